use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::profile::ProfileManager;
use crate::types::OutputFormat;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Create a new profile
    Create {
        /// Profile name
        name: String,
    },

    /// Delete a profile and its browser data
    Delete {
        /// Profile name
        name: String,
    },

    /// List all profiles
    List {
        /// Output format
        #[arg(short, long, default_value = "simple")]
        format: OutputFormat,
    },
}

pub async fn handle_profile(command: ProfileCommands) -> Result<()> {
    let manager = ProfileManager::new()?;

    match command {
        ProfileCommands::Create { name } => {
            info!("Creating profile: {}", name);
            match manager.create_profile(&name) {
                Ok(path) => {
                    println!("✓ Profile '{}' created successfully", name);
                    println!("Location: {}", path.display());
                    Ok(())
                }
                Err(e) => {
                    eprintln!("✗ Failed to create profile '{}': {}", name, e);
                    Err(e)
                }
            }
        }

        ProfileCommands::Delete { name } => {
            info!("Deleting profile: {}", name);
            match manager.delete_profile(&name) {
                Ok(()) => {
                    println!("✓ Profile '{}' deleted successfully", name);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("✗ Failed to delete profile '{}': {}", name, e);
                    Err(e)
                }
            }
        }

        ProfileCommands::List { format } => {
            let profiles = manager.list_profiles()?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&profiles)?);
                }
                OutputFormat::Simple => {
                    if profiles.is_empty() {
                        println!("No profiles found");
                        return Ok(());
                    }

                    println!("{:<20} {:<20} {:<20}", "Name", "Created", "Last Used");
                    println!("{}", "-".repeat(60));
                    for profile in profiles {
                        println!(
                            "{:<20} {:<20} {:<20}",
                            profile.name,
                            profile.created_at.format("%Y-%m-%d %H:%M"),
                            profile.last_used.format("%Y-%m-%d %H:%M"),
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
