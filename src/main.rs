#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postscrape::commands;
use postscrape::commands::profile::ProfileCommands;
use postscrape::commands::scrape::ScrapeArgs;
use postscrape::errors::ScrapeError;
use postscrape::types::OutputFormat;
use postscrape::webdriver_manager;

const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "postscrape")]
#[command(about = "Extract a profile's post history into CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a profile's posts and export them to CSV
    Scrape(ScrapeArgs),

    /// Open the site and wait for a manual login
    Login {
        /// Named browser profile to log in with
        #[arg(short, long)]
        profile: Option<String>,

        /// Attach to a running browser; without a value, probe ports 9222-9224
        #[arg(long, value_name = "WS", num_args = 0..=1)]
        attach: Option<Option<String>>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Look for a browser exposing a DevTools endpoint
    Discover {
        /// Output format
        #[arg(short, long, default_value = "simple")]
        format: OutputFormat,
    },

    /// Run the web form for starting scrapes and downloading results
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Directory for exported CSV files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Named browser profile to reuse
        #[arg(long)]
        profile: Option<String>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run the launched browser headless
        #[arg(long)]
        headless: bool,
    },

    /// Print the default configuration as JSON
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage named browser profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let result = run().await;

    // Always clean up chromedriver processes before exiting
    webdriver_manager::GLOBAL_WEBDRIVER_MANAGER.stop_all();

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            let scrape_err = ScrapeError::classify(err);

            // Output JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": format!("{:#}", scrape_err),
                "exit_code": scrape_err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            // Also log to stderr for human reading
            eprintln!("Error: {:#}", scrape_err);
            std::process::exit(scrape_err.exit_code());
        }
    }
}

async fn run() -> Result<()> {
    // Initialize tracing to stderr (so JSON output to stdout remains clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postscrape=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape(args) => commands::scrape::handle_scrape(args).await?,

        Commands::Login {
            profile,
            attach,
            config,
        } => commands::login::handle_login(profile, attach, config).await?,

        Commands::Discover { format } => commands::discover::handle_discover(format).await?,

        Commands::Serve {
            host,
            port,
            output_dir,
            profile,
            config,
            headless,
        } => {
            commands::serve::handle_serve(host, port, output_dir, profile, config, headless)
                .await?
        }

        Commands::Config { output } => commands::config::handle_config(output).await?,

        Commands::Profile { command } => commands::profile::handle_profile(command).await?,

        Commands::Version => commands::version::handle_version().await?,
    }

    Ok(())
}
