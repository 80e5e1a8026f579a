use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::ScraperConfig;

/// Print the default configuration, selector table included, as editable JSON
pub async fn handle_config(output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(&ScraperConfig::default())?;

    match output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Default configuration written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
