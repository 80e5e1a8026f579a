use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::profile::ProfileManager;
use crate::types::ViewportSize;

/// Flags shared by the browser-driving commands, applied over the config file
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub headless: bool,
    pub viewport: Option<String>,
    pub screenshots: Option<PathBuf>,
}

/// Load the config file (or defaults), then apply command-line overrides
pub fn load_config(path: Option<PathBuf>, overrides: ConfigOverrides) -> Result<ScraperConfig> {
    let mut config = ScraperConfig::load(path.as_deref())?;

    if overrides.headless {
        config.headless = true;
    }
    if let Some(viewport) = overrides.viewport {
        config.viewport = ViewportSize::parse(&viewport)?;
    }
    if let Some(dir) = overrides.screenshots {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create screenshot directory {}", dir.display()))?;
        config.screenshot_dir = Some(dir);
    }

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Resolve `--profile NAME` to its user-data directory
pub fn resolve_profile(profile: Option<String>) -> Result<Option<PathBuf>> {
    match profile {
        Some(name) => Ok(Some(ProfileManager::new()?.open_profile(&name)?)),
        None => Ok(None),
    }
}
