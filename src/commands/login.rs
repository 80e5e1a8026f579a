use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::commands::utils::{self, ConfigOverrides};
use crate::errors::ScrapeError;
use crate::scraper::ProfileScraper;
use crate::session::AttachRequest;

/// Run the manual login flow only, so a profile holds a session for later scrapes
pub async fn handle_login(
    profile: Option<String>,
    attach: Option<Option<String>>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = utils::load_config(config, ConfigOverrides::default())?;
    let user_data_dir = utils::resolve_profile(profile)?;
    let endpoint = AttachRequest::from_flag(attach).resolve().await;

    let scraper = ProfileScraper::connect(config, endpoint.as_deref(), user_data_dir).await?;
    info!("Log in using the browser window; waiting for the feed");
    let logged_in = scraper.login().await;
    scraper.shutdown().await;

    if !logged_in {
        eprintln!("✗ Login did not complete");
        return Err(ScrapeError::LoginFailed("manual login timed out or was rejected".into()).into());
    }

    println!("✓ Logged in");
    Ok(())
}
