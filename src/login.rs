//! Login-state detection and the manual login flow.
//!
//! Authentication itself is left to a human in the browser window (or to a
//! browser profile that is already signed in). This module only decides
//! whether the viewer is facing a login barrier and waits for it to clear.

use anyhow::Result;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::config::ScraperConfig;
use crate::navigation::navigate_tolerant;
use crate::page::PageDriver;
use crate::selectors::Probe;

/// Whether any probe in `probes` matches.
///
/// `None` when no probe could be evaluated at all.
async fn any_present<P: PageDriver>(page: &P, probes: &[Probe]) -> Option<bool> {
    let mut evaluated = false;
    for probe in probes {
        match probe.find_in_page(page).await {
            Ok(found) if !found.is_empty() => return Some(true),
            Ok(_) => evaluated = true,
            Err(e) => debug!("Login probe {} failed: {:#}", probe, e),
        }
    }
    evaluated.then_some(false)
}

/// Whether the page shows a login or paywall barrier.
///
/// An OR of independent signals; a signal that cannot be checked counts as
/// absent. If none of them could be checked the answer is `true`.
pub async fn is_login_required<P: PageDriver>(page: &P, config: &ScraperConfig) -> bool {
    let selectors = &config.selectors;

    let markup = any_present(page, &selectors.login_markup).await;
    let prompts = any_present(page, &selectors.login_prompts).await;
    let guest = any_present(page, &selectors.guest_markers).await;
    let url = match page.current_url().await {
        Ok(url) => Some(url),
        Err(e) => {
            debug!("Could not read current URL: {:#}", e);
            None
        }
    };

    let login_url = url.as_deref().map(|u| config.site.is_login_url(u));
    let guest_home = url
        .as_deref()
        .map(|u| config.site.is_home_url(u) && prompts == Some(true));

    let signals = [markup, prompts, guest, login_url, guest_home];
    if signals.iter().all(Option::is_none) {
        error!("Error checking if login is required, assuming it is");
        return true;
    }

    let required = signals.iter().any(|s| *s == Some(true));
    debug!(
        "Login signals: markup={:?} prompts={:?} guest={:?} login_url={:?} guest_home={:?}",
        markup, prompts, guest, login_url, guest_home
    );
    required
}

/// Open the site and, if needed, wait for the operator to log in by hand.
///
/// Returns `true` when the viewer ends up authenticated. Never errors.
pub async fn login<P: PageDriver>(page: &P, config: &ScraperConfig) -> bool {
    match run_login(page, config).await {
        Ok(logged_in) => logged_in,
        Err(e) => {
            error!("Error during login: {:#}", e);
            false
        }
    }
}

async fn run_login<P: PageDriver>(page: &P, config: &ScraperConfig) -> Result<bool> {
    let site = &config.site;

    info!("Opening {} to check login status", site.home_url());
    navigate_tolerant(page, &site.home_url()).await?;
    sleep(config.home_settle()).await;

    if !is_login_required(page, config).await {
        info!("Already logged in");
        return Ok(true);
    }

    navigate_tolerant(page, &site.login_url()).await?;
    info!(
        "Please log in manually in the browser window (waiting up to {} seconds)",
        config.login_timeout_secs
    );

    if wait_for_feed(page, config).await {
        info!("Login successful");
        return Ok(true);
    }

    warn!("Timed out waiting for the feed page");
    let url = page.current_url().await?;
    if site.is_on_site(&url) && !site.is_login_url(&url) {
        info!("Appears to be logged in despite timeout");
        return Ok(true);
    }

    info!(
        "Waiting {} more seconds before a final check",
        config.login_grace_secs
    );
    sleep(config.login_grace()).await;
    Ok(!is_login_required(page, config).await)
}

/// Poll the current URL until it is the feed or the login timeout elapses
async fn wait_for_feed<P: PageDriver>(page: &P, config: &ScraperConfig) -> bool {
    let deadline = Instant::now() + config.login_timeout();
    loop {
        match page.current_url().await {
            Ok(url) if config.site.is_feed_url(&url) => return true,
            Ok(_) => {}
            Err(e) => debug!("Could not read URL while waiting for login: {:#}", e),
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(config.login_poll()).await;
    }
}
