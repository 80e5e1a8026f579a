//! Routes from a profile page to a listing of the profile's own posts.

use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::errors::is_timeout;
use crate::page::{ElementHandle, PageDriver};
use crate::types::UNKNOWN_PROFILE;

/// One way of reaching a posts view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Click an Activity/Posts/Articles tab on the profile page
    ActivityTab,
    /// Open the canonical activity listing URL for the profile handle
    ActivityUrl,
    /// Search the general feed for the display name
    FeedSearch,
}

impl Strategy {
    /// Fixed priority order
    pub const ORDER: [Strategy; 3] = [
        Strategy::ActivityTab,
        Strategy::ActivityUrl,
        Strategy::FeedSearch,
    ];

    fn position(self) -> usize {
        match self {
            Strategy::ActivityTab => 0,
            Strategy::ActivityUrl => 1,
            Strategy::FeedSearch => 2,
        }
    }

    /// The strategy after this one, if any
    pub fn next(self) -> Option<Strategy> {
        Self::ORDER.get(self.position() + 1).copied()
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::ActivityTab => "activity tab",
            Strategy::ActivityUrl => "activity URL",
            Strategy::FeedSearch => "feed search",
        };
        write!(f, "{}", name)
    }
}

/// Whose posts are being looked for
#[derive(Debug, Clone, Copy)]
pub struct NavigationTarget<'a> {
    pub profile_url: &'a str,
    /// Resolved display name; the placeholder counts as unknown
    pub profile_name: &'a str,
}

impl NavigationTarget<'_> {
    fn known_name(&self) -> Option<&str> {
        let name = self.profile_name.trim();
        (!name.is_empty() && name != UNKNOWN_PROFILE).then_some(name)
    }
}

/// Navigate, treating a timeout as a slow page rather than a failure
pub async fn navigate_tolerant<P: PageDriver>(page: &P, url: &str) -> Result<()> {
    match page.goto(url).await {
        Ok(()) => Ok(()),
        Err(e) if is_timeout(&e) => {
            warn!("Timeout while navigating to {}, but continuing: {:#}", url, e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Save a debug screenshot when a screenshot directory is configured
pub async fn capture<P: PageDriver>(page: &P, config: &ScraperConfig, label: &str) {
    let Some(dir) = &config.screenshot_dir else {
        return;
    };

    let path = dir.join(format!(
        "{}_{}.png",
        label,
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    if let Err(e) = page.screenshot(&path).await {
        warn!("Failed to take {} screenshot: {:#}", label, e);
    }
}

/// Run one strategy. `Ok(false)` means it found nothing to act on.
pub async fn try_strategy<P: PageDriver>(
    page: &P,
    config: &ScraperConfig,
    strategy: Strategy,
    target: &NavigationTarget<'_>,
) -> Result<bool> {
    match strategy {
        Strategy::ActivityTab => open_activity_tab(page, config).await,
        Strategy::ActivityUrl => open_activity_url(page, config, target).await,
        Strategy::FeedSearch => search_feed(page, config, target).await,
    }
}

async fn open_activity_tab<P: PageDriver>(page: &P, config: &ScraperConfig) -> Result<bool> {
    for probe in &config.selectors.activity_tabs {
        let tabs = match probe.find_in_page(page).await {
            Ok(tabs) => tabs,
            Err(e) => {
                debug!("Tab probe {} failed: {:#}", probe, e);
                continue;
            }
        };
        let Some(tab) = tabs.first() else {
            continue;
        };

        info!("Found activity tab with selector: {}", probe);
        match tab.click().await {
            Ok(()) => {
                tokio::time::sleep(config.page_settle()).await;
                capture(page, config, "tab_clicked").await;
                return Ok(true);
            }
            Err(e) => warn!("Error clicking tab {}: {:#}", probe, e),
        }
    }

    debug!("No activity tab found");
    Ok(false)
}

async fn open_activity_url<P: PageDriver>(
    page: &P,
    config: &ScraperConfig,
    target: &NavigationTarget<'_>,
) -> Result<bool> {
    let Some(handle) = config.site.handle_from(target.profile_url)? else {
        debug!("No profile handle in {}", target.profile_url);
        return Ok(false);
    };

    let activity_url = config.site.activity_url(&handle);
    info!("Trying direct activity URL: {}", activity_url);
    navigate_tolerant(page, &activity_url).await?;
    tokio::time::sleep(config.page_settle()).await;
    capture(page, config, "direct_activity").await;
    Ok(true)
}

async fn search_feed<P: PageDriver>(
    page: &P,
    config: &ScraperConfig,
    target: &NavigationTarget<'_>,
) -> Result<bool> {
    info!("Trying main feed as last resort");
    navigate_tolerant(page, &config.site.feed_url()).await?;
    tokio::time::sleep(config.page_settle()).await;
    capture(page, config, "feed").await;

    let Some(name) = target.known_name() else {
        return Ok(true);
    };

    for probe in &config.selectors.search_input {
        let inputs = match probe.find_in_page(page).await {
            Ok(inputs) => inputs,
            Err(e) => {
                debug!("Search probe {} failed: {:#}", probe, e);
                continue;
            }
        };
        if let Some(search_box) = inputs.first() {
            info!("Searching for: {}", name);
            search_box.fill(name).await?;
            search_box.submit().await?;
            tokio::time::sleep(config.page_settle()).await;
            break;
        }
    }

    Ok(true)
}

/// Drive the page to a listing of the target's posts.
///
/// Strategies run in order starting at `from`, each attempt recorded in
/// `attempted`. Returns the strategy that reached a view. `None` means every
/// step failed and callers extract from whatever page is loaded.
pub async fn locate_posts_view<P: PageDriver>(
    page: &P,
    config: &ScraperConfig,
    target: &NavigationTarget<'_>,
    from: Strategy,
    attempted: &mut Vec<Strategy>,
) -> Option<Strategy> {
    for strategy in Strategy::ORDER.into_iter().skip(from.position()) {
        attempted.push(strategy);
        match try_strategy(page, config, strategy, target).await {
            Ok(true) => {
                info!("Reached posts view via {}", strategy);
                return Some(strategy);
            }
            Ok(false) => debug!("Strategy {} found nothing", strategy),
            Err(e) => warn!("Error with {}: {:#}", strategy, e),
        }
    }

    debug!("No strategy from {} reached a posts view", from);
    None
}
