use anyhow::Result;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::aggregator::aggregate;
use crate::config::ScraperConfig;
use crate::errors::ScrapeError;
use crate::extractor::extract_profile_name;
use crate::login;
use crate::navigation::{NavigationTarget, capture, navigate_tolerant};
use crate::page::PageDriver;
use crate::session::{acquire_session, release_session};
use crate::types::{ERROR_PROFILE, LOGIN_FAILED_PROFILE, ScrapeResult};
use crate::webdriver::{Browser, LaunchOptions};

/// Scrapes profiles through one page it exclusively owns.
///
/// The page outlives individual scrapes; it is released only by
/// [`ProfileScraper::shutdown`].
pub struct ProfileScraper<P: PageDriver> {
    page: P,
    config: ScraperConfig,
}

impl<P: PageDriver> ProfileScraper<P> {
    pub fn new(page: P, config: ScraperConfig) -> Self {
        Self { page, config }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Open the site and wait for a manual login if one is needed
    pub async fn login(&self) -> bool {
        login::login(&self.page, &self.config).await
    }

    /// Scrape up to `max_posts` posts from a profile.
    ///
    /// Never fails: a failed login or a fatal error yields a sentinel result
    /// whose single post describes the problem.
    pub async fn scrape(&self, profile_url: &str, max_posts: NonZeroUsize) -> ScrapeResult {
        info!("Starting scrape of profile: {}", profile_url);

        match self.try_scrape(profile_url, max_posts).await {
            Ok(result) => result,
            Err(e) => {
                error!("Error scraping profile: {:#}", e);
                ScrapeResult::sentinel(
                    ERROR_PROFILE,
                    profile_url,
                    format!("Error scraping profile: {:#}", e),
                )
            }
        }
    }

    async fn try_scrape(&self, profile_url: &str, max_posts: NonZeroUsize) -> Result<ScrapeResult> {
        let page = &self.page;
        let config = &self.config;

        self.open_profile(profile_url).await?;

        if login::is_login_required(page, config).await {
            warn!("Login required");
            if !self.login().await {
                return Ok(ScrapeResult::sentinel(
                    LOGIN_FAILED_PROFILE,
                    profile_url,
                    "Login failed. Please try again.",
                ));
            }
            info!("Navigating back to {}", profile_url);
            self.open_profile(profile_url).await?;
        }

        capture(page, config, "profile").await;

        let profile_name = extract_profile_name(page, config).await;
        let target = NavigationTarget {
            profile_url,
            profile_name: &profile_name,
        };

        let outcome = aggregate(page, config, &target, max_posts).await;
        info!(
            "Total posts found: {} (strategies tried: {:?})",
            outcome.posts.len(),
            outcome.attempted
        );

        Ok(ScrapeResult::new(profile_name, profile_url, outcome.posts))
    }

    async fn open_profile(&self, profile_url: &str) -> Result<()> {
        navigate_tolerant(&self.page, profile_url).await?;
        tokio::time::sleep(self.config.page_settle()).await;
        Ok(())
    }

    /// Give back the page, e.g. to inspect it after a scrape
    pub fn into_page(self) -> P {
        self.page
    }
}

impl ProfileScraper<Browser> {
    /// Attach to `endpoint` when given, launch a browser otherwise
    pub async fn connect(
        config: ScraperConfig,
        endpoint: Option<&str>,
        user_data_dir: Option<PathBuf>,
    ) -> Result<Self, ScrapeError> {
        let options = LaunchOptions {
            headless: config.headless,
            viewport: config.viewport,
            user_data_dir,
            navigation_timeout: config.navigation_timeout(),
        };
        let browser = acquire_session(endpoint.is_some(), endpoint, &options).await?;
        Ok(Self::new(browser, config))
    }

    /// Close the browser session; errors are logged
    pub async fn shutdown(self) {
        release_session(self.page).await;
    }
}
