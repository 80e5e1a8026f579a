use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::selectors::SelectorTable;
use crate::types::ViewportSize;

/// Where the target site keeps its pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root, also the "home" page checked for guest prompts
    pub base_url: String,

    /// Path of the login form
    pub login_path: String,

    /// Path of the signed-in feed; reaching it means login completed
    pub feed_path: String,

    /// Activity listing path, `{handle}` is replaced by the profile handle
    pub activity_path: String,

    /// Regex whose first capture group is the profile handle
    pub profile_handle_pattern: String,

    /// Suffix the site appends to document titles
    pub title_suffix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.linkedin.com/".to_string(),
            login_path: "login".to_string(),
            feed_path: "feed/".to_string(),
            activity_path: "in/{handle}/recent-activity/all/".to_string(),
            profile_handle_pattern: r"linkedin\.com/in/([^/?#]+)".to_string(),
            title_suffix: " | LinkedIn".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn home_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn login_url(&self) -> String {
        self.join(&self.login_path)
    }

    pub fn feed_url(&self) -> String {
        self.join(&self.feed_path)
    }

    /// Canonical activity listing URL for a handle
    pub fn activity_url(&self, handle: &str) -> String {
        self.join(&self.activity_path.replace("{handle}", handle))
    }

    /// Profile handle segment of a profile URL, if the URL has one
    pub fn handle_from(&self, profile_url: &str) -> Result<Option<String>> {
        let pattern = Regex::new(&self.profile_handle_pattern).with_context(|| {
            format!(
                "Invalid profile handle pattern: {}",
                self.profile_handle_pattern
            )
        })?;
        Ok(pattern
            .captures(profile_url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()))
    }

    /// Whether `url` is the signed-in feed
    pub fn is_feed_url(&self, url: &str) -> bool {
        let feed = self.feed_path.trim_matches('/');
        !feed.is_empty() && url.contains(&format!("/{}", feed))
    }

    /// Whether the path of `url` contains the login path or a `signup` segment.
    ///
    /// Matches whole segments, so `/in/loginova-maria/` is not a login page
    /// while `/login` and `/uas/login?trk=x` are.
    pub fn is_login_url(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let login: Vec<&str> = self
            .login_path
            .split('/')
            .filter(|seg| !seg.is_empty())
            .collect();

        let has_login = !login.is_empty()
            && segments
                .windows(login.len())
                .any(|window| window == login.as_slice());
        let has_signup = segments.iter().any(|seg| *seg == "signup");
        has_login || has_signup
    }

    /// Whether `url` is on the site at all
    pub fn is_on_site(&self, url: &str) -> bool {
        let host = |u: &str| url::Url::parse(u).ok()?.host_str().map(str::to_string);
        match (host(&self.base_url), host(url)) {
            (Some(site), Some(other)) => {
                let site = site.trim_start_matches("www.");
                other == site || other.ends_with(&format!(".{}", site))
            }
            _ => false,
        }
    }

    /// Whether `url` is the bare site root
    pub fn is_home_url(&self, url: &str) -> bool {
        url.trim_end_matches('/') == self.base_url.trim_end_matches('/')
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Configuration for one scraper instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub site: SiteConfig,

    /// Per-navigation time budget in seconds (default: 60)
    pub navigation_timeout_secs: u64,

    /// Settle after landing on a profile or listing, in milliseconds (default: 5000)
    pub page_settle_ms: u64,

    /// Settle after opening the home page during login, in milliseconds (default: 3000)
    pub home_settle_ms: u64,

    /// Settle after each scroll, in milliseconds (default: 2000)
    pub scroll_settle_ms: u64,

    /// Settle after each "see more" click, in milliseconds (default: 500)
    pub expand_settle_ms: u64,

    /// How long to wait for a manual login, in seconds (default: 300)
    pub login_timeout_secs: u64,

    /// Extra wait before the final login check, in seconds (default: 30)
    pub login_grace_secs: u64,

    /// Interval between URL polls while waiting for login, in milliseconds (default: 1000)
    pub login_poll_ms: u64,

    /// Hard ceiling on scroll iterations per view (default: 20)
    pub max_scroll_iterations: usize,

    /// Consecutive unchanged heights that end pagination (default: 3)
    pub stable_height_limit: usize,

    pub viewport: ViewportSize,

    /// Run the browser without a window (default: false)
    pub headless: bool,

    /// Directory for debug screenshots, none when unset
    pub screenshot_dir: Option<PathBuf>,

    pub selectors: SelectorTable,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            navigation_timeout_secs: 60,
            page_settle_ms: 5000,
            home_settle_ms: 3000,
            scroll_settle_ms: 2000,
            expand_settle_ms: 500,
            login_timeout_secs: 300,
            login_grace_secs: 30,
            login_poll_ms: 1000,
            max_scroll_iterations: 20,
            stable_height_limit: 3,
            viewport: ViewportSize::default(),
            headless: false,
            screenshot_dir: None,
            selectors: SelectorTable::default(),
        }
    }
}

impl ScraperConfig {
    /// Load a configuration file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn home_settle(&self) -> Duration {
        Duration::from_millis(self.home_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn expand_settle(&self) -> Duration {
        Duration::from_millis(self.expand_settle_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn login_grace(&self) -> Duration {
        Duration::from_secs(self.login_grace_secs)
    }

    pub fn login_poll(&self) -> Duration {
        Duration::from_millis(self.login_poll_ms)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
