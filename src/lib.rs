//! # postscrape
#![allow(clippy::uninlined_format_args)]
//!
//! Extract a profile's public post history from a JavaScript-rendered social
//! feed and save it as CSV.
//!
//! The scraper drives a real Chrome through chromedriver, reaches the
//! profile's activity view through a chain of fallback strategies, scrolls
//! until the feed stops growing, and writes the deduplicated posts to a CSV
//! file. Site-specific markup lives in a swappable [`SelectorTable`].
//!
//! ## CLI Usage
//!
//! ```bash
//! # Scrape up to 50 posts into posts_<name>_<timestamp>.csv
//! postscrape scrape "https://www.linkedin.com/in/someone/"
//!
//! # Reuse a Chrome started with --remote-debugging-port=9222
//! postscrape scrape "https://www.linkedin.com/in/someone/" --attach --max-posts 20
//!
//! # Keep a login across runs
//! postscrape login --profile work
//! postscrape scrape "https://www.linkedin.com/in/someone/" --profile work
//!
//! # Dump the default configuration, edit it, use it
//! postscrape config > postscrape.json
//! postscrape scrape "https://www.linkedin.com/in/someone/" --config postscrape.json
//!
//! # Web form with progress polling and CSV download
//! postscrape serve --port 5000
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use std::num::NonZeroUsize;
//! use postscrape::{ProfileScraper, ScraperConfig, write_csv};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let scraper = ProfileScraper::connect(ScraperConfig::default(), None, None).await?;
//! let result = scraper
//!     .scrape("https://www.linkedin.com/in/someone/", NonZeroUsize::new(20).unwrap())
//!     .await;
//! scraper.shutdown().await;
//!
//! let path = write_csv(&result, None)?;
//! println!("{} posts saved to {}", result.posts().len(), path.display());
//! # Ok(())
//! # }
//! ```

/// Merging posts from the fallback strategies
pub mod aggregator;

/// CLI command handlers
pub mod commands;

/// Site and timing configuration
pub mod config;

/// Finding a browser that exposes a DevTools endpoint
pub mod discovery;

/// Typed errors with CLI exit codes
pub mod errors;

/// CSV export
pub mod export;

/// Pulling posts and profile details out of the rendered page
pub mod extractor;

/// Scrape job registry for the HTTP shell
pub mod jobs;

/// Login detection and the manual login flow
pub mod login;

/// Reaching the profile's posts view
pub mod navigation;

/// The page abstraction the core is written against
pub mod page;

/// Scroll-driven collection
pub mod pagination;

/// Named browser profiles
pub mod profile;

/// The scrape entry point
pub mod scraper;

/// Site-specific selector strategies
pub mod selectors;

/// HTTP shell
pub mod server;

/// Browser session acquisition and release
pub mod session;

/// Post and result types
pub mod types;

/// WebDriver browser control
pub mod webdriver;

/// Automatic chromedriver process management
pub mod webdriver_manager;

pub use config::{ScraperConfig, SiteConfig};
pub use errors::ScrapeError;
pub use export::write_csv;
pub use page::{ElementHandle, Locator, PageDriver};
pub use profile::ProfileManager;
pub use scraper::ProfileScraper;
pub use selectors::{Probe, SelectorTable};
pub use types::{OutputFormat, Post, ScrapeResult, ViewportSize};
pub use webdriver::Browser;
