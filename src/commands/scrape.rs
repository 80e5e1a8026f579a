use anyhow::Result;
use clap::Args;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::commands::utils::{self, ConfigOverrides};
use crate::errors::ScrapeError;
use crate::export::write_csv;
use crate::scraper::ProfileScraper;
use crate::session::AttachRequest;
use crate::types::{OutputFormat, ScrapeResult, parse_max_posts};

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Profile URL to scrape
    pub url: String,

    /// Maximum number of posts to collect
    #[arg(short, long, default_value = "50")]
    pub max_posts: usize,

    /// CSV file to write (defaults to posts_<name>_<timestamp>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Attach to a running browser; without a value, probe ports 9222-9224
    #[arg(long, value_name = "WS", num_args = 0..=1)]
    pub attach: Option<Option<String>>,

    /// Run the launched browser headless
    #[arg(long)]
    pub headless: bool,

    /// Named browser profile to reuse
    #[arg(short, long)]
    pub profile: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
    #[arg(long)]
    pub viewport: Option<String>,

    /// Directory for debug screenshots
    #[arg(long, value_name = "DIR")]
    pub screenshots: Option<PathBuf>,

    /// Output format for the summary
    #[arg(short, long, default_value = "simple")]
    pub format: OutputFormat,
}

pub async fn handle_scrape(args: ScrapeArgs) -> Result<()> {
    // Reject a zero count before any browser work
    let max_posts = parse_max_posts(args.max_posts)?;

    let config = utils::load_config(
        args.config,
        ConfigOverrides {
            headless: args.headless,
            viewport: args.viewport,
            screenshots: args.screenshots,
        },
    )?;
    let user_data_dir = utils::resolve_profile(args.profile)?;

    let attach = AttachRequest::from_flag(args.attach);
    let discovering = attach == AttachRequest::Discover;
    let endpoint = attach.resolve().await;
    if discovering && endpoint.is_none() {
        warn!("No debuggable browser found, launching a new one");
    }

    let scraper = ProfileScraper::connect(config, endpoint.as_deref(), user_data_dir).await?;
    let result = scraper.scrape(&args.url, max_posts).await;
    scraper.shutdown().await;

    let path = write_csv(&result, args.output.as_deref())?;
    info!("Saved {} posts to {}", result.posts().len(), path.display());
    print_summary(&result, &path, args.format)?;

    if result.is_login_failure() {
        return Err(ScrapeError::LoginFailed(args.url).into());
    }
    if result.is_error() {
        let message = result
            .posts()
            .first()
            .map(|post| post.text.clone())
            .unwrap_or_default();
        return Err(ScrapeError::classify(anyhow::anyhow!(message)).into());
    }
    Ok(())
}

fn print_summary(result: &ScrapeResult, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let summary = json!({
                "profile_name": result.profile_name(),
                "profile_url": result.profile_url(),
                "scrape_timestamp": result.scrape_timestamp(),
                "post_count": result.posts().len(),
                "output": path.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Simple => {
            println!("Profile: {}", result.profile_name());
            println!("URL: {}", result.profile_url());
            println!("Scraped at: {}", result.scrape_timestamp());
            println!("Posts: {}", result.posts().len());
            println!("Saved to: {}", path.display());
        }
    }
    Ok(())
}
