use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::errors::ScrapeError;

/// Output format for CLI results
#[derive(Clone, Copy, Debug, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// Placeholder date for posts whose timestamp could not be resolved
pub const UNKNOWN_DATE: &str = "Unknown date";

/// Placeholder display name when no name selector or title matched
pub const UNKNOWN_PROFILE: &str = "Unknown Profile";

/// Profile name of the sentinel result returned when login fails
pub const LOGIN_FAILED_PROFILE: &str = "Login Failed";

/// Profile name of the sentinel result returned on a fatal scrape error
pub const ERROR_PROFILE: &str = "Error";

/// A single post harvested from the rendered feed
///
/// Two posts are the same post when their `text` is identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Body text, paragraphs separated by blank lines
    pub text: String,
    /// Site-native date phrasing ("3d ago", "2 weeks"), not normalized
    pub date: String,
    /// Reaction count
    pub likes: u64,
    /// Always 0, comment counts are not resolved
    pub comments: u64,
    /// Always 0, share counts are not resolved
    pub shares: u64,
    /// Permalink when one was found in the container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Post {
    /// Create a post with zeroed counters and no permalink
    pub fn new(text: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            date: date.into(),
            likes: 0,
            comments: 0,
            shares: 0,
            url: None,
        }
    }

    pub fn with_likes(mut self, likes: u64) -> Self {
        self.likes = likes;
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }
}

/// Outcome of one scrape invocation
///
/// Built once and never mutated. A failed scrape is still a `ScrapeResult`:
/// it holds a single post whose text describes the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    profile_name: String,
    profile_url: String,
    posts: Vec<Post>,
    scrape_timestamp: String,
}

impl ScrapeResult {
    /// Build a result stamped with the current local time
    pub fn new(
        profile_name: impl Into<String>,
        profile_url: impl Into<String>,
        posts: Vec<Post>,
    ) -> Self {
        Self {
            profile_name: profile_name.into(),
            profile_url: profile_url.into(),
            posts,
            scrape_timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Build a result from already-known parts, e.g. when re-reading an export
    pub fn from_parts(
        profile_name: impl Into<String>,
        profile_url: impl Into<String>,
        posts: Vec<Post>,
        scrape_timestamp: impl Into<String>,
    ) -> Self {
        Self {
            profile_name: profile_name.into(),
            profile_url: profile_url.into(),
            posts,
            scrape_timestamp: scrape_timestamp.into(),
        }
    }

    /// A well-formed result describing a failure instead of carrying posts
    pub fn sentinel(
        profile_name: impl Into<String>,
        profile_url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let today = Local::now().format("%Y-%m-%d").to_string();
        Self::new(profile_name, profile_url, vec![Post::new(message, today)])
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn scrape_timestamp(&self) -> &str {
        &self.scrape_timestamp
    }

    /// Whether this is a sentinel describing a failed login
    pub fn is_login_failure(&self) -> bool {
        self.profile_name == LOGIN_FAILED_PROFILE && self.posts.len() == 1
    }

    /// Whether this is a sentinel describing a fatal error
    pub fn is_error(&self) -> bool {
        self.profile_name == ERROR_PROFILE && self.posts.len() == 1
    }
}

/// Parse a requested post count, rejecting zero before any browser work
pub fn parse_max_posts(value: usize) -> std::result::Result<NonZeroUsize, ScrapeError> {
    NonZeroUsize::new(value).ok_or_else(|| {
        ScrapeError::InvalidInput("maximum number of posts must be at least 1".to_string())
    })
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 1024,
        }
    }
}

impl ViewportSize {
    /// Parse viewport size from "WIDTHxHEIGHT" format (e.g., "1920x1080")
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid viewport format. Use WIDTHxHEIGHT (e.g., 1920x1080)");
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid width in viewport size"))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid height in viewport size"))?;

        Ok(ViewportSize { width, height })
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
