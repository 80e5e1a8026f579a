//! Selector strategy table.
//!
//! Every site-specific selector the scraper uses lives here as data. Control
//! flow iterates these lists in order; when the target site changes its
//! markup, only the table (or a JSON override of it) needs to change.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::page::{ElementHandle, Locator, PageDriver};

/// One entry of the table: where to look, and optionally which text the
/// match must contain (case-insensitive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    pub locator: Locator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_contains: Option<String>,
}

impl Probe {
    pub fn css(selector: &str) -> Self {
        Self {
            locator: Locator::css(selector),
            text_contains: None,
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            locator: Locator::text(text),
            text_contains: None,
        }
    }

    /// CSS match whose rendered text contains `text`
    pub fn css_with_text(selector: &str, text: &str) -> Self {
        Self {
            locator: Locator::css(selector),
            text_contains: Some(text.to_string()),
        }
    }

    /// Matches anywhere in the page
    pub async fn find_in_page<P: PageDriver>(&self, page: &P) -> Result<Vec<P::Element>> {
        let found = page.find_all(&self.locator).await?;
        Ok(self.filter_by_text(found).await)
    }

    /// Matches inside `scope`
    pub async fn find_in<E: ElementHandle>(&self, scope: &E) -> Result<Vec<E>> {
        let found = scope.find_all(&self.locator).await?;
        Ok(self.filter_by_text(found).await)
    }

    async fn filter_by_text<E: ElementHandle>(&self, elements: Vec<E>) -> Vec<E> {
        let Some(needle) = &self.text_contains else {
            return elements;
        };
        let needle = needle.to_lowercase();

        let mut kept = Vec::new();
        for element in elements {
            match element.text().await {
                Ok(text) if text.to_lowercase().contains(&needle) => kept.push(element),
                Ok(_) => {}
                Err(e) => debug!("Skipping element with unreadable text: {}", e),
            }
        }
        kept
    }
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.text_contains {
            Some(text) => write!(f, "{}:has-text(\"{}\")", self.locator, text),
            None => write!(f, "{}", self.locator),
        }
    }
}

/// Ordered probe lists for each thing the scraper looks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorTable {
    /// Display name on the profile page, most specific first
    pub profile_name: Vec<Probe>,
    /// Login links or forms
    pub login_markup: Vec<Probe>,
    /// "Sign in" / "Join now" style prompts
    pub login_prompts: Vec<Probe>,
    /// Limited or guest view markers
    pub guest_markers: Vec<Probe>,
    /// Links to the profile's activity listing
    pub activity_tabs: Vec<Probe>,
    /// Global search box on the feed
    pub search_input: Vec<Probe>,
    /// Post containers, across feed, activity tab and card layouts
    pub post_containers: Vec<Probe>,
    /// Truncation expanders inside a container
    pub see_more: Vec<Probe>,
    /// Text-bearing sub-containers holding paragraphs
    pub paragraph_containers: Vec<Probe>,
    /// Paragraph-like children of a paragraph container
    pub paragraphs: Vec<Probe>,
    /// Single text-bearing elements, used when no paragraphs resolve
    pub text_fallbacks: Vec<Probe>,
    pub dates: Vec<Probe>,
    /// Reaction/like counters
    pub reactions: Vec<Probe>,
    /// Anchors carrying the post's permalink
    pub permalinks: Vec<Probe>,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            profile_name: vec![
                Probe::css("h1.text-heading-xlarge"),
                Probe::css("h1.pv-top-card-section__name"),
                Probe::css("h1.pv-text-details__title"),
                Probe::css(".profile-card-one-to-one__container h1"),
                Probe::css(".ph5 h1"),
                Probe::css("h1"),
            ],
            login_markup: vec![Probe::css(r#"a[href*="login"], form[action*="login"]"#)],
            login_prompts: vec![Probe::text("Sign in"), Probe::text("Join now")],
            guest_markers: vec![Probe::css(".profile-unavailable, .guest-view")],
            activity_tabs: vec![
                Probe::css(r#"a[href*="recent-activity/shares"]"#),
                Probe::css(r#"a[href*="recent-activity/posts"]"#),
                Probe::css(r#"a[href*="detail/recent-activity"]"#),
                Probe::css_with_text("a", "Activity"),
                Probe::css_with_text("a", "Posts"),
                Probe::css_with_text("a", "Articles"),
                Probe::css_with_text("nav a", "Activity"),
            ],
            search_input: vec![Probe::css(
                r#"input[placeholder*="Search"], input[aria-label*="Search"]"#,
            )],
            post_containers: vec![
                Probe::css(".update-components-actor"),
                Probe::css(".feed-shared-update-v2"),
                Probe::css(".occludable-update"),
                Probe::css(".profile-activity-card"),
                Probe::css(".artdeco-card"),
                Probe::css(".activity-card"),
                Probe::css("div[data-urn]"),
            ],
            see_more: vec![
                Probe::css_with_text("button", "see more"),
                Probe::css_with_text("button", "...more"),
                Probe::css_with_text("button", "…more"),
                Probe::css_with_text("button", "read more"),
                Probe::css_with_text("span", "see more"),
                Probe::css_with_text("span", "...more"),
                Probe::css_with_text("span", "…more"),
                Probe::css_with_text("span", "read more"),
                Probe::css_with_text("a", "see more"),
                Probe::css_with_text("a", "...more"),
                Probe::css_with_text("a", "…more"),
                Probe::css_with_text("a", "read more"),
            ],
            paragraph_containers: vec![
                Probe::css(".feed-shared-update-v2__description"),
                Probe::css(".feed-shared-text"),
                Probe::css(".update-components-text"),
                Probe::css(".feed-shared-update__description"),
                Probe::css(".update-components-update-content"),
                Probe::css(".activity-card__content"),
            ],
            paragraphs: vec![Probe::css("p, span.break-words, div.break-words")],
            text_fallbacks: vec![
                Probe::css(".feed-shared-update-v2__description"),
                Probe::css(".feed-shared-text"),
                Probe::css(".update-components-text"),
                Probe::css(".feed-shared-update__description"),
                Probe::css(".update-components-update-content"),
                Probe::css(".update-components-text span"),
                Probe::css(".activity-card__content"),
                Probe::css("p, span"),
            ],
            dates: vec![
                Probe::css(".feed-shared-actor__sub-description"),
                Probe::css(".feed-shared-time-ago"),
                Probe::css(".update-components-actor__sub-description"),
                Probe::css("time"),
                Probe::css(".activity-card__date"),
                Probe::css_with_text("span", "ago"),
            ],
            reactions: vec![
                Probe::css(".social-details-social-counts__reactions-count"),
                Probe::css(r#"span[data-test-id="social-actions__reaction-count"]"#),
                Probe::css(r#"button[aria-label*="reactions"]"#),
                Probe::css_with_text("span", "Like"),
            ],
            permalinks: vec![
                Probe::css(r#"a[href*="/feed/update/"]"#),
                Probe::css(r#"a[href*="/posts/"]"#),
            ],
        }
    }
}

impl SelectorTable {
    /// Load a table from JSON; missing lists keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read selector table {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid selector table {}", path.display()))
    }
}

#[cfg(test)]
#[path = "selectors_test.rs"]
mod selectors_test;
