//! Page abstraction the scraping core is written against.
//!
//! [`crate::webdriver::Browser`] implements these traits over a live
//! WebDriver session. Anything else that can answer the same questions (a
//! recorded page, a simulated DOM) can drive the core unchanged.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How to find elements, independent of the driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Locator {
    /// CSS selector, possibly a comma-separated group
    Css(String),
    /// Elements whose own text, whitespace-normalized, equals the value
    Text(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text(text.into())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "{}", selector),
            Locator::Text(text) => write!(f, "text=\"{}\"", text),
        }
    }
}

/// An element inside a rendered page
#[async_trait]
pub trait ElementHandle: Send + Sync + Sized {
    /// Descendants of this element matching the locator
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self>>;

    /// Rendered text of the element
    async fn text(&self) -> Result<String>;

    /// Attribute value, `None` when the attribute is absent
    async fn attr(&self, name: &str) -> Result<Option<String>>;

    async fn click(&self) -> Result<()>;

    /// Replace the element's value with `value`
    async fn fill(&self, value: &str) -> Result<()>;

    /// Press Enter inside the element
    async fn submit(&self) -> Result<()>;
}

/// A controllable page
#[async_trait]
pub trait PageDriver: Send + Sync {
    type Element: ElementHandle;

    /// Navigate and wait for the document to be ready
    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// Elements anywhere in the document matching the locator
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Current `document.body.scrollHeight`
    async fn scroll_height(&self) -> Result<i64>;

    /// Save a PNG screenshot of the viewport
    async fn screenshot(&self, path: &Path) -> Result<()>;
}
