use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder, Locator as WdLocator};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::errors::{ScrapeError, is_timeout};
use crate::page::{ElementHandle, Locator, PageDriver};
use crate::types::ViewportSize;
use crate::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;

/// Enter key in the WebDriver key table
const ENTER_KEY: &str = "\u{E007}";

/// Extra time the local guard gives chromedriver to report its own page-load timeout
const NAVIGATION_GUARD_MARGIN: Duration = Duration::from_secs(5);

/// How a new browser should be started
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub viewport: ViewportSize,
    /// Persistent profile directory, a throwaway one when `None`
    pub user_data_dir: Option<PathBuf>,
    pub navigation_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: false,
            viewport: ViewportSize::default(),
            user_data_dir: None,
            navigation_timeout: Duration::from_secs(60),
        }
    }
}

/// Chrome controlled through chromedriver
pub struct Browser {
    client: Client,
    navigation_timeout: Duration,
    attached: bool,
    // Removed from disk when the browser is dropped
    _temp_profile: Option<TempDir>,
}

impl Browser {
    /// Launch a fresh Chrome with automation markers hidden
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        info!("Launching Chrome through WebDriver");

        let (profile_path, temp_profile) = match &options.user_data_dir {
            Some(dir) => (dir.clone(), None),
            None => {
                let temp_dir = tempfile::Builder::new()
                    .prefix("postscrape-chrome-")
                    .tempdir()
                    .context("Failed to create temporary browser profile")?;
                (temp_dir.path().to_path_buf(), Some(temp_dir))
            }
        };

        let caps = launch_capabilities(options, &profile_path);
        let client = Self::connect(caps).await?;
        apply_timeouts(&client, options.navigation_timeout).await?;

        let vp = options.viewport;
        debug!("Setting viewport to {}x{}", vp.width, vp.height);
        if let Err(e) = client.set_window_size(vp.width, vp.height).await {
            debug!("Note: Could not set window size: {}", e);
        }

        Ok(Self {
            client,
            navigation_timeout: options.navigation_timeout,
            attached: false,
            _temp_profile: temp_profile,
        })
    }

    /// Take over a Chrome already running with `--remote-debugging-port`
    pub async fn attach(endpoint: &str, options: &LaunchOptions) -> Result<Self> {
        let address = debugger_address(endpoint)?;
        info!("Attaching to existing browser at {}", address);

        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "debuggerAddress": address }),
        );
        let client = Self::connect(caps).await?;
        apply_timeouts(&client, options.navigation_timeout).await?;

        Ok(Self {
            client,
            navigation_timeout: options.navigation_timeout,
            attached: true,
            _temp_profile: None,
        })
    }

    async fn connect(caps: serde_json::Map<String, serde_json::Value>) -> Result<Client> {
        let webdriver_url = GLOBAL_WEBDRIVER_MANAGER.ensure_driver().await?;
        debug!("Connecting to WebDriver at {}", webdriver_url);

        match ClientBuilder::rustls()
            .capabilities(caps.clone())
            .connect(&webdriver_url)
            .await
        {
            Ok(client) => Ok(client),
            Err(e) => {
                let error_str = e.to_string();
                if !error_str.contains("Session is already started")
                    && !error_str.contains("session not created")
                {
                    return Err(e).context("Failed to connect to WebDriver");
                }

                info!("WebDriver appears to be in a bad state, attempting recovery...");
                GLOBAL_WEBDRIVER_MANAGER.restart();
                tokio::time::sleep(Duration::from_millis(500)).await;

                let new_url = GLOBAL_WEBDRIVER_MANAGER
                    .ensure_driver()
                    .await
                    .context("Failed to restart WebDriver after recovery")?;

                ClientBuilder::rustls()
                    .capabilities(caps)
                    .connect(&new_url)
                    .await
                    .context("Failed to connect to WebDriver after restart")
            }
        }
    }

    /// Whether this session took over a browser it did not start
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    async fn execute(&self, script: &str) -> Result<serde_json::Value> {
        self.client
            .execute(script, vec![])
            .await
            .context("Failed to execute script")
    }

    /// End the WebDriver session. A launched browser exits with it.
    pub async fn close(self) -> Result<()> {
        self.client
            .close()
            .await
            .context("Failed to close WebDriver session")?;
        Ok(())
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("navigation_timeout", &self.navigation_timeout)
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}

/// Session timeouts for a navigation budget.
///
/// chromedriver serializes commands per session, so its page-load timeout has
/// to carry the budget. Otherwise a slow load keeps blocking every later
/// command. Script and implicit-wait timeouts keep their defaults.
pub fn session_timeouts(navigation_timeout: Duration) -> TimeoutConfiguration {
    TimeoutConfiguration::new(None, Some(navigation_timeout), None)
}

async fn apply_timeouts(client: &Client, navigation_timeout: Duration) -> Result<()> {
    debug!("Setting page load timeout to {:?}", navigation_timeout);
    client
        .update_timeouts(session_timeouts(navigation_timeout))
        .await
        .context("Failed to set WebDriver timeouts")
}

/// Chrome capabilities for a launched, anti-detection browser
pub fn launch_capabilities(
    options: &LaunchOptions,
    profile_path: &Path,
) -> serde_json::Map<String, serde_json::Value> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--no-sandbox".to_string(),
        "--start-maximized".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-popup-blocking".to_string(),
    ];

    if options.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
        args.push("--disable-dev-shm-usage".to_string());
    }

    args.push(format!(
        "--window-size={},{}",
        options.viewport.width, options.viewport.height
    ));
    args.push(format!("--user-data-dir={}", profile_path.display()));

    let mut caps = serde_json::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "excludeSwitches": ["enable-automation"],
            "useAutomationExtension": false,
        }),
    );
    caps
}

/// Reduce a DevTools endpoint to the `host:port` chromedriver attaches to.
///
/// Accepts `ws://host:port/devtools/browser/<id>`, `http://host:port` or a
/// bare `host:port`.
pub fn debugger_address(endpoint: &str) -> std::result::Result<String, ScrapeError> {
    let invalid = || ScrapeError::BrowserLaunch(format!("Invalid debugger endpoint: {}", endpoint));

    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("ws://{}", endpoint)
    };

    let parsed = url::Url::parse(&with_scheme).map_err(|_| invalid())?;
    let host = parsed.host_str().ok_or_else(invalid)?;
    let port = parsed.port_or_known_default().ok_or_else(invalid)?;
    Ok(format!("{}:{}", host, port))
}

/// Quote `text` as an XPath string literal
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// XPath for elements whose own normalized text equals `text`
fn text_xpath(text: &str, relative: bool) -> String {
    let prefix = if relative { "." } else { "" };
    format!(
        "{}//*[normalize-space(text())={}]",
        prefix,
        xpath_literal(text.trim())
    )
}

#[async_trait]
impl PageDriver for Browser {
    type Element = ChromeElement;

    async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);

        let guard = self.navigation_timeout + NAVIGATION_GUARD_MARGIN;
        match tokio::time::timeout(guard, self.client.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let err = anyhow::Error::new(e);
                if is_timeout(&err) {
                    return Err(ScrapeError::NavigationTimeout(url.to_string()).into());
                }
                return Err(err.context(format!("Failed to navigate to {}", url)));
            }
            Err(_) => return Err(ScrapeError::NavigationTimeout(url.to_string()).into()),
        }

        // Max 2 seconds waiting for readyState
        for _ in 0..20 {
            match self.execute("return document.readyState === 'complete';").await {
                Ok(val) if val.as_bool().unwrap_or(false) => break,
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }

        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn title(&self) -> Result<String> {
        let value = self.execute("return document.title;").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ChromeElement>> {
        let found = match locator {
            Locator::Css(selector) => self.client.find_all(WdLocator::Css(selector)).await,
            Locator::Text(text) => {
                let xpath = text_xpath(text, false);
                self.client.find_all(WdLocator::XPath(&xpath)).await
            }
        }
        .with_context(|| format!("Failed to query {}", locator))?;

        Ok(found.into_iter().map(ChromeElement).collect())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.execute("window.scrollTo(0, document.body.scrollHeight);")
            .await?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<i64> {
        let value = self.execute("return document.body.scrollHeight;").await?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|h| h as i64))
            .with_context(|| format!("Unexpected scroll height value: {}", value))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let png = self
            .client
            .screenshot()
            .await
            .context("Failed to take screenshot")?;
        tokio::fs::write(path, png)
            .await
            .with_context(|| format!("Failed to write screenshot {}", path.display()))?;
        info!("Screenshot saved to {}", path.display());
        Ok(())
    }
}

/// An element of a live page
#[derive(Debug, Clone)]
pub struct ChromeElement(Element);

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self>> {
        let found = match locator {
            Locator::Css(selector) => self.0.find_all(WdLocator::Css(selector)).await,
            Locator::Text(text) => {
                let xpath = text_xpath(text, true);
                self.0.find_all(WdLocator::XPath(&xpath)).await
            }
        }
        .with_context(|| format!("Failed to query {}", locator))?;

        Ok(found.into_iter().map(ChromeElement).collect())
    }

    async fn text(&self) -> Result<String> {
        Ok(self.0.text().await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>> {
        Ok(self.0.attr(name).await?)
    }

    async fn click(&self) -> Result<()> {
        self.0.click().await.context("Failed to click element")?;
        Ok(())
    }

    async fn fill(&self, value: &str) -> Result<()> {
        if let Err(e) = self.0.clear().await {
            warn!("Could not clear field before typing: {}", e);
        }
        self.0
            .send_keys(value)
            .await
            .context("Failed to type into element")?;
        Ok(())
    }

    async fn submit(&self) -> Result<()> {
        self.0
            .send_keys(ENTER_KEY)
            .await
            .context("Failed to press Enter")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "webdriver_test.rs"]
mod webdriver_test;
