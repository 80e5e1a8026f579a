//! Acquiring and releasing the browser a scraper drives.

use tracing::{info, warn};

use crate::discovery;
use crate::errors::ScrapeError;
use crate::webdriver::{Browser, LaunchOptions};

/// Whether, and where, to attach to an already-running browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachRequest {
    /// Always launch a new browser
    Never,
    /// Probe the usual debugging ports, launch when nothing answers
    Discover,
    /// Attach to this DevTools endpoint
    Endpoint(String),
}

impl AttachRequest {
    /// Map clap's `--attach [WS]` shape: absent, bare flag, or flag with value
    pub fn from_flag(flag: Option<Option<String>>) -> Self {
        match flag {
            None => AttachRequest::Never,
            Some(None) => AttachRequest::Discover,
            Some(Some(endpoint)) => AttachRequest::Endpoint(endpoint),
        }
    }

    /// The endpoint to attach to, if any
    pub async fn resolve(self) -> Option<String> {
        match self {
            AttachRequest::Never => None,
            AttachRequest::Discover => discovery::find_debugger_endpoint().await,
            AttachRequest::Endpoint(endpoint) => Some(endpoint),
        }
    }
}

/// Get a browser to drive.
///
/// With `existing` and an endpoint, attach to it and fail if it is
/// unreachable. Otherwise launch a new browser.
pub async fn acquire_session(
    existing: bool,
    endpoint: Option<&str>,
    options: &LaunchOptions,
) -> Result<Browser, ScrapeError> {
    let result = match (existing, endpoint) {
        (true, Some(endpoint)) => Browser::attach(endpoint, options).await,
        _ => Browser::launch(options).await,
    };

    result.map_err(|e| match e.downcast::<ScrapeError>() {
        Ok(typed) => typed,
        Err(e) => ScrapeError::BrowserLaunch(format!("{:#}", e)),
    })
}

/// Close the session. Failures are logged, never returned.
pub async fn release_session(browser: Browser) {
    let attached = browser.is_attached();
    match browser.close().await {
        Ok(()) if attached => info!("Detached from existing browser"),
        Ok(()) => info!("Browser closed"),
        Err(e) => warn!("Error closing browser: {:#}", e),
    }
}
