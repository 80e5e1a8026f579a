use std::path::PathBuf;

use thiserror::Error;

/// Errors that cross a component boundary, each carrying a CLI exit code
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Caller supplied an unusable argument (exit code 2)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Manual login did not complete (exit code 3)
    #[error("Login did not complete: {0}")]
    LoginFailed(String),
    /// Browser could not be launched or attached (exit code 4)
    #[error("Failed to acquire browser session: {0}")]
    BrowserLaunch(String),
    /// Navigation exceeded its time budget (exit code 5)
    #[error("Navigation timed out: {0}")]
    NavigationTimeout(String),
    /// Export file could not be written (exit code 6)
    #[error("Failed to write export file {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Generic error (exit code 1)
    #[error("{0}")]
    Other(anyhow::Error),
}

impl ScrapeError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ScrapeError::InvalidInput(_) => 2,
            ScrapeError::LoginFailed(_) => 3,
            ScrapeError::BrowserLaunch(_) => 4,
            ScrapeError::NavigationTimeout(_) => 5,
            ScrapeError::Export { .. } => 6,
            ScrapeError::Other(_) => 1,
        }
    }

    /// Recover a typed error from an `anyhow` chain.
    ///
    /// Errors that were raised as `ScrapeError` keep their variant. Anything
    /// else is classified from its message, the way WebDriver failures only
    /// surface as text.
    pub fn classify(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ScrapeError>() {
            Ok(typed) => return typed,
            Err(err) => err,
        };

        let msg = err.to_string();
        if msg.contains("chromedriver") || msg.contains("WebDriver") {
            ScrapeError::BrowserLaunch(msg)
        } else if is_timeout_message(&msg) {
            ScrapeError::NavigationTimeout(msg)
        } else {
            ScrapeError::Other(err)
        }
    }
}

/// Whether an error chain represents a navigation timeout.
///
/// Matches both the typed variant and WebDriver's textual timeout reports.
pub fn is_timeout(err: &anyhow::Error) -> bool {
    if let Some(ScrapeError::NavigationTimeout(_)) = err.downcast_ref::<ScrapeError>() {
        return true;
    }
    err.chain().any(|cause| is_timeout_message(&cause.to_string()))
}

fn is_timeout_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("timeout") || lower.contains("timed out")
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
