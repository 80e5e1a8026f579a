//! CSV export of a scrape result.
//!
//! Layout: a header block (profile name, URL, scrape date), a blank line,
//! then one row per post. Every field is quoted; quotes are doubled and a
//! backslash is the escape character, so literal backslashes are doubled
//! too. Lines end with `\n`.

use chrono::Local;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::ScrapeError;
use crate::types::ScrapeResult;

const HEADER_BLOCK: [&str; 3] = ["Profile Name", "Profile URL", "Scrape Date"];
const POST_COLUMNS: [&str; 6] = ["Post Text", "Date", "Likes", "Comments", "Shares", "URL"];

/// Trailing expander labels that leak into extracted text
const TRUNCATION_MARKERS: [&str; 3] = ["...more", "see more", "See more"];

/// Remove one trailing "...more" / "see more" / "See more", nothing else
pub fn strip_truncation_marker(text: &str) -> &str {
    TRUNCATION_MARKERS
        .iter()
        .find_map(|marker| text.strip_suffix(marker))
        .unwrap_or(text)
}

/// `posts_<name>_<YYYYmmdd_HHMMSS>.csv`, whitespace and path separators in
/// the name replaced by `_`
pub fn default_export_path(profile_name: &str) -> PathBuf {
    let safe_name: String = profile_name
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect();
    PathBuf::from(format!(
        "posts_{}_{}.csv",
        safe_name,
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .escape(b'\\')
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(out)
}

fn escape_backslashes(field: &str) -> String {
    field.replace('\\', "\\\\")
}

/// Serialize `result` in the export layout
pub fn write_csv_to<W: Write>(result: &ScrapeResult, mut out: W) -> io::Result<()> {
    {
        let mut header = csv_writer(&mut out);
        header.write_record(HEADER_BLOCK)?;
        header.write_record([
            escape_backslashes(result.profile_name()),
            escape_backslashes(result.profile_url()),
            escape_backslashes(result.scrape_timestamp()),
        ])?;
        header.flush()?;
    }

    out.write_all(b"\n")?;

    let mut rows = csv_writer(&mut out);
    rows.write_record(POST_COLUMNS)?;
    for post in result.posts() {
        rows.write_record([
            escape_backslashes(strip_truncation_marker(&post.text)),
            escape_backslashes(&post.date),
            post.likes.to_string(),
            post.comments.to_string(),
            post.shares.to_string(),
            escape_backslashes(post.url.as_deref().unwrap_or_default()),
        ])?;
    }
    rows.flush()?;
    Ok(())
}

/// Write `result` to `path`, or to [`default_export_path`] in the current
/// directory. Returns the path written.
pub fn write_csv(result: &ScrapeResult, path: Option<&Path>) -> Result<PathBuf, ScrapeError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_export_path(result.profile_name()),
    };
    info!("Saving data to CSV file: {}", path.display());

    let mut buffer = Vec::new();
    write_csv_to(result, &mut buffer).map_err(|source| ScrapeError::Export {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, buffer).map_err(|source| ScrapeError::Export {
        path: path.clone(),
        source,
    })?;

    info!("Successfully saved {} posts to CSV", result.posts().len());
    Ok(path)
}

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;
