//! Harvesting posts from the currently rendered page.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::page::{ElementHandle, PageDriver};
use crate::selectors::{Probe, SelectorTable};
use crate::types::{Post, UNKNOWN_DATE, UNKNOWN_PROFILE};

lazy_static! {
    static ref COUNT_PATTERN: Regex =
        Regex::new(r"(\d+)(?:[,.](\d+))?\s*([KkMm])?").expect("valid regex");
}

/// Shortest fallback text accepted as a post body
const MIN_FALLBACK_CHARS: usize = 5;

/// Words that mark a relative date ("3 days ago", "2w", "1 month")
const DATE_MARKERS: [&str; 4] = ["ago", "day", "week", "month"];

/// Parse an engagement count such as `"1K"`, `"2.3K"`, `"1,204"` or `"15"`.
///
/// Takes the first numeral with an optional one-group fraction and an
/// optional K/M suffix, and rounds down. `,` is read as a decimal mark like
/// `.`, so `"1,204"` is 1. Anything unparseable is 0.
pub fn parse_count(text: &str) -> u64 {
    let Some(caps) = COUNT_PATTERN.captures(text) else {
        return 0;
    };

    let multiplier: u64 = match caps.get(3).map(|m| m.as_str()) {
        Some("K" | "k") => 1_000,
        Some("M" | "m") => 1_000_000,
        _ => 1,
    };

    let Ok(whole) = caps[1].parse::<u64>() else {
        return 0;
    };
    let Some(whole) = whole.checked_mul(multiplier) else {
        return 0;
    };

    // Only the first six fractional digits can matter for a ×1 000 000 suffix
    let fraction = match caps.get(2) {
        Some(digits) => {
            let digits: String = digits.as_str().chars().take(6).collect();
            let Ok(numerator) = digits.parse::<u64>() else {
                return 0;
            };
            let denominator = 10u64.pow(digits.len() as u32);
            numerator * multiplier / denominator
        }
        None => 0,
    };

    whole.checked_add(fraction).unwrap_or(0)
}

/// Whether a text fragment is boilerplate rather than post content
fn is_boilerplate(text: &str) -> bool {
    text.starts_with("Translate") || text.contains("...more") || text.contains("…more")
}

/// Body text of a post container, longest candidate wins.
///
/// Paragraph reconstruction is preferred: each paragraph container's
/// paragraph-like children, joined with a blank line. When that yields
/// nothing, the longest single text element is used. Longest-wins favours
/// the full post over its preview, and can pick up an over-wide wrapper
/// (e.g. one that also holds a reshared post) where markup is unusual.
pub async fn extract_body_text<E: ElementHandle>(container: &E, table: &SelectorTable) -> String {
    let mut best = String::new();

    for probe in &table.paragraph_containers {
        let Ok(blocks) = probe.find_in(container).await else {
            continue;
        };
        let Some(block) = blocks.first() else {
            continue;
        };

        let mut paragraphs = Vec::new();
        for paragraph_probe in &table.paragraphs {
            let Ok(found) = paragraph_probe.find_in(block).await else {
                continue;
            };
            for paragraph in found {
                match paragraph.text().await {
                    Ok(text) => {
                        let text = text.trim();
                        if !text.is_empty() && !is_boilerplate(text) {
                            paragraphs.push(text.to_string());
                        }
                    }
                    Err(e) => debug!("Error reading paragraph: {:#}", e),
                }
            }
        }

        let combined = paragraphs.join("\n\n");
        if combined.chars().count() > best.chars().count() {
            best = combined;
        }
    }

    if !best.is_empty() {
        return best;
    }

    for probe in &table.text_fallbacks {
        let Ok(found) = probe.find_in(container).await else {
            continue;
        };
        for element in found {
            let Ok(text) = element.text().await else {
                continue;
            };
            let text = text.trim();
            if text.chars().count() >= MIN_FALLBACK_CHARS
                && !is_boilerplate(text)
                && text.chars().count() > best.chars().count()
            {
                best = text.to_string();
            }
        }
    }

    best
}

/// First element a probe finds inside `scope`, errors treated as no match
async fn first_match<E: ElementHandle>(scope: &E, probe: &Probe) -> Option<E> {
    match probe.find_in(scope).await {
        Ok(found) => found.into_iter().next(),
        Err(e) => {
            debug!("Probe {} failed: {:#}", probe, e);
            None
        }
    }
}

async fn extract_date<E: ElementHandle>(container: &E, table: &SelectorTable) -> String {
    for probe in &table.dates {
        let Some(element) = first_match(container, probe).await else {
            continue;
        };
        let Ok(text) = element.text().await else {
            continue;
        };
        let text = text.trim();
        if !text.is_empty() && DATE_MARKERS.iter().any(|m| text.contains(m)) {
            return text.to_string();
        }
    }
    UNKNOWN_DATE.to_string()
}

async fn extract_likes<E: ElementHandle>(container: &E, table: &SelectorTable) -> u64 {
    for probe in &table.reactions {
        let Some(element) = first_match(container, probe).await else {
            continue;
        };
        if let Ok(text) = element.text().await {
            return parse_count(text.trim());
        }
    }
    0
}

async fn extract_permalink<E: ElementHandle>(container: &E, table: &SelectorTable) -> Option<String> {
    for probe in &table.permalinks {
        let Some(element) = first_match(container, probe).await else {
            continue;
        };
        if let Ok(Some(href)) = element.attr("href").await
            && !href.trim().is_empty()
        {
            return Some(href.trim().to_string());
        }
    }
    None
}

/// Click every "see more" style affordance inside a container
async fn expand_truncated<E: ElementHandle>(container: &E, config: &ScraperConfig) {
    for probe in &config.selectors.see_more {
        let Ok(buttons) = probe.find_in(container).await else {
            continue;
        };
        for button in buttons {
            match button.click().await {
                Ok(()) => {
                    tokio::time::sleep(config.expand_settle()).await;
                    debug!("Expanded 'see more' content in post");
                }
                Err(e) => debug!("Could not click see more button: {:#}", e),
            }
        }
    }
}

/// Turn one container into a post; `None` when it holds no usable text
pub async fn extract_post<E: ElementHandle>(container: &E, config: &ScraperConfig) -> Option<Post> {
    let table = &config.selectors;

    expand_truncated(container, config).await;

    let text = extract_body_text(container, table).await;
    if text.is_empty() {
        return None;
    }

    let date = extract_date(container, table).await;
    let likes = extract_likes(container, table).await;
    let url = extract_permalink(container, table).await;

    Some(Post::new(text, date).with_likes(likes).with_url(url))
}

/// Posts in the currently rendered DOM, across every container family.
///
/// The same post may appear once per family that matches it; callers dedup.
pub async fn extract_visible<P: PageDriver>(page: &P, config: &ScraperConfig) -> Vec<Post> {
    let mut posts = Vec::new();

    for probe in &config.selectors.post_containers {
        let containers = match probe.find_in_page(page).await {
            Ok(containers) => containers,
            Err(e) => {
                warn!("Error with selector '{}': {:#}", probe, e);
                continue;
            }
        };
        debug!("Found {} elements with selector '{}'", containers.len(), probe);

        for container in &containers {
            if let Some(post) = extract_post(container, config).await {
                posts.push(post);
            }
        }
    }

    posts
}

/// Display name of the profile on the current page.
///
/// Name selectors first, then the document title before the site suffix,
/// then the placeholder.
pub async fn extract_profile_name<P: PageDriver>(page: &P, config: &ScraperConfig) -> String {
    for probe in &config.selectors.profile_name {
        let found = match probe.find_in_page(page).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Error with selector {}: {:#}", probe, e);
                continue;
            }
        };
        let Some(element) = found.first() else {
            continue;
        };
        if let Ok(name) = element.text().await {
            let name = name.trim();
            if !name.is_empty() {
                info!("Profile name: {}", name);
                return name.to_string();
            }
        }
    }

    let suffix = &config.site.title_suffix;
    if let Ok(title) = page.title().await
        && !suffix.is_empty()
        && let Some((name, _)) = title.split_once(suffix.as_str())
        && !name.trim().is_empty()
    {
        return name.trim().to_string();
    }

    UNKNOWN_PROFILE.to_string()
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod extractor_test;
