use tracing::{debug, info, warn};

use crate::aggregator::PostAccumulator;
use crate::config::ScraperConfig;
use crate::extractor::extract_visible;
use crate::navigation::capture;
use crate::page::PageDriver;
use crate::types::Post;

/// Scroll the current view and harvest posts as they load.
///
/// Each iteration scrolls to the bottom, settles, measures the page height
/// and extracts. Stops once `max_items` distinct posts are held, after
/// `stable_height_limit` consecutive iterations without height change, or
/// after `max_scroll_iterations` iterations. A failing scroll or height
/// probe ends the loop with what was already collected.
pub async fn collect_with_scrolling<P: PageDriver>(
    page: &P,
    config: &ScraperConfig,
    max_items: usize,
) -> Vec<Post> {
    let mut collected = PostAccumulator::new(max_items);

    let mut last_height = match page.scroll_height().await {
        Ok(height) => height,
        Err(e) => {
            warn!("Could not measure page height: {:#}", e);
            return collected.into_posts();
        }
    };
    let mut stable = 0;

    for iteration in 1..=config.max_scroll_iterations {
        if collected.is_full() {
            break;
        }

        if let Err(e) = page.scroll_to_bottom().await {
            warn!("Scroll failed, keeping {} posts: {:#}", collected.len(), e);
            break;
        }
        tokio::time::sleep(config.scroll_settle()).await;

        let height = match page.scroll_height().await {
            Ok(height) => height,
            Err(e) => {
                warn!("Could not measure page height, keeping {} posts: {:#}", collected.len(), e);
                break;
            }
        };

        if height == last_height {
            stable += 1;
            if stable >= config.stable_height_limit {
                debug!("Page height unchanged for {} scrolls", stable);
                break;
            }
        } else {
            stable = 0;
        }
        last_height = height;

        collected.merge(extract_visible(page, config).await, None);
        info!("Found {} posts after scroll {}", collected.len(), iteration);

        if iteration % 5 == 0 {
            capture(page, config, &format!("scroll_{}", iteration)).await;
        }
    }

    collected.into_posts()
}
