//! Combining the posts each navigation strategy yields into one bounded,
//! duplicate-free list.

use std::collections::HashSet;
use std::num::NonZeroUsize;

use tracing::{info, warn};

use crate::config::ScraperConfig;
use crate::navigation::{NavigationTarget, Strategy, locate_posts_view};
use crate::page::PageDriver;
use crate::pagination::collect_with_scrolling;
use crate::types::Post;

/// Ordered, deduplicated, size-capped post list.
///
/// Two posts are duplicates when their text is identical.
#[derive(Debug, Clone)]
pub struct PostAccumulator {
    posts: Vec<Post>,
    seen: HashSet<String>,
    max: usize,
}

impl PostAccumulator {
    pub fn new(max: usize) -> Self {
        Self {
            posts: Vec::new(),
            seen: HashSet::new(),
            max,
        }
    }

    /// Append unseen posts that pass `filter`, up to the cap.
    /// Returns how many were added.
    pub fn merge(
        &mut self,
        posts: impl IntoIterator<Item = Post>,
        filter: Option<&AuthorshipFilter>,
    ) -> usize {
        let mut added = 0;
        for post in posts {
            if self.is_full() {
                break;
            }
            if filter.is_some_and(|f| !f.accepts(&post)) {
                continue;
            }
            if self.seen.insert(post.text.clone()) {
                self.posts.push(post);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.posts.len() >= self.max
    }

    /// Room left before the cap
    pub fn remaining(&self) -> usize {
        self.max.saturating_sub(self.posts.len())
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }
}

/// Heuristic authorship check for posts found through feed search.
///
/// Keeps a post only when the profile's display name appears in its text.
/// Misses posts that never mention the author's own name, and admits other
/// people's posts that mention it.
#[derive(Debug, Clone)]
pub struct AuthorshipFilter {
    name: String,
}

impl AuthorshipFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn accepts(&self, post: &Post) -> bool {
        post.text.contains(&self.name)
    }
}

/// Posts plus the strategies that were tried, in order
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub posts: Vec<Post>,
    pub attempted: Vec<Strategy>,
}

/// Run strategies in priority order and harvest every view they reach.
///
/// After a strategy reaches a view, the search resumes with the next one
/// until `max_posts` posts are held or the strategies run out. Feed-search
/// results go through the authorship filter. When no strategy reaches a
/// view, the currently loaded page is harvested instead.
pub async fn aggregate<P: PageDriver>(
    page: &P,
    config: &ScraperConfig,
    target: &NavigationTarget<'_>,
    max_posts: NonZeroUsize,
) -> AggregateOutcome {
    let mut accumulator = PostAccumulator::new(max_posts.get());
    let mut attempted = Vec::new();
    let filter = AuthorshipFilter::new(target.profile_name);
    let mut next = Some(Strategy::ActivityTab);
    let mut reached_any = false;

    while let Some(from) = next {
        if accumulator.is_full() {
            break;
        }
        let Some(strategy) =
            locate_posts_view(page, config, target, from, &mut attempted).await
        else {
            break;
        };
        reached_any = true;

        let harvested = collect_with_scrolling(page, config, accumulator.remaining()).await;
        let found = harvested.len();
        let view_filter = (strategy == Strategy::FeedSearch).then_some(&filter);
        let added = accumulator.merge(harvested, view_filter);
        info!(
            "Extracted {} posts from {} ({} new)",
            found, strategy, added
        );

        next = strategy.next();
    }

    if !reached_any {
        warn!("No posts view reached, extracting from the current page");
        let harvested = collect_with_scrolling(page, config, accumulator.remaining()).await;
        accumulator.merge(harvested, None);
    }

    AggregateOutcome {
        posts: accumulator.into_posts(),
        attempted,
    }
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod aggregator_test;
