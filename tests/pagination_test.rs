mod common;

use common::fake_page::{FakeDocument, FakePage, FakeSite, instant_config, post_card};
use postscrape::navigation::navigate_tolerant;
use postscrape::pagination::collect_with_scrolling;
use pretty_assertions::assert_eq;

const LISTING_URL: &str = "https://www.linkedin.com/in/jane-doe/recent-activity/all/";

async fn open(document: FakeDocument) -> FakePage {
    let page = FakePage::new(FakeSite::new().page(LISTING_URL, document));
    navigate_tolerant(&page, LISTING_URL).await.unwrap();
    page
}

#[tokio::test]
async fn test_stable_height_stops_after_three_scrolls() {
    let page = open(
        FakeDocument::new()
            .heights(&[1200])
            .node(post_card("The only post on the page", "1d ago", "2")),
    )
    .await;

    let posts = collect_with_scrolling(&page, &instant_config(), 50).await;

    assert_eq!(page.total_scrolls(), 3);
    assert_eq!(posts.len(), 1);
}

#[tokio::test]
async fn test_lazy_posts_collected_until_height_settles() {
    let document = FakeDocument::new()
        .heights(&[1000, 2000, 3000])
        .node(post_card("First post already rendered", "1d ago", "1"))
        .loads_after(1, post_card("Second post after one scroll", "2d ago", "1"))
        .loads_after(2, post_card("Third post after two scrolls", "3d ago", "1"));
    let page = open(document).await;

    let posts = collect_with_scrolling(&page, &instant_config(), 50).await;

    let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "First post already rendered",
            "Second post after one scroll",
            "Third post after two scrolls"
        ]
    );
    // Two growing scrolls, then three at a stable height
    assert_eq!(page.total_scrolls(), 5);
}

#[tokio::test]
async fn test_iteration_ceiling_bounds_an_endless_feed() {
    let heights: Vec<i64> = (0..100).map(|i| 1000 + i * 500).collect();
    let page = open(FakeDocument::new().heights(&heights)).await;

    let posts = collect_with_scrolling(&page, &instant_config(), 50).await;

    assert!(posts.is_empty());
    assert_eq!(page.total_scrolls(), 20);
}

#[tokio::test]
async fn test_stops_once_enough_posts_are_held() {
    let heights: Vec<i64> = (0..100).map(|i| 1000 + i * 500).collect();
    let document = FakeDocument::new()
        .heights(&heights)
        .node(post_card("One", "1d ago", "1"))
        .node(post_card("Two", "2d ago", "1"))
        .node(post_card("Three", "3d ago", "1"));
    let page = open(document).await;

    let posts = collect_with_scrolling(&page, &instant_config(), 2).await;

    assert_eq!(posts.len(), 2);
    assert_eq!(page.total_scrolls(), 1);
}

#[tokio::test]
async fn test_screenshot_every_fifth_scroll() {
    let shots = tempfile::tempdir().unwrap();
    let mut config = instant_config();
    config.screenshot_dir = Some(shots.path().to_path_buf());
    config.max_scroll_iterations = 10;

    let heights: Vec<i64> = (0..100).map(|i| 1000 + i * 500).collect();
    let page = open(FakeDocument::new().heights(&heights)).await;

    collect_with_scrolling(&page, &config, 50).await;

    let labels: Vec<String> = page
        .screenshots()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(labels.len(), 2);
    assert!(labels[0].starts_with("scroll_5_"));
    assert!(labels[1].starts_with("scroll_10_"));
}
