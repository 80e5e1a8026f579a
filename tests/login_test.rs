mod common;

use std::num::NonZeroUsize;

use common::fake_page::{FakeDocument, FakePage, FakeSite, Node, instant_config};
use common::{FEED_URL, HOME_URL, LOGIN_URL, PROFILE_URL, guest_home, profile_page};
use postscrape::login::{is_login_required, login};
use postscrape::navigation::navigate_tolerant;
use postscrape::scraper::ProfileScraper;
use pretty_assertions::assert_eq;

const PAGE_URL: &str = "https://www.linkedin.com/in/someone/";

async fn login_required_on(document: FakeDocument, url: &str) -> bool {
    let page = FakePage::new(FakeSite::new().page(url, document));
    navigate_tolerant(&page, url).await.unwrap();
    is_login_required(&page, &instant_config()).await
}

#[tokio::test]
async fn test_sign_in_text_means_login_required() {
    let document = profile_page("Someone").node(Node::new("span").text("  Sign in "));
    assert!(login_required_on(document, PAGE_URL).await);
}

#[tokio::test]
async fn test_signed_in_profile_needs_no_login() {
    assert!(!login_required_on(profile_page("Someone"), PAGE_URL).await);
}

#[tokio::test]
async fn test_login_form_means_login_required() {
    let document = FakeDocument::new().node(Node::new("form").attr("action", "/uas/login-submit"));
    assert!(login_required_on(document, PAGE_URL).await);
}

#[tokio::test]
async fn test_guest_view_means_login_required() {
    let document = FakeDocument::new().node(Node::new("div").class("guest-view"));
    assert!(login_required_on(document, PAGE_URL).await);
}

#[tokio::test]
async fn test_login_url_means_login_required() {
    assert!(login_required_on(FakeDocument::new(), LOGIN_URL).await);
    assert!(
        login_required_on(
            FakeDocument::new(),
            "https://www.linkedin.com/signup/cold-join?trk=guest"
        )
        .await
    );
}

#[tokio::test]
async fn test_handle_containing_login_is_not_a_login_page() {
    let url = "https://www.linkedin.com/in/loginova-maria/";
    assert!(!login_required_on(profile_page("Maria Loginova"), url).await);
}

#[tokio::test]
async fn test_already_logged_in() {
    let site = FakeSite::new().page(HOME_URL, FakeDocument::new().title("Feed | LinkedIn"));
    let page = FakePage::new(site);

    assert!(login(&page, &instant_config()).await);
    assert_eq!(page.visits(), vec![HOME_URL]);
}

#[tokio::test]
async fn test_manual_login_reaches_feed() {
    // The browser profile holds a session, so the login page bounces to the feed
    let site = FakeSite::new()
        .page(HOME_URL, guest_home())
        .page(FEED_URL, FakeDocument::new())
        .redirect(LOGIN_URL, FEED_URL);
    let page = FakePage::new(site);

    assert!(login(&page, &instant_config()).await);
    assert_eq!(page.visits(), vec![HOME_URL, LOGIN_URL]);
}

#[tokio::test]
async fn test_manual_login_times_out() {
    let site = FakeSite::new()
        .page(HOME_URL, guest_home())
        .page(LOGIN_URL, guest_home());
    let page = FakePage::new(site);

    assert!(!login(&page, &instant_config()).await);
}

#[tokio::test]
async fn test_off_login_page_after_timeout_counts_as_logged_in() {
    let mid_login = "https://www.linkedin.com/checkpoint/challenge";
    let site = FakeSite::new()
        .page(HOME_URL, guest_home())
        .page(mid_login, FakeDocument::new())
        .redirect(LOGIN_URL, mid_login);
    let page = FakePage::new(site);

    assert!(login(&page, &instant_config()).await);
}

#[tokio::test]
async fn test_failed_login_yields_sentinel_result() {
    let site = FakeSite::new()
        .page(PROFILE_URL, guest_home())
        .page(HOME_URL, guest_home())
        .page(LOGIN_URL, guest_home());
    let page = FakePage::new(site);
    let scraper = ProfileScraper::new(page, instant_config());

    let result = scraper
        .scrape(PROFILE_URL, NonZeroUsize::new(10).unwrap())
        .await;

    assert!(result.is_login_failure());
    assert_eq!(result.profile_url(), PROFILE_URL);
    assert_eq!(result.posts().len(), 1);
    assert_eq!(result.posts()[0].text, "Login failed. Please try again.");
}
