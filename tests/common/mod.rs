// Common test utilities and fixtures

#![allow(dead_code)]

pub mod fake_page;

use fake_page::{FakeDocument, Node};

pub const HOME_URL: &str = "https://www.linkedin.com/";
pub const LOGIN_URL: &str = "https://www.linkedin.com/login";
pub const FEED_URL: &str = "https://www.linkedin.com/feed/";
pub const PROFILE_URL: &str = "https://www.linkedin.com/in/jane-doe/";
pub const ACTIVITY_URL: &str = "https://www.linkedin.com/in/jane-doe/recent-activity/all/";
pub const SEARCH_RESULTS_URL: &str =
    "https://www.linkedin.com/search/results/content/?keywords=Jane%20Doe";

/// Signed-in profile page with a name heading and no activity tab
pub fn profile_page(name: &str) -> FakeDocument {
    FakeDocument::new()
        .title(&format!("{} | LinkedIn", name))
        .node(Node::new("h1").class("text-heading-xlarge").text(name))
}

/// Signed-out landing page
pub fn guest_home() -> FakeDocument {
    FakeDocument::new()
        .title("LinkedIn: Log In or Sign Up")
        .node(Node::new("button").text("Sign in"))
        .node(Node::new("button").text("Join now"))
}

/// Feed with a search box that leads to the content search results
pub fn feed_with_search() -> FakeDocument {
    FakeDocument::new().title("Feed | LinkedIn").node(
        Node::new("input")
            .attr("placeholder", "Search")
            .navigates_to(SEARCH_RESULTS_URL),
    )
}
