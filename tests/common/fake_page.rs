//! A simulated browser page for driving the scraping core without Chrome.
//!
//! Documents are small trees of [`Node`]s keyed by URL. CSS support covers
//! what the default selector table uses: comma groups, descendant
//! combinators, tag, class and `[attr]`, `[attr="v"]`, `[attr*="v"]` tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use postscrape::config::ScraperConfig;
use postscrape::errors::ScrapeError;
use postscrape::page::{ElementHandle, Locator, PageDriver};

/// One element of a simulated document
#[derive(Debug, Clone, Default)]
pub struct Node {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Arc<Node>>,
    navigates_to: Option<String>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            ..Default::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    /// Clicking or submitting this element loads `url`
    pub fn navigates_to(mut self, url: &str) -> Self {
        self.navigates_to = Some(url.to_string());
        self
    }

    fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Own text followed by descendant text, one line each
    fn rendered_text(&self) -> String {
        let mut lines = Vec::new();
        if !self.text.trim().is_empty() {
            lines.push(self.text.clone());
        }
        for child in &self.children {
            let text = child.rendered_text();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines.join("\n")
    }
}

/// A typical feed post: body paragraph, relative date, reaction count
pub fn post_card(text: &str, date: &str, likes: &str) -> Node {
    Node::new("div")
        .class("feed-shared-update-v2")
        .child(
            Node::new("span")
                .class("update-components-actor__sub-description")
                .text(date),
        )
        .child(
            Node::new("div")
                .class("update-components-text")
                .child(Node::new("p").text(text)),
        )
        .child(
            Node::new("span")
                .class("social-details-social-counts__reactions-count")
                .text(likes),
        )
}

/// A rendered page: title, initial nodes, a height per scroll, and nodes
/// that only load after some number of scrolls
#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    title: String,
    roots: Vec<Arc<Node>>,
    heights: Vec<i64>,
    lazy: Vec<(usize, Arc<Node>)>,
}

impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn node(mut self, node: Node) -> Self {
        self.roots.push(Arc::new(node));
        self
    }

    /// Page height before the first scroll, after the first, and so on;
    /// the last value repeats
    pub fn heights(mut self, heights: &[i64]) -> Self {
        self.heights = heights.to_vec();
        self
    }

    /// `node` appears once the page has been scrolled `scrolls` times
    pub fn loads_after(mut self, scrolls: usize, node: Node) -> Self {
        self.lazy.push((scrolls, Arc::new(node)));
        self
    }

    fn visible_roots(&self, scrolls: usize) -> Vec<Arc<Node>> {
        let mut roots = self.roots.clone();
        roots.extend(
            self.lazy
                .iter()
                .filter(|(after, _)| *after <= scrolls)
                .map(|(_, node)| node.clone()),
        );
        roots
    }

    fn height(&self, scrolls: usize) -> i64 {
        match self.heights.last() {
            Some(last) => *self.heights.get(scrolls).unwrap_or(last),
            None => 1000,
        }
    }
}

/// Documents by URL, plus server-side redirects
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    documents: HashMap<String, FakeDocument>,
    redirects: HashMap<String, String>,
    slow: Vec<String>,
    broken: Vec<String>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, document: FakeDocument) -> Self {
        self.documents.insert(url.to_string(), document);
        self
    }

    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Navigating to `url` loads it but reports a navigation timeout
    pub fn slow(mut self, url: &str) -> Self {
        self.slow.push(url.to_string());
        self
    }

    /// Navigating to `url` fails outright and leaves the page where it was
    pub fn broken(mut self, url: &str) -> Self {
        self.broken.push(url.to_string());
        self
    }
}

#[derive(Debug, Default)]
struct PageState {
    site: FakeSite,
    current_url: String,
    scrolls: usize,
    visits: Vec<String>,
    clicks: Vec<String>,
    fills: Vec<String>,
    screenshots: Vec<PathBuf>,
    total_scrolls: usize,
}

impl PageState {
    fn navigate(&mut self, url: &str) {
        self.visits.push(url.to_string());
        self.current_url = self
            .site
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        self.scrolls = 0;
    }

    fn document(&self) -> FakeDocument {
        self.site
            .documents
            .get(&self.current_url)
            .cloned()
            .unwrap_or_default()
    }
}

/// The simulated page; clones share state
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn new(site: FakeSite) -> Self {
        Self {
            state: Arc::new(Mutex::new(PageState {
                site,
                current_url: "about:blank".to_string(),
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every URL passed to `goto` or followed by a click, in order
    pub fn visits(&self) -> Vec<String> {
        self.state().visits.clone()
    }

    /// Rendered text of every clicked element, in order
    pub fn clicks(&self) -> Vec<String> {
        self.state().clicks.clone()
    }

    /// Values typed into inputs, in order
    pub fn fills(&self) -> Vec<String> {
        self.state().fills.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.state().screenshots.clone()
    }

    /// Scrolls performed over the page's lifetime
    pub fn total_scrolls(&self) -> usize {
        self.state().total_scrolls
    }
}

/// Zero-delay configuration for tests
pub fn instant_config() -> ScraperConfig {
    ScraperConfig {
        page_settle_ms: 0,
        home_settle_ms: 0,
        scroll_settle_ms: 0,
        expand_settle_ms: 0,
        login_timeout_secs: 0,
        login_grace_secs: 0,
        login_poll_ms: 0,
        ..Default::default()
    }
}

#[async_trait]
impl PageDriver for FakePage {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state();
        if state.site.broken.iter().any(|u| u == url) {
            state.visits.push(url.to_string());
            return Err(anyhow!("unknown error: net::ERR_CONNECTION_RESET at {}", url));
        }
        state.navigate(url);
        if state.site.slow.iter().any(|u| u == url) {
            return Err(ScrapeError::NavigationTimeout(url.to_string()).into());
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state().current_url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.state().document().title)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>> {
        let roots = {
            let state = self.state();
            state.document().visible_roots(state.scrolls)
        };
        let matcher = Matcher::parse(locator)?;
        let mut found = Vec::new();
        let mut ancestors = Vec::new();
        for root in &roots {
            collect(root, &mut ancestors, &matcher, &self.state, &mut found);
        }
        Ok(found)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        let mut state = self.state();
        state.scrolls += 1;
        state.total_scrolls += 1;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<i64> {
        let state = self.state();
        Ok(state.document().height(state.scrolls))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.state().screenshots.push(path.to_path_buf());
        Ok(())
    }
}

/// An element of a [`FakePage`], remembering its ancestors
#[derive(Debug, Clone)]
pub struct FakeElement {
    node: Arc<Node>,
    ancestors: Vec<Arc<Node>>,
    state: Arc<Mutex<PageState>>,
}

impl FakeElement {
    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self>> {
        let matcher = Matcher::parse(locator)?;
        let mut found = Vec::new();
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.node.clone());
        for child in &self.node.children {
            collect(child, &mut ancestors, &matcher, &self.state, &mut found);
        }
        Ok(found)
    }

    async fn text(&self) -> Result<String> {
        Ok(self.node.rendered_text())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>> {
        Ok(self.node.attr_value(name).map(str::to_string))
    }

    async fn click(&self) -> Result<()> {
        let mut state = self.state();
        state.clicks.push(self.node.rendered_text());
        if let Some(url) = &self.node.navigates_to {
            state.navigate(url);
        }
        Ok(())
    }

    async fn fill(&self, value: &str) -> Result<()> {
        if self.node.tag != "input" {
            return Err(anyhow!("element <{}> is not fillable", self.node.tag));
        }
        self.state().fills.push(value.to_string());
        Ok(())
    }

    async fn submit(&self) -> Result<()> {
        if let Some(url) = &self.node.navigates_to {
            self.state().navigate(url);
        }
        Ok(())
    }
}

fn collect(
    node: &Arc<Node>,
    ancestors: &mut Vec<Arc<Node>>,
    matcher: &Matcher,
    state: &Arc<Mutex<PageState>>,
    found: &mut Vec<FakeElement>,
) {
    if matcher.matches(node, ancestors) {
        found.push(FakeElement {
            node: node.clone(),
            ancestors: ancestors.clone(),
            state: state.clone(),
        });
    }
    ancestors.push(node.clone());
    for child in &node.children {
        collect(child, ancestors, matcher, state, found);
    }
    ancestors.pop();
}

#[derive(Debug, Clone)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
    Contains(String, String),
}

#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn parse(source: &str) -> Result<Self> {
        let mut compound = Compound::default();
        let tag_end = source.find(['.', '[']).unwrap_or(source.len());
        if tag_end > 0 && &source[..tag_end] != "*" {
            compound.tag = Some(source[..tag_end].to_lowercase());
        }

        let mut rest = &source[tag_end..];
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('.') {
                let end = after.find(['.', '[']).unwrap_or(after.len());
                compound.classes.push(after[..end].to_string());
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('[') {
                let end = after
                    .find(']')
                    .ok_or_else(|| anyhow!("unclosed attribute selector in {}", source))?;
                compound.attrs.push(parse_attr(&after[..end]));
                rest = &after[end + 1..];
            } else {
                return Err(anyhow!("unsupported selector {}", source));
            }
        }
        Ok(compound)
    }

    fn matches(&self, node: &Node) -> bool {
        if self.tag.as_ref().is_some_and(|tag| *tag != node.tag) {
            return false;
        }
        if !self.classes.iter().all(|c| node.classes.contains(c)) {
            return false;
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Exists(name) => node.attr_value(name).is_some(),
            AttrTest::Equals(name, value) => node.attr_value(name) == Some(value.as_str()),
            AttrTest::Contains(name, value) => node
                .attr_value(name)
                .is_some_and(|v| v.contains(value.as_str())),
        })
    }
}

fn parse_attr(inner: &str) -> AttrTest {
    let unquote = |v: &str| v.trim().trim_matches(['"', '\'']).to_string();
    if let Some((name, value)) = inner.split_once("*=") {
        AttrTest::Contains(name.trim().to_string(), unquote(value))
    } else if let Some((name, value)) = inner.split_once('=') {
        AttrTest::Equals(name.trim().to_string(), unquote(value))
    } else {
        AttrTest::Exists(inner.trim().to_string())
    }
}

enum Matcher {
    /// Alternatives, each a descendant chain
    Css(Vec<Vec<Compound>>),
    /// Own text, whitespace-normalized
    Text(String),
}

impl Matcher {
    fn parse(locator: &Locator) -> Result<Self> {
        match locator {
            Locator::Css(selector) => {
                let mut alternatives = Vec::new();
                for group in selector.split(',') {
                    let chain = group
                        .split_whitespace()
                        .map(Compound::parse)
                        .collect::<Result<Vec<_>>>()?;
                    if chain.is_empty() {
                        return Err(anyhow!("empty selector in {}", selector));
                    }
                    alternatives.push(chain);
                }
                Ok(Matcher::Css(alternatives))
            }
            Locator::Text(text) => Ok(Matcher::Text(normalize(text))),
        }
    }

    fn matches(&self, node: &Node, ancestors: &[Arc<Node>]) -> bool {
        match self {
            Matcher::Text(text) => normalize(&node.text) == *text,
            Matcher::Css(alternatives) => alternatives
                .iter()
                .any(|chain| chain_matches(chain, node, ancestors)),
        }
    }
}

fn chain_matches(chain: &[Compound], node: &Node, ancestors: &[Arc<Node>]) -> bool {
    let Some((last, outer)) = chain.split_last() else {
        return false;
    };
    if !last.matches(node) {
        return false;
    }

    // Match the remaining compounds against ancestors, nearest first
    let mut remaining = outer.iter().rev().peekable();
    for ancestor in ancestors.iter().rev() {
        match remaining.peek() {
            Some(compound) if compound.matches(ancestor) => {
                remaining.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    remaining.peek().is_none()
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
