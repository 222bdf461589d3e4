//! Page extractors for listing and topic pages
//!
//! An extractor turns one fetched page into an ordered list of records plus
//! an optional link to the following page:
//! - `ListingExtractor`: topic title anchors → `TopicRef`
//! - `ThreadExtractor`: post containers → `Post`
//!
//! Extraction never fails. Markup that does not match the selectors yields
//! empty record lists and no next link.

use crate::config::SelectorConfig;
use crate::crawler::PageBody;
use crate::model::{PageLink, Post, TopicRef, FALLBACK_AUTHOR, FALLBACK_CONTENT, FALLBACK_DATE};
use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Records extracted from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage<T> {
    /// Records in document order
    pub records: Vec<T>,

    /// Resolved "next page" link, if the page has one
    pub next: Option<PageLink>,
}

/// Extracts typed records from a fetched page
pub trait PageExtractor {
    type Record;

    fn extract(&self, body: &PageBody) -> ExtractedPage<Self::Record>;
}

/// Compiles a CSS selector, mapping failures to `ConfigError::InvalidSelector`
pub fn compile_selector(selector: &str) -> ConfigResult<Selector> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Locates the "next page" anchor by its relation marker and resolves it
#[derive(Debug, Clone)]
struct NextLinkFinder {
    base: Url,
    selector: Selector,
}

impl NextLinkFinder {
    fn find(&self, document: &Html) -> Option<PageLink> {
        let anchor = document.select(&self.selector).next()?;
        let href = anchor.value().attr("href")?;
        PageLink::resolve(&self.base, href)
    }
}

/// Collapses whitespace runs in an element's text and trims the ends
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first element matching `selector` under `scope`, or `fallback`
fn field_text(scope: ElementRef<'_>, selector: &Selector, fallback: &str) -> String {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_else(|| fallback.to_string())
}

/// Reads topic titles and links from a subforum listing page
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    topic_title: Selector,
    next: NextLinkFinder,
}

impl ListingExtractor {
    /// Creates an extractor resolving hrefs against `base`
    pub fn new(base: Url, selectors: &SelectorConfig) -> ConfigResult<Self> {
        Ok(Self {
            topic_title: compile_selector(&selectors.topic_title)?,
            next: NextLinkFinder {
                base,
                selector: compile_selector(&selectors.next_page)?,
            },
        })
    }
}

impl PageExtractor for ListingExtractor {
    type Record = TopicRef;

    fn extract(&self, body: &PageBody) -> ExtractedPage<TopicRef> {
        let document = Html::parse_document(&body.html);

        let records: Vec<TopicRef> = document
            .select(&self.topic_title)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?;
                let url = PageLink::resolve(&self.next.base, href)?;
                Some(TopicRef {
                    title: element_text(anchor),
                    url,
                })
            })
            .collect();

        let next = self.next.find(&document);

        tracing::debug!(
            "Listing page {}: {} topics, next: {}",
            body.url,
            records.len(),
            next.as_ref().map(PageLink::as_str).unwrap_or("none")
        );

        ExtractedPage { records, next }
    }
}

/// Reads posts from a topic page
#[derive(Debug, Clone)]
pub struct ThreadExtractor {
    post: Selector,
    author: Selector,
    date: Selector,
    content: Selector,
    next: NextLinkFinder,
}

impl ThreadExtractor {
    /// Creates an extractor resolving hrefs against `base`
    pub fn new(base: Url, selectors: &SelectorConfig) -> ConfigResult<Self> {
        Ok(Self {
            post: compile_selector(&selectors.post)?,
            author: compile_selector(&selectors.author)?,
            date: compile_selector(&selectors.date)?,
            content: compile_selector(&selectors.content)?,
            next: NextLinkFinder {
                base,
                selector: compile_selector(&selectors.next_page)?,
            },
        })
    }

    // Each field is looked up on its own so a missing author never hides the content.
    fn extract_post(&self, container: ElementRef<'_>) -> Post {
        Post {
            author: field_text(container, &self.author, FALLBACK_AUTHOR),
            date: field_text(container, &self.date, FALLBACK_DATE),
            content: field_text(container, &self.content, FALLBACK_CONTENT),
        }
    }
}

impl PageExtractor for ThreadExtractor {
    type Record = Post;

    fn extract(&self, body: &PageBody) -> ExtractedPage<Post> {
        let document = Html::parse_document(&body.html);

        let records: Vec<Post> = document
            .select(&self.post)
            .map(|container| self.extract_post(container))
            .collect();

        let next = self.next.find(&document);

        tracing::debug!(
            "Topic page {}: {} posts, next: {}",
            body.url,
            records.len(),
            next.as_ref().map(PageLink::as_str).unwrap_or("none")
        );

        ExtractedPage { records, next }
    }
}
