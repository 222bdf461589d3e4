use crate::model::PageLink;
use serde::{Deserialize, Serialize};

/// Author recorded when a post has no author element
pub const FALLBACK_AUTHOR: &str = "Unknown";

/// Date recorded when a post has no date element
pub const FALLBACK_DATE: &str = "Unknown";

/// Content recorded when a post has no content element
pub const FALLBACK_CONTENT: &str = "No content";

/// A topic discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRef {
    /// Topic title as shown in the listing
    pub title: String,

    /// Link to the first page of the topic
    pub url: PageLink,
}

/// A single post within a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub author: String,
    pub date: String,
    pub content: String,
}

impl Default for Post {
    fn default() -> Self {
        Self {
            author: FALLBACK_AUTHOR.to_string(),
            date: FALLBACK_DATE.to_string(),
            content: FALLBACK_CONTENT.to_string(),
        }
    }
}

/// All posts collected for one topic, in page order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDocument {
    pub title: String,

    /// Absolute URL of the topic's first page. Absent in files written
    /// before the URL was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Posts in page order, then document order within a page
    #[serde(rename = "chat")]
    pub posts: Vec<Post>,
}

impl TopicDocument {
    /// Wraps the posts collected for `topic`
    pub fn new(topic: &TopicRef, posts: Vec<Post>) -> Self {
        Self {
            title: topic.title.clone(),
            url: Some(topic.url.as_str().to_string()),
            posts,
        }
    }
}

/// Ordered collection of topic documents produced by one crawl
///
/// Documents are appended once per finished topic and never modified
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrawlResult {
    documents: Vec<TopicDocument>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finished topic
    pub fn push(&mut self, document: TopicDocument) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total number of posts across all documents
    pub fn post_count(&self) -> usize {
        self.documents.iter().map(|d| d.posts.len()).sum()
    }

    pub fn documents(&self) -> &[TopicDocument] {
        &self.documents
    }
}

impl From<Vec<TopicDocument>> for CrawlResult {
    fn from(documents: Vec<TopicDocument>) -> Self {
        Self { documents }
    }
}
