use crate::output::DedupKey;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Forum-Scribe
///
/// Every section has defaults, so an empty TOML file is a valid configuration
/// targeting the FreeCAD help subforum.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub forum: ForumConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Where the crawl starts and how relative links are resolved
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    /// Origin that every href is resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// First listing page of the subforum
    #[serde(rename = "start-url")]
    pub start_url: String,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            base_url: "https://forum.freecad.org".to_string(),
            start_url: "https://forum.freecad.org/viewforum.php?f=3".to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Minimum time between two requests to the forum (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Maximum number of listing pages to visit
    #[serde(rename = "max-listing-pages")]
    pub max_listing_pages: u32,

    /// Maximum number of pages to visit per topic
    #[serde(rename = "max-topic-pages")]
    pub max_topic_pages: u32,

    /// Number of topics crawled concurrently
    #[serde(rename = "max-concurrent-topics")]
    pub max_concurrent_topics: u32,

    /// Extra attempts for a page after a transient failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Pause before each retry (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl CrawlerConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            delay_ms: 100,
            max_listing_pages: 1000,
            max_topic_pages: 1000,
            max_concurrent_topics: 1,
            max_retries: 0,
            retry_backoff_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ForumScribe".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// CSS selectors used to read listing and topic pages
///
/// Defaults match phpBB markup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Topic title anchors on a listing page
    #[serde(rename = "topic-title")]
    pub topic_title: String,

    /// The "next page" anchor on listing and topic pages
    #[serde(rename = "next-page")]
    pub next_page: String,

    /// Post containers on a topic page
    pub post: String,

    /// Author element, relative to a post container
    pub author: String,

    /// Date/metadata element, relative to a post container
    pub date: String,

    /// Body element, relative to a post container
    pub content: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            topic_title: "ul.topiclist.topics li dl dt a.topictitle".to_string(),
            next_page: "a[rel='next']".to_string(),
            post: "div.post".to_string(),
            author: ".username".to_string(),
            date: ".author".to_string(),
            content: ".content".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON document written by a crawl
    pub path: String,

    /// Keep the documents already in `path` and add this crawl's after them
    pub append: bool,

    /// Rewrite the document after this many finished topics (0 = only at the end)
    #[serde(rename = "checkpoint-every")]
    pub checkpoint_every: u32,

    /// Key used by the dedup command when none is given
    #[serde(rename = "dedup-key")]
    pub dedup_key: DedupKey,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "collected_forum_data/all_posts.json".to_string(),
            append: true,
            checkpoint_every: 25,
            dedup_key: DedupKey::Title,
        }
    }
}
