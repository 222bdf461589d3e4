//! Data model for harvested forum content
//!
//! This module holds the records that flow through a crawl:
//! - `PageLink`: an absolute URL resolved from an href
//! - `TopicRef`: a topic title and the link to its first page
//! - `Post` / `TopicDocument`: the persisted records
//! - `CrawlResult`: the ordered collection produced by one crawl

mod document;
mod link;

pub use document::{CrawlResult, Post, TopicDocument, TopicRef};
pub use document::{FALLBACK_AUTHOR, FALLBACK_CONTENT, FALLBACK_DATE};
pub use link::PageLink;
