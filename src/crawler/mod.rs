//! Crawler module for forum traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `PageFetcher` seam
//! - Listing and topic page extraction
//! - The politeness gate shared by all requests
//! - The generic pagination state machine
//! - Overall crawl orchestration

mod extractor;
mod fetcher;
mod gate;
mod orchestrator;
mod paginator;

#[cfg(test)]
pub(crate) mod test_support;

pub use extractor::{
    compile_selector, ExtractedPage, ListingExtractor, PageExtractor, ThreadExtractor,
};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageBody, PageFetcher};
pub use gate::RequestGate;
pub use orchestrator::{CrawlOrchestrator, CrawlReport, TopicOutcome};
pub use paginator::{Pagination, PaginationPolicy, Paginator, StopReason};

use crate::config::Config;
use crate::output::ResultSink;
use crate::ScribeError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client from the user agent configuration
/// 2. Paginate the subforum listing to collect topics
/// 3. Paginate every topic to collect its posts
/// 4. Hand the growing result to `sink` after each topic
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `sink` - Receives the result after each finished topic
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed (possibly with truncated topics)
/// * `Err(ScribeError)` - The crawl could not start or its output failed
pub async fn crawl<S: ResultSink + ?Sized>(
    config: &Config,
    sink: &mut S,
) -> Result<CrawlReport, ScribeError> {
    CrawlOrchestrator::from_config(config)?.run(sink).await
}
