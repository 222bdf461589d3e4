//! Crawl orchestration
//!
//! The orchestrator runs two nested pagination passes:
//! 1. the subforum listing, producing the ordered topic list
//! 2. each topic, producing that topic's posts
//!
//! Failures are fail-soft at every level. A listing failure truncates the
//! topic list, a topic failure truncates that topic's posts, and the crawl
//! carries on either way. Only sink (output) errors abort a run.

use crate::config::Config;
use crate::crawler::extractor::{ListingExtractor, ThreadExtractor};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::gate::RequestGate;
use crate::crawler::paginator::{Pagination, PaginationPolicy, Paginator, StopReason};
use crate::model::{CrawlResult, PageLink, TopicDocument, TopicRef};
use crate::output::ResultSink;
use crate::ScribeError;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use url::Url;

/// Summary of a finished crawl, together with its result
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Topic documents in listing order
    pub result: CrawlResult,

    /// Listing pages fetched
    pub listing_pages: u32,

    /// Why listing pagination ended
    pub listing_stop: StopReason,

    /// Titles of topics whose pagination ended on a fetch failure
    pub truncated_topics: Vec<String>,

    /// Requests issued through the politeness gate (retries included)
    pub requests_issued: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn topic_count(&self) -> usize {
        self.result.len()
    }

    pub fn post_count(&self) -> usize {
        self.result.post_count()
    }
}

/// Outcome of crawling a single topic
#[derive(Debug, Clone)]
pub struct TopicOutcome {
    pub document: TopicDocument,
    pub pages_visited: u32,
    pub stop: StopReason,
}

/// Drives listing and topic pagination and assembles the crawl result
pub struct CrawlOrchestrator<F> {
    fetcher: F,
    gate: RequestGate,
    listing: ListingExtractor,
    thread: ThreadExtractor,
    start: PageLink,
    listing_policy: PaginationPolicy,
    topic_policy: PaginationPolicy,
    concurrency: usize,
}

impl CrawlOrchestrator<HttpFetcher> {
    /// Builds an orchestrator with a reqwest-backed fetcher
    pub fn from_config(config: &Config) -> Result<Self, ScribeError> {
        let fetcher =
            HttpFetcher::from_config(&config.user_agent, config.crawler.request_timeout())?;
        Self::new(fetcher, config)
    }
}

impl<F: PageFetcher> CrawlOrchestrator<F> {
    /// Creates an orchestrator using `fetcher` for every request
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOrchestrator)` - Ready to run
    /// * `Err(ScribeError)` - A URL or selector in the config is invalid
    pub fn new(fetcher: F, config: &Config) -> Result<Self, ScribeError> {
        let base = Url::parse(&config.forum.base_url)?;
        let start = PageLink::from_absolute(Url::parse(&config.forum.start_url)?);
        let crawler = &config.crawler;

        Ok(Self {
            fetcher,
            gate: RequestGate::new(crawler.delay()),
            listing: ListingExtractor::new(base.clone(), &config.selectors)?,
            thread: ThreadExtractor::new(base, &config.selectors)?,
            start,
            listing_policy: PaginationPolicy {
                max_pages: crawler.max_listing_pages,
                max_retries: crawler.max_retries,
                retry_backoff: crawler.retry_backoff(),
            },
            topic_policy: PaginationPolicy {
                max_pages: crawler.max_topic_pages,
                max_retries: crawler.max_retries,
                retry_backoff: crawler.retry_backoff(),
            },
            concurrency: crawler.max_concurrent_topics.max(1) as usize,
        })
    }

    fn paginator(&self) -> Paginator<'_, F> {
        Paginator::new(&self.fetcher, &self.gate)
    }

    /// Paginates the subforum listing and returns its topics in listing order
    pub async fn collect_topics(&self) -> Pagination<TopicRef> {
        tracing::info!("Scraping subforum listing from {}", self.start);

        let listing = self
            .paginator()
            .run(self.start.clone(), &self.listing, &self.listing_policy)
            .await;

        match &listing.stop {
            StopReason::Failed(e) => tracing::warn!(
                "Listing truncated after {} page(s), continuing with {} topics: {}",
                listing.pages_visited,
                listing.records.len(),
                e
            ),
            StopReason::PageCap => tracing::info!(
                "Listing page cap of {} reached",
                self.listing_policy.max_pages
            ),
            StopReason::Exhausted => {}
        }

        listing
    }

    /// Paginates one topic and wraps whatever posts were collected
    pub async fn crawl_topic(&self, topic: &TopicRef) -> TopicOutcome {
        let Pagination {
            records,
            pages_visited,
            stop,
        } = self
            .paginator()
            .run(topic.url.clone(), &self.thread, &self.topic_policy)
            .await;

        if let StopReason::Failed(e) = &stop {
            tracing::warn!(
                "Topic '{}' truncated after {} page(s): {}",
                topic.title,
                pages_visited,
                e
            );
        }

        tracing::info!(
            "Collected {} posts from '{}' ({} page(s))",
            records.len(),
            topic.title,
            pages_visited
        );

        TopicOutcome {
            document: TopicDocument::new(topic, records),
            pages_visited,
            stop,
        }
    }

    /// Runs the full crawl, reporting progress to `sink`
    ///
    /// Topics are crawled by up to `max-concurrent-topics` workers. Their
    /// documents are appended to the result in listing order regardless of
    /// completion order, and `sink` sees the result after every append.
    pub async fn run<S: ResultSink + ?Sized>(&self, sink: &mut S) -> Result<CrawlReport, ScribeError> {
        let started_at = Utc::now();

        let listing = self.collect_topics().await;
        let topics = listing.records;
        let total = topics.len();
        tracing::info!(
            "Found {} topics on {} listing page(s)",
            total,
            listing.pages_visited
        );

        let mut result = CrawlResult::new();
        let mut truncated_topics = Vec::new();

        let outcomes = stream::iter(topics.iter().enumerate())
            .map(|(index, topic)| {
                tracing::info!("Scraping topic {}/{}: {}", index + 1, total, topic.title);
                self.crawl_topic(topic)
            })
            .buffered(self.concurrency);
        futures::pin_mut!(outcomes);

        while let Some(outcome) = outcomes.next().await {
            if matches!(outcome.stop, StopReason::Failed(_)) {
                truncated_topics.push(outcome.document.title.clone());
            }
            result.push(outcome.document);
            sink.record(&result)?;
        }

        sink.close(&result)?;

        let report = CrawlReport {
            result,
            listing_pages: listing.pages_visited,
            listing_stop: listing.stop,
            truncated_topics,
            requests_issued: self.gate.issued(),
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "Crawl finished: {} topics, {} posts, {} truncated, {} requests in {}s",
            report.topic_count(),
            report.post_count(),
            report.truncated_topics.len(),
            report.requests_issued,
            (report.finished_at - report.started_at).num_seconds()
        );

        Ok(report)
    }
}
