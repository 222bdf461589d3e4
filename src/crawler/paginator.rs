//! Generic pagination driver
//!
//! The paginator walks a chain of "next page" links, extracting records from
//! each page, until one of its terminal states is reached:
//!
//! | State | Stop reason |
//! |-------|-------------|
//! | page has no next link | `Exhausted` |
//! | `max_pages` pages visited | `PageCap` |
//! | fetch failed (after retries) | `Failed` |
//!
//! Records collected before a failure are always kept.

use crate::crawler::extractor::PageExtractor;
use crate::crawler::fetcher::{FetchError, PageBody, PageFetcher};
use crate::crawler::gate::RequestGate;
use crate::model::PageLink;
use std::time::Duration;

/// Limits applied to one pagination run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationPolicy {
    /// Maximum number of pages to fetch; must be at least 1
    pub max_pages: u32,

    /// Extra attempts after a transient fetch failure
    pub max_retries: u32,

    /// Pause before each retry, on top of the gate's delay
    pub retry_backoff: Duration,
}

impl PaginationPolicy {
    /// Single-attempt policy with the given page cap
    pub fn with_max_pages(max_pages: u32) -> Self {
        Self {
            max_pages,
            max_retries: 0,
            retry_backoff: Duration::ZERO,
        }
    }
}

/// Why a pagination run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The last visited page had no next link
    Exhausted,

    /// The page cap was reached while a next link remained
    PageCap,

    /// A page could not be fetched; the run was truncated there
    Failed(FetchError),
}

/// Result of one pagination run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination<T> {
    /// Records of every visited page, concatenated in visit order
    pub records: Vec<T>,

    /// Number of pages successfully fetched
    pub pages_visited: u32,

    pub stop: StopReason,
}

impl<T> Pagination<T> {
    /// Whether the run ended early because of a fetch failure
    pub fn is_truncated(&self) -> bool {
        matches!(self.stop, StopReason::Failed(_))
    }
}

/// Mutable state of a run: where to go next and what has been gathered
struct PaginationState<T> {
    current: Option<PageLink>,
    pages_visited: u32,
    accumulated: Vec<T>,
}

impl<T> PaginationState<T> {
    fn new(start: PageLink) -> Self {
        Self {
            current: Some(start),
            pages_visited: 0,
            accumulated: Vec::new(),
        }
    }

    fn finish(self, stop: StopReason) -> Pagination<T> {
        Pagination {
            records: self.accumulated,
            pages_visited: self.pages_visited,
            stop,
        }
    }
}

/// Drives fetch → extract → advance over a chain of pages
pub struct Paginator<'a, F: ?Sized> {
    fetcher: &'a F,
    gate: &'a RequestGate,
}

impl<'a, F: PageFetcher + ?Sized> Paginator<'a, F> {
    /// Creates a paginator issuing requests through `gate`
    pub fn new(fetcher: &'a F, gate: &'a RequestGate) -> Self {
        Self { fetcher, gate }
    }

    /// Runs pagination from `start` until a terminal state is reached
    ///
    /// Pages that yield no records but do have a next link are followed;
    /// only a missing next link or the page cap ends a healthy run.
    pub async fn run<E: PageExtractor>(
        &self,
        start: PageLink,
        extractor: &E,
        policy: &PaginationPolicy,
    ) -> Pagination<E::Record> {
        let mut state = PaginationState::new(start);

        loop {
            let Some(url) = state.current.take() else {
                return state.finish(StopReason::Exhausted);
            };

            if state.pages_visited >= policy.max_pages {
                tracing::debug!(
                    "Page cap of {} reached, not following {}",
                    policy.max_pages,
                    url
                );
                return state.finish(StopReason::PageCap);
            }

            let body = match self.fetch_with_retries(&url, policy).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        "Stopping pagination after {} page(s): {}",
                        state.pages_visited,
                        e
                    );
                    return state.finish(StopReason::Failed(e));
                }
            };

            let page = extractor.extract(&body);
            state.accumulated.extend(page.records);
            state.current = page.next;
            state.pages_visited += 1;
        }
    }

    /// Fetches one page, retrying transient failures per `policy`
    async fn fetch_with_retries(
        &self,
        url: &PageLink,
        policy: &PaginationPolicy,
    ) -> Result<PageBody, FetchError> {
        let mut attempt = 0;

        loop {
            if attempt > 0 && !policy.retry_backoff.is_zero() {
                tokio::time::sleep(policy.retry_backoff).await;
            }

            self.gate.wait().await;
            tracing::info!("Fetching page: {}", url);

            match self.fetcher.fetch(&url.url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < policy.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Retrying {} (attempt {}/{}): {}",
                        url,
                        attempt,
                        policy.max_retries,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}
