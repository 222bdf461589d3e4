//! Request gate enforcing the politeness delay
//!
//! Every request to the forum passes through a single shared `RequestGate`.
//! The gate spaces request issuance by a fixed interval regardless of how
//! many topic workers are running, so parallel workers overlap only in
//! response processing, never in request rate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fixed-interval gate shared by all workers
///
/// Spacing is measured from one request's issuance to the next, not from
/// the end of the previous response.
#[derive(Debug)]
pub struct RequestGate {
    /// Minimum spacing between two issued requests
    interval: Duration,

    /// When the last request was let through
    last_issued: Mutex<Option<Instant>>,

    /// Number of requests let through so far
    issued: AtomicU64,
}

impl RequestGate {
    /// Creates a gate spacing requests by `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_issued: Mutex::new(None),
            issued: AtomicU64::new(0),
        }
    }

    /// Waits until the next request may be issued
    ///
    /// The first call returns immediately. Later calls return no earlier than
    /// `interval` after the previous call returned. The lock is held while
    /// sleeping so waiters are released one at a time.
    pub async fn wait(&self) {
        let mut last = self.last_issued.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                tracing::trace!("Politeness delay: waiting {:?}", ready_at - Instant::now());
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of requests issued through this gate
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}
