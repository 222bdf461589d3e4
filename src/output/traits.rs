//! Output handler traits and error types
//!
//! This module defines the sink interface the orchestrator reports to and
//! the errors that can occur while persisting results.

use crate::model::CrawlResult;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives the crawl result as it grows
///
/// The orchestrator is the only writer of the result; sinks only read it.
/// Any error returned here aborts the crawl.
pub trait ResultSink {
    /// Called after each finished topic with the result so far
    fn record(&mut self, result: &CrawlResult) -> OutputResult<()>;

    /// Called once with the final result
    fn close(&mut self, result: &CrawlResult) -> OutputResult<()>;
}

/// Sink that persists nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl ResultSink for DiscardSink {
    fn record(&mut self, _result: &CrawlResult) -> OutputResult<()> {
        Ok(())
    }

    fn close(&mut self, _result: &CrawlResult) -> OutputResult<()> {
        Ok(())
    }
}
