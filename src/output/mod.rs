//! Output module for persisting and post-processing crawl results
//!
//! This module handles:
//! - The `ResultSink` interface the crawler reports to
//! - Atomic JSON persistence of topic documents
//! - Title-based deduplication of persisted documents
//! - Statistics over persisted documents

mod dedup;
mod json_sink;
pub mod stats;
mod traits;

pub use dedup::{deduplicate, deduplicate_file, DedupKey, DedupSummary};
pub use json_sink::{load_documents, to_pretty_json, write_documents, JsonFileSink};
pub use stats::{compute_statistics, print_statistics, DocumentStatistics};
pub use traits::{DiscardSink, OutputError, OutputResult, ResultSink};
