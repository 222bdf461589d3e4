//! Deduplication of persisted topic documents
//!
//! Keeps the first document seen for each key and drops later ones,
//! preserving the relative order of first occurrences.

use crate::model::TopicDocument;
use crate::output::json_sink::{load_documents, write_documents};
use crate::output::traits::OutputResult;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Which fields identify a topic
///
/// `Title` matches the historical behaviour, where two distinct threads
/// that happen to share a title collapse into one. `TitleAndUrl` keeps them
/// apart when the document records its URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DedupKey {
    #[default]
    Title,
    TitleAndUrl,
}

impl DedupKey {
    fn identity<'a>(&self, document: &'a TopicDocument) -> (&'a str, Option<&'a str>) {
        match self {
            Self::Title => (document.title.as_str(), None),
            Self::TitleAndUrl => (document.title.as_str(), document.url.as_deref()),
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::TitleAndUrl => f.write_str("title-and-url"),
        }
    }
}

/// Returns the first document for each distinct key, in input order
///
/// # Example
///
/// ```
/// use forum_scribe::{deduplicate, DedupKey, TopicDocument};
///
/// let doc = |title: &str| TopicDocument { title: title.to_string(), url: None, posts: vec![] };
/// let unique = deduplicate(&[doc("a"), doc("b"), doc("a")], DedupKey::Title);
/// assert_eq!(unique.len(), 2);
/// ```
pub fn deduplicate(documents: &[TopicDocument], key: DedupKey) -> Vec<TopicDocument> {
    let mut seen = HashSet::new();

    documents
        .iter()
        .filter(|document| seen.insert(key.identity(*document)))
        .cloned()
        .collect()
}

/// Counts from one deduplication pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupSummary {
    pub before: usize,
    pub after: usize,
}

impl DedupSummary {
    pub fn removed(&self) -> usize {
        self.before - self.after
    }
}

/// Deduplicates a persisted document in place
///
/// The file is replaced atomically; on any error it is left untouched.
pub fn deduplicate_file(path: &Path, key: DedupKey) -> OutputResult<DedupSummary> {
    let documents = load_documents(path)?;
    let unique = deduplicate(&documents, key);

    write_documents(path, &unique)?;

    let summary = DedupSummary {
        before: documents.len(),
        after: unique.len(),
    };
    tracing::info!(
        "Deduplicated {} by {}: {} -> {} topics",
        path.display(),
        key,
        summary.before,
        summary.after
    );

    Ok(summary)
}
