//! Statistics over persisted topic documents
//!
//! This module summarises a harvested document: how many topics and posts it
//! holds, which titles repeat, and how many posts fell back to placeholder
//! fields.

use crate::model::{TopicDocument, FALLBACK_AUTHOR, FALLBACK_CONTENT};
use std::collections::HashMap;

/// Summary of a document collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStatistics {
    /// Number of topic documents
    pub topics: usize,

    /// Number of posts across all topics
    pub posts: usize,

    /// Number of distinct titles
    pub distinct_titles: usize,

    /// Titles that appear more than once, with their count, in first-seen order
    pub duplicate_titles: Vec<(String, usize)>,

    /// Topics without any post
    pub empty_topics: usize,

    /// Posts whose author element was missing
    pub unknown_authors: usize,

    /// Posts whose content element was missing
    pub missing_content: usize,
}

/// Computes statistics for a collection of documents
pub fn compute_statistics(documents: &[TopicDocument]) -> DocumentStatistics {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    let mut stats = DocumentStatistics {
        topics: documents.len(),
        ..Default::default()
    };

    for document in documents {
        let count = counts.entry(document.title.as_str()).or_insert(0);
        if *count == 0 {
            order.push(document.title.as_str());
        }
        *count += 1;

        if document.posts.is_empty() {
            stats.empty_topics += 1;
        }

        for post in &document.posts {
            stats.posts += 1;
            if post.author == FALLBACK_AUTHOR {
                stats.unknown_authors += 1;
            }
            if post.content == FALLBACK_CONTENT {
                stats.missing_content += 1;
            }
        }
    }

    stats.distinct_titles = order.len();
    stats.duplicate_titles = order
        .into_iter()
        .filter_map(|title| {
            let count = counts[title];
            (count > 1).then(|| (title.to_string(), count))
        })
        .collect();

    stats
}

/// Prints statistics to stdout in a human-readable format
pub fn print_statistics(stats: &DocumentStatistics) {
    println!("=== Forum-Scribe Document Statistics ===\n");

    println!("Topics:          {}", stats.topics);
    println!("Posts:           {}", stats.posts);
    println!("Distinct titles: {}", stats.distinct_titles);
    println!("Empty topics:    {}", stats.empty_topics);
    println!("Unknown authors: {}", stats.unknown_authors);
    println!("Missing content: {}", stats.missing_content);

    if !stats.duplicate_titles.is_empty() {
        println!("\nDuplicate titles ({}):", stats.duplicate_titles.len());
        for (title, count) in &stats.duplicate_titles {
            println!("  {:>4}x  {}", count, title);
        }
    }
}
