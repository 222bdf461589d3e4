//! Configuration module for Forum-Scribe
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All sections are optional; missing keys fall back to documented defaults.
//!
//! # Example
//!
//! ```no_run
//! use forum_scribe::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("forum.toml")).unwrap();
//! println!("Listing page cap: {}", config.crawler.max_listing_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ForumConfig, OutputConfig, SelectorConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
