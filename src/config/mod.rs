//! Configuration module for Wiki-Crawler
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so the crawler runs without one.
//!
//! # Example
//!
//! ```no_run
//! use wiki_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Resolving links against: {}", config.crawler.base_origin);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HttpConfig, StorageConfig, DEFAULT_BASE_ORIGIN,
    DEFAULT_FETCH_CONCURRENCY,
};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
