//! Configuration module for Dex
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use dex_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("dex.toml")).unwrap();
//! println!("Idle poll interval: {}ms", config.crawler.idle_poll_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, IndexConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, load_seed_list};
pub use validation::validate_worker_count;
