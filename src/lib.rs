//! Dex: a concurrent web crawler feeding a TF-IDF inverted index
//!
//! This crate crawls pages with a pool of workers pulling from a shared link
//! frontier, stores every accepted page, counts term occurrences inline and
//! converts the raw counts into corpus-relative TF-IDF scores in a deferred
//! normalization pass.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod index;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Dex operations
#[derive(Debug, Error)]
pub enum DexError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Frontier error: {0}")]
    Frontier(#[from] frontier::FrontierError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Dex operations
pub type Result<T> = std::result::Result<T, DexError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use frontier::{Dispatch, Frontier, FrontierPhase};
pub use index::{DenominatorMode, Field, IndexEngine};
pub use storage::{DocumentStore, SqliteStore};
pub use url::normalize_url;
