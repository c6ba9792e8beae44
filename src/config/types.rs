use crate::index::DenominatorMode;
use serde::Deserialize;

/// Main configuration structure for Dex
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub index: IndexConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers; prompted for on stdin when absent
    #[serde(default)]
    pub workers: Option<usize>,

    /// Back-off between polls when the frontier has no work (milliseconds)
    #[serde(rename = "idle-poll-ms", default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,

    /// Seed URLs, dispatched first and in order
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Optional file with one seed URL per line, appended after `seeds`
    #[serde(rename = "seeds-file", default)]
    pub seeds_file: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

/// Term-weighting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// How per-document normalization denominators are produced
    #[serde(default)]
    pub denominators: DenominatorMode,

    /// Weight of the normalized title frequency in the score
    #[serde(rename = "title-weight", default = "default_title_weight")]
    pub title_weight: f64,

    /// Weight of the normalized body frequency in the score
    #[serde(rename = "body-weight", default = "default_body_weight")]
    pub body_weight: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            denominators: DenominatorMode::default(),
            title_weight: default_title_weight(),
            body_weight: default_body_weight(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_idle_poll_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_title_weight() -> f64 {
    0.6
}

fn default_body_weight() -> f64 {
    0.3
}
