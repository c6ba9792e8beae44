//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - HTML extraction (page text, headers, images, links)
//! - The worker pool draining the frontier
//! - Overall crawl coordination and shutdown persistence

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlOptions, CrawlSummary};
pub use fetcher::{build_http_client, fetch_url, user_agent_string, FetchResult};
pub use parser::{extract_page, ExtractedPage};
pub use scheduler::{CrawlReport, Scheduler};
