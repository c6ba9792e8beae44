//! Output module for reporting crawl results
//!
//! This module handles:
//! - Corpus and index statistics (`--stats`)
//! - The end-of-run summary printed after a crawl

pub mod stats;

pub use stats::{load_statistics, print_statistics, IndexStatistics};

use crate::crawler::CrawlSummary;
use crate::index::NormalizationReport;

/// Prints the outcome of a normalization pass
pub fn print_normalization(report: &NormalizationReport) {
    println!(
        "Normalization: {} entries scored, {} already scored, {} failed",
        report.normalized, report.skipped, report.failed
    );    if report.interrupted {
        println!("Normalization interrupted; remaining entries are scored on the next pass.");
    }
}

/// Prints the end-of-run summary
pub fn print_crawl_summary(summary: &CrawlSummary) {
    let crawl = &summary.crawl;

    println!("=== Crawl Summary ===\n");
    if crawl.cancelled {
        println!("Crawl interrupted before the frontier drained.");
    }
    println!("  Links processed: {}", crawl.links_processed);
    println!("  Pages stored: {}", crawl.pages_stored);
    println!("  Pages dropped (no title or text): {}", crawl.pages_dropped);
    println!("  Fetch failures: {}", crawl.fetch_failures);
    if crawl.workers_failed > 0 {
        println!("  Workers stopped on error: {}", crawl.workers_failed);
    }
    println!("  Links saved for resume: {}", summary.persisted_links);

    match &summary.normalization {
        Some(report) => print_normalization(report),
        None => println!("Normalization: skipped"),
    }
}
