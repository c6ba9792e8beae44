//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! corpus and index statistics from the storage layer.

use crate::storage::{DocumentStore, StorageResult};

/// Corpus and index statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStatistics {
    /// Pages stored in `processed_pages`
    pub total_pages: u64,

    /// Pages already covered by a normalization pass
    pub indexed_pages: u64,

    /// Rows in the inverted index
    pub term_entries: u64,

    /// Inverted-index rows holding a final TF-IDF score
    pub normalized_entries: u64,

    /// Stored images
    pub images: u64,

    /// Links persisted for the next run to resume from
    pub unprocessed_links: u64,
}

impl IndexStatistics {
    /// Inverted-index rows still holding raw counts
    pub fn pending_entries(&self) -> u64 {
        self.term_entries.saturating_sub(self.normalized_entries)
    }
}

/// Loads statistics from storage
pub fn load_statistics<S: DocumentStore + ?Sized>(storage: &S) -> StorageResult<IndexStatistics> {
    Ok(IndexStatistics {
        total_pages: storage.count_pages()?,
        indexed_pages: storage.count_indexed_pages()?,
        term_entries: storage.count_term_entries(None)?,
        normalized_entries: storage.count_term_entries(Some(true))?,
        images: storage.count_images()?,
        unprocessed_links: storage.count_unprocessed_links()?,
    })
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Corpus:");
    println!("  Pages stored: {}", stats.total_pages);
    println!(
        "  Pages indexed: {} ({:.1}%)",
        stats.indexed_pages,
        percentage(stats.indexed_pages, stats.total_pages)
    );
    println!("  Images: {}", stats.images);
    println!();

    println!("Inverted index:");
    println!("  Term entries: {}", stats.term_entries);
    println!(
        "  Normalized: {} ({:.1}%)",
        stats.normalized_entries,
        percentage(stats.normalized_entries, stats.term_entries)
    );
    println!("  Awaiting normalization: {}", stats.pending_entries());
    println!();

    println!("Frontier:");
    println!(
        "  Unprocessed links saved for resume: {}",
        stats.unprocessed_links
    );
}
