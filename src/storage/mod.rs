//! Storage module for persisting pages and the inverted index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Processed page persistence and the indexed work queue
//! - Atomic term occurrence counting and normalized score write-back
//! - Crash-recovery persistence of unprocessed links
//! - Write-once image metadata

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{DocumentStore, StorageError, StorageResult};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Identity of a stored page
pub type DocumentId = i64;

/// Placeholder written to both term-count denominators when a page is stored
pub const UNSET_TERM_COUNT: f64 = -0.2;

/// Initializes or opens a store database
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// A page header (`h1`..`h6`) captured by the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

/// An image reference captured by the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub src: String,
    pub alt: Option<String>,
}

/// A page about to be inserted into `processed_pages`
#[derive(Debug, Clone, Default)]
pub struct NewPage {
    pub link: String,
    pub title: String,
    pub content: String,
    pub description: String,
    pub paragraphs: Vec<String>,
    pub links: Vec<String>,
    pub headers: Vec<Header>,
}

/// Represents a processed page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: DocumentId,
    pub link: String,
    pub title: String,
    pub content: String,
    pub description: String,
    pub paragraphs: Vec<String>,
    pub links: Vec<String>,
    pub headers: Vec<Header>,
    pub title_term_count: f64,
    pub body_term_count: f64,
    pub indexed: bool,
    pub crawled_at: String,
}

/// One row of the inverted index
#[derive(Debug, Clone, PartialEq)]
pub struct TermEntry {
    pub token: String,
    pub document_id: DocumentId,
    pub tf_title: f64,
    pub tf_body: f64,
    pub tf_idf: f64,
    pub normalized: bool,
}

/// An un-normalized term entry joined with its page's denominators
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTermEntry {
    pub token: String,
    pub document_id: DocumentId,
    pub tf_title: f64,
    pub tf_body: f64,
    pub title_term_count: f64,
    pub body_term_count: f64,
}

/// Terminal values written by the normalization pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedScore {
    pub tf_title: f64,
    pub tf_body: f64,
    pub tf_idf: f64,
}
