//! Storage traits and error types
//!
//! This module defines the trait interface for document store backends and
//! associated error types.

use crate::index::Field;
use crate::storage::{
    DocumentId, JoinedTermEntry, NewPage, NormalizedScore, PageRecord, TermEntry,
};
use rusqlite::ErrorCode;
use thiserror::Error;

/// SQLite extended result codes for key collisions
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// Returns true if this error is a duplicate-key conflict
    ///
    /// Duplicate keys are expected for images and persisted links and are
    /// ignored by those callers. Every other error is surfaced.
    pub fn is_duplicate(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == ErrorCode::ConstraintViolation
                    && matches!(
                        err.extended_code,
                        SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE
                    )
            }
            _ => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document store implementations
///
/// Keyed collections for processed pages, the inverted index, persisted
/// unprocessed links and images. Implementations are shared between workers
/// behind a mutex; every method is a single logical store operation.
pub trait DocumentStore: Send {
    // ===== Processed Pages =====

    /// Inserts a page with placeholder denominators and `indexed = false`
    fn insert_page(&mut self, page: &NewPage) -> StorageResult<DocumentId>;

    /// Gets a page by ID
    fn get_page(&self, id: DocumentId) -> StorageResult<Option<PageRecord>>;

    /// Gets every page whose outgoing links include `link`
    fn pages_linking_to(&self, link: &str) -> StorageResult<Vec<PageRecord>>;

    /// Overwrites the per-document normalization denominators
    fn set_term_counts(&mut self, id: DocumentId, title: f64, body: f64) -> StorageResult<()>;

    /// Sets the `indexed` flag of a page
    fn set_indexed(&mut self, id: DocumentId, indexed: bool) -> StorageResult<()>;

    /// Gets all pages not yet covered by a normalization pass
    fn unindexed_pages(&self) -> StorageResult<Vec<PageRecord>>;

    /// Counts stored pages
    fn count_pages(&self) -> StorageResult<u64>;

    /// Counts pages with `indexed = true`
    fn count_indexed_pages(&self) -> StorageResult<u64>;

    // ===== Inverted Index =====

    /// Atomically increments `field` for `(token, document)`, creating the
    /// entry with both fields at 1 when absent
    fn upsert_term_occurrence(
        &mut self,
        token: &str,
        document: DocumentId,
        field: Field,
    ) -> StorageResult<()>;

    /// Gets one term entry
    fn term_entry(&self, token: &str, document: DocumentId) -> StorageResult<Option<TermEntry>>;

    /// Gets all entries for a token, highest score first
    fn term_entries(&self, token: &str) -> StorageResult<Vec<TermEntry>>;

    /// Joins every un-normalized entry with its page's denominators
    fn unnormalized_entries(&self) -> StorageResult<Vec<JoinedTermEntry>>;

    /// Number of distinct documents containing `token`
    fn document_frequency(&self, token: &str) -> StorageResult<u64>;

    /// Writes a terminal score; returns false if the entry was already normalized
    fn write_normalized(
        &mut self,
        token: &str,
        document: DocumentId,
        score: NormalizedScore,
    ) -> StorageResult<bool>;

    /// Counts term entries, optionally filtered by the `normalized` flag
    fn count_term_entries(&self, normalized: Option<bool>) -> StorageResult<u64>;

    // ===== Unprocessed Links =====

    /// Persists one unprocessed link; duplicates fail with a duplicate error
    fn insert_unprocessed_link(&mut self, url: &str) -> StorageResult<()>;

    /// Removes one persisted unprocessed link
    fn remove_unprocessed_link(&mut self, url: &str) -> StorageResult<()>;

    /// Reads every persisted unprocessed link, then empties the collection
    fn take_unprocessed_links(&mut self) -> StorageResult<Vec<String>>;

    /// Counts persisted unprocessed links
    fn count_unprocessed_links(&self) -> StorageResult<u64>;

    // ===== Images =====

    /// Inserts image metadata; a repeated `src` fails with a duplicate error
    fn insert_image(&mut self, src: &str, description: &str) -> StorageResult<()>;

    /// Counts stored images
    fn count_images(&self) -> StorageResult<u64>;

    // ===== Maintenance =====

    /// Empties every collection (full index reset)
    fn drop_all(&mut self) -> StorageResult<()>;
}
