//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Dex database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Pages accepted from the extractor
CREATE TABLE IF NOT EXISTS processed_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_link TEXT NOT NULL,
    page_title TEXT NOT NULL,
    page_content TEXT NOT NULL,
    page_description TEXT NOT NULL DEFAULT '',
    page_paragraphs TEXT NOT NULL DEFAULT '[]',
    page_links TEXT NOT NULL DEFAULT '[]',
    page_headers TEXT NOT NULL DEFAULT '[]',
    title_term_count REAL NOT NULL,
    body_term_count REAL NOT NULL,
    indexed INTEGER NOT NULL DEFAULT 0,
    crawled_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_indexed ON processed_pages(indexed);

-- Inverted index, one row per (token, document)
CREATE TABLE IF NOT EXISTS inverted_index (
    token TEXT NOT NULL,
    document_id INTEGER NOT NULL REFERENCES processed_pages(id),
    tf_title REAL NOT NULL,
    tf_body REAL NOT NULL,
    tf_idf REAL NOT NULL DEFAULT 0.0,
    normalized INTEGER NOT NULL DEFAULT 0,
    UNIQUE(token, document_id)
);

CREATE INDEX IF NOT EXISTS idx_inverted_token ON inverted_index(token);
CREATE INDEX IF NOT EXISTS idx_inverted_normalized ON inverted_index(normalized);

-- Frontier snapshot for crash recovery
CREATE TABLE IF NOT EXISTS unprocessed_links (
    url TEXT PRIMARY KEY
);

-- Image metadata, write-once per src
CREATE TABLE IF NOT EXISTS images (
    src TEXT PRIMARY KEY,
    description TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
