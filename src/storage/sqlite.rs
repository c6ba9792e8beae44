//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DocumentStore trait.

use crate::index::Field;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, StorageResult};
use crate::storage::{
    DocumentId, JoinedTermEntry, NewPage, NormalizedScore, PageRecord, TermEntry,
    UNSET_TERM_COUNT,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const PAGE_COLUMNS: &str = "id, page_link, page_title, page_content, page_description, \
     page_paragraphs, page_links, page_headers, title_term_count, body_term_count, \
     indexed, crawled_at";

const TERM_COLUMNS: &str = "token, document_id, tf_title, tf_body, tf_idf, normalized";

/// SQLite document store
pub struct SqliteStore {
    conn: Connection,
}

/// Page row before the JSON columns are decoded
struct RawPage {
    id: DocumentId,
    link: String,
    title: String,
    content: String,
    description: String,
    paragraphs: String,
    links: String,
    headers: String,
    title_term_count: f64,
    body_term_count: f64,
    indexed: bool,
    crawled_at: String,
}

impl RawPage {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            link: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            description: row.get(4)?,
            paragraphs: row.get(5)?,
            links: row.get(6)?,
            headers: row.get(7)?,
            title_term_count: row.get(8)?,
            body_term_count: row.get(9)?,
            indexed: row.get(10)?,
            crawled_at: row.get(11)?,
        })
    }

    fn into_record(self) -> StorageResult<PageRecord> {
        Ok(PageRecord {
            id: self.id,
            link: self.link,
            title: self.title,
            content: self.content,
            description: self.description,
            paragraphs: serde_json::from_str(&self.paragraphs)?,
            links: serde_json::from_str(&self.links)?,
            headers: serde_json::from_str(&self.headers)?,
            title_term_count: self.title_term_count,
            body_term_count: self.body_term_count,
            indexed: self.indexed,
            crawled_at: self.crawled_at,
        })
    }
}

fn term_from_row(row: &Row<'_>) -> rusqlite::Result<TermEntry> {
    Ok(TermEntry {
        token: row.get(0)?,
        document_id: row.get(1)?,
        tf_title: row.get(2)?,
        tf_body: row.get(3)?,
        tf_idf: row.get(4)?,
        normalized: row.get(5)?,
    })
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_pages(&self, sql: &str, param: Option<&str>) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw = match param {
            Some(p) => stmt
                .query_map(params![p], RawPage::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], RawPage::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };

        raw.into_iter().map(RawPage::into_record).collect()
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl DocumentStore for SqliteStore {
    // ===== Processed Pages =====

    fn insert_page(&mut self, page: &NewPage) -> StorageResult<DocumentId> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO processed_pages (page_link, page_title, page_content, page_description,
             page_paragraphs, page_links, page_headers, title_term_count, body_term_count,
             indexed, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10)",
            params![
                page.link,
                page.title,
                page.content,
                page.description,
                serde_json::to_string(&page.paragraphs)?,
                serde_json::to_string(&page.links)?,
                serde_json::to_string(&page.headers)?,
                UNSET_TERM_COUNT,
                UNSET_TERM_COUNT,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_page(&self, id: DocumentId) -> StorageResult<Option<PageRecord>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {} FROM processed_pages WHERE id = ?1", PAGE_COLUMNS),
                params![id],
                RawPage::from_row,
            )
            .optional()?;

        raw.map(RawPage::into_record).transpose()
    }

    fn pages_linking_to(&self, link: &str) -> StorageResult<Vec<PageRecord>> {
        self.query_pages(
            &format!(
                "SELECT {} FROM processed_pages p
                 WHERE EXISTS (SELECT 1 FROM json_each(p.page_links) WHERE json_each.value = ?1)
                 ORDER BY id",
                PAGE_COLUMNS
            ),
            Some(link),
        )
    }

    fn set_term_counts(&mut self, id: DocumentId, title: f64, body: f64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE processed_pages SET title_term_count = ?1, body_term_count = ?2 WHERE id = ?3",
            params![title, body, id],
        )?;
        Ok(())
    }

    fn set_indexed(&mut self, id: DocumentId, indexed: bool) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE processed_pages SET indexed = ?1 WHERE id = ?2",
            params![indexed, id],
        )?;
        Ok(())
    }

    fn unindexed_pages(&self) -> StorageResult<Vec<PageRecord>> {
        self.query_pages(
            &format!(
                "SELECT {} FROM processed_pages WHERE indexed = 0 ORDER BY id",
                PAGE_COLUMNS
            ),
            None,
        )
    }

    fn count_pages(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM processed_pages")
    }

    fn count_indexed_pages(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM processed_pages WHERE indexed = 1")
    }

    // ===== Inverted Index =====

    fn upsert_term_occurrence(
        &mut self,
        token: &str,
        document: DocumentId,
        field: Field,
    ) -> StorageResult<()> {
        // Both fields start at 1 on insert: the counted occurrence plus the
        // presence seed for the other field.
        let sql = match field {
            Field::Title => {
                "INSERT INTO inverted_index (token, document_id, tf_title, tf_body, tf_idf, normalized)
                 VALUES (?1, ?2, 1.0, 1.0, 0.0, 0)
                 ON CONFLICT(token, document_id) DO UPDATE SET tf_title = tf_title + 1.0"
            }
            Field::Body => {
                "INSERT INTO inverted_index (token, document_id, tf_title, tf_body, tf_idf, normalized)
                 VALUES (?1, ?2, 1.0, 1.0, 0.0, 0)
                 ON CONFLICT(token, document_id) DO UPDATE SET tf_body = tf_body + 1.0"
            }
        };
        self.conn.execute(sql, params![token, document])?;
        Ok(())
    }

    fn term_entry(&self, token: &str, document: DocumentId) -> StorageResult<Option<TermEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM inverted_index WHERE token = ?1 AND document_id = ?2",
                    TERM_COLUMNS
                ),
                params![token, document],
                term_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn term_entries(&self, token: &str) -> StorageResult<Vec<TermEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM inverted_index WHERE token = ?1 ORDER BY tf_idf DESC, document_id ASC",
            TERM_COLUMNS
        ))?;

        let entries = stmt
            .query_map(params![token], term_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn unnormalized_entries(&self) -> StorageResult<Vec<JoinedTermEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.token, i.document_id, i.tf_title, i.tf_body,
                    p.title_term_count, p.body_term_count
             FROM inverted_index i
             JOIN processed_pages p ON p.id = i.document_id
             WHERE i.normalized = 0
             ORDER BY i.document_id, i.token",
        )?;

        let entries = stmt
            .query_map([], |row| {
                Ok(JoinedTermEntry {
                    token: row.get(0)?,
                    document_id: row.get(1)?,
                    tf_title: row.get(2)?,
                    tf_body: row.get(3)?,
                    title_term_count: row.get(4)?,
                    body_term_count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn document_frequency(&self, token: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM inverted_index WHERE token = ?1",
            params![token],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn write_normalized(
        &mut self,
        token: &str,
        document: DocumentId,
        score: NormalizedScore,
    ) -> StorageResult<bool> {
        let changed = self.conn.execute(
            "UPDATE inverted_index SET tf_title = ?1, tf_body = ?2, tf_idf = ?3, normalized = 1
             WHERE token = ?4 AND document_id = ?5 AND normalized = 0",
            params![score.tf_title, score.tf_body, score.tf_idf, token, document],
        )?;
        Ok(changed == 1)
    }

    fn count_term_entries(&self, normalized: Option<bool>) -> StorageResult<u64> {
        match normalized {
            None => self.count("SELECT COUNT(*) FROM inverted_index"),
            Some(flag) => {
                let count: i64 = self.conn.query_row(
                    "SELECT COUNT(*) FROM inverted_index WHERE normalized = ?1",
                    params![flag],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            }
        }
    }

    // ===== Unprocessed Links =====

    fn insert_unprocessed_link(&mut self, url: &str) -> StorageResult<()> {
        self.conn
            .execute("INSERT INTO unprocessed_links (url) VALUES (?1)", params![url])?;
        Ok(())
    }

    fn remove_unprocessed_link(&mut self, url: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM unprocessed_links WHERE url = ?1", params![url])?;
        Ok(())
    }

    fn take_unprocessed_links(&mut self) -> StorageResult<Vec<String>> {
        let tx = self.conn.transaction()?;
        let links = {
            let mut stmt = tx.prepare("SELECT url FROM unprocessed_links ORDER BY rowid")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        tx.execute("DELETE FROM unprocessed_links", [])?;
        tx.commit()?;
        Ok(links)
    }

    fn count_unprocessed_links(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM unprocessed_links")
    }

    // ===== Images =====

    fn insert_image(&mut self, src: &str, description: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO images (src, description) VALUES (?1, ?2)",
            params![src, description],
        )?;
        Ok(())
    }

    fn count_images(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM images")
    }

    // ===== Maintenance =====

    fn drop_all(&mut self) -> StorageResult<()> {
        self.conn.execute_batch(
            "
            DELETE FROM inverted_index;
            DELETE FROM images;
            DELETE FROM unprocessed_links;
            DELETE FROM processed_pages;
        ",
        )?;
        Ok(())
    }
}
