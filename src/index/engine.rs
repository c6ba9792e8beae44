use crate::config::IndexConfig;
use crate::crawler::ExtractedPage;
use crate::index::scoring::{normalize_entry, Weights};
use crate::index::tokenizer::tokenize;
use crate::index::{DenominatorMode, Field};
use crate::storage::{DocumentId, DocumentStore, PageRecord, StorageResult, TermEntry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Raw term totals of one page, used as normalization denominators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TermCounts {
    pub title: usize,
    pub body: usize,
}

/// Outcome of one normalization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizationReport {
    /// Entries converted and written by this pass
    pub normalized: usize,
    /// Entries another writer normalized first
    pub skipped: usize,
    /// Entries whose conversion or write failed
    pub failed: usize,
    /// Whether the pass stopped early on a shutdown request
    pub interrupted: bool,
}

/// Owns inverted-index maintenance and score normalization
pub struct IndexEngine<S> {
    store: Arc<Mutex<S>>,
    mode: DenominatorMode,
    weights: Weights,
}

impl<S> Clone for IndexEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mode: self.mode,
            weights: self.weights,
        }
    }
}

impl<S: DocumentStore> IndexEngine<S> {
    /// Creates an engine with default weights and computed denominators
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self {
            store,
            mode: DenominatorMode::default(),
            weights: Weights::default(),
        }
    }

    /// Creates an engine from the `[index]` configuration section
    pub fn from_config(store: Arc<Mutex<S>>, config: &IndexConfig) -> Self {
        Self {
            store,
            mode: config.denominators,
            weights: Weights {
                title: config.title_weight,
                body: config.body_weight,
            },
        }
    }

    pub fn with_mode(mut self, mode: DenominatorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> DenominatorMode {
        self.mode
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// Stores an accepted page and its images
    ///
    /// Pages flagged invalid by the extractor are dropped and `None` is
    /// returned. Images without alt text are skipped; an image whose `src`
    /// is already stored is ignored.
    pub fn store_document(&self, page: &ExtractedPage) -> StorageResult<Option<DocumentId>> {
        if page.invalid {
            tracing::debug!("Dropping invalid page {}", page.url);
            return Ok(None);
        }

        let mut store = self.store.lock();
        let id = store.insert_page(&page.to_new_page())?;

        for image in &page.images {
            let description = match image.alt.as_deref().map(str::trim) {
                Some(alt) if !alt.is_empty() => alt,
                _ => continue,
            };
            match store.insert_image(&image.src, description) {
                Ok(()) => {}
                Err(e) if e.is_duplicate() => {
                    tracing::trace!("Image {} already stored", image.src);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Some(id))
    }

    /// Counts one occurrence of `token` in `field` of `document`
    pub fn record_occurrence(
        &self,
        token: &str,
        document: DocumentId,
        field: Field,
    ) -> StorageResult<()> {
        self.store
            .lock()
            .upsert_term_occurrence(token, document, field)
    }

    /// Tokenizes a stored page and records every title and body occurrence
    ///
    /// In `Computed` mode the page's denominators are set to its real term
    /// totals, floored at 1 so a page with an empty title still divides
    /// by a positive number.
    pub fn index_document(
        &self,
        document: DocumentId,
        page: &ExtractedPage,
    ) -> StorageResult<TermCounts> {
        let title_tokens = tokenize(&page.title);
        let body_tokens = tokenize(&page.content);

        let mut store = self.store.lock();
        for token in &title_tokens {
            store.upsert_term_occurrence(token, document, Field::Title)?;
        }
        for token in &body_tokens {
            store.upsert_term_occurrence(token, document, Field::Body)?;
        }

        if self.mode == DenominatorMode::Computed {
            store.set_term_counts(
                document,
                title_tokens.len().max(1) as f64,
                body_tokens.len().max(1) as f64,
            )?;
        }

        Ok(TermCounts {
            title: title_tokens.len(),
            body: body_tokens.len(),
        })
    }

    /// Converts every un-normalized entry into its TF-IDF score
    ///
    /// Must not overlap with `record_occurrence` calls for the same
    /// documents: raw counts are overwritten and never retained. Entries
    /// already normalized are filtered out, so re-running is a no-op. A
    /// failure on one entry is logged and counted; the pass continues.
    pub fn normalize_pass(&self) -> StorageResult<NormalizationReport> {
        self.normalize_pass_until(&CancellationToken::new())
    }

    /// Same as `normalize_pass`, but stops between entries once `stop` is
    /// cancelled
    ///
    /// Entries left behind stay un-normalized for the next pass.
    pub fn normalize_pass_until(
        &self,
        stop: &CancellationToken,
    ) -> StorageResult<NormalizationReport> {
        let (total_docs, entries) = {
            let store = self.store.lock();
            (store.count_pages()? as f64, store.unnormalized_entries()?)
        };

        tracing::info!(
            "Normalizing {} term entries across {} documents",
            entries.len(),
            total_docs
        );

        let mut report = NormalizationReport::default();
        let mut frequencies: HashMap<String, f64> = HashMap::new();

        for entry in &entries {
            if stop.is_cancelled() {
                tracing::warn!(
                    "Normalization interrupted with {} entries left",
                    entries.len() - report.normalized - report.skipped - report.failed
                );
                report.interrupted = true;
                break;
            }

            let cached = frequencies.get(&entry.token).copied();
            let df = match cached {
                Some(df) => df,
                None => match self.store.lock().document_frequency(&entry.token) {
                    Ok(df) => {
                        let df = df as f64;
                        frequencies.insert(entry.token.clone(), df);
                        df
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to count document frequency of '{}': {}",
                            entry.token,
                            e
                        );
                        report.failed += 1;
                        continue;
                    }
                },
            };

            let score = match normalize_entry(entry, total_docs, df, self.weights) {
                Ok(score) => score,
                Err(e) => {
                    tracing::warn!("Skipping entry: {}", e);
                    report.failed += 1;
                    continue;
                }
            };

            match self
                .store
                .lock()
                .write_normalized(&entry.token, entry.document_id, score)
            {
                Ok(true) => report.normalized += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to write score for ({}, {}): {}",
                        entry.token,
                        entry.document_id,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Normalization pass: {} normalized, {} skipped, {} failed",
            report.normalized,
            report.skipped,
            report.failed
        );

        Ok(report)
    }

    /// Marks a document as covered by a normalization pass
    pub fn mark_indexed(&self, document: DocumentId) -> StorageResult<()> {
        self.store.lock().set_indexed(document, true)
    }

    /// Documents not yet covered by a normalization pass
    pub fn fetch_unindexed_documents(&self) -> StorageResult<Vec<PageRecord>> {
        self.store.lock().unindexed_pages()
    }

    /// Normalizes pending entries and marks the pending documents indexed
    ///
    /// The pending set is captured before the pass so documents stored
    /// while it runs stay queued for the next cycle.
    pub fn index_cycle(&self) -> StorageResult<NormalizationReport> {
        self.index_cycle_until(&CancellationToken::new())
    }

    /// Same as `index_cycle`, but stoppable through `stop`
    ///
    /// An interrupted pass leaves every pending document unindexed.
    pub fn index_cycle_until(&self, stop: &CancellationToken) -> StorageResult<NormalizationReport> {
        let pending = self.fetch_unindexed_documents()?;
        let report = self.normalize_pass_until(stop)?;
        if report.interrupted {
            return Ok(report);
        }

        for page in &pending {
            self.mark_indexed(page.id)?;
        }

        tracing::info!("Marked {} documents indexed", pending.len());
        Ok(report)
    }

    /// Posting list for a query word, highest score first
    pub fn lookup(&self, word: &str) -> StorageResult<Vec<TermEntry>> {
        match tokenize(word).first() {
            Some(token) => self.store.lock().term_entries(token),
            None => Ok(Vec::new()),
        }
    }
}
