//! Term-weighting index engine
//!
//! Raw occurrence counting happens inline while crawling: each token seen in
//! a page's title or body bumps a per-(token, document) counter with one
//! atomic upsert. Turning counts into TF-IDF needs corpus-wide aggregates
//! (document count, per-token document frequency), so that conversion is a
//! deferred batch pass run once crawling for the batch has finished.

mod engine;
mod scoring;
mod tokenizer;

pub use engine::{IndexEngine, NormalizationReport, TermCounts};
pub use scoring::{normalize_entry, tf_idf, ScoreError, Weights};
pub use tokenizer::tokenize;

use serde::Deserialize;
use std::fmt;

/// Which part of a page an occurrence was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Body,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How per-document normalization denominators are produced
///
/// `Computed` writes each page's real title/body term counts when the page
/// is indexed. `Sentinel` leaves the `-0.2` placeholder written at insert
/// time, which makes normalized values negative multiples of the raw counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenominatorMode {
    #[default]
    Computed,
    Sentinel,
}
