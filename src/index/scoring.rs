//! TF-IDF scoring for a single term entry

use crate::storage::{DocumentId, JoinedTermEntry, NormalizedScore};
use thiserror::Error;

/// Field weights applied to the normalized frequencies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub title: f64,
    pub body: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            title: 0.6,
            body: 0.3,
        }
    }
}

/// Failure converting one entry; the rest of the pass is unaffected
#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("non-finite score for ({token}, {document}): tf_idf={tf_idf}")]
    NonFinite {
        token: String,
        document: DocumentId,
        tf_idf: f64,
    },
}

/// `log10(N / (df + 1)) * (body * bodyWeight + title * titleWeight)`
pub fn tf_idf(
    total_docs: f64,
    document_frequency: f64,
    normalized_title: f64,
    normalized_body: f64,
    weights: Weights,
) -> f64 {
    let idf = (total_docs / (document_frequency + 1.0)).log10();
    idf * (normalized_body * weights.body + normalized_title * weights.title)
}

/// Converts raw counts into the terminal values for one entry
///
/// Each field is divided by the document's own denominator.
pub fn normalize_entry(
    entry: &JoinedTermEntry,
    total_docs: f64,
    document_frequency: f64,
    weights: Weights,
) -> Result<NormalizedScore, ScoreError> {
    let tf_body = entry.tf_body / entry.body_term_count;
    let tf_title = entry.tf_title / entry.title_term_count;
    let score = tf_idf(total_docs, document_frequency, tf_title, tf_body, weights);

    if !score.is_finite() || !tf_body.is_finite() || !tf_title.is_finite() {
        return Err(ScoreError::NonFinite {
            token: entry.token.clone(),
            document: entry.document_id,
            tf_idf: score,
        });
    }

    Ok(NormalizedScore {
        tf_title,
        tf_body,
        tf_idf: score,
    })
}
