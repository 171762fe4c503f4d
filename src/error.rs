//! Error taxonomy for the extraction engine and its collaborators.
//!
//! Only [`ClaimError::DocumentProcessingFailure`] and
//! [`ClaimError::Configuration`] ever escape the engine. The numeric and
//! sentence-boundary variants are recovered where they occur and exist so the
//! recovery can be logged with a consistent shape.

use thiserror::Error;

/// Errors raised while configuring, running, or persisting an extraction run.
#[derive(Error, Debug)]
pub enum ClaimError {
    /// A numeric token could not be parsed; the candidate is dropped.
    #[error("malformed numeric token {token:?} at byte {offset}")]
    MalformedNumericToken { token: String, offset: usize },

    /// Sentence boundaries around a claim could not be resolved cleanly.
    #[error("ambiguous sentence boundary near byte {offset}")]
    SentenceBoundaryAmbiguous { offset: usize },

    /// One document could not be processed; siblings are unaffected.
    #[error("failed to process {url} ({domain}): {reason}")]
    DocumentProcessingFailure {
        url: String,
        domain: String,
        reason: String,
    },

    /// Invalid configuration, rejected before any document is processed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// URL discovery or HTTP fetch failure.
    #[error("fetch error: {0}")]
    Fetch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ClaimError {
    pub(crate) fn document(url: &str, domain: &str, reason: impl Into<String>) -> Self {
        ClaimError::DocumentProcessingFailure {
            url: url.to_string(),
            domain: domain.to_string(),
            reason: reason.into(),
        }
    }
}
