//! Tunables for the extraction engine.
//!
//! Settings are read from an optional `config.yaml` and may be overridden
//! from the command line. [`ExtractionConfig::validate`] runs once at startup;
//! an invalid configuration rejects the run before any document is touched.

use crate::error::ClaimError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

/// Configuration for matching, scoring, and deduplication.
///
/// Every field has a default, so a YAML file only needs the keys it changes:
///
/// ```yaml
/// confidence_threshold: 0.6
/// snippet_max_chars: 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Percentages above this value are treated as parsing noise.
    pub percent_ceiling: f64,
    /// Minimum confidence for a claim to become a record.
    pub confidence_threshold: f64,
    /// Upper bound on context snippet length, in characters.
    pub snippet_max_chars: usize,
    /// Decimal places kept for the quantity when fingerprinting.
    pub fingerprint_precision: u32,
    /// Records emitted per document at most; `0` disables the limit.
    pub max_records_per_document: usize,
    /// Documents longer than this (in bytes) are rejected.
    pub max_document_chars: usize,
    /// Documents processed concurrently by the batch runner.
    pub workers: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            percent_ceiling: 1000.0,
            confidence_threshold: 0.5,
            snippet_max_chars: 400,
            fingerprint_precision: 1,
            max_records_per_document: 6,
            max_document_chars: 500_000,
            workers: 12,
        }
    }
}

impl ExtractionConfig {
    /// Smallest snippet cap that still fits a short sentence.
    pub const MIN_SNIPPET_CHARS: usize = 40;
    /// Largest supported fingerprint precision.
    pub const MAX_FINGERPRINT_PRECISION: u32 = 6;

    /// Check every option, returning [`ClaimError::Configuration`] on the first violation.
    pub fn validate(&self) -> Result<(), ClaimError> {
        if !self.percent_ceiling.is_finite() || self.percent_ceiling <= 0.0 {
            return Err(ClaimError::Configuration(format!(
                "percent_ceiling must be a positive number, got {}",
                self.percent_ceiling
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ClaimError::Configuration(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.snippet_max_chars < Self::MIN_SNIPPET_CHARS {
            return Err(ClaimError::Configuration(format!(
                "snippet_max_chars must be at least {}, got {}",
                Self::MIN_SNIPPET_CHARS,
                self.snippet_max_chars
            )));
        }
        if self.fingerprint_precision > Self::MAX_FINGERPRINT_PRECISION {
            return Err(ClaimError::Configuration(format!(
                "fingerprint_precision must be at most {}, got {}",
                Self::MAX_FINGERPRINT_PRECISION,
                self.fingerprint_precision
            )));
        }
        if self.max_document_chars == 0 {
            return Err(ClaimError::Configuration(
                "max_document_chars must be greater than 0".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(ClaimError::Configuration(
                "workers must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a configuration from YAML text. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ClaimError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load and parse a YAML configuration file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ClaimError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let config = Self::from_yaml(&raw)?;
        info!(?config, "Loaded extraction configuration");
        Ok(config)
    }
}
