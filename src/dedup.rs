//! Claim fingerprints and the index that keeps emission at-most-once.
//!
//! A fingerprint is a BLAKE3 digest of the claim's normalized attributes:
//! domain, quantity at a fixed precision, unit, direction, and the snippet
//! lowercased with whitespace collapsed. Formatting noise therefore maps to
//! the same fingerprint while different wording does not.
//!
//! [`FingerprintIndex`] is the only state shared between workers. It is
//! loaded before a run, consulted for every accepted claim, and saved after
//! the run so later runs skip what was already emitted.

use crate::error::ClaimError;
use crate::models::{Direction, Unit};
use crate::utils::collapse_whitespace;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::fs;
use tracing::{info, instrument};

const FIELD_SEPARATOR: &str = "\u{1f}";

/// Lowercase, trim, and drop a leading `www.`.
pub fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Lowercase and collapse whitespace.
pub fn normalize_snippet(snippet: &str) -> String {
    collapse_whitespace(&snippet.to_lowercase())
}

/// Stable identity of a claim across runs and re-publications.
pub fn fingerprint(
    domain: &str,
    quantity: f64,
    unit: Unit,
    direction: Direction,
    snippet: &str,
    precision: u32,
) -> String {
    let quantity = format!("{:.*}", precision as usize, quantity);
    let material = [
        normalize_domain(domain),
        quantity,
        unit.label().to_string(),
        direction.label().to_string(),
        normalize_snippet(snippet),
    ]
    .join(FIELD_SEPARATOR);
    blake3::hash(material.as_bytes()).to_hex().to_string()
}

/// Set of fingerprints already emitted, safe to share between workers.
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    seen: Mutex<HashSet<String>>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fingerprints<I, S>(fingerprints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seen: Mutex::new(fingerprints.into_iter().map(Into::into).collect()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `fingerprint` if it is new. Returns `true` exactly once per
    /// fingerprint for the lifetime of the index.
    pub fn accept(&self, fingerprint: &str) -> bool {
        let mut seen = self.lock();
        if seen.contains(fingerprint) {
            return false;
        }
        seen.insert(fingerprint.to_string())
    }

    /// Forget an accepted fingerprint whose record never reached the sink.
    pub fn release(&self, fingerprint: &str) -> bool {
        self.lock().remove(fingerprint)
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.lock().contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All fingerprints, sorted.
    pub fn snapshot(&self) -> Vec<String> {
        let mut all: Vec<String> = self.lock().iter().cloned().collect();
        all.sort_unstable();
        all
    }

    /// Load an index saved by [`FingerprintIndex::save`].
    ///
    /// A missing file yields an empty index; blank lines are ignored.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ClaimError> {
        let raw = match fs::read_to_string(path.as_ref()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No fingerprint index yet; starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let index = Self::from_fingerprints(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );
        info!(count = index.len(), "Loaded fingerprint index");
        Ok(index)
    }

    /// Write one fingerprint per line, replacing the file atomically.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ClaimError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let fingerprints = self.snapshot();
        let mut body = fingerprints.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, path).await?;
        info!(count = fingerprints.len(), "Saved fingerprint index");
        Ok(())
    }
}
