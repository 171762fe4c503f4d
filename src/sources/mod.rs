//! Where documents come from.
//!
//! Two-phase discovery mode, as the binary runs it by default:
//!
//! 1. **Discovery**: [`gdelt::discover_urls`] finds article URLs
//! 2. **Fetching**: [`fetch::fetch_documents`] downloads each page and
//!    [`clean`] reduces it to plain paragraphs
//!
//! Alternatively, [`load_documents_jsonl`] reads already-fetched documents,
//! one JSON object per line.

pub mod clean;
pub mod fetch;
pub mod gdelt;

use crate::error::ClaimError;
use crate::models::FetchedDocument;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Load [`FetchedDocument`]s from a JSON-lines file.
///
/// Blank lines are ignored. A line that does not parse is logged and
/// skipped; only an unreadable file is an error.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_documents_jsonl(
    path: impl AsRef<Path>,
) -> Result<Vec<FetchedDocument>, ClaimError> {
    let raw = fs::read_to_string(path.as_ref()).await?;

    let mut documents = Vec::new();
    let mut skipped = 0usize;
    for (n, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<FetchedDocument>(line) {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                skipped += 1;
                warn!(line = n + 1, error = %e, "Skipping malformed document line");
            }
        }
    }

    info!(count = documents.len(), skipped, "Loaded documents");
    Ok(documents)
}
