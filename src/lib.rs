//! # Claim Sieve
//!
//! Finds quantitative productivity claims in news articles (percentage
//! changes and time saved) and keeps each one exactly once.
//!
//! ## Architecture
//!
//! 1. **Sources**: discover article URLs, fetch and clean them, or load
//!    pre-fetched documents ([`sources`])
//! 2. **Extraction**: match, contextualize, and score candidate claims
//!    ([`extract`])
//! 3. **Deduplication**: fingerprint accepted claims against a persisted
//!    index ([`dedup`])
//! 4. **Output**: append records to CSV and write a run report ([`outputs`])
//!
//! [`pipeline::ExtractionPipeline`] ties stages 2 to 4 together.

pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod sources;
pub mod utils;

pub use config::ExtractionConfig;
pub use dedup::FingerprintIndex;
pub use error::ClaimError;
pub use models::{ClaimRecord, Direction, FetchedDocument, TimeUnit, Unit};
pub use pipeline::{BatchReport, ExtractionPipeline};
