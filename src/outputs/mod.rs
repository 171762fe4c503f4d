//! Destinations for extracted claims and run summaries.
//!
//! # Submodules
//!
//! - [`csv`]: Appends [`ClaimRecord`]s to a CSV file, one row per claim
//! - [`json`]: Writes the [`BatchReport`](crate::pipeline::BatchReport) of a run
//!
//! # Output Structure
//!
//! ```text
//! claims.csv                 # appended across runs
//! report_dir/
//! └── 2025-05-06/
//!     ├── morning-071502.json
//!     └── afternoon-134010.json
//! ```

pub mod csv;
pub mod json;

use crate::error::ClaimError;
use crate::models::ClaimRecord;

/// Where accepted records go.
///
/// The pipeline calls [`emit`](RecordSink::emit) once per accepted record
/// and [`flush`](RecordSink::flush) after each document. A failed `emit`
/// means the record was not persisted.
pub trait RecordSink {
    fn emit(&mut self, record: &ClaimRecord) -> Result<(), ClaimError>;

    fn flush(&mut self) -> Result<(), ClaimError> {
        Ok(())
    }
}

impl RecordSink for Vec<ClaimRecord> {
    fn emit(&mut self, record: &ClaimRecord) -> Result<(), ClaimError> {
        self.push(record.clone());
        Ok(())
    }
}
