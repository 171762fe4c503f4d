//! CSV sink for claim records.
//!
//! Columns follow [`ClaimRecord`]'s field order:
//!
//! ```text
//! source_url,domain,quantity,unit,direction,context_snippet,confidence,fingerprint,extracted_at
//! ```
//!
//! Opening an existing, non-empty file appends rows without repeating the
//! header, so one file accumulates claims across runs.

use super::RecordSink;
use crate::error::ClaimError;
use crate::models::ClaimRecord;
use csv::{Writer, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use tracing::{info, instrument};

pub struct CsvSink {
    writer: Writer<File>,
    rows: usize,
}

impl CsvSink {
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClaimError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let has_rows = fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = WriterBuilder::new().has_headers(!has_rows).from_writer(file);
        info!(appending = has_rows, "Opened CSV sink");

        Ok(Self { writer, rows: 0 })
    }

    /// Rows written through this sink.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl RecordSink for CsvSink {
    fn emit(&mut self, record: &ClaimRecord) -> Result<(), ClaimError> {
        self.writer.serialize(record)?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ClaimError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Unit};
    use chrono::{TimeZone, Utc};

    fn record(fingerprint: &str) -> ClaimRecord {
        ClaimRecord {
            source_url: "https://example.com/a".to_string(),
            domain: "example.com".to_string(),
            quantity: 25.0,
            unit: Unit::Percent,
            direction: Direction::Increase,
            context_snippet: "Acme said output rose 25%, a \"record\".".to_string(),
            confidence: 0.75,
            fingerprint: fingerprint.to_string(),
            extracted_at: Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_new_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/claims.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.emit(&record("f1")).unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.rows(), 1);

        let body = std::fs::read_to_string(&path).unwrap();
        let mut lines = body.lines();
        assert_eq!(
            lines.next().unwrap(),
            "source_url,domain,quantity,unit,direction,context_snippet,confidence,fingerprint,extracted_at"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("https://example.com/a,example.com,25.0,percent,increase,"));
        assert!(row.contains("\"Acme said output rose 25%, a \"\"record\"\".\""));
    }

    #[test]
    fn test_reopen_appends_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claims.csv");

        for fp in ["f1", "f2"] {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.emit(&record(fp)).unwrap();
            sink.flush().unwrap();
        }

        let mut reader = ::csv::Reader::from_path(&path).unwrap();
        let rows: Vec<ClaimRecord> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fingerprint, "f1");
        assert_eq!(rows[1].fingerprint, "f2");
        assert_eq!(rows[1].unit, Unit::Percent);
    }
}
