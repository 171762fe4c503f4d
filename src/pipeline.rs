//! The extraction pipeline: matcher → context → relevance → dedup → emit.
//!
//! [`ExtractionPipeline::process`] handles one document synchronously.
//! [`ExtractionPipeline::run_batch`] fans documents out over a worker pool,
//! hands accepted records to a [`RecordSink`], and keeps going when single
//! documents fail.

use crate::config::ExtractionConfig;
use crate::dedup::{FingerprintIndex, fingerprint};
use crate::error::ClaimError;
use crate::extract::{
    ClaimMatcher, ContextExtractor, RelevanceFilter, RuleSegmenter, Segmenter,
};
use crate::models::{ClaimRecord, FetchedDocument, ScoredClaim};
use crate::outputs::RecordSink;
use crate::utils::domain_of;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// A document that could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub url: String,
    pub domain: String,
    pub reason: String,
}

/// Outcome of one [`ExtractionPipeline::run_batch`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub documents_total: usize,
    pub documents_processed: usize,
    /// Documents never started because the run was cancelled.
    pub documents_skipped: usize,
    pub records_emitted: usize,
    /// Records the sink rejected; their fingerprints were released.
    pub sink_failures: usize,
    pub cancelled: bool,
    pub elapsed_ms: u64,
    pub failures: Vec<DocumentFailure>,
}

/// Records accepted into the index but not yet returned.
///
/// If a worker panics mid-document, the fingerprints accepted so far are
/// released so those claims can be emitted by a later run.
struct Accepted<'a> {
    index: &'a FingerprintIndex,
    records: Vec<ClaimRecord>,
}

impl Drop for Accepted<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            for record in &self.records {
                self.index.release(&record.fingerprint);
            }
        }
    }
}

/// Composes the extraction stages around a shared [`FingerprintIndex`].
#[derive(Debug)]
pub struct ExtractionPipeline {
    config: ExtractionConfig,
    segmenter: Arc<dyn Segmenter>,
    matcher: ClaimMatcher,
    extractor: ContextExtractor,
    filter: RelevanceFilter,
    index: Arc<FingerprintIndex>,
}

impl ExtractionPipeline {
    /// Build a pipeline with the rule-based segmenter.
    ///
    /// Fails with [`ClaimError::Configuration`] when `config` is invalid.
    pub fn new(
        config: ExtractionConfig,
        index: Arc<FingerprintIndex>,
    ) -> Result<Self, ClaimError> {
        Self::with_segmenter(config, index, Arc::new(RuleSegmenter::new()))
    }

    pub fn with_segmenter(
        config: ExtractionConfig,
        index: Arc<FingerprintIndex>,
        segmenter: Arc<dyn Segmenter>,
    ) -> Result<Self, ClaimError> {
        config.validate()?;
        Ok(Self {
            matcher: ClaimMatcher::new(config.percent_ceiling, Arc::clone(&segmenter)),
            extractor: ContextExtractor::new(config.snippet_max_chars),
            filter: RelevanceFilter::new(),
            segmenter,
            index,
            config,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<FingerprintIndex> {
        &self.index
    }

    /// Every claim in `document` that clears the threshold and has not been
    /// emitted before.
    #[instrument(level = "debug", skip_all, fields(url = %document.url))]
    pub fn process(&self, document: &FetchedDocument) -> Result<Vec<ClaimRecord>, ClaimError> {
        let domain = self.check_document(document)?;
        let text = document.cleaned_text.as_str();
        let sentences = self.segmenter.segment(text);
        let limit = match self.config.max_records_per_document {
            0 => usize::MAX,
            n => n,
        };

        let mut accepted = Accepted {
            index: &self.index,
            records: Vec::new(),
        };
        // Readings of one number share a start offset and arrive together;
        // the best-scoring one stands for the number, earliest on ties.
        let readings = self
            .matcher
            .scan_with(text, &sentences)
            .map(|candidate| {
                self.filter
                    .score(self.extractor.extract(text, &sentences, candidate))
            })
            .chunk_by(|scored| scored.claim.candidate.span_start);

        for (_, group) in &readings {
            if accepted.records.len() >= limit {
                debug!(limit, "Per-document record limit reached");
                break;
            }

            let Some(scored) = group.reduce(|best, next| {
                if next.confidence > best.confidence { next } else { best }
            }) else {
                continue;
            };
            if scored.confidence < self.config.confidence_threshold {
                debug!(
                    raw = %scored.claim.candidate.raw_text,
                    confidence = scored.confidence,
                    "Below threshold"
                );
                continue;
            }

            let record = self.materialize(document, &domain, scored);
            if self.index.accept(&record.fingerprint) {
                accepted.records.push(record);
            } else {
                debug!(fingerprint = %record.fingerprint, "Duplicate claim suppressed");
            }
        }

        Ok(std::mem::take(&mut accepted.records))
    }

    fn check_document(&self, document: &FetchedDocument) -> Result<String, ClaimError> {
        if document.url.trim().is_empty() {
            return Err(ClaimError::document(
                &document.url,
                &document.domain,
                "document has no url",
            ));
        }
        let chars = document.cleaned_text.chars().count();
        if chars > self.config.max_document_chars {
            return Err(ClaimError::document(
                &document.url,
                &document.domain,
                format!(
                    "text too long: {chars} chars (max {})",
                    self.config.max_document_chars
                ),
            ));
        }

        let domain = match document.domain.trim() {
            "" => domain_of(&document.url),
            d => d.to_string(),
        };
        if domain.is_empty() {
            return Err(ClaimError::document(
                &document.url,
                &document.domain,
                "no domain and url has no host",
            ));
        }
        Ok(domain)
    }

    fn materialize(
        &self,
        document: &FetchedDocument,
        domain: &str,
        scored: ScoredClaim,
    ) -> ClaimRecord {
        let candidate = &scored.claim.candidate;
        let fingerprint = fingerprint(
            domain,
            candidate.quantity,
            candidate.unit,
            candidate.direction,
            &scored.claim.context_snippet,
            self.config.fingerprint_precision,
        );

        ClaimRecord {
            source_url: document.url.clone(),
            domain: domain.to_string(),
            quantity: candidate.quantity,
            unit: candidate.unit,
            direction: candidate.direction,
            confidence: (scored.confidence * 1000.0).round() / 1000.0,
            context_snippet: scored.claim.context_snippet,
            fingerprint,
            extracted_at: Utc::now(),
        }
    }

    /// Process `documents` on up to `workers` blocking threads, emitting
    /// records to `sink` as each document finishes.
    ///
    /// Once `cancel` fires no further documents are started; documents
    /// already in flight finish and their records are emitted.
    #[instrument(level = "info", skip_all, fields(documents = documents.len()))]
    pub async fn run_batch<S: RecordSink>(
        self: &Arc<Self>,
        documents: Vec<FetchedDocument>,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let started = Instant::now();
        let mut report = BatchReport {
            documents_total: documents.len(),
            ..BatchReport::default()
        };
        info!(workers = self.config.workers, "Starting parallel claim extraction");

        let mut outcomes = stream::iter(documents)
            .take_while(|_| std::future::ready(!cancel.is_cancelled()))
            .map(|document| {
                let pipeline = Arc::clone(self);
                async move {
                    let url = document.url.clone();
                    let domain = document.domain.clone();
                    let joined =
                        tokio::task::spawn_blocking(move || pipeline.process(&document)).await;
                    let outcome = joined.unwrap_or_else(|e| {
                        Err(ClaimError::document(&url, &domain, format!("worker panicked: {e}")))
                    });
                    (url, domain, outcome)
                }
            })
            .buffer_unordered(self.config.workers);

        while let Some((url, domain, outcome)) = outcomes.next().await {
            match outcome {
                Ok(records) => {
                    report.documents_processed += 1;
                    debug!(%url, count = records.len(), "Document processed");
                    self.emit_all(records, sink, &mut report);
                }
                Err(e) => {
                    warn!(%url, %domain, error = %e, "Document failed; continuing with the batch");
                    report.failures.push(DocumentFailure {
                        url,
                        domain,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.cancelled = cancel.is_cancelled();
        report.documents_skipped =
            report.documents_total - report.documents_processed - report.failures.len();
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            total = report.documents_total,
            processed = report.documents_processed,
            failed = report.failures.len(),
            skipped = report.documents_skipped,
            records = report.records_emitted,
            cancelled = report.cancelled,
            "Completed claim extraction"
        );
        report
    }

    /// Emit then flush. Records only count as emitted once the flush
    /// succeeds; otherwise their fingerprints are released.
    fn emit_all<S: RecordSink>(
        &self,
        records: Vec<ClaimRecord>,
        sink: &mut S,
        report: &mut BatchReport,
    ) {
        let mut unflushed = Vec::with_capacity(records.len());
        for record in records {
            match sink.emit(&record) {
                Ok(()) => unflushed.push(record.fingerprint),
                Err(e) => {
                    self.index.release(&record.fingerprint);
                    report.sink_failures += 1;
                    error!(
                        fingerprint = %record.fingerprint,
                        error = %e,
                        "Sink rejected record; fingerprint released"
                    );
                }
            }
        }

        match sink.flush() {
            Ok(()) => report.records_emitted += unflushed.len(),
            Err(e) => {
                for fingerprint in &unflushed {
                    self.index.release(fingerprint);
                }
                report.sink_failures += unflushed.len();
                error!(
                    count = unflushed.len(),
                    error = %e,
                    "Sink flush failed; fingerprints released"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, TimeUnit, Unit};

    fn document(url: &str, text: &str) -> FetchedDocument {
        FetchedDocument {
            url: url.to_string(),
            domain: domain_of(url),
            fetched_at: Utc::now(),
            cleaned_text: text.to_string(),
        }
    }

    fn pipeline() -> ExtractionPipeline {
        let index = Arc::new(FingerprintIndex::new());
        ExtractionPipeline::new(ExtractionConfig::default(), index).unwrap()
    }

    #[test]
    fn test_time_saved_scenario_emits_record() {
        let doc = document(
            "https://news.example.com/a",
            "Company X reported saving 3 hours per week after adopting the tool.",
        );
        let records = pipeline().process(&doc).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.quantity, 3.0);
        assert_eq!(record.unit, Unit::Time(TimeUnit::Hours));
        assert_eq!(record.direction, Direction::Unspecified);
        assert_eq!(
            record.context_snippet,
            "Company X reported saving 3 hours per week after adopting the tool."
        );
        assert!(record.confidence > 0.5);
        assert_eq!(record.domain, "news.example.com");
        assert_eq!(record.fingerprint.len(), 64);
    }

    #[test]
    fn test_negated_claim_is_not_emitted() {
        let doc = document("https://a.com/x", "It was not faster, with no measurable 10% gain.");
        assert!(pipeline().process(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_above_ceiling_is_not_emitted() {
        let doc = document(
            "https://a.com/x",
            "After adopting the AI tool, staff productivity increased by 1500%.",
        );
        assert!(pipeline().process(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_threshold_filters_monotonically() {
        let text = "The rollout increased productivity by 25% across teams. Turnout was 40% in the city.";
        let doc = document("https://a.com/x", text);

        let lenient = ExtractionConfig {
            confidence_threshold: 0.0,
            ..ExtractionConfig::default()
        };
        let all = ExtractionPipeline::new(lenient, Arc::new(FingerprintIndex::new()))
            .unwrap()
            .process(&doc)
            .unwrap();
        assert_eq!(all.len(), 2);

        let strict = pipeline().process(&doc).unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].quantity, 25.0);
        assert!(strict.iter().all(|r| r.confidence >= 0.5));
    }

    #[test]
    fn test_second_pass_emits_nothing() {
        let p = pipeline();
        let doc = document(
            "https://a.com/x",
            "Company X reported saving 3 hours per week after adopting the tool.",
        );
        assert_eq!(p.process(&doc).unwrap().len(), 1);
        assert!(p.process(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_same_claim_on_another_domain_is_kept() {
        let p = pipeline();
        let text = "Company X reported saving 3 hours per week after adopting the tool.";
        assert_eq!(p.process(&document("https://a.com/x", text)).unwrap().len(), 1);
        assert_eq!(p.process(&document("https://b.com/x", text)).unwrap().len(), 1);
    }

    #[test]
    fn test_per_document_limit() {
        let config = ExtractionConfig {
            max_records_per_document: 2,
            ..ExtractionConfig::default()
        };
        let p = ExtractionPipeline::new(config, Arc::new(FingerprintIndex::new())).unwrap();
        let text = "Staff saved 1 hour daily. Staff saved 2 hours weekly. Staff saved 3 hours monthly.";
        assert_eq!(p.process(&document("https://a.com/x", text)).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ExtractionConfig {
            confidence_threshold: 2.0,
            ..ExtractionConfig::default()
        };
        let result = ExtractionPipeline::new(config, Arc::new(FingerprintIndex::new()));
        assert!(matches!(result, Err(ClaimError::Configuration(_))));
    }

    #[test]
    fn test_document_without_url_fails() {
        let doc = document("", "Staff saved 3 hours.");
        assert!(matches!(
            pipeline().process(&doc),
            Err(ClaimError::DocumentProcessingFailure { .. })
        ));
    }

    #[test]
    fn test_missing_domain_is_derived_from_url() {
        let mut doc = document("https://www.example.org/a", "Staff saved 3 hours with the tool.");
        doc.domain = String::new();
        let records = pipeline().process(&doc).unwrap();
        assert_eq!(records[0].domain, "www.example.org");
    }

    #[tokio::test]
    async fn test_batch_continues_past_failures() {
        let config = ExtractionConfig {
            max_document_chars: 200,
            workers: 2,
            ..ExtractionConfig::default()
        };
        let index = Arc::new(FingerprintIndex::new());
        let p = Arc::new(ExtractionPipeline::new(config, index).unwrap());
        let docs = vec![
            document(
                "https://a.com/1",
                "Company X reported saving 3 hours per week after adopting the tool.",
            ),
            document("https://a.com/2", &"Too long. ".repeat(50)),
            document(
                "https://b.com/3",
                "Clinicians saved 2 hours a day on documentation with the AI tool.",
            ),
        ];

        let mut sink: Vec<ClaimRecord> = Vec::new();
        let report = p.run_batch(docs, &mut sink, &CancellationToken::new()).await;

        assert_eq!(report.documents_total, 3);
        assert_eq!(report.documents_processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].url, "https://a.com/2");
        assert_eq!(report.records_emitted, 2);
        assert_eq!(sink.len(), 2);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_batch_starts_nothing() {
        let p = Arc::new(pipeline());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let docs = vec![document("https://a.com/1", "Staff saved 3 hours with the tool.")];
        let mut sink: Vec<ClaimRecord> = Vec::new();
        let report = p.run_batch(docs, &mut sink, &cancel).await;

        assert!(report.cancelled);
        assert_eq!(report.documents_skipped, 1);
        assert!(sink.is_empty());
        assert!(p.index().is_empty());
    }

    struct RejectingSink;

    impl RecordSink for RejectingSink {
        fn emit(&mut self, _record: &ClaimRecord) -> Result<(), ClaimError> {
            Err(ClaimError::Io(std::io::Error::other("disk full")))
        }
    }

    #[tokio::test]
    async fn test_sink_failure_releases_fingerprint() {
        let p = Arc::new(pipeline());
        let docs = vec![document("https://a.com/1", "Staff saved 3 hours with the tool.")];
        let report = p.run_batch(docs, &mut RejectingSink, &CancellationToken::new()).await;

        assert_eq!(report.sink_failures, 1);
        assert_eq!(report.records_emitted, 0);
        assert!(p.index().is_empty());
    }

    /// Buffers records but can never write them out.
    #[derive(Default)]
    struct UnflushableSink {
        buffered: Vec<ClaimRecord>,
    }

    impl RecordSink for UnflushableSink {
        fn emit(&mut self, record: &ClaimRecord) -> Result<(), ClaimError> {
            self.buffered.push(record.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ClaimError> {
            Err(ClaimError::Io(std::io::Error::other("disk full")))
        }
    }

    #[tokio::test]
    async fn test_flush_failure_releases_fingerprints() {
        let p = Arc::new(pipeline());
        let docs = vec![document("https://a.com/1", "Staff saved 3 hours with the tool.")];
        let mut sink = UnflushableSink::default();
        let report = p.run_batch(docs, &mut sink, &CancellationToken::new()).await;

        assert_eq!(sink.buffered.len(), 1);
        assert_eq!(report.records_emitted, 0);
        assert_eq!(report.sink_failures, 1);
        assert!(p.index().is_empty());
    }

    #[tokio::test]
    async fn test_second_run_after_save_and_load_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.txt");
        let doc = document(
            "https://a.com/x",
            "Company X reported saving 3 hours per week after adopting the tool.",
        );

        let first = pipeline();
        assert_eq!(first.process(&doc).unwrap().len(), 1);
        first.index().save(&path).await.unwrap();

        let index = Arc::new(FingerprintIndex::load(&path).await.unwrap());
        let second = ExtractionPipeline::new(ExtractionConfig::default(), index).unwrap();
        assert!(second.process(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_one_record_per_number_with_two_unit_readings() {
        let config = ExtractionConfig {
            confidence_threshold: 0.0,
            ..ExtractionConfig::default()
        };
        let p = ExtractionPipeline::new(config, Arc::new(FingerprintIndex::new())).unwrap();
        let text = "Approval rose 5 percentage points after the AI tool rollout.";
        let records = p.process(&document("https://a.com/x", text)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].unit, Unit::PercentagePoints);
        assert_eq!(records[0].direction, Direction::Increase);
    }

    #[test]
    fn test_document_limit_counts_characters() {
        let config = ExtractionConfig {
            max_document_chars: 40,
            ..ExtractionConfig::default()
        };
        let p = ExtractionPipeline::new(config, Arc::new(FingerprintIndex::new())).unwrap();
        // 38 characters, 58 bytes.
        let text = "é".repeat(20) + " saved 3 hours ok.";
        assert!(text.len() > 40 && text.chars().count() <= 40);
        assert!(p.process(&document("https://a.com/x", &text)).is_ok());
    }
}
