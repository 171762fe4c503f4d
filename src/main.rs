//! # Claim Sieve
//!
//! Discovers news articles about AI adoption, extracts quantitative
//! productivity claims from them, and appends each new claim to a CSV file.
//!
//! ## Usage
//!
//! ```sh
//! claim_sieve -o ./claims.csv
//! claim_sieve -i ./docs.jsonl -o ./claims.csv
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: Query GDELT for article URLs (skipped with `--input`)
//! 2. **Fetching**: Download and clean each article
//! 3. **Extraction**: Match, score, and deduplicate claims (parallel, 12 workers by default)
//! 4. **Output**: Append CSV rows, save the fingerprint index, write a JSON run report

use claim_sieve::outputs::csv::CsvSink;
use claim_sieve::outputs::json;
use claim_sieve::sources::fetch::{self, HttpFetcher, RetryFetch};
use claim_sieve::sources::gdelt::{self, DiscoveryOptions};
use claim_sieve::sources::load_documents_jsonl;
use claim_sieve::utils::ensure_writable_dir;
use claim_sieve::{ExtractionConfig, ExtractionPipeline, FetchedDocument, FingerprintIndex};
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("claim_sieve starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Load & validate config ----
    let mut config = match &args.config {
        Some(path) => match ExtractionConfig::load(path).await {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path, error = %e, "Failed to load configuration");
                return Err(e.into());
            }
        },
        None => ExtractionConfig::default(),
    };
    args.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration; nothing was processed");
        return Err(e.into());
    }

    // Early check: ensure report dir is writable
    if let Err(e) = ensure_writable_dir(&args.report_dir).await {
        error!(
            path = %args.report_dir,
            error = %e,
            "Report directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let index = Arc::new(FingerprintIndex::load(&args.index).await?);
    let pipeline = Arc::new(ExtractionPipeline::new(config, Arc::clone(&index))?);

    // ---- Ctrl-C stops new work; in-flight documents finish ----
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; finishing in-flight documents");
                cancel.cancel();
            }
        });
    }

    // ---- Documents ----
    let documents = match collect_documents(&args, &cancel).await {
        Ok(documents) => documents,
        Err(e) => {
            error!(error = %e, "Failed to collect documents");
            return Err(e);
        }
    };
    info!(count = documents.len(), "Total documents to analyze");

    // ---- Extract ----
    let mut sink = CsvSink::open(&args.output)?;
    let report = pipeline.run_batch(documents, &mut sink, &cancel).await;
    info!(path = %args.output, rows = sink.rows(), "Appended claims to CSV");

    if let Err(e) = index.save(&args.index).await {
        error!(path = %args.index, error = %e, "Failed to save fingerprint index");
        return Err(e.into());
    }

    if let Err(e) = json::write_run_report(&report, &args.report_dir).await {
        error!(error = %e, "Failed to write run report");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        records = report.records_emitted,
        cancelled = report.cancelled,
        "Execution complete"
    );

    Ok(())
}

async fn collect_documents(
    args: &Cli,
    cancel: &CancellationToken,
) -> Result<Vec<FetchedDocument>, Box<dyn Error>> {
    if let Some(input) = &args.input {
        return Ok(load_documents_jsonl(input).await?);
    }

    let options = DiscoveryOptions {
        max_urls: args.max_urls,
        timespan: args.timespan.clone(),
        ..DiscoveryOptions::default()
    };
    let urls = gdelt::discover_urls(&options).await?;

    let fetcher = RetryFetch::new(HttpFetcher::new()?, 2, StdDuration::from_secs(1));
    Ok(fetch::fetch_documents(&fetcher, urls, fetch::POLITE_PAUSE, cancel).await)
}
