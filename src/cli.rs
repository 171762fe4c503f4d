//! Command-line interface definitions for Claim Sieve.
//!
//! Paths can be provided via command-line flags or environment variables.

use claim_sieve::config::ExtractionConfig;
use clap::Parser;

/// Command-line arguments for the Claim Sieve application.
///
/// Without `--input`, articles are discovered through GDELT and fetched
/// before extraction.
///
/// # Examples
///
/// ```sh
/// # Discover, fetch, and extract into claims.csv
/// claim_sieve -o ./claims.csv
///
/// # Extract from pre-fetched documents with a stricter threshold
/// claim_sieve -i ./docs.jsonl -o ./claims.csv --threshold 0.7
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON-lines file of fetched documents; skips discovery and fetching
    #[arg(short, long, env = "CLAIM_SIEVE_INPUT")]
    pub input: Option<String>,

    /// CSV file claims are appended to
    #[arg(short, long, env = "CLAIM_SIEVE_OUTPUT", default_value = "claims.csv")]
    pub output: String,

    /// Fingerprint index persisted between runs
    #[arg(long, env = "CLAIM_SIEVE_INDEX", default_value = "fingerprints.txt")]
    pub index: String,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "CLAIM_SIEVE_CONFIG")]
    pub config: Option<String>,

    /// Output directory for JSON run reports
    #[arg(short, long, env = "CLAIM_SIEVE_REPORT_DIR", default_value = "reports")]
    pub report_dir: String,

    /// Override the confidence threshold from the config file
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Override the number of extraction workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Maximum URLs to discover
    #[arg(long, default_value_t = 300)]
    pub max_urls: usize,

    /// GDELT timespan for discovery, e.g. 1y, 6m, 2w
    #[arg(long, default_value = "1y")]
    pub timespan: String,
}

impl Cli {
    /// Apply command-line overrides on top of file configuration.
    pub fn apply_overrides(&self, config: &mut ExtractionConfig) {
        if let Some(threshold) = self.threshold {
            config.confidence_threshold = threshold;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
    }
}
