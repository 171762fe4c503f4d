//! JSON run reports.
//!
//! Each run writes its [`BatchReport`] next to earlier ones, grouped by date:
//! ```text
//! report_dir/
//! └── 2025-05-06/
//!     ├── morning-071502.json
//!     └── evening-190233.json
//! ```
//!
//! The time-of-day prefix matches the edition naming used elsewhere; the
//! `HHMMSS` suffix keeps several runs in one slot from overwriting each other.

use crate::error::ClaimError;
use crate::pipeline::BatchReport;
use crate::utils::classify_time_of_day;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Report file wrapper: when the run finished plus what it did.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    finished_at: DateTime<Local>,
    time_of_day: &'static str,
    #[serde(flatten)]
    batch: &'a BatchReport,
}

/// Path a report finished at `at` is written to.
pub fn report_path(report_dir: &str, at: DateTime<Local>) -> PathBuf {
    let slot = classify_time_of_day(at.time());
    PathBuf::from(report_dir)
        .join(at.date_naive().to_string())
        .join(format!("{}-{}.json", slot, at.format("%H%M%S")))
}

/// Write `report` under `report_dir` and return the file path.
///
/// # Output Path
///
/// `{report_dir}/{date}/{time_of_day}-{HHMMSS}.json`
#[instrument(level = "info", skip_all, fields(report_dir = %report_dir))]
pub async fn write_run_report(
    report: &BatchReport,
    report_dir: &str,
) -> Result<PathBuf, ClaimError> {
    write_run_report_at(report, report_dir, Local::now()).await
}

async fn write_run_report_at(
    report: &BatchReport,
    report_dir: &str,
    at: DateTime<Local>,
) -> Result<PathBuf, ClaimError> {
    let wrapped = RunReport {
        finished_at: at,
        time_of_day: classify_time_of_day(at.time()),
        batch: report,
    };
    let json = serde_json::to_string_pretty(&wrapped)?;

    let path = report_path(report_dir, at);
    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring report directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create report dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote run report");
    Ok(path)
}
