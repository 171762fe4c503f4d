//! Utility functions for text normalization, time classification, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace collapsing shared by cleaning, context extraction, and fingerprints
//! - Domain extraction from article URLs
//! - String truncation for logging
//! - Time-of-day classification for report naming
//! - File system validation for output directories

use chrono::{NaiveTime, Timelike};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Collapse every run of whitespace to a single space and trim the ends.
///
/// # Examples
///
/// ```
/// use claim_sieve::utils::collapse_whitespace;
/// assert_eq!(collapse_whitespace("  saved\n\n 3\thours "), "saved 3 hours");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased host of `url`, or an empty string when it does not parse.
///
/// # Examples
///
/// ```
/// use claim_sieve::utils::domain_of;
/// assert_eq!(domain_of("https://WWW.Example.com/a?b=1"), "www.example.com");
/// assert_eq!(domain_of("not a url"), "");
/// ```
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and a byte
/// count indicator appended. Cuts always land on a character boundary.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Classify a time of day into morning, afternoon, or evening.
///
/// The time boundaries are:
/// - **Morning**: 00:00 - 08:00
/// - **Afternoon**: 08:00 - 16:00
/// - **Evening**: 16:00 - 24:00
pub fn classify_time_of_day(tod: NaiveTime) -> &'static str {
    match tod.hour() {
        0..=7 => "morning",
        8..=15 => "afternoon",
        _ => "evening",
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let scratch_path = format!("{}/..__write_check__", path.trim_end_matches('/'));
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("Alpha\n\n  Beta\tGamma"), "Alpha Beta Gamma");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://lite.cnn.com/2025/05/06/article"), "lite.cnn.com");
        assert_eq!(domain_of("http://Example.COM"), "example.com");
        assert_eq!(domain_of(""), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "é".repeat(10);
        let result = truncate_for_log(&s, 3);
        assert!(result.starts_with("ééé…"));
    }

    #[test]
    fn test_classify_time_of_day() {
        let at = |h| NaiveTime::from_hms_opt(h, 30, 0).unwrap();
        assert_eq!(classify_time_of_day(at(6)), "morning");
        assert_eq!(classify_time_of_day(at(12)), "afternoon");
        assert_eq!(classify_time_of_day(at(20)), "evening");
        assert_eq!(classify_time_of_day(NaiveTime::from_hms_opt(8, 0, 0).unwrap()), "afternoon");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports/nested");
        let nested = nested.to_str().unwrap();
        ensure_writable_dir(nested).await.unwrap();
        assert!(std::path::Path::new(nested).is_dir());
    }
}
