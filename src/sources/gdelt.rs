//! URL discovery through the GDELT DOC 2.0 API.
//!
//! GDELT limits query length, so discovery runs several short queries from
//! the most specific to the most general and merges their URLs in order,
//! stopping once enough unique URLs are found. A failing query is retried and
//! then skipped; discovery fails only when no query produced anything.

use crate::error::ClaimError;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

pub const ENDPOINT: &str = "https://api.gdeltproject.org/api/v2/doc/doc";

/// Articles returned per query; GDELT caps `artlist` at 250.
pub const MAX_RECORDS: usize = 250;

pub const QUERIES: &[&str] = &[
    r#"("generative AI" OR "AI adoption") (productivity OR "time saved" OR efficiency) sourcecountry:unitedstates"#,
    r#""AI adoption" productivity sourcecountry:unitedstates"#,
    r#""generative AI" "time saved" sourcecountry:unitedstates"#,
    r#""AI adoption" "documentation burden" time saved sourcecountry:unitedstates"#,
];

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub max_urls: usize,
    /// GDELT timespan, e.g. `1y`, `6m`, `2w`.
    pub timespan: String,
    /// Attempts per query.
    pub retries: usize,
    pub retry_pause: StdDuration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_urls: 300,
            timespan: "1y".to_string(),
            retries: 3,
            retry_pause: StdDuration::from_secs(2),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArtList {
    #[serde(default)]
    articles: Option<Vec<ArtListEntry>>,
}

#[derive(Debug, Deserialize)]
struct ArtListEntry {
    #[serde(default)]
    url: Option<String>,
}

pub fn build_query_url(query: &str, timespan: &str) -> String {
    format!(
        "{ENDPOINT}?query={}&mode=artlist&format=json&sort=datedesc&maxrecords={MAX_RECORDS}&timespan={}",
        urlencoding::encode(query),
        urlencoding::encode(timespan)
    )
}

/// Article URLs from an `artlist` response, trimmed, in response order.
pub fn parse_artlist(body: &str) -> Result<Vec<String>, ClaimError> {
    let list: ArtList = serde_json::from_str(body)?;
    Ok(list
        .articles
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect())
}

/// Append `more` to `urls`, keeping first occurrences and at most `max`.
fn merge_unique(urls: Vec<String>, more: Vec<String>, max: usize) -> Vec<String> {
    urls.into_iter().chain(more).unique().take(max).collect()
}

#[instrument(level = "info", skip_all, fields(query = %query))]
async fn run_query(
    client: &Client,
    query: &str,
    timespan: &str,
) -> Result<Vec<String>, ClaimError> {
    let resp = client
        .get(build_query_url(query, timespan))
        .send()
        .await
        .map_err(|e| ClaimError::Fetch(e.to_string()))?;

    let status = resp.status();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();
    let body = resp.text().await.map_err(|e| ClaimError::Fetch(e.to_string()))?;

    if !status.is_success() || !content_type.contains("json") {
        return Err(ClaimError::Fetch(format!(
            "GDELT not JSON: status={status}, type={content_type}, preview={:?}",
            truncate_for_log(&body, 200)
        )));
    }
    parse_artlist(&body)
}

/// Discover up to `options.max_urls` unique article URLs.
#[instrument(
    level = "info",
    skip_all,
    fields(max_urls = options.max_urls, timespan = %options.timespan)
)]
pub async fn discover_urls(options: &DiscoveryOptions) -> Result<Vec<String>, ClaimError> {
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ClaimError::Fetch(e.to_string()))?;

    let mut urls = Vec::new();
    for query in QUERIES {
        for attempt in 1..=options.retries.max(1) {
            match run_query(&client, query, &options.timespan).await {
                Ok(found) => {
                    debug!(attempt, count = found.len(), "GDELT query succeeded");
                    urls = merge_unique(urls, found, options.max_urls);
                    break;
                }
                Err(e) => {
                    warn!(attempt, max = options.retries, error = %e, "GDELT query failed");
                    if attempt < options.retries {
                        sleep(options.retry_pause).await;
                    }
                }
            }
        }
        if urls.len() >= options.max_urls {
            break;
        }
    }

    if urls.is_empty() {
        return Err(ClaimError::Fetch(
            "no URLs discovered from GDELT; try a shorter timespan such as 6m".to_string(),
        ));
    }
    info!(count = urls.len(), "Discovered article URLs");
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_url_encodes_query() {
        let url = build_query_url(r#""AI adoption" productivity"#, "1y");
        assert!(url.starts_with(ENDPOINT));
        assert!(url.contains("?query=%22AI%20adoption%22%20productivity&"));
        assert!(url.contains("mode=artlist"));
        assert!(url.contains("maxrecords=250"));
        assert!(url.ends_with("timespan=1y"));
    }

    #[test]
    fn test_parse_artlist() {
        let body = r#"{"articles": [
            {"url": " https://a.com/1 ", "title": "One"},
            {"title": "no url"},
            {"url": ""},
            {"url": "https://b.com/2"}
        ]}"#;
        assert_eq!(parse_artlist(body).unwrap(), vec!["https://a.com/1", "https://b.com/2"]);
    }

    #[test]
    fn test_parse_empty_artlist() {
        assert!(parse_artlist("{}").unwrap().is_empty());
        assert!(matches!(parse_artlist("<html>"), Err(ClaimError::Json(_))));
    }

    #[test]
    fn test_merge_unique_keeps_order_and_cap() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["y".to_string(), "z".to_string(), "w".to_string()];
        assert_eq!(merge_unique(a.clone(), b.clone(), 10), vec!["x", "y", "z", "w"]);
        assert_eq!(merge_unique(a, b, 3), vec!["x", "y", "z"]);
    }
}
