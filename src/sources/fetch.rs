//! Article fetching with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`FetchAsync`]: Core trait: URL in, HTML out
//! - [`HttpFetcher`]: `reqwest` client with browser-like headers
//! - [`RetryFetch`]: Decorator that adds retry logic to any `FetchAsync` implementation
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```
//!
//! [`fetch_documents`] walks URLs one at a time with a polite pause between
//! them; a failed URL is logged and skipped.

use super::clean::parse_page;
use crate::error::ClaimError;
use crate::models::FetchedDocument;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::{Rng, rng};
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(25);

/// Pause between consecutive article fetches.
pub const POLITE_PAUSE: StdDuration = StdDuration::from_millis(1500);

/// Trait for async page fetching.
pub trait FetchAsync {
    /// Fetch `url` and return its body.
    async fn fetch(&self, url: &str) -> Result<String, ClaimError>;
}

/// Plain HTTP fetcher. Any status other than 200 is a failure.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ClaimError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://google.com/"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClaimError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

impl FetchAsync for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, ClaimError> {
        let t0 = Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClaimError::Fetch(e.to_string()))?;

        let status = resp.status();
        match status {
            StatusCode::OK => {}
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                warn!(%status, "Blocked by publisher");
                return Err(ClaimError::Fetch(format!("HTTP {status} (blocked)")));
            }
            _ => return Err(ClaimError::Fetch(format!("HTTP {status}"))),
        }

        let body = resp.text().await.map_err(|e| ClaimError::Fetch(e.to_string()))?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchAsync`] implementation.
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync,
{
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, ClaimError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Fetch and clean each URL in turn, pausing `pause` between requests.
///
/// Stops starting new fetches once `cancel` fires. Pages that fail to
/// download or yield no text are skipped.
#[instrument(level = "info", skip_all, fields(urls = urls.len()))]
pub async fn fetch_documents<F: FetchAsync>(
    fetcher: &F,
    urls: Vec<String>,
    pause: StdDuration,
    cancel: &CancellationToken,
) -> Vec<FetchedDocument> {
    let total = urls.len();
    let documents: Vec<FetchedDocument> = stream::iter(urls.into_iter().enumerate())
        .take_while(|_| std::future::ready(!cancel.is_cancelled()))
        .then(|(i, url)| async move {
            if i > 0 && !pause.is_zero() {
                sleep(pause).await;
            }
            match fetcher.fetch(&url).await {
                Ok(html) => {
                    let page = parse_page(&html);
                    let doc = page.to_document(&url, Utc::now());
                    if doc.is_none() {
                        warn!(%url, "Page produced no article text");
                    } else {
                        debug!(%url, title = ?page.title, "Fetched article");
                    }
                    doc
                }
                Err(e) => {
                    error!(error = %e, %url, "Article fetch failed");
                    None
                }
            }
        })
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(requested = total, fetched = documents.len(), "Fetched article contents");
    documents
}
