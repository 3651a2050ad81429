//! HTTP client wrapper for mirror requests.
//!
//! This module provides the `HttpClient` struct which performs single GET
//! requests for sitemaps, pages and the changelog, with cache-busting headers
//! and bounded timeouts. It never retries; see
//! [`RetryingFetcher`](super::RetryingFetcher) for that.

use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, EXPIRES, HeaderMap, HeaderValue, PRAGMA, RETRY_AFTER};
use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};
use url::Url;

use super::FetchError;
use crate::user_agent;

/// Default HTTP connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout (30 seconds; documents are small).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// HTTP client for mirror requests.
///
/// Create once per run and reuse it so connections are pooled.
///
/// # Example
///
/// ```no_run
/// use docmirror_core::fetch::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let body = client.get_text("https://docs.example.com/sitemap.xml").await?;
/// println!("{} bytes", body.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be constructed
    /// (for example, no TLS backend is available).
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be constructed.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .default_headers(cache_busting_headers())
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()?;
        Ok(Self { client })
    }

    /// Performs one GET request and returns the body as text.
    ///
    /// Redirects are followed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::RateLimited`] for HTTP 429 (carrying the raw
    /// Retry-After value), [`FetchError::HttpStatus`] for any other non-2xx
    /// status, and network, timeout or body errors otherwise.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        debug!(status = status.as_u16(), "response received");

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            return Err(FetchError::rate_limited(url, retry_after));
        }

        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        response.text().await.map_err(|e| FetchError::body(url, e))
    }
}

fn cache_busting_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers
}
