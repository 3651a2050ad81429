//! Error types for the fetch module.
//!
//! Every variant carries the URL or filename it concerns, so a failure
//! recorded deep inside a sync run can still be traced back to its document.

use thiserror::Error;

use crate::validate::ValidationError;

/// Errors that can occur while fetching a single remote resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP status other than 429.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// HTTP 429 from the mirror host.
    #[error("rate limited fetching {url}")]
    RateLimited {
        /// The URL that was rate limited.
        url: String,
        /// The raw Retry-After header value, if present.
        retry_after: Option<String>,
    },

    /// The response body could not be read as text.
    #[error("failed to read body of {url}: {source}")]
    Body {
        /// The URL whose body failed.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The body arrived but is not plausible documentation.
    #[error("invalid content from {url}: {source}")]
    Validation {
        /// The URL whose content was rejected.
        url: String,
        /// Why the content was rejected.
        #[source]
        source: ValidationError,
    },

    /// Every attempt failed; `source` is the last attempt's error.
    #[error("failed to fetch {filename} after {attempts} attempts: {source}")]
    Exhausted {
        /// Local filename the document would have been written to.
        filename: String,
        /// Number of attempts made.
        attempts: u32,
        /// Error from the final attempt.
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    ///
    /// Timeouts are mapped to [`FetchError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            return Self::Timeout { url };
        }
        Self::Network { url, source }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a rate-limited error with the raw Retry-After header value.
    pub fn rate_limited(url: impl Into<String>, retry_after: Option<String>) -> Self {
        Self::RateLimited {
            url: url.into(),
            retry_after,
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Body {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a content validation error.
    pub fn validation(url: impl Into<String>, source: ValidationError) -> Self {
        Self::Validation {
            url: url.into(),
            source,
        }
    }

    /// Wraps the final attempt's error once the retry budget is spent.
    pub fn exhausted(filename: impl Into<String>, attempts: u32, last: FetchError) -> Self {
        Self::Exhausted {
            filename: filename.into(),
            attempts,
            source: Box::new(last),
        }
    }

    /// Returns true when the failure was a content rejection rather than a transport problem.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation { .. } => true,
            Self::Exhausted { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}
