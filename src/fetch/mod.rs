//! HTTP fetching of mirror documents.
//!
//! # Features
//!
//! - Cache-busting GET requests with an identifying User-Agent
//! - Bounded exponential backoff with jitter
//! - Server-directed waits on HTTP 429 (`Retry-After`)
//! - Content validation inside the retry loop
//! - Deterministic identifier → filename mapping with collision detection
//!
//! # Example
//!
//! ```no_run
//! use docmirror_core::fetch::{HttpClient, RetryPolicy, RetryingFetcher};
//! use docmirror_core::validate::ContentValidator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = RetryingFetcher::new(
//!     HttpClient::new()?,
//!     RetryPolicy::default(),
//!     ContentValidator::default(),
//! );
//! let doc = fetcher
//!     .fetch_document("/en/docs/claude-code/hooks", "https://docs.anthropic.com")
//!     .await?;
//! println!("{} -> {} bytes", doc.filename, doc.content.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod fetcher;
mod filename;
mod retry;

pub use client::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpClient};
pub use error::FetchError;
pub use fetcher::{CHANGELOG_FILENAME, FetchedDocument, RetryingFetcher, changelog_header};
pub use filename::{FilenameCollision, find_filename_collisions, url_to_safe_filename};
pub use retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, DEFAULT_RETRY_AFTER,
    RetryDecision, RetryPolicy, parse_retry_after,
};
