//! One logical fetch per document, retried with backoff.

use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::filename::url_to_safe_filename;
use super::retry::{RetryDecision, RetryPolicy};
use super::FetchError;
use crate::validate::{ContentValidator, ValidationProfile};

/// Local filename of the mirrored changelog.
pub const CHANGELOG_FILENAME: &str = "changelog.md";

/// A fetched and validated document, ready to hash and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Local filename derived from the identifier.
    pub filename: String,
    /// URL the content was fetched from.
    pub content_url: String,
    /// Validated content, exactly as it will be written.
    pub content: String,
}

/// Fetches documents with bounded retries and content validation.
///
/// Validation runs inside the retry loop: a placeholder page served with a
/// 200 is retried like a transient error.
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: HttpClient,
    policy: RetryPolicy,
    validator: ContentValidator,
}

impl RetryingFetcher {
    /// Creates a fetcher over a shared client.
    #[must_use]
    pub fn new(client: HttpClient, policy: RetryPolicy, validator: ContentValidator) -> Self {
        Self {
            client,
            policy,
            validator,
        }
    }

    /// Fetches `base_url + path + ".md"` and validates it as a page.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Exhausted`] carrying the filename and the last
    /// attempt's error once the attempt budget is spent.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn fetch_document(
        &self,
        path: &str,
        base_url: &str,
    ) -> Result<FetchedDocument, FetchError> {
        let content_url = format!("{}{path}.md", base_url.trim_end_matches('/'));
        let filename = url_to_safe_filename(path);
        info!(url = %content_url, filename = %filename, "fetching");

        let content = self
            .fetch_validated(&content_url, &filename, ValidationProfile::Page, |body| body)
            .await?;

        info!(filename = %filename, bytes = content.len(), "fetched and validated");
        Ok(FetchedDocument {
            filename,
            content_url,
            content,
        })
    }

    /// Fetches the changelog and prefixes it with an attribution header.
    ///
    /// The upstream body is validated on its own, so the header cannot pad a
    /// truncated changelog past the length threshold. The header is part of
    /// the returned (and later hashed) content.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Exhausted`] once the attempt budget is spent.
    #[instrument(skip(self))]
    pub async fn fetch_changelog(
        &self,
        raw_url: &str,
        page_url: &str,
    ) -> Result<FetchedDocument, FetchError> {
        info!(url = %raw_url, "fetching changelog");
        let header = changelog_header(page_url);
        let content = self
            .fetch_validated(
                raw_url,
                CHANGELOG_FILENAME,
                ValidationProfile::Changelog,
                |body| format!("{header}{body}"),
            )
            .await?;

        info!(bytes = content.len(), "fetched changelog");
        Ok(FetchedDocument {
            filename: CHANGELOG_FILENAME.to_string(),
            content_url: raw_url.to_string(),
            content,
        })
    }

    async fn fetch_validated<F>(
        &self,
        url: &str,
        filename: &str,
        profile: ValidationProfile,
        prepare: F,
    ) -> Result<String, FetchError>
    where
        F: Fn(String) -> String,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;
        loop {
            let error = match self.attempt_once(url, profile, &prepare).await {
                Ok(content) => return Ok(content),
                Err(error) => error,
            };

            warn!(
                filename = %filename,
                attempt,
                max_attempts,
                error = %error,
                "fetch attempt failed"
            );

            if attempt >= max_attempts {
                return Err(FetchError::exhausted(filename, attempt, error));
            }

            let delay = if let FetchError::RateLimited { retry_after, .. } = &error {
                let delay = self.policy.rate_limit_delay(retry_after.as_deref());
                warn!(delay_secs = delay.as_secs_f64(), "rate limited, waiting");
                delay
            } else {
                match self.policy.should_retry(attempt) {
                    RetryDecision::Retry { delay, .. } => delay,
                    RetryDecision::DoNotRetry { reason } => {
                        debug!(reason = %reason, "not retrying");
                        return Err(FetchError::exhausted(filename, attempt, error));
                    }
                }
            };

            info!(
                filename = %filename,
                delay_ms = delay.as_millis(),
                "retrying"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt_once<F>(
        &self,
        url: &str,
        profile: ValidationProfile,
        prepare: &F,
    ) -> Result<String, FetchError>
    where
        F: Fn(String) -> String,
    {
        let body = self.client.get_text(url).await?;
        self.validator
            .validate(&body, profile)
            .map_err(|e| FetchError::validation(url, e))?;
        Ok(prepare(body))
    }
}

/// Attribution block prepended to the mirrored changelog.
#[must_use]
pub fn changelog_header(page_url: &str) -> String {
    format!(
        "# Claude Code Changelog\n\n\
         > **Source**: {page_url}\n\
         >\n\
         > This is the official Claude Code release changelog from the Claude Code repository.\n\n\
         ---\n\n"
    )
}
