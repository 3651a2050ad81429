//! Retry policy with exponential backoff for transient fetch failures.
//!
//! # Overview
//!
//! Every failed attempt except a rate-limit response is followed by an
//! exponential backoff delay:
//!
//! ```text
//! delay = min(base_delay * 2^(attempt - 1), max_delay) * uniform(0.5, 1.0)
//! ```
//!
//! An HTTP 429 instead waits for the server-directed `Retry-After` delay
//! (default 60 seconds) and skips the backoff curve. Both kinds of failure
//! consume one slot of the attempt budget.
//!
//! # Example
//!
//! ```
//! use docmirror_core::fetch::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! match policy.should_retry(1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument, warn};

/// Default maximum attempts per document (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay for exponential backoff (2 seconds).
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default maximum backoff delay (30 seconds).
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Delay used when a 429 response carries no usable Retry-After header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Maximum Retry-After value (1 hour) to prevent excessive delays.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Lower bound of the jitter scaling factor.
const JITTER_MIN_FACTOR: f64 = 0.5;

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `base_delay`: 2 seconds
/// - `max_delay`: 30 seconds
/// - `default_retry_after`: 60 seconds
///
/// With defaults, backoff delays before jitter are 2s then 4s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Base delay for the first retry.
    base_delay: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// Wait applied to a 429 without a parseable Retry-After.
    default_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            default_retry_after: DEFAULT_RETRY_AFTER,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum attempts including initial (must be >= 1)
    /// * `base_delay` - Base delay for first retry
    /// * `max_delay` - Maximum delay cap
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// Creates a policy with a custom max_attempts, using defaults for other settings.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Overrides the wait applied to a 429 without a usable Retry-After header.
    #[must_use]
    pub fn with_default_retry_after(mut self, delay: Duration) -> Self {
        self.default_retry_after = delay;
        self
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether to retry after attempt `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Returns the wait for a 429 response given its raw Retry-After header.
    #[must_use]
    pub fn rate_limit_delay(&self, retry_after: Option<&str>) -> Duration {
        retry_after
            .and_then(parse_retry_after)
            .unwrap_or(self.default_retry_after)
    }

    /// Calculates the delay for a retry attempt with exponential backoff and jitter.
    ///
    /// Formula: `min(base_delay * 2^(attempt - 1), max_delay) * uniform(0.5, 1.0)`
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let capped_ms = self.backoff_ceiling(attempt).as_millis() as f64;
        let factor = rand::thread_rng().gen_range(JITTER_MIN_FACTOR..=1.0);
        Duration::from_millis((capped_ms * factor) as u64)
    }

    /// Un-jittered delay after attempt `attempt` (1-indexed) failed.
    fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports two formats as per RFC 7231:
/// - Integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2025 07:28:00 GMT`
///
/// Returns `None` if the value cannot be parsed. Caps excessive values at 1 hour.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use docmirror_core::fetch::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("0"), Some(Duration::ZERO));
/// assert_eq!(parse_retry_after("invalid"), None);
/// ```
#[must_use]
#[instrument]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let value = header_value.trim();

    let delay = if let Ok(seconds) = value.parse::<i64>() {
        let Ok(seconds) = u64::try_from(seconds) else {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        };
        Duration::from_secs(seconds)
    } else if let Ok(when) = httpdate::parse_http_date(value) {
        // A date already in the past means "retry now".
        when.duration_since(std::time::SystemTime::now())
            .unwrap_or(Duration::ZERO)
    } else {
        debug!(value, "unparseable Retry-After value");
        return None;
    };

    if delay > MAX_RETRY_AFTER {
        warn!(
            delay_secs = delay.as_secs(),
            max_secs = MAX_RETRY_AFTER.as_secs(),
            "Retry-After exceeds maximum, capping"
        );
        return Some(MAX_RETRY_AFTER);
    }
    Some(delay)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== RetryPolicy Tests ====================

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert_eq!(policy.default_retry_after, Duration::from_secs(60));
    }

    #[test]
    fn test_retry_policy_max_attempts_minimum_is_one() {
        let policy = RetryPolicy::with_max_attempts(0);
        assert_eq!(policy.max_attempts(), 1);
        assert!(matches!(
            policy.should_retry(1),
            RetryDecision::DoNotRetry { .. }
        ));
    }

    // ==================== Delay Calculation Tests ====================

    #[test]
    fn test_delay_first_retry_is_jittered_base() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2), Duration::from_secs(30));
        for _ in 0..50 {
            let delay = policy.calculate_delay(1);
            assert!(delay >= Duration::from_secs(1), "{delay:?} below half of base");
            assert!(delay <= Duration::from_secs(2), "{delay:?} above base");
        }
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(10, Duration::from_secs(2), Duration::from_secs(300));
        assert_eq!(policy.backoff_ceiling(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_ceiling(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_ceiling(3), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_secs(2), Duration::from_secs(30));
        assert_eq!(policy.backoff_ceiling(6), Duration::from_secs(30));
        assert_eq!(policy.backoff_ceiling(60), Duration::from_secs(30));
        let delay = policy.calculate_delay(60);
        assert!(delay >= Duration::from_secs(15) && delay <= Duration::from_secs(30));
    }

    // ==================== should_retry Tests ====================

    #[test]
    fn test_should_retry_until_budget_spent() {
        let policy = RetryPolicy::with_max_attempts(3);
        assert!(matches!(
            policy.should_retry(1),
            RetryDecision::Retry { attempt: 2, .. }
        ));
        assert!(matches!(
            policy.should_retry(2),
            RetryDecision::Retry { attempt: 3, .. }
        ));
        match policy.should_retry(3) {
            RetryDecision::DoNotRetry { reason } => assert!(reason.contains("exhausted")),
            other => panic!("expected DoNotRetry, got {other:?}"),
        }
    }

    // ==================== Rate limit Tests ====================

    #[test]
    fn test_rate_limit_delay_uses_header() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.rate_limit_delay(Some("5")), Duration::from_secs(5));
    }

    #[test]
    fn test_rate_limit_delay_defaults_when_missing_or_invalid() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.rate_limit_delay(None), Duration::from_secs(60));
        assert_eq!(policy.rate_limit_delay(Some("soon")), Duration::from_secs(60));

        let fast = RetryPolicy::default().with_default_retry_after(Duration::from_millis(10));
        assert_eq!(fast.rate_limit_delay(None), Duration::from_millis(10));
    }

    #[test]
    fn test_parse_retry_after_caps_excessive_values() {
        assert_eq!(parse_retry_after("999999"), Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn test_parse_retry_after_negative_is_none() {
        assert_eq!(parse_retry_after("-5"), None);
    }

    #[test]
    fn test_parse_retry_after_past_http_date_is_zero() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"),
            Some(Duration::ZERO)
        );
    }
}
