//! Freshness gate.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Decides whether a manifest written at `last_updated` is due for a refresh.
///
/// A missing timestamp is always stale. An age equal to the threshold is
/// stale; anything younger is fresh, including timestamps ahead of `now`.
#[must_use]
pub fn is_stale(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>, threshold: Duration) -> bool {
    let Some(last_updated) = last_updated else {
        return true;
    };
    let Ok(threshold) = chrono::Duration::from_std(threshold) else {
        return false;
    };
    now.signed_duration_since(last_updated) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_HOURS: Duration = Duration::from_secs(3 * 60 * 60);

    #[test]
    fn test_missing_timestamp_is_stale() {
        assert!(is_stale(None, Utc::now(), THREE_HOURS));
    }

    #[test]
    fn test_exactly_at_threshold_is_stale() {
        let now = Utc::now();
        let written = now - chrono::Duration::seconds(10_800);
        assert!(is_stale(Some(written), now, THREE_HOURS));
    }

    #[test]
    fn test_one_second_under_threshold_is_fresh() {
        let now = Utc::now();
        let written = now - chrono::Duration::seconds(10_799);
        assert!(!is_stale(Some(written), now, THREE_HOURS));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let now = Utc::now();
        let written = now + chrono::Duration::minutes(5);
        assert!(!is_stale(Some(written), now, THREE_HOURS));
    }

    #[test]
    fn test_zero_threshold_is_always_stale() {
        let now = Utc::now();
        assert!(is_stale(Some(now), now, Duration::ZERO));
    }
}
