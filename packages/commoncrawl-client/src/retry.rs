//! Bounded retry policy with jittered backoff.
//!
//! The index endpoints are rate-limited and flaky under load, so every query
//! path retries with a randomized sleep. Attempt counts and jitter ranges
//! live here as plain data so callers stay deterministic in tests.

use std::ops::RangeInclusive;
use std::time::Duration;

/// Retry budget and backoff jitter for the client's query paths.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts for the one-time catalog load. Exhaustion is fatal.
    pub catalog_attempts: u32,
    /// Attempts for a single index query (page listing or location lookup).
    /// Exhaustion degrades the query to an empty result.
    pub query_attempts: u32,
    /// Jittered sleep between catalog attempts, in whole seconds.
    pub catalog_delay: RangeInclusive<u64>,
    /// Jittered sleep between index query attempts, in whole seconds.
    pub query_delay: RangeInclusive<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            catalog_attempts: 10,
            query_attempts: 5,
            catalog_delay: 1..=3,
            query_delay: 1..=4,
        }
    }
}

impl RetryPolicy {
    /// Sleep a random interval drawn from the catalog backoff range.
    pub async fn catalog_backoff(&self) {
        sleep_jittered(self.catalog_delay.clone()).await;
    }

    /// Sleep a random interval drawn from the query backoff range.
    pub async fn query_backoff(&self) {
        sleep_jittered(self.query_delay.clone()).await;
    }

    /// Policy with zero-length sleeps, for tests.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            catalog_attempts: 10,
            query_attempts: 3,
            catalog_delay: 0..=0,
            query_delay: 0..=0,
        }
    }
}

async fn sleep_jittered(range: RangeInclusive<u64>) {
    let secs = fastrand::u64(range);
    if secs > 0 {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_matches_service_limits() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.catalog_attempts, 10);
        assert_eq!(policy.query_attempts, 5);
        assert_eq!(policy.catalog_delay, 1..=3);
        assert_eq!(policy.query_delay, 1..=4);
    }

    #[tokio::test]
    async fn zero_range_backoff_returns_immediately() {
        let policy = RetryPolicy::immediate();
        policy.catalog_backoff().await;
        policy.query_backoff().await;
    }
}
