//! Fetcher seam and retry policy.
//!
//! The fetcher is an injected collaborator: the pipeline only sees
//! "snapshot fetched" or "fetch failed after exhausting retries". How a
//! snapshot is obtained (plain HTTP, a rendered page, a fixture) is the
//! fetcher's own concern.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Feed, RetryConfig, Snapshot};

pub use http::HttpFetcher;

/// Trait for availability fetchers.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the current availability snapshot for a feed.
    async fn fetch(&self, feed: &Feed) -> Result<Snapshot>;
}

/// Bounded-retry policy with an increasing backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_initial: Duration,
    backoff_multiplier: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_initial: Duration, backoff_multiplier: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_initial,
            backoff_multiplier: backoff_multiplier.max(1),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_initial_ms),
            config.backoff_multiplier,
        )
    }

    /// Delay to sleep after the given zero-based failed attempt.
    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_initial * self.backoff_multiplier.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Wraps any fetcher with a retry policy.
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: Fetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RetryingFetcher<F> {
    async fn fetch(&self, feed: &Feed) -> Result<Snapshot> {
        let mut last_error: Option<AppError> = None;

        for attempt in 0..self.policy.max_attempts {
            if attempt > 0 {
                let delay = self.policy.backoff(attempt - 1);
                log::info!(
                    "Retrying fetch for '{}' in {:?} (attempt {}/{})",
                    feed.id,
                    delay,
                    attempt + 1,
                    self.policy.max_attempts
                );
                tokio::time::sleep(delay).await;
            }

            match self.inner.fetch(feed).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => {
                    log::warn!("Fetch attempt {} for '{}' failed: {}", attempt + 1, feed.id, e);
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        Err(AppError::fetch(&feed.id, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::models::Status;

    /// Fetcher that fails a fixed number of times before succeeding.
    struct FlakyFetcher {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Fetcher for FlakyFetcher {
        async fn fetch(&self, feed: &Feed) -> Result<Snapshot> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(AppError::fetch(&feed.id, "transient"))
            } else {
                Ok(Snapshot::new(Status::Available, Vec::new()))
            }
        }
    }

    fn feed() -> Feed {
        Feed::new("test", "Test", "https://example.com")
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), 1)
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let fetcher = RetryingFetcher::new(
            FlakyFetcher {
                failures: 2,
                calls: AtomicU32::new(0),
            },
            fast_policy(3),
        );

        assert!(fetcher.fetch(&feed()).await.is_ok());
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail() {
        let fetcher = RetryingFetcher::new(
            FlakyFetcher {
                failures: 5,
                calls: AtomicU32::new(0),
            },
            fast_policy(3),
        );

        let err = fetcher.fetch(&feed()).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_grows() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100), 2);
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }
}
