//! Per-item retry policy
//!
//! Each attempt runs under the attempt timeout. A failed attempt is retried
//! after a fixed interval while the error is retryable and retries remain.
//! Cancellation never interrupts an attempt, but no new attempt starts once
//! the run is cancelled.

use artifact_types::{Error, Result, RetryConfig};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fixed-interval retry wrapper around one item transfer
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy from validated retry settings
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Retry settings
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds or the policy gives up.
    ///
    /// `operation` receives the retry number (0 for the first attempt).
    /// `on_retry` is called after the delay and right before each retry with
    /// the new retry number and the error that caused it. The last error is
    /// returned when retries are exhausted, the error is not retryable, or
    /// the run was cancelled.
    pub async fn execute<T, F, Fut, R>(
        &self,
        path: &str,
        cancel: &CancellationToken,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
        R: FnMut(u32, &Error),
    {
        let mut attempt = 0u32;

        loop {
            let error = match tokio::time::timeout(self.config.attempt_timeout, operation(attempt))
                .await
            {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) => error,
                Err(_) => Error::Timeout {
                    path: path.to_string(),
                    millis: u64::try_from(self.config.attempt_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                },
            };

            if !error.should_retry() {
                debug!(path, error = %error, "Error is not retryable");
                return Err(error);
            }
            if attempt >= self.config.max_retries {
                return Err(error);
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(path, attempt, "Run cancelled, abandoning retries");
                    return Err(error);
                }
                () = tokio::time::sleep(self.config.delay_for_attempt(attempt + 1)) => {}
            }

            attempt += 1;
            on_retry(attempt, &error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn policy(retries: u32) -> RetryPolicy {
        RetryPolicy::new(
            RetryConfig::new(retries, Duration::from_millis(1), Duration::from_millis(200)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = &AtomicU32::new(0);
        let mut retries = Vec::new();

        let result = policy(2)
            .execute(
                "a.txt",
                &CancellationToken::new(),
                move |_| async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::write("a.txt", "quota exceeded"))
                    } else {
                        Ok(42)
                    }
                },
                |attempt, _| retries.push(attempt),
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retries, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let calls = &AtomicU32::new(0);

        let result: Result<()> = policy(3)
            .execute(
                "a.txt",
                &CancellationToken::new(),
                move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Error::read("a.txt", "connection reset"))
                },
                |_, _| {},
            )
            .await;

        assert!(matches!(result, Err(Error::Read { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let calls = &AtomicU32::new(0);

        let result: Result<()> = policy(5)
            .execute(
                "gone.txt",
                &CancellationToken::new(),
                move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Error::item_not_found("gone.txt"))
                },
                |_, _| panic!("must not retry"),
            )
            .await;

        assert!(matches!(result, Err(Error::ItemNotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_retried() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(
            RetryConfig::new(1, Duration::from_millis(1), Duration::from_millis(20)).unwrap(),
        );

        let result: Result<()> = policy
            .execute(
                "slow.bin",
                &CancellationToken::new(),
                move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                },
                |_, _| {},
            )
            .await;

        assert!(matches!(result, Err(Error::Timeout { millis: 20, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancellation_stops_retries() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = &AtomicU32::new(0);

        let result: Result<()> = policy(10)
            .execute(
                "a.txt",
                &cancel,
                move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Error::write("a.txt", "refused"))
                },
                |_, _| {},
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
