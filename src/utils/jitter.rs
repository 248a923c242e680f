//! Retry helpers for upstream fetches

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::errors::SourceResult;

/// Upper bound of the random jitter added to every retry delay
pub const MAX_JITTER_MS: u64 = 250;

/// Exponential backoff with jitter for the given 1-based attempt
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponential_delay = base * 2_u32.saturating_pow(attempt.saturating_sub(1));
    let jitter = Duration::from_millis(fastrand::u64(0..=MAX_JITTER_MS));
    exponential_delay + jitter
}

/// Run `operation` until it succeeds, fails permanently, or `retries` extra
/// attempts have been spent
///
/// Only transient errors (timeouts, 429, 5xx) are retried.
pub async fn retry_with_backoff<F, Fut, R>(
    operation: F,
    operation_name: &str,
    retries: u32,
    base_delay: Duration,
) -> SourceResult<R>
where
    F: Fn() -> Fut,
    Fut: Future<Output = SourceResult<R>>,
{
    let max_attempts = retries + 1;
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    info!("'{}' succeeded on attempt {}", operation_name, attempts);
                }
                return Ok(result);
            }
            Err(e) if e.is_transient() && attempts < max_attempts => {
                let delay = backoff_delay(base_delay, attempts);
                debug!(
                    "'{}' failed on attempt {}: {}. Retrying in {:?}",
                    operation_name, attempts, e, delay
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_grows() {
        let base = Duration::from_millis(100);
        let first = backoff_delay(base, 1);
        let third = backoff_delay(base, 3);
        assert!(first >= base);
        assert!(first <= base + Duration::from_millis(MAX_JITTER_MS));
        assert!(third >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(SourceError::http(503, "Service Unavailable"))
                } else {
                    Ok(n)
                }
            },
            "test",
            2,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: SourceResult<()> = retry_with_backoff(
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::http(404, "Not Found"))
            },
            "test",
            5,
            Duration::from_millis(1),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: SourceResult<()> = retry_with_backoff(
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::timeout("http://example.com"))
            },
            "test",
            1,
            Duration::from_millis(1),
        )
        .await;

        assert!(matches!(result, Err(SourceError::Timeout { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
