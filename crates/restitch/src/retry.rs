//! Bounded fixed-delay retry loop shared by the fetch layer.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, FetchConfig};
use crate::error::RestitchError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: config.retry_delay,
        }
    }
}

/// What one attempt decided.
pub enum RetryAction<T> {
    /// The attempt succeeded with this value.
    Success(T),
    /// The attempt failed but another one may be worth it.
    Retry(RestitchError),
    /// The attempt failed in a way no retry can repair.
    Fail(RestitchError),
}

/// Runs `operation` until it succeeds, fails terminally, or the retry
/// budget is spent, pausing `policy.delay` between attempts. The
/// operation receives the current attempt number, starting at 0. On
/// exhaustion the last attempt's error is returned.
pub async fn run_with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RestitchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = RetryAction<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation(attempt).await {
            RetryAction::Success(value) => return Ok(value),
            RetryAction::Fail(error) => return Err(error),
            RetryAction::Retry(error) => {
                if attempt >= policy.max_retries {
                    return Err(error);
                }
                attempt += 1;
                warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    error = %error,
                    "attempt failed, retrying after delay"
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn first_attempt_success_incurs_no_delay() {
        let policy = RetryPolicy {
            max_retries: 15,
            delay: Duration::from_millis(200),
        };
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = run_with_retries(&policy, |_| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                RetryAction::Success(42u32)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let calls = AtomicU32::new(0);

        let result = run_with_retries(&quick(15), |_| {
            let calls = &calls;
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 3 {
                    RetryAction::Retry(RestitchError::transient("http://a/1.ts", "HTTP 503"))
                } else {
                    RetryAction::Success("payload")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "payload");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn exhaustion_returns_the_last_error_after_max_plus_one_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = run_with_retries(&quick(2), |attempt| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                RetryAction::Retry(RestitchError::transient(
                    "http://a/1.ts",
                    format!("attempt {attempt}"),
                ))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("attempt 2"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn terminal_failures_short_circuit() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = run_with_retries(&quick(15), |_| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                RetryAction::Fail(RestitchError::invalid_url("::", "malformed"))
            }
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            RestitchError::InvalidUrl { .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
