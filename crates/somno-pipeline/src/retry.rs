//! Bounded retry with linear backoff.
//!
//! Every remote stage of a run (task submission and polling, uploads,
//! the Sheets append) is wrapped in the same executor. The wrapped
//! operation must tolerate being repeated — resubmitting a generation
//! task is wasteful but harmless.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Immutable retry configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (2 means 3 total tries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Additional delay per subsequent retry.
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_secs(2),
            step: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default backoff shape.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Backoff after the failure of (zero-based) attempt `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay + self.step * attempt
    }
}

/// Execute an async operation under a retry policy.
///
/// On failure, sleeps `backoff(attempt)` and retries while attempts
/// remain; once exhausted, the last error is propagated unchanged — no
/// wrapping, no swallowing.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, op: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt);
                attempt += 1;
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    operation,
                    attempt,
                    policy.max_attempts + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            step: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(2));
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(2), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_immediate_success_invokes_once() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry(&fast_policy(2), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_eventual_success_after_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry(&fast_policy(2), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(format!("failure {n}"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_propagates_last_error_unchanged() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry(&fast_policy(2), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("failure {n}")) }
        })
        .await;

        // 3 total tries; the error from the final try comes back as-is.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err(), "failure 2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_sleep_is_the_backoff_sum() {
        let policy = RetryPolicy::default();
        let started = tokio::time::Instant::now();

        let result: Result<(), String> = retry(&policy, "op", || async { Err("nope".to_string()) }).await;
        assert!(result.is_err());

        // backoff(0) + backoff(1) = 2s + 4s with the default policy.
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }
}
