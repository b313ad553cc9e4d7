//! Retry policy with linear backoff

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::Result;

/// Default attempt ceiling, first attempt included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay between attempts
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed for one logical call
    pub max_attempts: u32,

    /// Delay unit; the wait after attempt `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy. A ceiling of 0 falls back to the default.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 {
                DEFAULT_MAX_ATTEMPTS
            } else {
                max_attempts
            },
            base_delay,
        }
    }

    /// Create retry policy from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new(
            lookup("BKHREASE_CMS_RETRY_ATTEMPTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            Duration::from_millis(
                lookup("BKHREASE_CMS_RETRY_DELAY_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
        )
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Delays between consecutive attempts when every attempt fails.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).map(|attempt| self.delay_for(attempt))
    }

    /// Execute a function with retry logic.
    ///
    /// The closure receives the 1-based attempt number. Only errors that
    /// report themselves retryable are attempted again; the error of the
    /// last attempt is returned once the ceiling is reached.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || attempt >= max_attempts => return Err(e),
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        status = e.status(),
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    async fn run_with_status(policy: &RetryPolicy, status: u16) -> (u32, ApiError) {
        let calls = Arc::new(Mutex::new(0_u32));
        let calls_clone = Arc::clone(&calls);

        let result = policy
            .execute(|_| {
                let calls = Arc::clone(&calls_clone);
                async move {
                    *calls.lock().expect("Operation should succeed") += 1;
                    Err::<(), ApiError>(ApiError::from_response(status, "", None))
                }
            })
            .await;

        let count = *calls.lock().expect("Operation should succeed");
        (count, result.expect_err("Test operation should fail"))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_zero_ceiling_falls_back_to_default() {
        let policy = RetryPolicy::new(0, Duration::from_millis(5));
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_from_lookup_values() {
        let vars: HashMap<&str, &str> = [
            ("BKHREASE_CMS_RETRY_ATTEMPTS", "5"),
            ("BKHREASE_CMS_RETRY_DELAY_MS", "250"),
        ]
        .into_iter()
        .collect();

        let policy = RetryPolicy::from_lookup(|k| vars.get(k).map(ToString::to_string));
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(250));

        let fallback = RetryPolicy::from_lookup(|k| {
            (k == "BKHREASE_CMS_RETRY_ATTEMPTS").then(|| "many".to_string())
        });
        assert_eq!(fallback, RetryPolicy::default());
    }

    #[test]
    fn test_linear_schedule() {
        let policy = RetryPolicy::new(4, Duration::from_millis(1000));
        let delays: Vec<_> = policy.schedule().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(3000),
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_success_on_first_try() {
        let policy = fast_policy(3);
        let result = policy.execute(|_| async { Ok::<i32, ApiError>(42) }).await;
        assert_eq!(result.expect("Operation should succeed"), 42);
    }

    #[tokio::test]
    async fn test_execute_recovers_after_transient_failures() {
        let policy = fast_policy(3);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let result = policy
            .execute(|attempt| {
                let seen = Arc::clone(&seen_clone);
                async move {
                    seen.lock().expect("Operation should succeed").push(attempt);
                    if attempt < 3 {
                        Err(ApiError::network("connection refused"))
                    } else {
                        Ok("loaded")
                    }
                }
            })
            .await;

        assert_eq!(result.expect("Operation should succeed"), "loaded");
        assert_eq!(*seen.lock().expect("Operation should succeed"), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_execute_returns_last_error() {
        let policy = fast_policy(3);
        let result = policy
            .execute(|attempt| async move {
                Err::<(), ApiError>(ApiError::from_response(
                    500 + attempt as u16,
                    "",
                    None,
                ))
            })
            .await;

        assert_eq!(result.expect_err("Test operation should fail").status(), 503);
    }

    #[tokio::test]
    async fn test_execute_unknown_error_not_retried() {
        let policy = fast_policy(3);
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = policy
            .execute(|_| {
                let calls = Arc::clone(&calls_clone);
                async move {
                    *calls.lock().expect("Operation should succeed") += 1;
                    Err::<(), ApiError>(ApiError::unknown("bad json"))
                }
            })
            .await;

        assert_eq!(result.expect_err("Test operation should fail").status(), 500);
        assert_eq!(*calls.lock().expect("Operation should succeed"), 1);
    }

    #[tokio::test]
    async fn test_backoff_is_linear() {
        let policy = RetryPolicy::new(3, Duration::from_millis(20));
        let start = Instant::now();

        let (calls, _) = run_with_status(&policy, 503).await;

        // 20ms after the first attempt, 40ms after the second
        let elapsed = start.elapsed();
        assert_eq!(calls, 3);
        assert!(elapsed >= Duration::from_millis(60));
        assert!(elapsed < Duration::from_millis(500));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_client_errors_use_one_attempt(status in 400_u16..500, max_attempts in 1_u32..6) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .expect("Operation should succeed");
            let policy = fast_policy(max_attempts);

            let (calls, err) = runtime.block_on(run_with_status(&policy, status));

            prop_assert_eq!(calls, 1);
            prop_assert_eq!(err.status(), status);
        }

        #[test]
        fn prop_server_errors_use_every_attempt(status in 500_u16..600, max_attempts in 1_u32..5) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .expect("Operation should succeed");
            let policy = RetryPolicy::new(max_attempts, Duration::ZERO);

            let (calls, err) = runtime.block_on(run_with_status(&policy, status));

            prop_assert_eq!(calls, max_attempts);
            prop_assert_eq!(err.status(), status);
        }

        #[test]
        fn prop_delays_never_decrease(base_ms in 0_u64..5000, max_attempts in 1_u32..10) {
            let policy = RetryPolicy::new(max_attempts, Duration::from_millis(base_ms));
            let delays: Vec<_> = policy.schedule().collect();

            prop_assert_eq!(delays.len() as u32, max_attempts - 1);
            prop_assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
