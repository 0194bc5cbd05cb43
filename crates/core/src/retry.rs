//! Bounded retry with exponential backoff.
//!
//! [`with_retries`] re-runs an async operation when a caller-supplied
//! classifier marks the error as retryable (lock timeouts, deadlocks,
//! serialization conflicts). Every other error propagates immediately,
//! so business-rule violations are never retried.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry policy: attempt count and backoff curve.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
}

impl BackoffPolicy {
    /// The admission/reconciliation policy: 3 attempts, 1s/1.5s backoff.
    pub const fn conflicts() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 1.5,
        }
    }

    /// Delay to sleep after the given 1-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        self.base_delay.mul_f64(factor)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::conflicts()
    }
}

/// Run `op`, retrying up to `policy.max_attempts` times while `is_retryable`
/// classifies the error as a conflict.
///
/// Retryable failures that exhaust the budget return the last error.
pub async fn with_retries<T, E, F, Fut, C>(
    policy: BackoffPolicy,
    is_retryable: C,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retryable(&err) && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retryable conflict, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("conflict")]
        Conflict,
        #[error("terminal")]
        Terminal,
    }

    fn retryable(err: &TestError) -> bool {
        matches!(err, TestError::Conflict)
    }

    /// Same shape as the conflict policy, with delays short enough for
    /// tests.
    fn fast_policy() -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(2),
            multiplier: 1.5,
        }
    }

    // -----------------------------------------------------------------------
    // Backoff curve
    // -----------------------------------------------------------------------

    #[test]
    fn conflict_policy_delays_are_1s_1500ms_2250ms() {
        let policy = BackoffPolicy::conflicts();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1_500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2_250));
    }

    // -----------------------------------------------------------------------
    // Retry behaviour
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn first_try_success_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, TestError> =
            with_retries(fast_policy(), retryable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(7) }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn conflict_then_success_retries_once() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, TestError> =
            with_retries(fast_policy(), retryable, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(TestError::Conflict)
                    } else {
                        Ok(99)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn persistent_conflict_stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, TestError> =
            with_retries(fast_policy(), retryable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Conflict) }
            })
            .await;
        assert!(matches!(result, Err(TestError::Conflict)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn terminal_error_is_never_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, TestError> =
            with_retries(fast_policy(), retryable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Terminal) }
            })
            .await;
        assert!(matches!(result, Err(TestError::Terminal)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_attempt_policy_never_sleeps() {
        let policy = BackoffPolicy {
            max_attempts: 1,
            base_delay: Duration::from_secs(3600),
            multiplier: 2.0,
        };
        let result: Result<u32, TestError> = with_retries(policy, retryable, || async {
            Err(TestError::Conflict)
        })
        .await;
        assert!(result.is_err());
    }
}
