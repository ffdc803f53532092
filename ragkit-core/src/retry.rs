use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Bounded exponential backoff for transient collaborator failures.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Backoff delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exp = self
            .initial_delay
            .saturating_mul(1u32 << attempt.min(16) as u32);
        exp.min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, the error stops being transient (per
/// `is_transient`), or the attempt budget is spent. The final error is
/// returned unchanged.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: RetryPolicy,
    is_transient: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;
                if attempt >= policy.max_attempts.max(1) || !is_transient(&error) {
                    return Err(error);
                }
                let delay = policy.delay_for(attempt - 1);
                warn!(%error, attempt, ?delay, "transient failure, backing off");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let result: Result<u32, String> = retry_with_backoff(policy, |_| true, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("flaky".to_string())
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
    async fn permanent_errors_fail_fast() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, String> =
            retry_with_backoff(RetryPolicy::new(5), |_| false, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("permanent".to_string()) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_attempt_budget() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };
        let result: Result<u32, String> = retry_with_backoff(policy, |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("flaky".to_string()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
