//! Retry with exponential backoff.
//!
//! Only transient errors are retried. The delay after failed attempt `n`
//! (1-based) is `base_delay * 2^n`, capped at `max_delay`.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ConnectorSettings;
use crate::context::OperationContext;
use crate::error::ConnectorResult;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Base of the exponential delay.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Default::default()
        }
    }

    /// Policy derived from per-instance connector settings.
    pub fn from_settings(settings: &ConnectorSettings) -> Self {
        Self::new(settings.retry_attempts, settings.retry_base_delay())
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `operation` with retries and no caller bounds.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> ConnectorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        self.execute_in(&OperationContext::new(), operation).await
    }

    /// Run `operation` with retries, aborting attempts and backoff sleeps
    /// when `ctx` is cancelled or its deadline passes.
    pub async fn execute_in<F, Fut, T>(
        &self,
        ctx: &OperationContext,
        mut operation: F,
    ) -> ConnectorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match ctx.run(operation()).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    warn!(
                        attempts = attempt,
                        error = %e,
                        "Giving up after transient errors"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient error"
                    );
                    ctx.sleep(delay).await?;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectorError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn unavailable() -> ConnectorError {
        ConnectorError::TargetUnavailable {
            message: "HTTP 503".to_string(),
        }
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(10), Duration::from_secs(60));
    }

    #[test]
    fn test_from_settings() {
        let settings = ConnectorSettings::new()
            .with_retry_attempts(5)
            .with_retry_base_delay(Duration::from_millis(250));
        let policy = RetryPolicy::from_settings(&settings);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_after_two_delays() {
        let policy = RetryPolicy::default();
        let start = Instant::now();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let recorded = calls.clone();
        let result = policy
            .execute(move || {
                let recorded = recorded.clone();
                async move {
                    let mut calls = recorded.lock().unwrap();
                    calls.push(start.elapsed());
                    if calls.len() < 3 {
                        Err(unavailable())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![Duration::ZERO, Duration::from_secs(2), Duration::from_secs(6)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reraises_last_error_after_max_attempts() {
        let policy = RetryPolicy::default();
        let count = AtomicU32::new(0);

        let result: ConnectorResult<()> = policy
            .execute(|| {
                let n = count.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    Err(ConnectorError::TargetUnavailable {
                        message: format!("attempt {n}"),
                    })
                }
            })
            .await;

        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().to_string(), "vendor unavailable: attempt 3");
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let policy = RetryPolicy::default();
        let count = AtomicU32::new(0);

        let result: ConnectorResult<()> = policy
            .execute(|| {
                count.fetch_add(1, Ordering::SeqCst);
                async { Err(ConnectorError::authentication("bad key")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_backoff() {
        let policy = RetryPolicy::default();
        let ctx = OperationContext::with_timeout(Duration::from_secs(3));
        let count = AtomicU32::new(0);

        let result: ConnectorResult<()> = policy
            .execute_in(&ctx, || {
                count.fetch_add(1, Ordering::SeqCst);
                async { Err(unavailable()) }
            })
            .await;

        assert!(matches!(result, Err(ConnectorError::DeadlineExceeded)));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let result = policy.execute(|| async { Ok(1) }).await;
        assert_eq!(result.unwrap(), 1);
    }
}
