//! Deadline and retry wrappers around adapter calls.

use crate::config::DEFAULT_RETRY_ATTEMPTS;
use crate::errors::{ProbeError, ProbeResult};
use crate::model::{millis, Operation, TestResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(1000);

/// Linear backoff: wait `backoff_step * attempt` after each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_step: Duration,
}

impl RetryPolicy {
    /// `attempts` below 1 behave as 1.
    pub fn new(attempts: u32) -> Self {
        Self {
            max_attempts: attempts.max(1),
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }

    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_ATTEMPTS)
    }
}

/// Race `fut` against `timeout`. On expiry the future is dropped and a
/// [`ProbeError::Timeout`] naming `label` is returned.
pub async fn with_deadline<T, F>(label: &str, timeout: Duration, fut: F) -> ProbeResult<T>
where
    F: Future<Output = ProbeResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::timeout(label, timeout)),
    }
}

/// Run `probe` until it reports success or the attempt budget is spent.
///
/// Never fails: an `Err` on the last attempt becomes a failed [`TestResult`]
/// tagged with `operation`. The returned result carries the duration of the
/// attempt that produced it.
pub async fn run_with_retry<F, Fut>(
    policy: &RetryPolicy,
    operation: Operation,
    mut probe: F,
) -> TestResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<TestResult>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        let started = Instant::now();
        let outcome = probe().await;
        let elapsed = started.elapsed();
        let last = attempt >= max_attempts;

        let error = match outcome {
            Ok(result) if result.success || last => return result.with_duration(elapsed),
            Ok(result) => result
                .error
                .unwrap_or_else(|| format!("{operation} probe failed")),
            Err(e) if last => {
                return TestResult::failed(operation, e.to_string()).with_duration(elapsed)
            }
            Err(e) => e.to_string(),
        };

        let backoff = policy.backoff_for(attempt);
        warn!(
            error = %error,
            operation = %operation,
            attempt,
            max_attempts,
            backoff_ms = millis(backoff),
            "retrying probe"
        );
        tokio::time::sleep(backoff).await;
        attempt += 1;
    }
}
