//! Retry with jitter-free exponential backoff.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// How often and how patiently to retry a failing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Retries on top of the first attempt.
    pub max_retries: u32,
    /// Wait after the first failure; doubles after each further failure.
    pub initial_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(2000),
        }
    }
}

impl BackoffPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Wait before the retry that follows failed attempt number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }

    /// Total time spent waiting before the final failure is reported.
    pub fn worst_case_wait(&self) -> Duration {
        // From attempt 32 on the factor is saturated, so every delay is the same.
        let doubling = self.max_retries.min(32);
        let ramp = (0..doubling).fold(Duration::ZERO, |total, attempt| {
            total.saturating_add(self.delay_for(attempt))
        });
        let plateau = self.delay_for(32).saturating_mul(self.max_retries - doubling);
        ramp.saturating_add(plateau)
    }
}

/// Runs `operation` until it succeeds or has failed `max_retries + 1` times.
///
/// The last error is returned unchanged. Only wrap operations that are safe to
/// invoke again after a failure.
pub async fn run_with_backoff<T, E, F, Fut>(policy: &BackoffPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= policy.max_retries => return Err(err),
            Err(err) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, retrying: {err}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
