//! Generic retry-with-backoff for transient external calls.
//!
//! Used by the ingestion page fetch and the embedding client; any other
//! transient external call can wrap itself the same way instead of growing
//! its own counted loop.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Attempt budget and backoff schedule for [`retry`].
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_attempts: usize,
    step: Duration,
}

impl RetryPolicy {
    /// Linear backoff: the delay after attempt `n` is `step * n`.
    pub fn linear(max_attempts: usize, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            step,
        }
    }

    /// Total attempts made before giving up, including the first.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.step.saturating_mul(attempt as u32)
    }
}

/// Runs `op` until it succeeds or the policy's attempt budget is exhausted,
/// sleeping between attempts. The closure receives the 1-based attempt
/// number; the final error is returned unchanged.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts() => {
                let delay = policy.delay_for(attempt);
                warn!(
                    %err,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "{label} failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
