//! Bounded retry with fixed backoff.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use offload_core::ClientResult;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

/// Fixed-bound, fixed-backoff retry policy.
///
/// Deliberately crude: every failure is treated as retryable up to the
/// attempt bound, with no jitter, no exponential growth, and no
/// classification of retryable versus fatal errors. The final failure is
/// propagated unchanged. This mirrors the behaviour remote deployments have
/// come to rely on; widening it to classify errors would change observable
/// behaviour.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Build a policy with an explicit attempt bound and backoff interval.
    #[must_use]
    pub const fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Run `attempt` until it succeeds or the attempt bound is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the error from the final attempt once the bound is reached.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut count = 0u32;
        loop {
            count += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if count < self.max_attempts => {
                    debug!(operation, attempt = count, error = %err, "retrying failed operation");
                    sleep(self.backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
