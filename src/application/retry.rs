use crate::error::{Result, SettlementError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with linear backoff: attempt `n` is followed by a wait of
/// `n * backoff_base` before the next try.
///
/// Only processor failures are retried. Any other error aborts immediately;
/// eligibility and consistency problems are screened out before a transfer
/// is attempted, so retrying them would just repeat a wrong answer.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts,
            backoff_base,
        }
    }

    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }

    /// Runs `attempt_fn` up to `max_attempts` times, passing the 1-based
    /// attempt number. Returns the first success, or the last processor
    /// error once the budget is spent. No lock may be held across the
    /// backoff sleep; callers pass an operation that owns its inputs.
    pub async fn run<T, F, Fut>(&self, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_fn(attempt).await {
                Ok(value) => return Ok(value),
                Err(SettlementError::Processor(cause)) if attempt < self.max_attempts => {
                    let wait = self.backoff_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        %cause,
                        "transfer attempt failed, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
