//! Bounded exponential backoff for idempotent API calls.

use std::future::Future;
use std::time::Duration;

use super::ClientError;

/// How many times and how slowly to retry a failing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_delay(attempt, self.initial_delay, self.max_delay)
    }
}

/// The delay doubles with each attempt (2^attempt * initial_delay), capped at max_delay.
fn backoff_delay(attempt: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
    let multiplier = 2u32.saturating_pow(attempt);
    initial_delay.saturating_mul(multiplier).min(max_delay)
}

/// Run `call` until it succeeds, fails permanently, or the policy is exhausted.
///
/// The error from the last attempt is returned unchanged.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(operation, attempts = attempt + 1, "call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_transient() {
                    tracing::error!(operation, attempts = attempt + 1, error = %err, "retries exhausted");
                }
                return Err(err);
            }
        }
    }
}
