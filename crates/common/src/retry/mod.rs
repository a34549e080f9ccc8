//! Retry policy for transient upstream failures
//!
//! A small value object applied uniformly around network calls by the
//! embedding client and the vector index gateway. Backoff is exponential
//! from `initial_backoff`, capped at `max_backoff`. Retries are
//! transparent to callers; only budget-exhausted failures propagate.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::metrics::RETRY_ATTEMPTS_TOTAL;

/// Bounded retry budget with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_backoff: Duration,
    /// Upper bound on any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(4),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
        }
    }

    /// Delay slept before the given attempt (1-based). The first attempt
    /// runs immediately; attempt `n` waits `initial * 2^(n-2)`, capped.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(2).min(31);
        let delay = self.initial_backoff.saturating_mul(1u32 << exp);
        delay.min(self.max_backoff)
    }

    /// Run `op` under this policy, returning the first success or the
    /// last error once the budget is exhausted.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts.max(1) {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        operation = what,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Upstream call failed"
                    );
                    metrics::counter!(RETRY_ATTEMPTS_TOTAL, "operation" => what.to_string())
                        .increment(1);
                    last_error = Some(e);
                }
            }
        }

        // max_attempts >= 1, so at least one attempt ran and failed
        Err(last_error.expect("retry loop ran no attempts"))
    }
}
