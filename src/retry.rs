//! Explicit retry policy with linear backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Linear backoff: the n-th retry (0-based) waits `step × (n + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    step: Duration,
}

impl Backoff {
    pub const fn linear(step: Duration) -> Self {
        Self { step }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt.saturating_add(1))
    }
}

/// What one attempt decided.
#[derive(Debug)]
pub enum Step<T> {
    /// Final answer, returned as is.
    Done(T),
    /// Try again after the given backoff, if attempts remain.
    Retry { backoff: Backoff, reason: String },
}

/// Runs an operation up to `max_retries + 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Call `op` with the 0-based attempt number until it returns
    /// [`Step::Done`]. Returns `None` when every attempt asked for a retry.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Step<T>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Step::Done(value) => return Some(value),
                Step::Retry { backoff, reason } => {
                    if attempt >= self.max_retries {
                        warn!(
                            "Giving up after {} attempts: {}",
                            attempt + 1,
                            reason
                        );
                        return None;
                    }
                    let delay = backoff.delay(attempt);
                    warn!(
                        "{} (attempt {}/{}), retrying in {:.1}s",
                        reason,
                        attempt + 1,
                        self.max_retries + 1,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
