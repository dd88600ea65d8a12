//! Jittered minimum-interval rate limiter.
//!
//! Every remote call made by one [`crate::ShareManager`] passes through a single
//! [`RateLimiter`]. The lock is held while sleeping and the previous call is
//! stamped with the time its caller actually woke, so callers are served one
//! at a time and a late wake pushes the next caller back as well.

use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// tokio timers fire on millisecond ticks. Deadlines are padded by one tick.
const TIMER_GRANULARITY: Duration = Duration::from_millis(1);

/// Jitter ratio restricted to `[0, 1]`; non-finite input means no jitter.
pub fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Draw a duration uniformly from `[base·(1−ratio), base·(1+ratio)]`.
pub fn jittered(base: Duration, ratio: f64) -> Duration {
    let ratio = sanitize_ratio(ratio);
    if base.is_zero() || ratio == 0.0 {
        return base;
    }
    let factor = rand::thread_rng().gen_range((1.0 - ratio)..=(1.0 + ratio));
    base.mul_f64(factor)
}

/// Enforces a jittered minimum spacing between successive `wait()` returns.
pub struct RateLimiter {
    min_interval: Duration,
    jitter_ratio: f64,
    last_call_at: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, jitter_ratio: f64) -> Self {
        Self {
            min_interval,
            jitter_ratio: sanitize_ratio(jitter_ratio),
            last_call_at: Mutex::new(None),
        }
    }

    /// Smallest spacing this limiter can produce between two calls.
    pub fn lower_bound(&self) -> Duration {
        self.min_interval.mul_f64(1.0 - self.jitter_ratio)
    }

    /// Wait until a freshly drawn interval has passed since the previous call.
    pub async fn wait(&self) {
        let mut last = self.last_call_at.lock().await;
        if let Some(prev) = *last {
            let deadline =
                prev + jittered(self.min_interval, self.jitter_ratio) + TIMER_GRANULARITY;
            if deadline > Instant::now() {
                tokio::time::sleep_until(deadline).await;
            }
        }
        *last = Some(Instant::now());
    }
}
