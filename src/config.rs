//! Tuning knobs for [`crate::ShareManager`].

use std::time::Duration;

use crate::rate_limit::sanitize_ratio;

/// Base interval between remote calls; the effective gap varies by `jitter_ratio`.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1500);

/// Relative jitter applied to every randomized delay (±30%).
pub const DEFAULT_JITTER_RATIO: f64 = 0.3;

/// Pause before descending into a share subdirectory.
pub const DEFAULT_RECURSION_DELAY: Duration = Duration::from_secs(1);

/// Lifetime of a cached path → directory id mapping.
pub const DEFAULT_PATH_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Retries after the first transfer attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Linear backoff step after a rate-limit response.
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

/// Linear backoff step after a transport failure.
pub const DEFAULT_TRANSPORT_BACKOFF: Duration = Duration::from_millis(1500);

/// Entries requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Items per combined transfer request.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Pause between consecutive batch requests.
pub const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_secs(3);

/// Configuration for a [`crate::ShareManager`].
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    pub min_interval: Duration,
    pub jitter_ratio: f64,
    pub recursion_delay: Duration,
    pub path_cache_ttl: Duration,
    pub max_retries: u32,
    pub rate_limit_backoff: Duration,
    pub transport_backoff: Duration,
    pub page_size: u32,
    /// Skip share subdirectories named after a season other than the target.
    pub season_pruning: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            jitter_ratio: DEFAULT_JITTER_RATIO,
            recursion_delay: DEFAULT_RECURSION_DELAY,
            path_cache_ttl: DEFAULT_PATH_CACHE_TTL,
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
            transport_backoff: DEFAULT_TRANSPORT_BACKOFF,
            page_size: DEFAULT_PAGE_SIZE,
            season_pruning: true,
        }
    }
}

impl ManagerConfig {
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Clamped to `[0, 1]`; NaN or infinite ratios disable jitter.
    pub fn with_jitter_ratio(mut self, ratio: f64) -> Self {
        self.jitter_ratio = sanitize_ratio(ratio);
        self
    }

    pub fn with_recursion_delay(mut self, delay: Duration) -> Self {
        self.recursion_delay = delay;
        self
    }

    pub fn with_path_cache_ttl(mut self, ttl: Duration) -> Self {
        self.path_cache_ttl = ttl;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff(mut self, rate_limit: Duration, transport: Duration) -> Self {
        self.rate_limit_backoff = rate_limit;
        self.transport_backoff = transport;
        self
    }

    /// Zero is bumped to one.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn with_season_pruning(mut self, enabled: bool) -> Self {
        self.season_pruning = enabled;
        self
    }
}
