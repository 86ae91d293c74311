//! Rate limiter tuning.

use std::time::Duration;

/// Consecutive 403s from one domain before they are treated as throttling.
pub const FORBIDDEN_STREAK_THRESHOLD: u32 = 3;

/// Adaptive delay tuning, shared by every domain a limiter tracks.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Delay between requests to one domain when it is healthy.
    pub base_delay: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Factor applied to the delay on 429/503.
    pub backoff_multiplier: f64,
    /// Factor applied after `recovery_threshold` successes while backing off.
    pub recovery_multiplier: f64,
    pub recovery_threshold: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            recovery_multiplier: 0.75,
            recovery_threshold: 3,
        }
    }
}
