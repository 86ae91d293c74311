//! Per-domain limiter state and its transitions.

use std::time::{Duration, Instant};

use super::config::{RateLimitConfig, FORBIDDEN_STREAK_THRESHOLD};

/// How a response should move a domain's delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// 429 or 503.
    Throttled,
    Forbidden,
    ServerError,
    /// Client errors other than 403 say nothing about pacing.
    Neutral,
}

impl Outcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 | 503 => Self::Throttled,
            403 => Self::Forbidden,
            500..=599 => Self::ServerError,
            200..=399 => Self::Success,
            _ => Self::Neutral,
        }
    }
}

/// What a reported outcome did, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    BackedOff,
    SlowedDown,
    Eased,
    Recovered,
}

#[derive(Debug, Clone)]
pub struct DomainState {
    pub current_delay: Duration,
    /// Earliest instant the next request may start.
    next_slot: Option<Instant>,
    consecutive_successes: u32,
    /// 403s in a row; job boards answer bursts with 403 instead of 429.
    forbidden_streak: u32,
    pub in_backoff: bool,
    pub total_requests: u64,
    pub rate_limit_hits: u64,
}

impl DomainState {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            current_delay: base_delay,
            next_slot: None,
            consecutive_successes: 0,
            forbidden_streak: 0,
            in_backoff: false,
            total_requests: 0,
            rate_limit_hits: 0,
        }
    }

    /// Claim the next request slot and return how long to wait for it.
    /// Slots are handed out under the caller's lock, so concurrent callers on
    /// one domain queue up instead of firing together.
    pub fn reserve(&mut self, now: Instant) -> Duration {
        let start = match self.next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        self.next_slot = Some(start + self.current_delay);
        self.total_requests += 1;
        start.saturating_duration_since(now)
    }

    pub fn apply(&mut self, outcome: Outcome, config: &RateLimitConfig) -> Transition {
        match outcome {
            Outcome::Success => self.succeed(config),
            Outcome::Throttled => {
                self.back_off(config);
                Transition::BackedOff
            }
            Outcome::Forbidden => {
                self.forbidden_streak += 1;
                self.consecutive_successes = 0;
                if self.forbidden_streak >= FORBIDDEN_STREAK_THRESHOLD {
                    self.forbidden_streak = 0;
                    self.back_off(config);
                    Transition::BackedOff
                } else {
                    Transition::Unchanged
                }
            }
            Outcome::ServerError => {
                self.consecutive_successes = 0;
                self.in_backoff = true;
                self.current_delay = self.current_delay.mul_f64(1.5).min(config.max_delay);
                Transition::SlowedDown
            }
            Outcome::Neutral => Transition::Unchanged,
        }
    }

    fn succeed(&mut self, config: &RateLimitConfig) -> Transition {
        self.forbidden_streak = 0;
        if !self.in_backoff {
            return Transition::Unchanged;
        }
        self.consecutive_successes += 1;
        if self.consecutive_successes < config.recovery_threshold {
            return Transition::Unchanged;
        }

        self.consecutive_successes = 0;
        self.current_delay = self
            .current_delay
            .mul_f64(config.recovery_multiplier)
            .max(config.min_delay);
        if self.current_delay <= config.base_delay {
            self.current_delay = config.base_delay;
            self.in_backoff = false;
            Transition::Recovered
        } else {
            Transition::Eased
        }
    }

    fn back_off(&mut self, config: &RateLimitConfig) {
        self.rate_limit_hits += 1;
        self.consecutive_successes = 0;
        self.in_backoff = true;
        self.current_delay = self
            .current_delay
            .mul_f64(config.backoff_multiplier)
            .min(config.max_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            base_delay: Duration::from_millis(100),
            min_delay: Duration::from_millis(10),
            recovery_threshold: 2,
            recovery_multiplier: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(Outcome::from_status(429), Outcome::Throttled);
        assert_eq!(Outcome::from_status(503), Outcome::Throttled);
        assert_eq!(Outcome::from_status(502), Outcome::ServerError);
        assert_eq!(Outcome::from_status(301), Outcome::Success);
        assert_eq!(Outcome::from_status(404), Outcome::Neutral);
    }

    #[test]
    fn test_slots_queue_up() {
        let mut state = DomainState::new(Duration::from_secs(2));
        let now = Instant::now();
        assert_eq!(state.reserve(now), Duration::ZERO);
        assert_eq!(state.reserve(now), Duration::from_secs(2));
        assert_eq!(state.reserve(now), Duration::from_secs(4));
        assert_eq!(state.total_requests, 3);
    }

    #[test]
    fn test_elapsed_slot_is_immediate() {
        let mut state = DomainState::new(Duration::from_millis(100));
        let start = Instant::now();
        state.reserve(start);
        assert_eq!(state.reserve(start + Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn test_forbidden_streak_threshold() {
        let config = config();
        let mut state = DomainState::new(config.base_delay);
        for _ in 1..FORBIDDEN_STREAK_THRESHOLD {
            assert_eq!(state.apply(Outcome::Forbidden, &config), Transition::Unchanged);
        }
        assert_eq!(state.apply(Outcome::Forbidden, &config), Transition::BackedOff);
        assert!(state.in_backoff);
    }

    #[test]
    fn test_server_error_slowdown_recovers() {
        let config = config();
        let mut state = DomainState::new(config.base_delay);
        assert_eq!(state.apply(Outcome::ServerError, &config), Transition::SlowedDown);
        assert_eq!(state.current_delay, Duration::from_millis(150));
        assert_eq!(state.rate_limit_hits, 0);

        state.apply(Outcome::Success, &config);
        assert_eq!(state.apply(Outcome::Success, &config), Transition::Recovered);
        assert_eq!(state.current_delay, config.base_delay);
        assert!(!state.in_backoff);
    }

    #[test]
    fn test_recovery_needs_a_streak() {
        let config = config();
        let mut state = DomainState::new(config.base_delay);
        state.apply(Outcome::Throttled, &config);
        state.apply(Outcome::Throttled, &config);
        assert_eq!(state.current_delay, Duration::from_millis(400));

        assert_eq!(state.apply(Outcome::Success, &config), Transition::Unchanged);
        assert_eq!(state.apply(Outcome::Success, &config), Transition::Eased);
        assert_eq!(state.current_delay, Duration::from_millis(200));
        state.apply(Outcome::Success, &config);
        assert_eq!(state.apply(Outcome::Success, &config), Transition::Recovered);
        assert_eq!(state.current_delay, config.base_delay);
        assert!(!state.in_backoff);
    }
}
