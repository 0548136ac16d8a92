//! Backoff policy and per-call state

use rand::Rng;
use std::time::Duration;

/// Retry policy shared by every call an executor makes
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any delay
    pub max_delay: Duration,
    /// Growth factor applied after each retry
    pub multiplier: f64,
    /// Total attempts, first call included
    pub max_attempts: u32,
    /// Randomize each sleep within `[delay / 2, delay]`, never below the previous sleep
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(25),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            max_attempts: 10,
            jitter: true,
        }
    }
}

impl BackoffPolicy {
    /// Create a policy with the given delay bounds
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            ..Default::default()
        }
    }

    /// Set the growth factor
    ///
    /// Factors below 1 or non-finite take effect as 1, keeping delays constant.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the attempt budget
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Fresh state for one logical call
    pub fn state(&self) -> BackoffState {
        BackoffState {
            attempts: 0,
            current: self.base_delay.min(self.max_delay),
            last: Duration::ZERO,
            max_delay: self.max_delay,
            multiplier: effective_multiplier(self.multiplier),
            max_attempts: self.max_attempts.max(1),
            jitter: self.jitter,
        }
    }
}

/// Attempt counter and current delay of one logical call
#[derive(Debug, Clone)]
pub struct BackoffState {
    attempts: u32,
    current: Duration,
    last: Duration,
    max_delay: Duration,
    multiplier: f64,
    max_attempts: u32,
    jitter: bool,
}

impl BackoffState {
    /// Count an attempt about to be made
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Attempts made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the attempt budget is spent
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Delay the next retry would use, before jitter
    pub fn current_delay(&self) -> Duration {
        self.current
    }

    /// Take the delay for this retry and grow the next one
    ///
    /// Successive results never decrease, with or without jitter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = grow(self.current, self.multiplier, self.max_delay);
        let sleep = if self.jitter {
            let floor = (delay / 2).max(self.last).min(delay);
            rand::thread_rng().gen_range(floor..=delay)
        } else {
            delay
        };
        self.last = sleep;
        sleep
    }
}

fn effective_multiplier(multiplier: f64) -> f64 {
    if multiplier.is_finite() && multiplier >= 1.0 {
        multiplier
    } else {
        1.0
    }
}

fn grow(current: Duration, multiplier: f64, max: Duration) -> Duration {
    let nanos = current.as_nanos() as f64 * multiplier;
    if nanos >= max.as_nanos() as f64 {
        max
    } else {
        Duration::from_nanos(nanos as u64)
    }
}
