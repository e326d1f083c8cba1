//! Retry pacing for the periodic background flush.

use rand::Rng;
use std::time::{Duration, Instant};

/// Exponential backoff with jitter: `base * 2^(failures - 1)`, capped at
/// `max`, plus up to 20% random spread so devices that lost connectivity
/// together do not retry in lockstep.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    failures: u32,
    next_attempt: Option<Instant>,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: 0,
            next_attempt: None,
        }
    }

    /// Delay before attempt number `failures + 1`, without jitter.
    pub fn delay_for(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let exp = failures.saturating_sub(1).min(16);
        self.base.saturating_mul(1u32 << exp).min(self.max)
    }

    /// Register a transient failure; returns the delay until the next attempt.
    pub fn record_failure(&mut self, now: Instant) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let delay = self.delay_for(self.failures);

        let spread = (delay.as_millis() / 5) as u64;
        let jitter = if spread > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
        } else {
            Duration::ZERO
        };

        let total = delay + jitter;
        self.next_attempt = Some(now + total);
        total
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.next_attempt = None;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_attempt.is_none_or(|at| now >= at)
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}
