//! Exponential backoff with jitter for dead-letter retries.
//!
//! ```text
//! delay(n) = base * 2^min(n, cap_exponent)
//! next_run_at = now + delay(n) + uniform(0, jitter_ratio) * delay(n)
//! ```
//!
//! `n` is the number of attempts recorded on the entry *before* the attempt
//! that just failed.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Retry schedule for dead-lettered webhooks.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    ///
    /// Default: 30 seconds
    pub base: Duration,

    /// Exponent ceiling; delays stop growing after this many attempts.
    ///
    /// Default: 6 (base * 64)
    pub cap_exponent: u32,

    /// Upper bound of the random extra delay, as a fraction of the delay.
    ///
    /// Default: 0.2
    pub jitter_ratio: f64,

    /// Attempts after which an entry is retired to the terminal state.
    ///
    /// Default: 8
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(30),
            cap_exponent: 6,
            jitter_ratio: 0.2,
            max_attempts: 8,
        }
    }
}

/// What to do with an entry whose retry just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Reschedule for another attempt.
    Retry { next_run_at: DateTime<Utc> },
    /// Retry budget exhausted; move to the terminal state.
    GiveUp,
}

impl BackoffPolicy {
    /// Delay without jitter for an entry with `attempts` prior attempts.
    pub fn base_delay(&self, attempts: u32) -> Duration {
        // 2^31 already saturates any practical base
        let exponent = attempts.min(self.cap_exponent).min(31);
        self.base.saturating_mul(1u32 << exponent)
    }

    /// Delay including jitter. `jitter_sample` is clamped to `[0, 1]`.
    pub fn delay(&self, attempts: u32, jitter_sample: f64) -> Duration {
        let base = self.base_delay(attempts);
        let ratio = self.jitter_ratio.clamp(0.0, 1.0) * jitter_sample.clamp(0.0, 1.0);
        let jitter = Duration::try_from_secs_f64(base.as_secs_f64() * ratio)
            .unwrap_or(Duration::MAX);
        base.saturating_add(jitter)
    }

    /// Next eligible run time using a random jitter sample.
    pub fn next_run_at(&self, attempts: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        self.next_run_at_with(attempts, now, rand::random::<f64>())
    }

    /// Next eligible run time using an explicit jitter sample.
    pub fn next_run_at_with(
        &self,
        attempts: u32,
        now: DateTime<Utc>,
        jitter_sample: f64,
    ) -> DateTime<Utc> {
        let delay = chrono::Duration::from_std(self.delay(attempts, jitter_sample))
            .unwrap_or_else(|_| chrono::Duration::days(365));
        now.checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Decides between rescheduling and retiring after a failed attempt.
    ///
    /// `attempts_before` is the entry's attempt count prior to the failure.
    pub fn decide(&self, attempts_before: u32, now: DateTime<Utc>) -> RetryDecision {
        if attempts_before.saturating_add(1) >= self.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry {
                next_run_at: self.next_run_at(attempts_before, now),
            }
        }
    }
}
