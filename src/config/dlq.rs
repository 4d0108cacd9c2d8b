//! Dead-letter queue configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::DlqRunnerConfig;
use crate::domain::webhook::BackoffPolicy;

/// Retry schedule and runner settings for the webhook DLQ
#[derive(Debug, Clone, Deserialize)]
pub struct DlqConfig {
    /// How often the runner wakes up, in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Maximum entries claimed per cycle
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Lease taken on claimed entries, in seconds
    #[serde(default = "default_lease")]
    pub lease_secs: u64,

    /// Delay before the first retry, in seconds
    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: u64,

    /// Exponent ceiling for the doubling delay
    #[serde(default = "default_cap_exponent")]
    pub backoff_cap_exponent: u32,

    /// Random extra delay as a fraction of the computed delay
    #[serde(default = "default_jitter_ratio")]
    pub backoff_jitter_ratio: f64,

    /// Failed retries before an entry is retired
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl DlqConfig {
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_secs(self.backoff_base_secs),
            cap_exponent: self.backoff_cap_exponent,
            jitter_ratio: self.backoff_jitter_ratio,
            max_attempts: self.max_attempts,
        }
    }

    pub fn runner_config(&self) -> DlqRunnerConfig {
        DlqRunnerConfig::default()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_batch_size(self.batch_size)
            .with_lease(Duration::from_secs(self.lease_secs))
            .with_backoff(self.backoff_policy())
    }

    /// Validate DLQ configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::ZeroDuration("dlq.poll_interval_ms"));
        }
        if self.lease_secs == 0 {
            return Err(ValidationError::ZeroDuration("dlq.lease_secs"));
        }
        if self.backoff_base_secs == 0 {
            return Err(ValidationError::ZeroDuration("dlq.backoff_base_secs"));
        }
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if !(0.0..=1.0).contains(&self.backoff_jitter_ratio) {
            return Err(ValidationError::InvalidJitterRatio);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        Ok(())
    }
}

impl Default for DlqConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            batch_size: default_batch_size(),
            lease_secs: default_lease(),
            backoff_base_secs: default_backoff_base(),
            backoff_cap_exponent: default_cap_exponent(),
            backoff_jitter_ratio: default_jitter_ratio(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5_000
}

fn default_batch_size() -> u32 {
    50
}

fn default_lease() -> u64 {
    120
}

fn default_backoff_base() -> u64 {
    30
}

fn default_cap_exponent() -> u32 {
    6
}

fn default_jitter_ratio() -> f64 {
    0.2
}

fn default_max_attempts() -> u32 {
    8
}
