//! DlqRunner - Background worker that retries dead-lettered webhooks.
//!
//! Each cycle leases up to `batch_size` due entries, replays the stored
//! payload through the business handler, and settles every entry on its own.
//! A store error on one entry is logged and the batch moves on; the lease
//! expires and the entry becomes claimable again.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 5s | How often to look for due entries |
//! | `batch_size` | 50 | Max entries claimed per cycle |
//! | `lease` | 120s | How long a claim hides an entry from other runners |
//!
//! ## Graceful Shutdown
//!
//! The runner listens for a shutdown signal and completes the current
//! batch before stopping.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::DomainError;
use crate::domain::webhook::{BackoffPolicy, DlqEntry, RetryDecision};
use crate::ports::{DlqStore, WebhookHandler};

/// Configuration for the DlqRunner.
#[derive(Debug, Clone)]
pub struct DlqRunnerConfig {
    /// How often to poll for due entries.
    pub poll_interval: Duration,

    /// Maximum entries to process per poll cycle.
    pub batch_size: u32,

    /// Lease taken on each claimed entry.
    pub lease: Duration,

    /// Retry schedule and budget.
    pub backoff: BackoffPolicy,
}

impl Default for DlqRunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 50,
            lease: Duration::from_secs(120),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl DlqRunnerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Per-cycle tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub rescheduled: usize,
    pub dead: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.rescheduled + self.dead
    }
}

enum Settled {
    Succeeded,
    Rescheduled,
    Dead,
}

/// Polling worker over the webhook DLQ.
pub struct DlqRunner {
    store: Arc<dyn DlqStore>,
    handler: Arc<dyn WebhookHandler>,
    config: DlqRunnerConfig,
}

impl DlqRunner {
    /// Create a new DlqRunner with default configuration.
    pub fn new(store: Arc<dyn DlqStore>, handler: Arc<dyn WebhookHandler>) -> Self {
        Self::with_config(store, handler, DlqRunnerConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DlqStore>,
        handler: Arc<dyn WebhookHandler>,
        config: DlqRunnerConfig,
    ) -> Self {
        Self {
            store,
            handler,
            config,
        }
    }

    pub fn config(&self) -> &DlqRunnerConfig {
        &self.config
    }

    /// Run the retry loop until shutdown signal is received.
    ///
    /// A failed claim is logged and retried on the next tick; the loop only
    /// ends on shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            "DLQ runner started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        // Shutdown requested - process one final batch then exit
                        if let Err(e) = self.process_batch().await {
                            tracing::warn!(error = %e, "Final DLQ batch failed");
                        }
                        tracing::info!("DLQ runner stopped");
                        return Ok(());
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.process_batch().await {
                        tracing::warn!(error = %e, "DLQ claim failed; retrying next cycle");
                    }
                }
            }
        }
    }

    /// Process a single batch of due entries.
    ///
    /// Only the claim can fail the batch; per-entry store errors are logged.
    pub async fn process_batch(&self) -> Result<BatchReport, DomainError> {
        let now = Utc::now();
        let entries = self
            .store
            .claim_due(self.config.batch_size, now, self.config.lease)
            .await?;

        let mut report = BatchReport::default();
        for entry in entries {
            let entry_id = entry.id;
            match self.settle(entry).await {
                Ok(Settled::Succeeded) => report.succeeded += 1,
                Ok(Settled::Rescheduled) => report.rescheduled += 1,
                Ok(Settled::Dead) => report.dead += 1,
                Err(e) => {
                    tracing::error!(entry_id = %entry_id, error = %e, "Failed to settle DLQ entry");
                }
            }
        }

        if report.total() > 0 {
            tracing::info!(
                succeeded = report.succeeded,
                rescheduled = report.rescheduled,
                dead = report.dead,
                "DLQ batch processed"
            );
        }
        Ok(report)
    }

    /// Run exactly one poll cycle (for tests and cron-style invocation).
    pub async fn poll_once(&self) -> Result<BatchReport, DomainError> {
        self.process_batch().await
    }

    async fn settle(&self, entry: DlqEntry) -> Result<Settled, DomainError> {
        let error = match self.handler.handle(&entry.provider, &entry.payload).await {
            Ok(()) => {
                self.store.mark_succeeded(entry.id).await?;
                tracing::info!(
                    entry_id = %entry.id,
                    provider = %entry.provider,
                    attempts = entry.attempts + 1,
                    "DLQ entry redelivered"
                );
                return Ok(Settled::Succeeded);
            }
            Err(e) => e,
        };

        let message = error.to_string();
        let decision = if error.is_retryable() {
            self.config.backoff.decide(entry.attempts, Utc::now())
        } else {
            RetryDecision::GiveUp
        };

        match decision {
            RetryDecision::Retry { next_run_at } => {
                self.store.mark_failed(entry.id, &message, next_run_at).await?;
                tracing::warn!(
                    entry_id = %entry.id,
                    provider = %entry.provider,
                    attempts = entry.attempts + 1,
                    next_run_at = %next_run_at,
                    error = %message,
                    "DLQ retry failed; rescheduled"
                );
                Ok(Settled::Rescheduled)
            }
            RetryDecision::GiveUp => {
                self.store.mark_dead(entry.id, &message).await?;
                tracing::error!(
                    entry_id = %entry.id,
                    provider = %entry.provider,
                    attempts = entry.attempts + 1,
                    error = %message,
                    "DLQ entry retired; operator attention required"
                );
                Ok(Settled::Dead)
            }
        }
    }
}
