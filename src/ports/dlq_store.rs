//! DlqStore port - durable holding area for webhooks whose handler failed.
//!
//! ## Claim Semantics
//!
//! Several runner processes may poll the same store. `claim_due` must hand
//! each due entry to at most one of them by taking a time-bounded lease
//! (`claimed_until`) in the same atomic operation that selects it. A runner
//! that crashes mid-batch simply lets its leases expire.
//!
//! ```text
//! PENDING --claim_due--> PENDING (leased)
//!    leased --mark_succeeded--> SUCCEEDED
//!    leased --mark_failed-----> PENDING (attempts+1, next_run_at moved forward)
//!    leased --mark_dead-------> DEAD
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::foundation::{DlqEntryId, DomainError};
use crate::domain::webhook::{DlqEntry, Provider};

/// Port for the webhook dead-letter queue.
#[async_trait]
pub trait DlqStore: Send + Sync {
    /// Stores a failed delivery with `attempts = 0`.
    async fn enqueue(
        &self,
        provider: &Provider,
        payload: &serde_json::Value,
        error: &str,
        next_run_at: DateTime<Utc>,
    ) -> Result<DlqEntryId, DomainError>;

    /// Leases up to `limit` pending entries whose `next_run_at <= now`.
    async fn claim_due(
        &self,
        limit: u32,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Vec<DlqEntry>, DomainError>;

    /// Retires an entry after a successful retry.
    async fn mark_succeeded(&self, id: DlqEntryId) -> Result<(), DomainError>;

    /// Records a failed retry and reschedules the entry.
    async fn mark_failed(
        &self,
        id: DlqEntryId,
        error: &str,
        next_run_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Moves an entry to the terminal DEAD state.
    async fn mark_dead(&self, id: DlqEntryId, error: &str) -> Result<(), DomainError>;

    async fn find(&self, id: DlqEntryId) -> Result<Option<DlqEntry>, DomainError>;

    /// Number of PENDING entries (due or not).
    async fn backlog(&self) -> Result<u64, DomainError>;
}
