//! WebhookEventStore port - the single source of idempotency truth.
//!
//! ## Why Webhook Idempotency Matters
//!
//! Payment and identity providers deliver callbacks at least once. They
//! retry on timeouts and on any non-2xx response, and two deliveries of the
//! same event can arrive concurrently on different API instances.
//!
//! The uniqueness of `(provider, event_id)` must therefore be enforced by
//! the storage layer itself (a unique constraint, or an equivalent atomic
//! check-and-insert), not by a read followed by a write in application code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;
use crate::domain::webhook::{EventStatus, Provider, RecordOutcome, WebhookEvent};

/// Port for recording inbound webhook deliveries.
#[async_trait]
pub trait WebhookEventStore: Send + Sync {
    /// Atomically inserts `(provider, event_id)` in status RECEIVED.
    ///
    /// A uniqueness violation is not an error: it returns
    /// `RecordOutcome { is_new: false }`. Any other storage failure is
    /// returned as `Err`, and the caller must not process the event.
    async fn record_if_new(
        &self,
        provider: &Provider,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome, DomainError>;

    /// Moves a RECEIVED event to PROCESSED or FAILED.
    async fn mark_status(
        &self,
        provider: &Provider,
        event_id: &str,
        status: EventStatus,
    ) -> Result<(), DomainError>;

    /// Looks up a recorded delivery.
    async fn find(
        &self,
        provider: &Provider,
        event_id: &str,
    ) -> Result<Option<WebhookEvent>, DomainError>;
}
