//! Webhook module - idempotent delivery records and dead-letter retries.

mod backoff;
mod dlq;
mod event;
mod provider;

pub use backoff::{BackoffPolicy, RetryDecision};
pub use dlq::{DlqEntry, DlqStatus};
pub use event::{validate_event_id, EventStatus, RecordOutcome, WebhookEvent};
pub use provider::Provider;
