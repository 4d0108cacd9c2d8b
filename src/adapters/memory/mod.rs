//! In-memory store adapters for tests and local development.
//!
//! These adapters should not back a multi-process deployment: their
//! atomicity only holds within a single process.

mod dlq_store;
mod webhook_event_store;

pub use dlq_store::InMemoryDlqStore;
pub use webhook_event_store::InMemoryWebhookEventStore;
