//! In-memory WebhookEventStore.
//!
//! The check-and-insert happens under a single write lock, which gives the
//! same linearization as a unique constraint within one process. Intended
//! for tests and local development only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::webhook::{EventStatus, Provider, RecordOutcome, WebhookEvent};
use crate::ports::WebhookEventStore;

type EventKey = (String, String);

/// In-memory webhook event store.
#[derive(Default)]
pub struct InMemoryWebhookEventStore {
    events: RwLock<HashMap<EventKey, WebhookEvent>>,
    unavailable: AtomicBool,
}

impl InMemoryWebhookEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Simulates a storage outage: every call returns a database error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of recorded deliveries.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::database("webhook event store unavailable"));
        }
        Ok(())
    }
}

fn key(provider: &Provider, event_id: &str) -> EventKey {
    (provider.as_str().to_string(), event_id.to_string())
}

#[async_trait]
impl WebhookEventStore for InMemoryWebhookEventStore {
    async fn record_if_new(
        &self,
        provider: &Provider,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome, DomainError> {
        self.check_available()?;
        let event = WebhookEvent::received(provider.clone(), event_id, now)?;

        let mut events = self.events.write().await;
        let key = key(provider, &event.event_id);
        if events.contains_key(&key) {
            return Ok(RecordOutcome::duplicate());
        }
        events.insert(key, event);
        Ok(RecordOutcome::new_event())
    }

    async fn mark_status(
        &self,
        provider: &Provider,
        event_id: &str,
        status: EventStatus,
    ) -> Result<(), DomainError> {
        self.check_available()?;
        let mut events = self.events.write().await;
        let event = events.get_mut(&key(provider, event_id)).ok_or_else(|| {
            DomainError::new(ErrorCode::WebhookEventNotFound, "Webhook event not recorded")
                .with_detail("provider", provider.as_str())
                .with_detail("event_id", event_id)
        })?;

        if !event.status.can_transition_to(status) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot move webhook event from {} to {}", event.status, status),
            ));
        }
        event.status = status;
        Ok(())
    }

    async fn find(
        &self,
        provider: &Provider,
        event_id: &str,
    ) -> Result<Option<WebhookEvent>, DomainError> {
        self.check_available()?;
        Ok(self.events.read().await.get(&key(provider, event_id)).cloned())
    }
}
