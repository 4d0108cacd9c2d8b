//! WebhookIngress - deduplicates a delivery, runs the business handler, and
//! dead-letters the payload when the handler fails.
//!
//! ## Flow
//!
//! 1. `record_if_new` on the event store; a duplicate short-circuits to success
//! 2. Business handler runs exactly once for the winning insert
//! 3. Success marks the event PROCESSED
//! 4. Failure enqueues the payload in the DLQ, then marks the event FAILED
//!
//! The provider is acknowledged in all three outcomes. Only storage failures
//! that leave the payload without a recovery path are returned as errors, so
//! the provider redelivers later.

use chrono::Utc;
use std::sync::Arc;

use crate::domain::foundation::{DlqEntryId, DomainError};
use crate::domain::webhook::{validate_event_id, BackoffPolicy, EventStatus, Provider};
use crate::ports::{DlqStore, WebhookEventStore, WebhookHandler};

/// Result of accepting one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressOutcome {
    /// First delivery; the handler succeeded.
    Processed,
    /// First delivery; the handler failed and the payload awaits retry.
    DeadLettered { entry_id: DlqEntryId },
    /// Already recorded; the handler was not invoked.
    Duplicate,
}

impl IngressOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, IngressOutcome::Duplicate)
    }

    pub fn is_dead_lettered(&self) -> bool {
        matches!(self, IngressOutcome::DeadLettered { .. })
    }
}

/// Entry point for inbound provider callbacks.
pub struct WebhookIngress {
    events: Arc<dyn WebhookEventStore>,
    dlq: Arc<dyn DlqStore>,
    handler: Arc<dyn WebhookHandler>,
    backoff: BackoffPolicy,
}

impl WebhookIngress {
    pub fn new(
        events: Arc<dyn WebhookEventStore>,
        dlq: Arc<dyn DlqStore>,
        handler: Arc<dyn WebhookHandler>,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            events,
            dlq,
            handler,
            backoff,
        }
    }

    /// Accepts one delivery.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for an empty or oversized event id
    /// - `DatabaseError` when either store is unavailable
    pub async fn receive(
        &self,
        provider: &Provider,
        event_id: &str,
        payload: &serde_json::Value,
    ) -> Result<IngressOutcome, DomainError> {
        let event_id = validate_event_id(event_id.to_string())?;
        let now = Utc::now();

        let outcome = self
            .events
            .record_if_new(provider, &event_id, now)
            .await
            .map_err(|e| {
                tracing::error!(
                    provider = %provider,
                    event_id = %event_id,
                    error = %e,
                    "Idempotency check failed; refusing to process"
                );
                e
            })?;

        if !outcome.is_new {
            tracing::debug!(provider = %provider, event_id = %event_id, "Duplicate webhook delivery");
            return Ok(IngressOutcome::Duplicate);
        }

        match self.handler.handle(provider, payload).await {
            Ok(()) => {
                self.events
                    .mark_status(provider, &event_id, EventStatus::Processed)
                    .await?;
                tracing::info!(provider = %provider, event_id = %event_id, "Webhook processed");
                Ok(IngressOutcome::Processed)
            }
            Err(handler_error) => {
                let message = handler_error.to_string();
                tracing::warn!(
                    provider = %provider,
                    event_id = %event_id,
                    error = %message,
                    "Webhook handler failed; dead-lettering payload"
                );

                let next_run_at = self.backoff.next_run_at(0, now);
                let entry_id = self
                    .dlq
                    .enqueue(provider, payload, &message, next_run_at)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            provider = %provider,
                            event_id = %event_id,
                            error = %e,
                            "Failed to enqueue webhook in DLQ"
                        );
                        e
                    })?;

                // The DLQ entry now owns the retry; a lost FAILED mark only affects reporting.
                if let Err(e) = self
                    .events
                    .mark_status(provider, &event_id, EventStatus::Failed)
                    .await
                {
                    tracing::error!(
                        provider = %provider,
                        event_id = %event_id,
                        dlq_entry_id = %entry_id,
                        error = %e,
                        "Failed to mark dead-lettered webhook as FAILED"
                    );
                }

                Ok(IngressOutcome::DeadLettered { entry_id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryDlqStore, InMemoryWebhookEventStore};
    use crate::domain::foundation::ErrorCode;
    use crate::domain::webhook::DlqStatus;
    use crate::ports::HandlerError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Handler that counts calls and optionally fails.
    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl WebhookHandler for CountingHandler {
        async fn handle(
            &self,
            _provider: &Provider,
            _payload: &serde_json::Value,
        ) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(HandlerError::Transient("downstream timeout".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        events: Arc<InMemoryWebhookEventStore>,
        dlq: Arc<InMemoryDlqStore>,
        handler: Arc<CountingHandler>,
        ingress: WebhookIngress,
    }

    fn fixture() -> Fixture {
        let events = Arc::new(InMemoryWebhookEventStore::new());
        let dlq = Arc::new(InMemoryDlqStore::new());
        let handler = Arc::new(CountingHandler::default());
        let ingress = WebhookIngress::new(
            events.clone(),
            dlq.clone(),
            handler.clone(),
            BackoffPolicy::default(),
        );
        Fixture {
            events,
            dlq,
            handler,
            ingress,
        }
    }

    #[tokio::test]
    async fn first_delivery_is_processed() {
        let f = fixture();
        let outcome = f
            .ingress
            .receive(&Provider::Stripe, "evt_1", &json!({"id": "evt_1"}))
            .await
            .unwrap();

        assert_eq!(outcome, IngressOutcome::Processed);
        assert_eq!(f.handler.calls.load(Ordering::SeqCst), 1);
        let stored = f.events.find(&Provider::Stripe, "evt_1").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Processed);
    }

    #[tokio::test]
    async fn duplicate_delivery_skips_handler() {
        let f = fixture();
        let payload = json!({"id": "evt_1"});
        f.ingress.receive(&Provider::Stripe, "evt_1", &payload).await.unwrap();
        let second = f.ingress.receive(&Provider::Stripe, "evt_1", &payload).await.unwrap();

        assert!(second.is_duplicate());
        assert_eq!(f.handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.events.len().await, 1);
    }

    #[tokio::test]
    async fn same_id_from_another_provider_is_new() {
        let f = fixture();
        let payload = json!({"id": "evt_1"});
        f.ingress.receive(&Provider::Stripe, "evt_1", &payload).await.unwrap();
        let other = f
            .ingress
            .receive(&Provider::StripeIdentity, "evt_1", &payload)
            .await
            .unwrap();

        assert_eq!(other, IngressOutcome::Processed);
        assert_eq!(f.handler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn handler_failure_dead_letters_payload() {
        let f = fixture();
        f.handler.fail.store(true, Ordering::SeqCst);
        let payload = json!({"id": "evt_9", "type": "invoice.paid"});

        let outcome = f.ingress.receive(&Provider::Stripe, "evt_9", &payload).await.unwrap();

        let entry_id = match outcome {
            IngressOutcome::DeadLettered { entry_id } => entry_id,
            other => panic!("expected dead letter, got {:?}", other),
        };
        let entry = f.dlq.find(entry_id).await.unwrap().unwrap();
        assert_eq!(entry.attempts, 0);
        assert_eq!(entry.status, DlqStatus::Pending);
        assert_eq!(entry.payload, payload);
        assert!(entry.next_run_at > entry.created_at);

        let stored = f.events.find(&Provider::Stripe, "evt_9").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Failed);
    }

    #[tokio::test]
    async fn redelivery_after_failure_is_still_a_duplicate() {
        let f = fixture();
        f.handler.fail.store(true, Ordering::SeqCst);
        let payload = json!({"id": "evt_9"});
        f.ingress.receive(&Provider::Stripe, "evt_9", &payload).await.unwrap();

        f.handler.fail.store(false, Ordering::SeqCst);
        let again = f.ingress.receive(&Provider::Stripe, "evt_9", &payload).await.unwrap();

        assert!(again.is_duplicate());
        assert_eq!(f.handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_outage_is_an_error_and_skips_handler() {
        let f = fixture();
        f.events.set_unavailable(true);

        let err = f
            .ingress
            .receive(&Provider::Stripe, "evt_1", &json!({}))
            .await
            .unwrap_err();

        assert!(err.is_storage_failure());
        assert_eq!(f.handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dlq_outage_surfaces_as_storage_failure() {
        let f = fixture();
        f.handler.fail.store(true, Ordering::SeqCst);
        f.dlq.set_unavailable(true);

        let err = f
            .ingress
            .receive(&Provider::Stripe, "evt_1", &json!({}))
            .await
            .unwrap_err();

        assert!(err.is_storage_failure());
    }

    /// Event store whose status updates always fail.
    struct StatusWriteFailingStore {
        inner: InMemoryWebhookEventStore,
    }

    #[async_trait]
    impl WebhookEventStore for StatusWriteFailingStore {
        async fn record_if_new(
            &self,
            provider: &Provider,
            event_id: &str,
            now: chrono::DateTime<Utc>,
        ) -> Result<crate::domain::webhook::RecordOutcome, DomainError> {
            self.inner.record_if_new(provider, event_id, now).await
        }

        async fn mark_status(
            &self,
            _provider: &Provider,
            _event_id: &str,
            _status: EventStatus,
        ) -> Result<(), DomainError> {
            Err(DomainError::database("connection reset"))
        }

        async fn find(
            &self,
            provider: &Provider,
            event_id: &str,
        ) -> Result<Option<crate::domain::webhook::WebhookEvent>, DomainError> {
            self.inner.find(provider, event_id).await
        }
    }

    #[tokio::test]
    async fn failed_status_write_still_dead_letters_payload() {
        let dlq = Arc::new(InMemoryDlqStore::new());
        let handler = Arc::new(CountingHandler::default());
        handler.fail.store(true, Ordering::SeqCst);
        let ingress = WebhookIngress::new(
            Arc::new(StatusWriteFailingStore {
                inner: InMemoryWebhookEventStore::new(),
            }),
            dlq.clone(),
            handler.clone(),
            BackoffPolicy::default(),
        );
        let payload = json!({"id": "evt_7"});

        let outcome = ingress.receive(&Provider::Stripe, "evt_7", &payload).await.unwrap();

        assert!(outcome.is_dead_lettered());
        assert_eq!(dlq.backlog().await.unwrap(), 1);

        let again = ingress.receive(&Provider::Stripe, "evt_7", &payload).await.unwrap();
        assert!(again.is_duplicate());
        assert_eq!(dlq.backlog().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_event_id_is_rejected() {
        let f = fixture();
        let err = f
            .ingress
            .receive(&Provider::Stripe, "   ", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(f.handler.calls.load(Ordering::SeqCst), 0);
    }
}
