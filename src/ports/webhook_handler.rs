//! WebhookHandler port - the business logic behind a webhook.
//!
//! Handlers run once per new delivery and again for every DLQ retry, so they
//! must tolerate out-of-order delivery across distinct events.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::webhook::Provider;

/// Failure reported by a business handler.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// A downstream dependency failed; worth retrying later.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The payload can never be processed.
    #[error("rejected payload: {0}")]
    Rejected(String),
}

impl HandlerError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, HandlerError::Transient(_))
    }
}

/// Processes the payload of one webhook delivery.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn handle(
        &self,
        provider: &Provider,
        payload: &serde_json::Value,
    ) -> Result<(), HandlerError>;
}
