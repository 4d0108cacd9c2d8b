//! Default business handler for deployments without provider-specific logic.

use async_trait::async_trait;

use crate::domain::webhook::Provider;
use crate::ports::{HandlerError, WebhookHandler};

/// Acknowledges every delivery and logs its event type.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

#[async_trait]
impl WebhookHandler for LoggingHandler {
    async fn handle(
        &self,
        provider: &Provider,
        payload: &serde_json::Value,
    ) -> Result<(), HandlerError> {
        let event_type = payload
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("unknown");
        tracing::info!(provider = %provider, event_type, "Webhook acknowledged");
        Ok(())
    }
}
