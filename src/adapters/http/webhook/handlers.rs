//! HTTP handlers for webhook ingress.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::WebhookIngress;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::webhook::Provider;

use super::dto::{ErrorResponse, LivenessResponse, WebhookAck, WebhookEnvelope};

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub ingress: Arc<WebhookIngress>,
}

/// POST /webhooks/:provider - Accept a provider callback
///
/// The body must be JSON with a top-level string `id`. Duplicate deliveries
/// and dead-lettered payloads are acknowledged with 200 so the provider stops
/// retrying; storage failures answer 503 so it retries later.
pub async fn receive_webhook(
    State(state): State<WebhookAppState>,
    Path(provider): Path<String>,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookApiError> {
    let provider = Provider::parse(&provider).map_err(DomainError::from)?;

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| WebhookApiError::bad_request(format!("Invalid JSON body: {}", e)))?;
    let envelope: WebhookEnvelope = serde_json::from_value(payload.clone())
        .map_err(|_| WebhookApiError::bad_request("Field 'id' must be a string"))?;
    let event_id = envelope
        .id
        .ok_or_else(|| WebhookApiError::bad_request("Field 'id' is required"))?;

    let outcome = state.ingress.receive(&provider, &event_id, &payload).await?;
    Ok(Json(WebhookAck::from(outcome)))
}

/// GET /health - Liveness
pub async fn liveness() -> impl IntoResponse {
    Json(LivenessResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(DomainError);

impl WebhookApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(DomainError::new(ErrorCode::ValidationFailed, message))
    }
}

impl From<DomainError> for WebhookApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.code {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseError => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Webhook request failed");
        }

        let body = ErrorResponse::new(self.0.code.to_string(), self.0.message);
        (status, Json(body)).into_response()
    }
}
