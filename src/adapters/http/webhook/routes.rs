//! Axum router configuration for webhook ingress.

use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{liveness, receive_webhook, WebhookAppState};

/// Create the webhook ingress router.
///
/// # Routes
/// - `POST /webhooks/:provider` - Accept a provider callback
/// - `GET /health` - Liveness
pub fn webhook_router(state: WebhookAppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/webhooks/:provider", post(receive_webhook))
        .route("/health", get(liveness))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
