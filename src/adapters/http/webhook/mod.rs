//! HTTP adapter for webhook ingress.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, WebhookAck};
pub use handlers::{WebhookApiError, WebhookAppState};
pub use routes::webhook_router;
