//! HTTP adapters.
//!
//! - `webhook` - axum ingress router for provider callbacks
//! - `HealthProbe` - reqwest poller implementing `ServiceProbe`
//! - `AdminClient` - reqwest client implementing `AdminApi`

mod admin_client;
mod health_probe;
pub mod webhook;

pub use admin_client::AdminClient;
pub use health_probe::HealthProbe;
pub use webhook::{webhook_router, WebhookAppState};
