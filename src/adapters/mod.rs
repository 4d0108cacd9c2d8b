//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Durable idempotency and DLQ stores
//! - `memory` - In-process stores for tests and local runs
//! - `http` - Webhook ingress router, health probe, admin API client
//! - `net` - DNS, TLS certificate and antivirus probes
//! - `backup` - Filesystem backup tool wrapper

pub mod backup;
pub mod http;
pub mod memory;
pub mod net;
pub mod postgres;

pub use backup::FilesystemBackuper;
pub use http::{webhook_router, AdminClient, HealthProbe, WebhookAppState};
pub use memory::{InMemoryDlqStore, InMemoryWebhookEventStore};
pub use net::{ClamdScanner, RustlsCertificateInspector, TokioHostResolver};
pub use postgres::{PostgresDlqStore, PostgresWebhookEventStore};
