//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! ## Webhook Ports
//!
//! - `WebhookEventStore` - idempotency records keyed by (provider, event id)
//! - `DlqStore` - dead-letter queue with leased claims
//! - `WebhookHandler` - business logic invoked for new and retried deliveries
//!
//! ## Readiness Ports
//!
//! - `ServiceProbe` - health endpoint polling and response headers
//! - `AdminApi` - bearer-authorized DLQ and webhook status queries
//! - `Backuper` - backup tool invocation and checksum recomputation
//! - `HostResolver`, `CertificateInspector`, `VirusScanner` - network probes

mod admin_api;
mod backuper;
mod dlq_store;
mod network;
mod service_probe;
mod webhook_event_store;
mod webhook_handler;

pub use admin_api::{AdminApi, DlqStats, ProviderDeliveryStatus, WebhookStatusReport};
pub use backuper::{BackupArtifact, BackupError, Backuper};
pub use dlq_store::DlqStore;
pub use network::{
    CertificateInspector, HostResolver, PeerCertificate, ResolveError, ScanError, ScanVerdict,
    TlsProbeError, VirusScanner,
};
pub use service_probe::{HeaderSnapshot, HealthSnapshot, ProbeError, ServiceProbe};
pub use webhook_event_store::WebhookEventStore;
pub use webhook_handler::{HandlerError, WebhookHandler};
