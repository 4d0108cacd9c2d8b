//! Application layer - services that orchestrate domain rules through ports.
//!
//! - `webhook` - ingress (dedup, dispatch, dead-letter) and the DLQ runner
//! - `gate` - readiness check suite and go/no-go aggregation

pub mod gate;
pub mod webhook;

pub use gate::{standard_suite, ReadinessCheck, ReadinessGate, SuiteDeps};
pub use webhook::{
    BatchReport, DlqRunner, DlqRunnerConfig, IngressOutcome, LoggingHandler, WebhookIngress,
};
