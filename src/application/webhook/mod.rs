//! Webhook pipeline services.

mod dlq_runner;
mod ingress;
mod logging_handler;

pub use dlq_runner::{BatchReport, DlqRunner, DlqRunnerConfig};
pub use ingress::{IngressOutcome, WebhookIngress};
pub use logging_handler::LoggingHandler;
