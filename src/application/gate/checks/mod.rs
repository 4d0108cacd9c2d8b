//! The readiness check suite.
//!
//! Every check is read-only and independent of the others. Checks never
//! return errors: each outcome, including "could not tell", is a
//! [`CheckResult`]. The first token of a result's detail is a short reason
//! code (`expiring`, `stale`, `unreachable`, ...) used in the gate summary.

mod alerts;
mod antivirus;
mod backup;
mod dlq_backlog;
mod dns;
mod headers;
mod health;
mod heartbeat;
mod tls;
mod webhooks;

#[cfg(test)]
pub(crate) mod fakes;

pub use alerts::AlertRulesCheck;
pub use antivirus::{AntivirusCheck, EICAR_TEST_SIGNATURE};
pub use backup::{BackupCheck, RestoreCheck};
pub use dlq_backlog::DlqBacklogCheck;
pub use dns::DnsCheck;
pub use headers::{evaluate_headers, HeadersCheck};
pub use health::HealthCheck;
pub use heartbeat::HeartbeatCheck;
pub use tls::TlsCheck;
pub use webhooks::WebhookFreshnessCheck;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::GateConfig;
use crate::domain::gate::CheckResult;
use crate::ports::{
    AdminApi, Backuper, CertificateInspector, HostResolver, ServiceProbe, VirusScanner,
};

/// One verification unit of the readiness gate.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// Name used in report lines.
    fn name(&self) -> &'static str;

    async fn run(&self, config: &GateConfig) -> CheckResult;
}

/// Collaborators the standard suite probes through.
#[derive(Clone)]
pub struct SuiteDeps {
    pub probe: Arc<dyn ServiceProbe>,
    pub admin: Arc<dyn AdminApi>,
    pub resolver: Arc<dyn HostResolver>,
    pub inspector: Arc<dyn CertificateInspector>,
    pub backuper: Arc<dyn Backuper>,
    pub scanner: Arc<dyn VirusScanner>,
}

/// The fixed, ordered suite.
pub fn standard_suite(deps: SuiteDeps) -> Vec<Box<dyn ReadinessCheck>> {
    vec![
        Box::new(HealthCheck::new(deps.probe.clone())),
        Box::new(DnsCheck::new(deps.resolver)),
        Box::new(TlsCheck::new(deps.inspector)),
        Box::new(HeadersCheck::new(deps.probe.clone())),
        Box::new(HeartbeatCheck::new(deps.probe)),
        Box::new(DlqBacklogCheck::new(deps.admin.clone())),
        Box::new(WebhookFreshnessCheck::new(deps.admin)),
        Box::new(BackupCheck::new(deps.backuper.clone())),
        Box::new(RestoreCheck::new(deps.backuper)),
        Box::new(AlertRulesCheck),
        Box::new(AntivirusCheck::new(deps.scanner)),
    ]
}

/// Outcome for a query that needs the admin token when none is configured.
pub(crate) fn missing_credentials(name: &'static str, required: bool) -> CheckResult {
    if required {
        CheckResult::fail(name, "missing-credentials")
    } else {
        CheckResult::skipped(name, "missing-credentials")
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;

    #[test]
    fn standard_suite_order() {
        let names: Vec<_> = standard_suite(fake_deps()).iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "health",
                "dns",
                "tls",
                "headers",
                "heartbeat",
                "dlq_backlog",
                "webhooks",
                "backup",
                "restore",
                "alerts",
                "antivirus"
            ]
        );
    }
}
