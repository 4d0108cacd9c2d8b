use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::ReadinessCheck;
use crate::config::GateConfig;
use crate::domain::gate::CheckResult;
use crate::ports::{CertificateInspector, TlsProbeError};

const NAME: &str = "tls";

/// Certificate validity and remaining lifetime.
pub struct TlsCheck {
    inspector: Arc<dyn CertificateInspector>,
}

impl TlsCheck {
    pub fn new(inspector: Arc<dyn CertificateInspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl ReadinessCheck for TlsCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        let Some(host) = config.tls_host() else {
            return CheckResult::skipped(NAME, "no-host");
        };
        let min_days = config.tls.min_days;

        match self.inspector.inspect(&host, config.tls.port).await {
            Ok(cert) => {
                let days_left = cert.days_until_expiry(Utc::now());
                if days_left > min_days {
                    CheckResult::pass(
                        NAME,
                        format!("days_left={} not_after={}", days_left, cert.not_after.to_rfc3339()),
                    )
                } else {
                    CheckResult::fail(
                        NAME,
                        format!("expiring days_left={} min_days={}", days_left, min_days),
                    )
                }
            }
            Err(TlsProbeError::InvalidCertificate(reason)) => {
                CheckResult::fail(NAME, format!("invalid {}", reason))
            }
            Err(TlsProbeError::Unreachable(reason)) => {
                tracing::debug!(host = %host, error = %reason, "TLS endpoint unreachable");
                CheckResult::skipped(NAME, format!("unreachable host={}", host))
            }
        }
    }
}
