use async_trait::async_trait;
use std::sync::Arc;

use super::ReadinessCheck;
use crate::config::GateConfig;
use crate::domain::gate::CheckResult;
use crate::ports::{HostResolver, ResolveError};

const NAME: &str = "dns";

/// Resolves the public hostname. Never fails hard: a resolution problem
/// here is usually the runner's network, not the deployment.
pub struct DnsCheck {
    resolver: Arc<dyn HostResolver>,
}

impl DnsCheck {
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl ReadinessCheck for DnsCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        let Some(host) = config.dns_host() else {
            return CheckResult::skipped(NAME, "no-host");
        };

        match self.resolver.resolve(&host).await {
            Ok(addrs) if addrs.is_empty() => {
                CheckResult::skipped(NAME, format!("no-records host={}", host))
            }
            Ok(addrs) => CheckResult::pass(
                NAME,
                format!("resolved={} host={}", addrs.len(), host),
            ),
            Err(ResolveError::Timeout) => CheckResult::skipped(NAME, format!("timeout host={}", host)),
            Err(ResolveError::Lookup(e)) => {
                tracing::debug!(host = %host, error = %e, "DNS lookup failed");
                CheckResult::skipped(NAME, format!("lookup-failed host={}", host))
            }
        }
    }
}
