use async_trait::async_trait;
use std::sync::Arc;

use super::{missing_credentials, ReadinessCheck};
use crate::config::GateConfig;
use crate::domain::gate::CheckResult;
use crate::ports::{AdminApi, ProbeError};

const NAME: &str = "dlq_backlog";

/// Webhook and SMS dead-letter backlogs against their ceilings.
pub struct DlqBacklogCheck {
    admin: Arc<dyn AdminApi>,
}

impl DlqBacklogCheck {
    pub fn new(admin: Arc<dyn AdminApi>) -> Self {
        Self { admin }
    }
}

#[async_trait]
impl ReadinessCheck for DlqBacklogCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        let limits = &config.dlq_backlog;
        let Some(token) = config.admin_token.as_ref() else {
            return missing_credentials(NAME, limits.require_credentials);
        };

        let stats = match self.admin.dlq_stats(token).await {
            Ok(stats) => stats,
            Err(ProbeError::Unauthorized(status)) => {
                return CheckResult::fail(NAME, format!("unauthorized status={}", status))
            }
            Err(e) => {
                tracing::debug!(error = %e, "DLQ stats query failed");
                return CheckResult::skipped(NAME, "unreachable");
            }
        };

        let mut exceeded = Vec::new();
        if stats.webhook > limits.max_webhook {
            exceeded.push(format!("webhook={}>{}", stats.webhook, limits.max_webhook));
        }
        if stats.sms > limits.max_sms {
            exceeded.push(format!("sms={}>{}", stats.sms, limits.max_sms));
        }

        if exceeded.is_empty() {
            CheckResult::pass(NAME, format!("webhook={} sms={}", stats.webhook, stats.sms))
        } else {
            CheckResult::fail(NAME, format!("backlog {}", exceeded.join(" ")))
        }
    }
}
