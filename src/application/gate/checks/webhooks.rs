use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::{missing_credentials, ReadinessCheck};
use crate::config::GateConfig;
use crate::domain::gate::{p95, CheckResult};
use crate::ports::{AdminApi, ProbeError};

const NAME: &str = "webhooks";

/// Per-provider delivery freshness, outcome and p95 latency.
pub struct WebhookFreshnessCheck {
    admin: Arc<dyn AdminApi>,
}

impl WebhookFreshnessCheck {
    pub fn new(admin: Arc<dyn AdminApi>) -> Self {
        Self { admin }
    }
}

#[async_trait]
impl ReadinessCheck for WebhookFreshnessCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        let policy = &config.webhooks;
        let Some(token) = config.admin_token.as_ref() else {
            return missing_credentials(NAME, policy.require_credentials);
        };

        let report = match self.admin.webhook_status(token).await {
            Ok(report) => report,
            Err(ProbeError::Unauthorized(status)) => {
                return CheckResult::fail(NAME, format!("unauthorized status={}", status))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Webhook status query failed");
                return CheckResult::skipped(NAME, "unreachable");
            }
        };

        let now = Utc::now();
        let mut summaries = Vec::new();

        for provider in &policy.providers {
            let Some(status) = report.provider(provider) else {
                return CheckResult::fail(NAME, format!("stale provider={} last_success=none", provider));
            };

            match status.last_success_at {
                Some(at) if now - at <= policy.freshness() => {}
                Some(at) => {
                    return CheckResult::fail(
                        NAME,
                        format!(
                            "stale provider={} age_secs={} max_secs={}",
                            provider,
                            (now - at).num_seconds(),
                            policy.freshness_secs
                        ),
                    )
                }
                None => {
                    return CheckResult::fail(NAME, format!("stale provider={} last_success=none", provider))
                }
            }

            if !status.outcome_ok() {
                return CheckResult::fail(
                    NAME,
                    format!(
                        "outcome provider={} last_outcome={}",
                        provider,
                        status.last_outcome.as_deref().unwrap_or("none")
                    ),
                );
            }

            let latency = p95(&status.latencies_ms);
            if let Some(ceiling) = policy.max_p95_ms {
                if latency > ceiling {
                    return CheckResult::fail(
                        NAME,
                        format!("latency provider={} p95_ms={} max_ms={}", provider, latency, ceiling),
                    );
                }
            }

            summaries.push(format!("{}:p95_ms={}", provider, latency));
        }

        CheckResult::pass(NAME, summaries.join(" "))
    }
}
