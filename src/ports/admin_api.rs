//! AdminApi port - authorized read-only queries against the service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Deserialize;

use super::ProbeError;

/// `GET /admin/dlq/stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DlqStats {
    #[serde(default)]
    pub webhook: u64,
    #[serde(default)]
    pub sms: u64,
}

/// One provider's entry in `GET /admin/webhooks/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDeliveryStatus {
    pub provider: String,
    #[serde(default)]
    pub last_success_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_outcome: Option<String>,
    #[serde(default)]
    pub latencies_ms: Vec<u64>,
}

impl ProviderDeliveryStatus {
    pub fn outcome_ok(&self) -> bool {
        self.last_outcome
            .as_deref()
            .map_or(false, |o| o.eq_ignore_ascii_case("ok"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookStatusReport {
    #[serde(default)]
    pub providers: Vec<ProviderDeliveryStatus>,
}

impl WebhookStatusReport {
    pub fn provider(&self, name: &str) -> Option<&ProviderDeliveryStatus> {
        self.providers
            .iter()
            .find(|p| p.provider.eq_ignore_ascii_case(name))
    }
}

#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn dlq_stats(&self, token: &SecretString) -> Result<DlqStats, ProbeError>;

    async fn webhook_status(&self, token: &SecretString) -> Result<WebhookStatusReport, ProbeError>;
}
