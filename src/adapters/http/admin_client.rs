//! AdminClient - bearer-authorized queries against the service admin API.

use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::health_probe::probe_error;
use crate::ports::{AdminApi, DlqStats, ProbeError, WebhookStatusReport};

const DLQ_STATS_PATH: &str = "/admin/dlq/stats";
const WEBHOOK_STATUS_PATH: &str = "/admin/webhooks/status";

pub struct AdminClient {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
}

impl AdminClient {
    pub fn new(base_url: Url, request_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            request_timeout,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &SecretString,
    ) -> Result<T, ProbeError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose_secret())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(probe_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProbeError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProbeError::InvalidBody(e.to_string()))
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn dlq_stats(&self, token: &SecretString) -> Result<DlqStats, ProbeError> {
        self.get_json(DLQ_STATS_PATH, token).await
    }

    async fn webhook_status(&self, token: &SecretString) -> Result<WebhookStatusReport, ProbeError> {
        self.get_json(WEBHOOK_STATUS_PATH, token).await
    }
}
