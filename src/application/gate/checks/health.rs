use async_trait::async_trait;
use std::sync::Arc;

use super::ReadinessCheck;
use crate::config::GateConfig;
use crate::domain::gate::CheckResult;
use crate::ports::ServiceProbe;

const NAME: &str = "health";

/// Waits for the service health endpoint and checks the database flag.
pub struct HealthCheck {
    probe: Arc<dyn ServiceProbe>,
}

impl HealthCheck {
    pub fn new(probe: Arc<dyn ServiceProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl ReadinessCheck for HealthCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        let url = match config.health_url() {
            Ok(url) => url.to_string(),
            Err(_) => return CheckResult::fail(NAME, "invalid-target"),
        };

        let probe = &config.probe;
        if !self
            .probe
            .wait_ready(&url, probe.timeout(), probe.retry_interval())
            .await
        {
            return CheckResult::fail(NAME, format!("not-ready timeout_secs={}", probe.timeout_secs));
        }

        // Readiness only needs the 200; the body is informational.
        match self.probe.fetch_health(&url).await {
            Ok(snapshot) if snapshot.db_connected == Some(false) => {
                CheckResult::fail(NAME, "db-disconnected")
            }
            Ok(snapshot) => {
                let cache = snapshot.cache_driver.as_deref().unwrap_or("unknown");
                CheckResult::pass(NAME, format!("ready cache={}", cache))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Health body unavailable after ready response");
                CheckResult::pass(NAME, "ready")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fakes::*;
    use super::*;
    use crate::domain::gate::CheckStatus;
    use crate::ports::{HealthSnapshot, ProbeError};

    async fn run(probe: FakeProbe) -> CheckResult {
        HealthCheck::new(Arc::new(probe)).run(&gate_config()).await
    }

    #[tokio::test]
    async fn ready_service_passes() {
        let snapshot = HealthSnapshot {
            db_connected: Some(true),
            cache_driver: Some("redis".to_string()),
            ..Default::default()
        };
        let result = run(FakeProbe {
            health: Ok(snapshot),
            ..Default::default()
        })
        .await;

        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.detail, "ready cache=redis");
    }

    #[tokio::test]
    async fn not_ready_fails() {
        let result = run(FakeProbe {
            ready: false,
            ..Default::default()
        })
        .await;

        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.reason(), Some("not-ready"));
    }

    #[tokio::test]
    async fn disconnected_database_fails() {
        let snapshot = HealthSnapshot {
            db_connected: Some(false),
            ..Default::default()
        };
        let result = run(FakeProbe {
            health: Ok(snapshot),
            ..Default::default()
        })
        .await;

        assert_eq!(result.label(), "health:db-disconnected");
    }

    #[tokio::test]
    async fn unreadable_body_still_passes() {
        let result = run(FakeProbe {
            health: Err(ProbeError::InvalidBody("not json".to_string())),
            ..Default::default()
        })
        .await;

        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn invalid_target_fails() {
        let result = HealthCheck::new(Arc::new(FakeProbe::default()))
            .run(&GateConfig::default())
            .await;
        assert_eq!(result.label(), "health:invalid-target");
    }
}
