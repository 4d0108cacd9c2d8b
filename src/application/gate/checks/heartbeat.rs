use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::ReadinessCheck;
use crate::config::GateConfig;
use crate::domain::gate::CheckResult;
use crate::ports::ServiceProbe;

const NAME: &str = "heartbeat";

/// Recency of a background job's last run, read from the health body.
pub struct HeartbeatCheck {
    probe: Arc<dyn ServiceProbe>,
}

impl HeartbeatCheck {
    pub fn new(probe: Arc<dyn ServiceProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl ReadinessCheck for HeartbeatCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        let url = match config.health_url() {
            Ok(url) => url.to_string(),
            Err(_) => return CheckResult::fail(NAME, "invalid-target"),
        };
        let job = &config.heartbeat.job;

        let snapshot = match self.probe.fetch_health(&url).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(error = %e, "Health endpoint unavailable for heartbeat");
                return CheckResult::skipped(NAME, "unreachable");
            }
        };

        let Some(last_run) = snapshot.last_run_at(job) else {
            return CheckResult::fail(NAME, format!("missing job={}", job));
        };

        let age = Utc::now() - last_run;
        if age > config.heartbeat.freshness() {
            CheckResult::fail(
                NAME,
                format!(
                    "stale job={} age_secs={} max_secs={}",
                    job,
                    age.num_seconds(),
                    config.heartbeat.freshness_secs
                ),
            )
        } else {
            CheckResult::pass(NAME, format!("job={} age_secs={}", job, age.num_seconds().max(0)))
        }
    }
}
