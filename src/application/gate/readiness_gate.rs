//! ReadinessGate - runs the check suite once and folds it into a verdict.
//!
//! ```text
//! NOT_RUN --run--> RUNNING --> COMPLETED(GO | NO_GO)
//! ```
//!
//! Checks run sequentially, each exactly once. A check that exceeds the
//! per-check timeout is SKIPPED `timeout`; checks not started before the
//! overall deadline are SKIPPED `gate-deadline`.

use std::time::Duration;
use tokio::time::Instant;

use super::checks::ReadinessCheck;
use crate::config::GateConfig;
use crate::domain::gate::{CheckResult, CheckStatus, GateState, GateVerdict};

pub struct ReadinessGate {
    config: GateConfig,
    checks: Vec<Box<dyn ReadinessCheck>>,
    state: GateState,
}

impl ReadinessGate {
    pub fn new(config: GateConfig, checks: Vec<Box<dyn ReadinessCheck>>) -> Self {
        Self {
            config,
            checks,
            state: GateState::NotRun,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub async fn run(&mut self) -> GateVerdict {
        self.state = GateState::Running;

        let deadline = Instant::now() + self.config.overall_timeout();
        let check_timeout = self.config.check_timeout();
        let mut results = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            let name = check.name();
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(check = name, "Gate deadline elapsed before check started");
                results.push(CheckResult::skipped(name, "gate-deadline"));
                continue;
            }

            let budget = check_timeout.min(remaining);
            let started = Instant::now();
            let result = match tokio::time::timeout(budget, check.run(&self.config)).await {
                Ok(result) => result,
                Err(_) => timed_out(name, budget, check_timeout),
            };

            log_result(&result, started.elapsed());
            results.push(result);
        }

        let verdict = GateVerdict::from_results(results, self.config.strict());
        let counts = verdict.counts();
        tracing::info!(
            status = %verdict.status,
            passed = counts.passed,
            failed = counts.failed,
            skipped = counts.skipped,
            strict = verdict.strict,
            "Readiness gate completed"
        );

        self.state = GateState::Completed(verdict.status);
        verdict
    }
}

fn timed_out(name: &str, budget: Duration, check_timeout: Duration) -> CheckResult {
    if budget < check_timeout {
        CheckResult::skipped(name, "gate-deadline")
    } else {
        CheckResult::skipped(name, format!("timeout after_secs={}", budget.as_secs()))
    }
}

fn log_result(result: &CheckResult, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match result.status {
        CheckStatus::Pass => {
            tracing::info!(check = %result.name, elapsed_ms, detail = %result.detail, "Check passed")
        }
        CheckStatus::Fail => {
            tracing::warn!(check = %result.name, elapsed_ms, detail = %result.detail, "Check failed")
        }
        CheckStatus::Skipped => {
            tracing::warn!(check = %result.name, elapsed_ms, detail = %result.detail, "Check skipped")
        }
    }
}
