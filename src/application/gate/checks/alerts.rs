use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;

use super::ReadinessCheck;
use crate::config::GateConfig;
use crate::domain::gate::CheckResult;

const NAME: &str = "alerts";

/// Prometheus-style rules file: `groups[].rules[].alert`.
#[derive(Debug, Default, Deserialize)]
struct RulesFile {
    #[serde(default)]
    groups: Vec<RuleGroup>,
}

#[derive(Debug, Deserialize)]
struct RuleGroup {
    #[serde(default)]
    rules: Vec<Rule>,
}

#[derive(Debug, Deserialize)]
struct Rule {
    /// Recording rules have no alert name.
    alert: Option<String>,
}

/// Required alert rule names are defined.
pub struct AlertRulesCheck;

#[async_trait]
impl ReadinessCheck for AlertRulesCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        let policy = &config.alerts;
        let absent = |detail: &str| {
            if policy.require_file {
                CheckResult::fail(NAME, detail)
            } else {
                CheckResult::skipped(NAME, detail)
            }
        };

        let Some(path) = policy.rules_file.as_ref() else {
            return absent("rules-file-absent");
        };

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return absent(&format!("rules-file-absent path={}", path.display()))
            }
            Err(e) => return CheckResult::fail(NAME, format!("unreadable {}", e)),
        };

        let rules: RulesFile = match serde_yaml::from_str(&raw) {
            Ok(rules) => rules,
            Err(e) => return CheckResult::fail(NAME, format!("invalid-rules {}", e)),
        };

        let defined: HashSet<&str> = rules
            .groups
            .iter()
            .flat_map(|g| g.rules.iter())
            .filter_map(|r| r.alert.as_deref())
            .collect();

        let missing: Vec<&str> = policy
            .required
            .iter()
            .map(String::as_str)
            .filter(|name| !defined.contains(name))
            .collect();

        if missing.is_empty() {
            CheckResult::pass(NAME, format!("required={} defined={}", policy.required.len(), defined.len()))
        } else {
            CheckResult::fail(NAME, format!("missing rules={}", missing.join(",")))
        }
    }
}
