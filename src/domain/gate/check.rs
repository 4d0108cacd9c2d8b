//! Outcome of a single readiness check.

use serde::Serialize;
use std::fmt;

/// Classification of a check outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    /// The check could not decide, usually because a dependency was unavailable.
    Skipped,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one check. Produced fresh on every gate run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    /// Free-form diagnostic. By convention the first token is a short reason
    /// code such as `expiring` or `unreachable`.
    pub detail: String,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, detail)
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Fail, detail)
    }

    pub fn skipped(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Skipped, detail)
    }

    fn new(name: impl Into<String>, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Leading reason code of the detail, if any.
    pub fn reason(&self) -> Option<&str> {
        self.detail.split_whitespace().next()
    }

    /// `<name>:<reason>`, e.g. `tls:expiring`.
    pub fn label(&self) -> String {
        match self.reason() {
            Some(reason) => format!("{}:{}", self.name, reason),
            None => self.name.clone(),
        }
    }

    /// Machine-parseable CI line: `PASS|FAIL|SKIPPED <name>[ <detail>]`.
    pub fn report_line(&self) -> String {
        if self.detail.is_empty() {
            format!("{} {}", self.status, self.name)
        } else {
            format!("{} {} {}", self.status, self.name, self.detail)
        }
    }
}
