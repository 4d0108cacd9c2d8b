//! Aggregate go/no-go decision over a set of check results.
//!
//! ## Policy
//!
//! | Results | strict (default) | allow-skips |
//! |---------|------------------|-------------|
//! | any FAIL | NO_GO | NO_GO |
//! | SKIPPED, no FAIL | NO_GO | GO |
//! | all PASS | GO | GO |

use serde::Serialize;
use std::fmt;

use super::{CheckResult, CheckStatus};

/// Final gate outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    Go,
    NoGo,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Go => "GO",
            GateStatus::NoGo => "NO_GO",
        }
    }

    /// Process exit code consumed by CI: 0 for GO, 1 for NO_GO.
    pub fn exit_code(&self) -> i32 {
        match self {
            GateStatus::Go => 0,
            GateStatus::NoGo => 1,
        }
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate lifecycle: `NotRun -> Running -> Completed(Go | NoGo)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    NotRun,
    Running,
    Completed(GateStatus),
}

/// Per-status tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Outcome of one gate invocation. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateVerdict {
    pub results: Vec<CheckResult>,
    pub status: GateStatus,
    /// Whether SKIPPED counted as failure.
    pub strict: bool,
}

impl GateVerdict {
    /// Classifies the ordered results under the given strictness.
    pub fn from_results(results: Vec<CheckResult>, strict: bool) -> Self {
        let counts = count(&results);
        let status = if counts.failed > 0 || (strict && counts.skipped > 0) {
            GateStatus::NoGo
        } else {
            GateStatus::Go
        };

        Self {
            results,
            status,
            strict,
        }
    }

    pub fn is_go(&self) -> bool {
        self.status == GateStatus::Go
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }

    pub fn counts(&self) -> ResultCounts {
        count(&self.results)
    }

    /// 1-based ordinal and result of the first check that blocked the gate.
    ///
    /// A SKIPPED result only blocks in strict mode.
    pub fn first_failure(&self) -> Option<(usize, &CheckResult)> {
        self.results
            .iter()
            .enumerate()
            .find(|(_, r)| match r.status {
                CheckStatus::Fail => true,
                CheckStatus::Skipped => self.strict,
                CheckStatus::Pass => false,
            })
            .map(|(i, r)| (i + 1, r))
    }

    /// One line per check followed by a summary line.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.results.iter().map(CheckResult::report_line).collect();
        let counts = self.counts();
        let mut summary = format!(
            "{} pass={} fail={} skipped={} strict={}",
            self.status, counts.passed, counts.failed, counts.skipped, self.strict
        );
        if let Some((ordinal, result)) = self.first_failure() {
            summary.push_str(&format!(" first_failure={}:{}", ordinal, result.label()));
        }
        lines.push(summary);
        lines
    }
}

fn count(results: &[CheckResult]) -> ResultCounts {
    results.iter().fold(ResultCounts::default(), |mut acc, r| {
        match r.status {
            CheckStatus::Pass => acc.passed += 1,
            CheckStatus::Fail => acc.failed += 1,
            CheckStatus::Skipped => acc.skipped += 1,
        }
        acc
    })
}
