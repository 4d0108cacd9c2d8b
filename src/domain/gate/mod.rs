//! Gate module - readiness check results and the aggregate verdict.

mod check;
mod latency;
mod verdict;

pub use check::{CheckResult, CheckStatus};
pub use latency::{p95, percentile};
pub use verdict::{GateState, GateStatus, GateVerdict, ResultCounts};
