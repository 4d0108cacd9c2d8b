//! Deployment readiness gate: the check suite and its aggregator.

pub mod checks;
mod readiness_gate;

pub use checks::{standard_suite, ReadinessCheck, SuiteDeps};
pub use readiness_gate::ReadinessGate;
