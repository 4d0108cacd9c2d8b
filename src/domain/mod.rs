//! Domain layer - types and rules with no I/O.
//!
//! - `foundation` - identifiers and error types
//! - `webhook` - delivery records, DLQ entries, retry backoff
//! - `gate` - readiness check results and the go/no-go verdict

pub mod foundation;
pub mod gate;
pub mod webhook;
