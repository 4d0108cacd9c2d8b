//! ServiceProbe port - read-only HTTP access to the deployment under test.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("request timed out")]
    Timeout,

    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("unauthorized (HTTP {0})")]
    Unauthorized(u16),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl ProbeError {
    /// Dependency could not be asked at all, as opposed to answering badly.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProbeError::Timeout | ProbeError::Unreachable(_))
    }
}

/// Parsed body of the service health endpoint.
///
/// ```json
/// {
///   "db": { "connected": true },
///   "cache": { "driver": "redis" },
///   "jobs": { "retention": { "lastRunAt": "2025-01-01T03:00:00Z" } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub db_connected: Option<bool>,
    pub cache_driver: Option<String>,
    /// Last run per job; `None` when the job is listed without a timestamp.
    pub jobs: HashMap<String, Option<DateTime<Utc>>>,
}

impl HealthSnapshot {
    /// Extracts the known fields, ignoring anything else in the body.
    pub fn from_json(body: &Value) -> Self {
        let db_connected = body
            .pointer("/db/connected")
            .and_then(Value::as_bool);
        let cache_driver = body
            .pointer("/cache/driver")
            .and_then(Value::as_str)
            .map(str::to_string);

        let jobs = body
            .get("jobs")
            .and_then(Value::as_object)
            .map(|jobs| {
                jobs.iter()
                    .map(|(name, job)| {
                        let raw = job.get("lastRunAt").or(Some(job)).and_then(Value::as_str);
                        let last_run = raw
                            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                            .map(|t| t.with_timezone(&Utc));
                        (name.clone(), last_run)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            db_connected,
            cache_driver,
            jobs,
        }
    }

    pub fn last_run_at(&self, job: &str) -> Option<DateTime<Utc>> {
        self.jobs.get(job).copied().flatten()
    }
}

/// Response headers, names lowercased, repeated headers kept in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSnapshot {
    entries: Vec<(String, String)>,
}

impl HeaderSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_ascii_lowercase(), value.into()));
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(move |(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// Polls `url` until it answers 200 or `timeout` elapses.
    async fn wait_ready(&self, url: &str, timeout: Duration, retry_interval: Duration) -> bool;

    /// Fetches and parses the health body.
    async fn fetch_health(&self, url: &str) -> Result<HealthSnapshot, ProbeError>;

    /// Fetches the response headers of a GET to `url`.
    async fn fetch_headers(&self, url: &str) -> Result<HeaderSnapshot, ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_documented_fields() {
        let snapshot = HealthSnapshot::from_json(&json!({
            "db": {"connected": true},
            "cache": {"driver": "redis"},
            "jobs": {"retention": {"lastRunAt": "2025-01-01T03:00:00Z"}}
        }));

        assert_eq!(snapshot.db_connected, Some(true));
        assert_eq!(snapshot.cache_driver.as_deref(), Some("redis"));
        assert_eq!(
            snapshot.last_run_at("retention").map(|t| t.to_rfc3339()),
            Some("2025-01-01T03:00:00+00:00".to_string())
        );
    }

    #[test]
    fn accepts_bare_timestamp_per_job() {
        let snapshot = HealthSnapshot::from_json(&json!({
            "jobs": {"retention": "2025-01-01T03:00:00Z"}
        }));
        assert!(snapshot.last_run_at("retention").is_some());
    }

    #[test]
    fn missing_fields_are_none() {
        let snapshot = HealthSnapshot::from_json(&json!({"status": "ok"}));
        assert_eq!(snapshot.db_connected, None);
        assert!(snapshot.last_run_at("retention").is_none());
    }

    #[test]
    fn unparseable_job_timestamp_is_none() {
        let snapshot = HealthSnapshot::from_json(&json!({
            "jobs": {"retention": {"lastRunAt": "yesterday"}}
        }));
        assert!(snapshot.jobs.contains_key("retention"));
        assert!(snapshot.last_run_at("retention").is_none());
    }

    #[test]
    fn header_lookup_is_case_insensitive_and_keeps_repeats() {
        let headers = HeaderSnapshot::new()
            .with("Set-Cookie", "a=1")
            .with("set-cookie", "b=2")
            .with("Strict-Transport-Security", "max-age=1");

        assert_eq!(headers.get("strict-transport-security"), Some("max-age=1"));
        assert_eq!(headers.get_all("SET-COOKIE").collect::<Vec<_>>(), vec!["a=1", "b=2"]);
        assert!(headers.get("content-security-policy").is_none());
    }
}
