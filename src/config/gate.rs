//! Readiness gate configuration
//!
//! Every threshold the checks apply lives here; none are hardcoded in the
//! checks themselves.

use reqwest::Url;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::webhook::Provider;

/// Top-level gate settings
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Base URL of the deployment under test, e.g. `https://staging.example.com`
    #[serde(default)]
    pub target_url: String,

    /// Path of the service health endpoint
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// When true, SKIPPED results do not block the release
    #[serde(default)]
    pub allow_skips: bool,

    /// Ceiling for the whole gate run, in seconds
    #[serde(default = "default_overall_timeout")]
    pub overall_timeout_secs: u64,

    /// Ceiling for a single check, in seconds
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,

    /// Bearer token for the admin query endpoints
    #[serde(default)]
    pub admin_token: Option<SecretString>,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub dns: DnsCheckConfig,

    #[serde(default)]
    pub tls: TlsCheckConfig,

    #[serde(default)]
    pub headers: HeadersCheckConfig,

    #[serde(default)]
    pub heartbeat: HeartbeatCheckConfig,

    #[serde(default)]
    pub dlq_backlog: DlqBacklogCheckConfig,

    #[serde(default)]
    pub webhooks: WebhookFreshnessCheckConfig,

    #[serde(default)]
    pub backup: BackupCheckConfig,

    #[serde(default)]
    pub alerts: AlertRulesCheckConfig,

    #[serde(default)]
    pub antivirus: AntivirusCheckConfig,
}

/// Health probe timing
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Overall time to wait for readiness, in seconds
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,

    /// Pause between attempts, in milliseconds
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,

    /// Ceiling for one request, in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DnsCheckConfig {
    /// Hostname to resolve; defaults to the target URL host
    pub host: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TlsCheckConfig {
    /// Hostname to connect to; defaults to the target URL host
    pub host: Option<String>,

    #[serde(default = "default_tls_port")]
    pub port: u16,

    /// Certificates expiring within this many days fail the gate
    #[serde(default = "default_min_days")]
    pub min_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadersCheckConfig {
    /// Minimum `Strict-Transport-Security` max-age, in seconds
    #[serde(default = "default_min_hsts_max_age")]
    pub min_hsts_max_age: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatCheckConfig {
    /// Job key under `jobs` in the health body
    #[serde(default = "default_heartbeat_job")]
    pub job: String,

    /// Maximum age of the last run, in seconds
    #[serde(default = "default_heartbeat_freshness")]
    pub freshness_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DlqBacklogCheckConfig {
    #[serde(default = "default_backlog_ceiling")]
    pub max_webhook: u64,

    #[serde(default = "default_backlog_ceiling")]
    pub max_sms: u64,

    /// Fail instead of skip when no admin token is configured
    #[serde(default)]
    pub require_credentials: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookFreshnessCheckConfig {
    /// Providers whose deliveries must be fresh
    #[serde(default = "default_webhook_providers")]
    pub providers: Vec<String>,

    /// Maximum age of the last successful delivery, in seconds
    #[serde(default = "default_webhook_freshness")]
    pub freshness_secs: u64,

    /// Optional ceiling on p95 delivery latency, in milliseconds
    #[serde(default)]
    pub max_p95_ms: Option<u64>,

    /// Fail instead of skip when no admin token is configured
    #[serde(default)]
    pub require_credentials: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupCheckConfig {
    /// Directory holding backup artifacts and their `.sha256` sidecars
    pub dir: Option<PathBuf>,

    /// Backup tool command line, run through `sh -c` with `BACKUP_FILE` set
    pub command: Option<String>,

    /// Take a fresh backup before checking
    #[serde(default)]
    pub run_before_check: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertRulesCheckConfig {
    /// Prometheus-style rules file
    pub rules_file: Option<PathBuf>,

    /// Alert names that must be defined
    #[serde(default)]
    pub required: Vec<String>,

    /// Fail instead of skip when the rules file is absent
    #[serde(default)]
    pub require_file: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AntivirusCheckConfig {
    #[serde(default)]
    pub enabled: bool,

    /// clamd TCP address
    #[serde(default = "default_clamd_address")]
    pub address: String,
}

impl GateConfig {
    pub fn strict(&self) -> bool {
        !self.allow_skips
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    /// Parsed target URL.
    pub fn target(&self) -> Result<Url, ValidationError> {
        let url = Url::parse(&self.target_url).map_err(|_| ValidationError::InvalidTargetUrl)?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ValidationError::InvalidTargetUrl);
        }
        Ok(url)
    }

    /// Full URL of the health endpoint.
    pub fn health_url(&self) -> Result<Url, ValidationError> {
        self.target()?
            .join(&self.health_path)
            .map_err(|_| ValidationError::InvalidTargetUrl)
    }

    /// Host used by the DNS check.
    pub fn dns_host(&self) -> Option<String> {
        self.dns.host.clone().or_else(|| self.target_host())
    }

    /// Host used by the TLS check.
    pub fn tls_host(&self) -> Option<String> {
        self.tls.host.clone().or_else(|| self.target_host())
    }

    fn target_host(&self) -> Option<String> {
        self.target()
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }

    /// Validate gate configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target_url.is_empty() {
            return Err(ValidationError::MissingRequired("GATE_TARGET_URL"));
        }
        self.target()?;
        if self.overall_timeout_secs == 0 {
            return Err(ValidationError::ZeroDuration("gate.overall_timeout_secs"));
        }
        if self.check_timeout_secs == 0 {
            return Err(ValidationError::ZeroDuration("gate.check_timeout_secs"));
        }
        self.probe.validate()?;
        for name in &self.webhooks.providers {
            Provider::parse(name).map_err(|_| ValidationError::InvalidProvider(name.clone()))?;
        }
        if self.antivirus.enabled && self.antivirus.address.parse::<std::net::SocketAddr>().is_err()
        {
            return Err(ValidationError::InvalidScannerAddress(
                self.antivirus.address.clone(),
            ));
        }
        Ok(())
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::ZeroDuration("gate.probe.timeout_secs"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ValidationError::ZeroDuration("gate.probe.request_timeout_ms"));
        }
        Ok(())
    }
}

impl HeartbeatCheckConfig {
    pub fn freshness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.freshness_secs.min(i64::MAX as u64) as i64)
    }
}

impl WebhookFreshnessCheckConfig {
    pub fn freshness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.freshness_secs.min(i64::MAX as u64) as i64)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            health_path: default_health_path(),
            allow_skips: false,
            overall_timeout_secs: default_overall_timeout(),
            check_timeout_secs: default_check_timeout(),
            admin_token: None,
            probe: ProbeConfig::default(),
            dns: DnsCheckConfig::default(),
            tls: TlsCheckConfig::default(),
            headers: HeadersCheckConfig::default(),
            heartbeat: HeartbeatCheckConfig::default(),
            dlq_backlog: DlqBacklogCheckConfig::default(),
            webhooks: WebhookFreshnessCheckConfig::default(),
            backup: BackupCheckConfig::default(),
            alerts: AlertRulesCheckConfig::default(),
            antivirus: AntivirusCheckConfig::default(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_probe_timeout(),
            retry_interval_ms: default_retry_interval(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for TlsCheckConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_tls_port(),
            min_days: default_min_days(),
        }
    }
}

impl Default for HeadersCheckConfig {
    fn default() -> Self {
        Self {
            min_hsts_max_age: default_min_hsts_max_age(),
        }
    }
}

impl Default for HeartbeatCheckConfig {
    fn default() -> Self {
        Self {
            job: default_heartbeat_job(),
            freshness_secs: default_heartbeat_freshness(),
        }
    }
}

impl Default for DlqBacklogCheckConfig {
    fn default() -> Self {
        Self {
            max_webhook: default_backlog_ceiling(),
            max_sms: default_backlog_ceiling(),
            require_credentials: false,
        }
    }
}

impl Default for WebhookFreshnessCheckConfig {
    fn default() -> Self {
        Self {
            providers: default_webhook_providers(),
            freshness_secs: default_webhook_freshness(),
            max_p95_ms: None,
            require_credentials: false,
        }
    }
}

impl Default for AntivirusCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_clamd_address(),
        }
    }
}

fn default_health_path() -> String {
    "/api/health".to_string()
}

fn default_overall_timeout() -> u64 {
    300
}

fn default_check_timeout() -> u64 {
    20
}

fn default_probe_timeout() -> u64 {
    60
}

fn default_retry_interval() -> u64 {
    2_000
}

fn default_request_timeout() -> u64 {
    5_000
}

fn default_tls_port() -> u16 {
    443
}

fn default_min_days() -> i64 {
    15
}

fn default_min_hsts_max_age() -> u64 {
    // 180 days
    15_552_000
}

fn default_heartbeat_job() -> String {
    "retention".to_string()
}

fn default_heartbeat_freshness() -> u64 {
    // daily job plus two hours of slack
    26 * 3600
}

fn default_backlog_ceiling() -> u64 {
    100
}

fn default_webhook_providers() -> Vec<String> {
    vec!["stripe".to_string()]
}

fn default_webhook_freshness() -> u64 {
    24 * 3600
}

fn default_clamd_address() -> String {
    "127.0.0.1:3310".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_target(url: &str) -> GateConfig {
        GateConfig {
            target_url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_are_strict() {
        let config = GateConfig::default();
        assert!(config.strict());
        assert_eq!(config.tls.min_days, 15);
        assert_eq!(config.heartbeat.job, "retention");
        assert_eq!(config.webhooks.providers, vec!["stripe".to_string()]);
    }

    #[test]
    fn missing_target_is_rejected() {
        assert_eq!(
            GateConfig::default().validate(),
            Err(ValidationError::MissingRequired("GATE_TARGET_URL"))
        );
    }

    #[test]
    fn non_http_target_is_rejected() {
        assert_eq!(
            with_target("ftp://example.com").validate(),
            Err(ValidationError::InvalidTargetUrl)
        );
    }

    #[test]
    fn health_url_joins_path() {
        let config = with_target("https://staging.example.com");
        assert_eq!(
            config.health_url().unwrap().as_str(),
            "https://staging.example.com/api/health"
        );
    }

    #[test]
    fn hosts_default_to_target_host() {
        let config = with_target("https://staging.example.com:8443/app");
        assert_eq!(config.dns_host().as_deref(), Some("staging.example.com"));
        assert_eq!(config.tls_host().as_deref(), Some("staging.example.com"));
    }

    #[test]
    fn explicit_hosts_override_target() {
        let mut config = with_target("https://staging.example.com");
        config.tls.host = Some("edge.example.com".to_string());
        assert_eq!(config.tls_host().as_deref(), Some("edge.example.com"));
    }

    #[test]
    fn invalid_provider_is_rejected() {
        let mut config = with_target("https://staging.example.com");
        config.webhooks.providers = vec!["bad provider".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidProvider(_))
        ));
    }

    #[test]
    fn enabled_antivirus_needs_socket_address() {
        let mut config = with_target("https://staging.example.com");
        config.antivirus.enabled = true;
        config.antivirus.address = "clamd".to_string();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidScannerAddress(_))
        ));
    }

    #[test]
    fn valid_config_passes() {
        assert!(with_target("https://staging.example.com").validate().is_ok());
    }
}
