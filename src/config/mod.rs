//! Application configuration module
//!
//! Configuration is loaded from an optional file followed by environment
//! variables using the `config` and `dotenvy` crates. Environment variables
//! carry the `LAUNCHGUARD` prefix and nested values use `__` as separator.
//!
//! # Example
//!
//! ```no_run
//! use launchguard::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod dlq;
mod error;
mod gate;
mod server;

pub use database::DatabaseConfig;
pub use dlq::DlqConfig;
pub use error::{ConfigError, ValidationError};
pub use gate::{
    AlertRulesCheckConfig, AntivirusCheckConfig, BackupCheckConfig, DlqBacklogCheckConfig,
    DnsCheckConfig, GateConfig, HeadersCheckConfig, HeartbeatCheckConfig, ProbeConfig,
    TlsCheckConfig, WebhookFreshnessCheckConfig,
};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;
use std::path::Path;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Webhook DLQ retry schedule and runner settings
    #[serde(default)]
    pub dlq: DlqConfig,

    /// Readiness gate thresholds
    #[serde(default)]
    pub gate: GateConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `LAUNCHGUARD__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LAUNCHGUARD__DATABASE__URL=...` -> `database.url = ...`
    /// - `LAUNCHGUARD__GATE__WEBHOOKS__PROVIDERS=stripe,stripe_identity`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional file, overridden by the environment.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("LAUNCHGUARD")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("gate.webhooks.providers")
                    .with_list_parse_key("gate.alerts.required")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate the sections every command needs.
    ///
    /// The database section is validated separately by commands that
    /// open a pool.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.dlq.validate()?;
        Ok(())
    }

    pub fn validate_database(&self) -> Result<(), ValidationError> {
        self.database.validate()
    }

    pub fn validate_gate(&self) -> Result<(), ValidationError> {
        self.gate.validate()
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "LAUNCHGUARD__DATABASE__URL",
        "LAUNCHGUARD__SERVER__PORT",
        "LAUNCHGUARD__SERVER__ENVIRONMENT",
        "LAUNCHGUARD__DLQ__MAX_ATTEMPTS",
        "LAUNCHGUARD__GATE__TARGET_URL",
        "LAUNCHGUARD__GATE__ALLOW_SKIPS",
        "LAUNCHGUARD__GATE__ADMIN_TOKEN",
        "LAUNCHGUARD__GATE__WEBHOOKS__PROVIDERS",
        "LAUNCHGUARD__GATE__TLS__MIN_DAYS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.dlq.max_attempts, 8);
        assert!(!config.gate.allow_skips);
        assert!(config.validate().is_ok());
        assert!(config.validate_database().is_err());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("LAUNCHGUARD__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("LAUNCHGUARD__SERVER__PORT", "3000");
        env::set_var("LAUNCHGUARD__DLQ__MAX_ATTEMPTS", "4");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.dlq.max_attempts, 4);
        assert!(config.validate_database().is_ok());
    }

    #[test]
    fn test_gate_section_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("LAUNCHGUARD__GATE__TARGET_URL", "https://staging.example.com");
        env::set_var("LAUNCHGUARD__GATE__ALLOW_SKIPS", "true");
        env::set_var("LAUNCHGUARD__GATE__ADMIN_TOKEN", "s3cret");
        env::set_var(
            "LAUNCHGUARD__GATE__WEBHOOKS__PROVIDERS",
            "stripe,stripe_identity",
        );
        env::set_var("LAUNCHGUARD__GATE__TLS__MIN_DAYS", "30");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.gate.allow_skips);
        assert_eq!(config.gate.tls.min_days, 30);
        assert_eq!(
            config.gate.webhooks.providers,
            vec!["stripe".to_string(), "stripe_identity".to_string()]
        );
        assert_eq!(
            config.gate.admin_token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("s3cret")
        );
        assert!(config.validate_gate().is_ok());
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[gate]\ntarget_url = \"https://file.example.com\"\n\n[server]\nport = 9000\n"
        )
        .unwrap();

        env::set_var("LAUNCHGUARD__SERVER__PORT", "9100");
        let result = AppConfig::load_from(Some(file.path()));
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.gate.target_url, "https://file.example.com");
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("LAUNCHGUARD__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }
}
