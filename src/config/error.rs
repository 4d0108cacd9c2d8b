//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool needs at least 2 connections (ingress plus DLQ runner)")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Duration '{0}' must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("DLQ batch size must be between 1 and 1000")]
    InvalidBatchSize,

    #[error("Backoff jitter ratio must be within [0, 1]")]
    InvalidJitterRatio,

    #[error("Max attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("Gate target URL must be an absolute http(s) URL")]
    InvalidTargetUrl,

    #[error("Invalid webhook provider name: {0}")]
    InvalidProvider(String),

    #[error("Invalid antivirus scanner address: {0}")]
    InvalidScannerAddress(String),
}
