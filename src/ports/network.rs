//! Network probe ports used by the readiness checks.
//!
//! Each port isolates one kind of outbound probe so checks can be exercised
//! against fakes. Every implementation must bound its own I/O by a timeout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use thiserror::Error;

/// Resolves a hostname to addresses.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("lookup failed: {0}")]
    Lookup(String),

    #[error("lookup timed out")]
    Timeout,
}

/// Leaf certificate presented by a TLS server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCertificate {
    pub subject: String,
    pub not_after: DateTime<Utc>,
}

impl PeerCertificate {
    /// Whole days until expiry, negative once expired.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.not_after - now).num_days()
    }
}

#[derive(Debug, Clone, Error)]
pub enum TlsProbeError {
    /// Could not reach the server; says nothing about the certificate.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The handshake failed on certificate validation.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
}

/// Fetches and validates a server's certificate.
#[async_trait]
pub trait CertificateInspector: Send + Sync {
    async fn inspect(&self, host: &str, port: u16) -> Result<PeerCertificate, TlsProbeError>;
}

/// Scanner verdict for a submitted buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Infected { signature: String },
}

#[derive(Debug, Clone, Error)]
pub enum ScanError {
    #[error("scanner unreachable: {0}")]
    Unreachable(String),

    #[error("scanner protocol error: {0}")]
    Protocol(String),
}

/// Submits content to an antivirus engine.
#[async_trait]
pub trait VirusScanner: Send + Sync {
    async fn scan(&self, content: &[u8]) -> Result<ScanVerdict, ScanError>;
}
