//! Certificate inspection via a real TLS handshake.
//!
//! The handshake validates the chain against the configured roots, so an
//! untrusted or expired certificate surfaces as `InvalidCertificate`. On
//! success the leaf certificate is parsed for its expiry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

use crate::ports::{CertificateInspector, PeerCertificate, TlsProbeError};

pub struct RustlsCertificateInspector {
    connector: TlsConnector,
    timeout: Duration,
}

impl RustlsCertificateInspector {
    /// Inspector trusting the Mozilla root program.
    pub fn new(timeout: Duration) -> Result<Self, TlsProbeError> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        Self::with_roots(roots, timeout)
    }

    pub fn with_roots(roots: RootCertStore, timeout: Duration) -> Result<Self, TlsProbeError> {
        let config = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .map_err(|e| TlsProbeError::Unreachable(format!("TLS config error: {}", e)))?
        .with_root_certificates(roots)
        .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
        })
    }
}

#[async_trait]
impl CertificateInspector for RustlsCertificateInspector {
    async fn inspect(&self, host: &str, port: u16) -> Result<PeerCertificate, TlsProbeError> {
        let server_name = ServerName::try_from(host.to_owned())
            .map_err(|e| TlsProbeError::Unreachable(format!("invalid server name: {}", e)))?;

        let tcp = timeout(self.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| TlsProbeError::Unreachable("TCP connect timed out".to_string()))?
            .map_err(|e| TlsProbeError::Unreachable(e.to_string()))?;

        let stream = timeout(self.timeout, self.connector.connect(server_name, tcp))
            .await
            .map_err(|_| TlsProbeError::Unreachable("TLS handshake timed out".to_string()))?
            .map_err(classify_handshake_error)?;

        let (_, connection) = stream.get_ref();
        let leaf = connection
            .peer_certificates()
            .and_then(|chain| chain.first())
            .ok_or_else(|| TlsProbeError::InvalidCertificate("no peer certificate".to_string()))?;

        parse_leaf(leaf.as_ref())
    }
}

fn classify_handshake_error(err: std::io::Error) -> TlsProbeError {
    let rustls_error = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>());

    match rustls_error {
        Some(rustls::Error::InvalidCertificate(reason)) => {
            TlsProbeError::InvalidCertificate(format!("{:?}", reason))
        }
        _ => TlsProbeError::Unreachable(format!("TLS handshake failed: {}", err)),
    }
}

/// Extracts subject and expiry from a DER-encoded certificate.
pub(crate) fn parse_leaf(der: &[u8]) -> Result<PeerCertificate, TlsProbeError> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| TlsProbeError::InvalidCertificate(format!("unparseable certificate: {}", e)))?;

    let not_after = DateTime::<Utc>::from_timestamp(cert.validity().not_after.timestamp(), 0)
        .ok_or_else(|| TlsProbeError::InvalidCertificate("expiry out of range".to_string()))?;

    Ok(PeerCertificate {
        subject: cert.subject().to_string(),
        not_after,
    })
}
