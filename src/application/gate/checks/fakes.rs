//! Scripted collaborators for check unit tests.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::SuiteDeps;
use crate::config::GateConfig;
use crate::ports::{
    AdminApi, BackupArtifact, BackupError, Backuper, CertificateInspector, DlqStats,
    HeaderSnapshot, HealthSnapshot, HostResolver, PeerCertificate, ProbeError, ResolveError,
    ScanError, ScanVerdict, ServiceProbe, TlsProbeError, VirusScanner, WebhookStatusReport,
};

pub fn gate_config() -> GateConfig {
    GateConfig {
        target_url: "https://staging.example.com".to_string(),
        ..Default::default()
    }
}

pub fn with_token(mut config: GateConfig) -> GateConfig {
    config.admin_token = Some(SecretString::new("admin-token".to_string()));
    config
}

pub struct FakeProbe {
    pub ready: bool,
    pub health: Result<HealthSnapshot, ProbeError>,
    pub headers: Result<HeaderSnapshot, ProbeError>,
}

impl Default for FakeProbe {
    fn default() -> Self {
        Self {
            ready: true,
            health: Ok(HealthSnapshot::default()),
            headers: Ok(HeaderSnapshot::new()),
        }
    }
}

#[async_trait]
impl ServiceProbe for FakeProbe {
    async fn wait_ready(&self, _url: &str, _timeout: Duration, _retry: Duration) -> bool {
        self.ready
    }

    async fn fetch_health(&self, _url: &str) -> Result<HealthSnapshot, ProbeError> {
        self.health.clone()
    }

    async fn fetch_headers(&self, _url: &str) -> Result<HeaderSnapshot, ProbeError> {
        self.headers.clone()
    }
}

pub struct FakeAdmin {
    pub dlq: Result<DlqStats, ProbeError>,
    pub webhooks: Result<WebhookStatusReport, ProbeError>,
}

impl Default for FakeAdmin {
    fn default() -> Self {
        Self {
            dlq: Ok(DlqStats::default()),
            webhooks: Ok(WebhookStatusReport::default()),
        }
    }
}

#[async_trait]
impl AdminApi for FakeAdmin {
    async fn dlq_stats(&self, _token: &SecretString) -> Result<DlqStats, ProbeError> {
        self.dlq.clone()
    }

    async fn webhook_status(&self, _token: &SecretString) -> Result<WebhookStatusReport, ProbeError> {
        self.webhooks.clone()
    }
}

pub struct FakeResolver(pub Result<Vec<IpAddr>, ResolveError>);

impl Default for FakeResolver {
    fn default() -> Self {
        Self(Ok(vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))]))
    }
}

#[async_trait]
impl HostResolver for FakeResolver {
    async fn resolve(&self, _host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        self.0.clone()
    }
}

pub struct FakeInspector(pub Result<PeerCertificate, TlsProbeError>);

impl FakeInspector {
    pub fn expiring_in(days: i64) -> Self {
        Self(Ok(PeerCertificate {
            subject: "CN=staging.example.com".to_string(),
            not_after: Utc::now() + chrono::Duration::days(days) + chrono::Duration::hours(1),
        }))
    }
}

#[async_trait]
impl CertificateInspector for FakeInspector {
    async fn inspect(&self, _host: &str, _port: u16) -> Result<PeerCertificate, TlsProbeError> {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct FakeBackuper {
    pub latest: Option<BackupArtifact>,
    /// `None` simulates an unreadable artifact.
    pub computed: Option<String>,
    pub unavailable: bool,
}

impl FakeBackuper {
    pub fn with_artifact(size_bytes: u64, recorded: Option<&str>, computed: Option<&str>) -> Self {
        Self {
            latest: Some(BackupArtifact {
                path: PathBuf::from("/var/backups/db-20250101.dump"),
                size_bytes,
                created_at: Utc::now(),
                recorded_checksum: recorded.map(str::to_string),
            }),
            computed: computed.map(str::to_string),
            unavailable: false,
        }
    }
}

#[async_trait]
impl Backuper for FakeBackuper {
    async fn run(&self) -> Result<BackupArtifact, BackupError> {
        self.latest
            .clone()
            .ok_or_else(|| BackupError::ToolFailed("exit status 1".to_string()))
    }

    async fn latest(&self) -> Result<Option<BackupArtifact>, BackupError> {
        if self.unavailable {
            return Err(BackupError::Unavailable("/var/backups".to_string()));
        }
        Ok(self.latest.clone())
    }

    async fn compute_checksum(&self, _artifact: &BackupArtifact) -> Result<String, BackupError> {
        self.computed.clone().ok_or_else(|| {
            BackupError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
        })
    }
}

pub struct FakeScanner(pub Result<ScanVerdict, ScanError>);

impl Default for FakeScanner {
    fn default() -> Self {
        Self(Ok(ScanVerdict::Infected {
            signature: "Eicar-Signature".to_string(),
        }))
    }
}

#[async_trait]
impl VirusScanner for FakeScanner {
    async fn scan(&self, _content: &[u8]) -> Result<ScanVerdict, ScanError> {
        self.0.clone()
    }
}

pub fn fake_deps() -> SuiteDeps {
    SuiteDeps {
        probe: Arc::new(FakeProbe::default()),
        admin: Arc::new(FakeAdmin::default()),
        resolver: Arc::new(FakeResolver::default()),
        inspector: Arc::new(FakeInspector::expiring_in(90)),
        backuper: Arc::new(FakeBackuper::default()),
        scanner: Arc::new(FakeScanner::default()),
    }
}
