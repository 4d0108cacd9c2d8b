//! Backup existence and restore dry-run.
//!
//! The restore dry-run never touches a database: it proves the artifact is
//! still readable end to end and byte-identical to what was recorded.

use async_trait::async_trait;
use std::sync::Arc;

use super::ReadinessCheck;
use crate::config::GateConfig;
use crate::domain::gate::CheckResult;
use crate::ports::Backuper;

const BACKUP: &str = "backup";
const RESTORE: &str = "restore";

pub struct BackupCheck {
    backuper: Arc<dyn Backuper>,
}

impl BackupCheck {
    pub fn new(backuper: Arc<dyn Backuper>) -> Self {
        Self { backuper }
    }
}

#[async_trait]
impl ReadinessCheck for BackupCheck {
    fn name(&self) -> &'static str {
        BACKUP
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        let artifact = if config.backup.run_before_check {
            self.backuper.run().await.map(Some)
        } else {
            self.backuper.latest().await
        };

        let artifact = match artifact {
            Ok(Some(artifact)) => artifact,
            Ok(None) => return CheckResult::fail(BACKUP, "missing"),
            Err(e) => return CheckResult::fail(BACKUP, format!("unavailable {}", e)),
        };

        let path = artifact.path.display();
        if artifact.size_bytes == 0 {
            return CheckResult::fail(BACKUP, format!("empty path={}", path));
        }
        if !artifact.has_valid_checksum() {
            return CheckResult::fail(BACKUP, format!("checksum-missing path={}", path));
        }

        CheckResult::pass(
            BACKUP,
            format!("path={} size={} created_at={}", path, artifact.size_bytes, artifact.created_at.to_rfc3339()),
        )
    }
}

pub struct RestoreCheck {
    backuper: Arc<dyn Backuper>,
}

impl RestoreCheck {
    pub fn new(backuper: Arc<dyn Backuper>) -> Self {
        Self { backuper }
    }
}

#[async_trait]
impl ReadinessCheck for RestoreCheck {
    fn name(&self) -> &'static str {
        RESTORE
    }

    async fn run(&self, _config: &GateConfig) -> CheckResult {
        let artifact = match self.backuper.latest().await {
            Ok(Some(artifact)) => artifact,
            Ok(None) => return CheckResult::skipped(RESTORE, "no-backup"),
            Err(e) => return CheckResult::fail(RESTORE, format!("unreadable {}", e)),
        };

        let Some(recorded) = artifact.recorded_checksum.as_deref() else {
            return CheckResult::fail(RESTORE, "checksum-missing");
        };

        match self.backuper.compute_checksum(&artifact).await {
            Ok(actual) if actual.eq_ignore_ascii_case(recorded) => {
                CheckResult::pass(RESTORE, format!("checksum-verified sha256={}", actual))
            }
            Ok(actual) => CheckResult::fail(
                RESTORE,
                format!("mismatch recorded={} actual={}", recorded, actual),
            ),
            Err(e) => CheckResult::fail(RESTORE, format!("unreadable {}", e)),
        }
    }
}
