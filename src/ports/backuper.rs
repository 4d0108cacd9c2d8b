//! Backuper port - narrow interface over the external backup tool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// A backup file plus its recorded checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    /// Hex SHA-256 recorded when the backup was taken, if any.
    pub recorded_checksum: Option<String>,
}

impl BackupArtifact {
    /// Recorded checksum is present and looks like a hex SHA-256 digest.
    pub fn has_valid_checksum(&self) -> bool {
        self.recorded_checksum
            .as_deref()
            .map_or(false, |c| c.len() == 64 && c.chars().all(|ch| ch.is_ascii_hexdigit()))
    }
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup location unavailable: {0}")]
    Unavailable(String),

    #[error("backup tool failed: {0}")]
    ToolFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Backuper: Send + Sync {
    /// Takes a new backup and records its checksum.
    async fn run(&self) -> Result<BackupArtifact, BackupError>;

    /// Most recent existing backup, if any.
    async fn latest(&self) -> Result<Option<BackupArtifact>, BackupError>;

    /// Recomputes the hex SHA-256 of the artifact's current contents.
    async fn compute_checksum(&self, artifact: &BackupArtifact) -> Result<String, BackupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(checksum: Option<&str>) -> BackupArtifact {
        BackupArtifact {
            path: PathBuf::from("/var/backups/db.dump"),
            size_bytes: 10,
            created_at: Utc::now(),
            recorded_checksum: checksum.map(str::to_string),
        }
    }

    #[test]
    fn sha256_hex_checksum_is_valid() {
        assert!(artifact(Some(&"a".repeat(64))).has_valid_checksum());
    }

    #[test]
    fn missing_or_malformed_checksum_is_invalid() {
        assert!(!artifact(None).has_valid_checksum());
        assert!(!artifact(Some("abc")).has_valid_checksum());
        assert!(!artifact(Some(&"z".repeat(64))).has_valid_checksum());
    }
}
