//! Filesystem Backuper
//!
//! Backup artifacts live in a single directory. Each artifact `<name>` has a
//! sidecar `<name>.sha256` in `sha256sum` format holding the digest recorded
//! when the backup was taken.
//!
//! ```text
//! backups/
//!   backup-20260101T030000Z.dump
//!   backup-20260101T030000Z.dump.sha256
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::ports::{BackupArtifact, BackupError, Backuper};

const SIDECAR_EXTENSION: &str = "sha256";
const READ_BUFFER: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct FilesystemBackuper {
    dir: Option<PathBuf>,
    command: Option<String>,
}

impl FilesystemBackuper {
    /// Create a backuper over `dir`.
    ///
    /// `command` is run through `sh -c` with `BACKUP_FILE` pointing at the
    /// artifact path it must write. Without a command only existing backups
    /// can be inspected.
    pub fn new(dir: Option<PathBuf>, command: Option<String>) -> Self {
        Self { dir, command }
    }

    fn dir(&self) -> Result<&Path, BackupError> {
        self.dir
            .as_deref()
            .ok_or_else(|| BackupError::Unavailable("no backup directory configured".to_string()))
    }

    fn sidecar_path(artifact: &Path) -> PathBuf {
        let mut name = artifact.as_os_str().to_owned();
        name.push(".");
        name.push(SIDECAR_EXTENSION);
        PathBuf::from(name)
    }

    async fn describe(&self, path: PathBuf) -> Result<BackupArtifact, BackupError> {
        let metadata = fs::metadata(&path).await?;
        let created_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        let recorded_checksum = match fs::read_to_string(Self::sidecar_path(&path)).await {
            Ok(raw) => raw
                .split_whitespace()
                .next()
                .map(|digest| digest.to_ascii_lowercase()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(BackupArtifact {
            path,
            size_bytes: metadata.len(),
            created_at,
            recorded_checksum,
        })
    }
}

/// Hex SHA-256 of a file, streamed.
async fn sha256_file(path: &Path) -> Result<String, BackupError> {
    let mut file = fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn is_sidecar(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == SIDECAR_EXTENSION)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.starts_with('.'))
}

#[async_trait]
impl Backuper for FilesystemBackuper {
    async fn run(&self) -> Result<BackupArtifact, BackupError> {
        let dir = self.dir()?;
        let command = self
            .command
            .as_deref()
            .ok_or_else(|| BackupError::Unavailable("no backup command configured".to_string()))?;

        fs::create_dir_all(dir).await?;
        let path = dir.join(format!("backup-{}.dump", Utc::now().format("%Y%m%dT%H%M%SZ")));

        tracing::info!(path = %path.display(), "Running backup tool");
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .env("BACKUP_FILE", &path)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BackupError::ToolFailed(format!("{}: {}", output.status, stderr)));
        }
        if fs::metadata(&path).await.is_err() {
            return Err(BackupError::ToolFailed(format!(
                "tool exited cleanly but wrote no file at {}",
                path.display()
            )));
        }

        let digest = sha256_file(&path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        fs::write(Self::sidecar_path(&path), format!("{}  {}\n", digest, file_name)).await?;

        let artifact = self.describe(path).await?;
        tracing::info!(
            path = %artifact.path.display(),
            size_bytes = artifact.size_bytes,
            "Backup completed"
        );
        Ok(artifact)
    }

    async fn latest(&self) -> Result<Option<BackupArtifact>, BackupError> {
        let dir = self.dir()?;
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackupError::Unavailable(format!("{} does not exist", dir.display())))
            }
            Err(e) => return Err(e.into()),
        };

        let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_sidecar(&path) || is_hidden(&path) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified()?;
            if newest.as_ref().map_or(true, |(seen, _)| modified > *seen) {
                newest = Some((modified, path));
            }
        }

        match newest {
            Some((_, path)) => self.describe(path).await.map(Some),
            None => Ok(None),
        }
    }

    async fn compute_checksum(&self, artifact: &BackupArtifact) -> Result<String, BackupError> {
        sha256_file(&artifact.path).await
    }
}
