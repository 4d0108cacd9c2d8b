//! Backup tool adapters.

mod filesystem_backuper;

pub use filesystem_backuper::FilesystemBackuper;
