//! The backup archive directory and the external backup creator.
//!
//! This is the only part of the collector with side effects. Listing and
//! downloading only read the archive directory; creation runs the configured
//! backup executable and reports its outcome as an [`ActionResult`].

use crate::{
    error::{
        Error,
        Result,
    },
    format::{
        format_bytes,
        format_timestamp,
    },
    process::{
        run_with_timeout,
        ActionResult,
    },
};
use serde::Serialize;
use std::{
    path::{
        Path,
        PathBuf,
    },
    sync::atomic::{
        AtomicBool,
        Ordering,
    },
};
use sync_status_config::BackupConfig;

pub const BACKUP_CREATED: &str = "Backup created successfully";
pub const BACKUP_IN_PROGRESS: &str = "A backup is already in progress";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub filename: String,
    pub size: u64,
    pub size_human: String,
    pub created: String,
}

/// Why an archive cannot be handed out.
#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("invalid backup file name")]
    InvalidName,
    #[error("backup not found")]
    NotFound,
    #[error(transparent)]
    Io(#[from] Error),
}

/// An archive opened for streaming.
#[derive(Debug)]
pub struct Archive {
    pub file: tokio::fs::File,
    pub len: u64,
    pub filename: String,
}

/// Names of the archives in `dir` ending in `suffix`, newest first.
///
/// Recency is inferred from the name: archive names are expected to embed a
/// sortable timestamp, so a descending name sort is a descending age sort.
/// Nothing enforces that convention.
pub fn read_archive_names(dir: &Path, suffix: &str) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(suffix))
        .collect();

    names.sort_unstable_by(|a, b| b.cmp(a));
    Ok(names)
}

fn archive_names_or_empty(dir: &Path, suffix: &str) -> Vec<String> {
    read_archive_names(dir, suffix).unwrap_or_else(|e| {
        if !e.is_not_found() {
            warn!(error = %e, "cannot list backup directory, reporting no backups");
        }
        Vec::new()
    })
}

/// At most `limit` archives, newest first. A missing directory has none.
pub fn list_backups(dir: &Path, suffix: &str, limit: usize) -> Vec<BackupRecord> {
    archive_names_or_empty(dir, suffix)
        .into_iter()
        .take(limit)
        .filter_map(|filename| {
            let path = dir.join(&filename);
            let meta = match std::fs::metadata(&path) {
                Ok(meta) => meta,
                Err(e) => {
                    // removed between the listing and the stat
                    debug!(path = %path.display(), error = %e, "skipping backup archive");
                    return None;
                }
            };
            let created = meta
                .modified()
                .map(format_timestamp)
                .unwrap_or_else(|_| "unknown".to_string());

            Some(BackupRecord {
                size_human: format_bytes(meta.len()),
                size: meta.len(),
                created,
                filename,
            })
        })
        .collect()
}

pub fn backup_count(dir: &Path, suffix: &str) -> u64 {
    archive_names_or_empty(dir, suffix).len() as u64
}

/// A name is acceptable only if it is a single plain path component.
pub fn validate_archive_name(name: &str) -> Result<(), DownloadError> {
    if name.is_empty() || name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(DownloadError::InvalidName);
    }
    Ok(())
}

/// Opens `name` inside `dir`. The name is validated before the filesystem is
/// touched, and the resolved path must still lie inside `dir` so a symlink
/// cannot be used to hand out files from elsewhere.
pub async fn open_for_download(dir: &Path, name: &str) -> Result<Archive, DownloadError> {
    validate_archive_name(name)?;

    let not_found_or = |path: &Path, e: std::io::Error| match e.kind() {
        std::io::ErrorKind::NotFound => DownloadError::NotFound,
        _ => DownloadError::Io(Error::io(path, e)),
    };

    let root = tokio::fs::canonicalize(dir).await.map_err(|e| not_found_or(dir, e))?;
    let candidate = root.join(name);
    let resolved = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(|e| not_found_or(&candidate, e))?;

    if !resolved.starts_with(&root) {
        warn!(archive = name, resolved = %resolved.display(), "backup name resolves outside the backup directory");
        return Err(DownloadError::InvalidName);
    }

    let file = tokio::fs::File::open(&resolved)
        .await
        .map_err(|e| not_found_or(&resolved, e))?;
    let meta = file.metadata().await.map_err(|e| not_found_or(&resolved, e))?;
    if !meta.is_file() {
        return Err(DownloadError::NotFound);
    }

    Ok(Archive {
        file,
        len: meta.len(),
        filename: name.to_string(),
    })
}

/// Clears the in-flight flag when the backup run ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Listing, creation and download of backup archives. At most one backup
/// creation runs at a time; overlapping requests are turned away.
pub struct BackupGateway {
    config: BackupConfig,
    backup_dir: PathBuf,
    in_flight: AtomicBool,
}

impl BackupGateway {
    pub fn new(config: BackupConfig, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            backup_dir: backup_dir.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Blocking.
    pub fn list(&self) -> Vec<BackupRecord> {
        list_backups(&self.backup_dir, &self.config.archive_suffix, self.config.list_limit)
    }

    /// Blocking. Names of the most recent archives for the status payload.
    pub fn recent_names(&self) -> Vec<String> {
        archive_names_or_empty(&self.backup_dir, &self.config.archive_suffix)
            .into_iter()
            .take(self.config.recent_limit)
            .collect()
    }

    /// Blocking.
    pub fn count(&self) -> u64 {
        backup_count(&self.backup_dir, &self.config.archive_suffix)
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs the backup executable. Never fails: spawn errors, timeouts and
    /// non-zero exits are all reported in the result.
    pub async fn create(&self) -> ActionResult {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("backup requested while another one is running");
            return ActionResult::failed(BACKUP_IN_PROGRESS);
        }
        let _guard = InFlight(&self.in_flight);

        info!(script = %self.config.script.display(), "starting backup");
        let result = ActionResult::from_run(
            run_with_timeout(&self.config.script, &[], self.config.timeout).await,
            BACKUP_CREATED,
        );

        if result.success {
            info!("backup finished");
        } else {
            warn!(message = %result.message, "backup failed");
        }
        result
    }

    pub async fn open(&self, name: &str) -> Result<Archive, DownloadError> {
        open_for_download(&self.backup_dir, name).await
    }
}
