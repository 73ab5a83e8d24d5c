use crate::{
    format::{
        format_bytes,
        format_timestamp,
    },
    probes::{
        introspect,
        scan,
    },
};
use serde::Serialize;
use std::{
    fs::Metadata,
    path::{
        Path,
        PathBuf,
    },
    time::SystemTime,
};

/// Extension of the per-user collection database files.
pub const COLLECTION_EXTENSION: &str = "anki2";
/// The single media folder directly below a user's directory.
pub const MEDIA_DIR: &str = "collection.media";
/// `last_sync` of a user whose directory does not exist.
pub const NEVER: &str = "Never";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub username: String,
    pub size: u64,
    pub size_human: String,
    pub last_sync: String,
    pub collections: Vec<CollectionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionRecord {
    pub name: String,
    pub size: u64,
    pub size_human: String,
    pub modified: String,
    #[serde(flatten)]
    pub details: CollectionDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CollectionDetails {
    Database { cards: u64 },
    Media { files: u64 },
}

/// Everything about one user that can be learned without opening a database.
#[derive(Debug, Clone, Default)]
pub struct UserScan {
    pub username: String,
    pub size: u64,
    pub last_sync: Option<SystemTime>,
    pub databases: Vec<DatabaseFile>,
    pub media: Option<MediaFolder>,
}

#[derive(Debug, Clone)]
pub struct DatabaseFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone)]
pub struct MediaFolder {
    pub size: u64,
    pub files: u64,
    pub modified: Option<SystemTime>,
}

fn modified_of(meta: &Metadata) -> Option<SystemTime> {
    meta.modified().ok()
}

fn render_time(time: Option<SystemTime>, absent: &str) -> String {
    time.map(format_timestamp).unwrap_or_else(|| absent.to_string())
}

impl UserScan {
    pub fn empty(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Default::default()
        }
    }

    /// Blocking: walks the user's directory below `data_dir`.
    pub fn scan(data_dir: &Path, username: &str) -> Self {
        let user_dir = data_dir.join(username);

        let last_sync = match scan::modified(&user_dir) {
            Ok(time) => Some(time),
            Err(e) if e.is_not_found() => return Self::empty(username),
            Err(e) => {
                debug!(user = username, error = %e, "cannot stat user directory");
                None
            }
        };

        let databases = scan::files_with_extension(&user_dir, COLLECTION_EXTENSION, MEDIA_DIR)
            .into_iter()
            .map(|(path, meta)| DatabaseFile {
                name: path
                    .strip_prefix(&user_dir)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .into_owned(),
                size: meta.len(),
                modified: modified_of(&meta),
                path,
            })
            .collect();

        let media_dir = user_dir.join(MEDIA_DIR);
        let media = std::fs::metadata(&media_dir)
            .ok()
            .filter(Metadata::is_dir)
            .map(|meta| MediaFolder {
                size: scan::scan_size(&media_dir),
                files: scan::count_files(&media_dir),
                modified: modified_of(&meta),
            });

        Self {
            username: username.to_string(),
            size: scan::scan_size(&user_dir),
            last_sync,
            databases,
            media,
        }
    }

    /// Opens each collection database for its card count. A database that
    /// cannot be read reports zero cards; it never fails the record.
    pub async fn into_record(self) -> UserRecord {
        let mut collections = Vec::with_capacity(self.databases.len() + 1);

        for db in self.databases {
            let cards = introspect::inspect(&db.path).await;
            collections.push(CollectionRecord {
                name: db.name,
                size: db.size,
                size_human: format_bytes(db.size),
                modified: render_time(db.modified, "unknown"),
                details: CollectionDetails::Database { cards },
            });
        }

        if let Some(media) = self.media {
            collections.push(CollectionRecord {
                name: MEDIA_DIR.to_string(),
                size: media.size,
                size_human: format_bytes(media.size),
                modified: render_time(media.modified, "unknown"),
                details: CollectionDetails::Media { files: media.files },
            });
        }

        UserRecord {
            size_human: format_bytes(self.size),
            last_sync: render_time(self.last_sync, NEVER),
            username: self.username,
            size: self.size,
            collections,
        }
    }
}

/// One record per username, in the given order. Users are independent: a
/// missing directory or unreadable database only affects that user's record.
pub async fn compile_users(data_dir: &Path, users: &[String]) -> Vec<UserRecord> {
    let scans = {
        let data_dir = data_dir.to_path_buf();
        let users = users.to_vec();
        tokio::task::spawn_blocking(move || {
            users
                .iter()
                .map(|username| UserScan::scan(&data_dir, username))
                .collect::<Vec<_>>()
        })
        .await
    };

    let scans = scans.unwrap_or_else(|e| {
        warn!(error = %e, "user directory scan aborted, reporting empty records");
        users.iter().map(|username| UserScan::empty(username)).collect()
    });

    let mut records = Vec::with_capacity(scans.len());
    for scan in scans {
        records.push(scan.into_record().await);
    }
    records
}
