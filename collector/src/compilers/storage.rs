use super::users::{
    COLLECTION_EXTENSION,
    MEDIA_DIR,
};
use crate::{
    format::format_bytes,
    probes::{
        scan,
        system::percent,
    },
};
use serde::Serialize;
use std::path::Path;

/// Bytes attributed to each of the four storage categories. Every byte is
/// counted under exactly one scan root, so `total` is their plain sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageBreakdown {
    pub collections: u64,
    pub media: u64,
    pub backups: u64,
    pub logs: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageCategory {
    pub name: &'static str,
    pub bytes: u64,
    pub human: String,
    pub percent: f64,
}

/// The breakdown together with rendered sizes and proportions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageReport {
    #[serde(flatten)]
    pub breakdown: StorageBreakdown,
    pub total_human: String,
    pub categories: Vec<StorageCategory>,
}

impl StorageBreakdown {
    pub fn new(collections: u64, media: u64, backups: u64, logs: u64) -> Self {
        Self {
            collections,
            media,
            backups,
            logs,
            total: collections + media + backups + logs,
        }
    }

    pub fn categories(&self) -> Vec<StorageCategory> {
        [
            ("collections", self.collections),
            ("media", self.media),
            ("backups", self.backups),
            ("logs", self.logs),
        ]
        .into_iter()
        .map(|(name, bytes)| StorageCategory {
            name,
            bytes,
            human: format_bytes(bytes),
            percent: percent(bytes, self.total),
        })
        .collect()
    }

    pub fn report(self) -> StorageReport {
        StorageReport {
            total_human: format_bytes(self.total),
            categories: self.categories(),
            breakdown: self,
        }
    }
}

/// Blocking. Collection databases are matched recursively below each user
/// directory, skipping the media folder, which is counted on its own.
pub fn breakdown(data_dir: &Path, backup_dir: &Path, log_dir: &Path, users: &[String]) -> StorageBreakdown {
    let mut collections = 0;
    let mut media = 0;

    for username in users {
        let user_dir = data_dir.join(username);
        collections += scan::files_with_extension(&user_dir, COLLECTION_EXTENSION, MEDIA_DIR)
            .iter()
            .map(|(_, meta)| meta.len())
            .sum::<u64>();
        media += scan::scan_size(&user_dir.join(MEDIA_DIR));
    }

    StorageBreakdown::new(collections, media, scan::scan_size(backup_dir), scan::scan_size(log_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn write(path: &Path, len: usize) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, vec![b'x'; len]).unwrap();
    }

    #[test]
    fn each_byte_lands_in_one_category() {
        let root = TempDir::new().unwrap();
        let data = root.child("data");
        write(&data.join("alice/collection.anki2"), 1000);
        write(&data.join("alice/collection.media/a.jpg"), 300);
        // a database file inside the media folder is media, not a collection
        write(&data.join("alice/collection.media/odd.anki2"), 7);
        write(&data.join("bob/collection.anki2"), 500);
        write(&data.join("bob/notes.txt"), 99);
        write(&root.child("backups/nightly.tar.gz"), 4000);
        write(&root.child("logs/sync.log"), 60);

        let users = vec!["alice".to_string(), "bob".to_string(), "ghost".to_string()];
        let result = breakdown(&data, &root.child("backups"), &root.child("logs"), &users);

        assert_eq!(result, StorageBreakdown::new(1500, 307, 4000, 60));
        assert_eq!(result.total, 5867);
    }

    #[test]
    fn total_is_the_sum_of_categories_for_any_tree() {
        for seed in 0..16usize {
            let root = TempDir::new().unwrap();
            let data = root.child("data");
            let users: Vec<String> = (0..seed % 4).map(|i| format!("user{i}")).collect();
            for (i, user) in users.iter().enumerate() {
                write(&data.join(user).join("collection.anki2"), seed * 13 + i);
                write(&data.join(user).join("deck/extra.anki2"), seed + 1);
                write(&data.join(user).join(MEDIA_DIR).join("m.bin"), seed * 7);
            }
            if seed % 2 == 0 {
                write(&root.child("backups/a.tar.gz"), seed * 31);
            }
            if seed % 3 == 0 {
                write(&root.child("logs/auth.log"), seed * 3);
            }

            let result = breakdown(&data, &root.child("backups"), &root.child("logs"), &users);

            assert_eq!(
                result.total,
                result.collections + result.media + result.backups + result.logs,
                "seed {seed}"
            );
        }
    }

    #[test]
    fn missing_roots_are_empty() {
        let root = TempDir::new().unwrap();
        let result = breakdown(
            &root.child("data"),
            &root.child("backups"),
            &root.child("logs"),
            &["alice".to_string()],
        );
        assert_eq!(result, StorageBreakdown::default());
        assert!(result.categories().iter().all(|c| c.percent == 0.0));
    }

    #[test]
    fn proportions() {
        let report = StorageBreakdown::new(50, 25, 25, 0).report();
        assert_eq!(report.total_human, "100 B");
        assert_eq!(
            report.categories.iter().map(|c| (c.name, c.percent)).collect::<Vec<_>>(),
            vec![("collections", 50.0), ("media", 25.0), ("backups", 25.0), ("logs", 0.0)]
        );
    }
}
