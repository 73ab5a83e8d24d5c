use crate::error::{
    Error,
    Result,
};
use std::{
    fs::Metadata,
    path::{
        Path,
        PathBuf,
    },
    time::SystemTime,
};
use walkdir::{
    DirEntry,
    WalkDir,
};

/// Sum of the sizes of all regular files below `path`. Symlinks are not
/// followed and directories contribute nothing themselves. Unreadable
/// subtrees count as empty, so a missing path yields 0.
pub fn scan_size(path: &Path) -> u64 {
    regular_files(path, |_| true).map(|(_, meta)| meta.len()).sum()
}

/// Number of regular files below `path`.
pub fn count_files(path: &Path) -> u64 {
    regular_files(path, |_| true).count() as u64
}

/// Regular files below `root` whose extension equals `extension`, without
/// descending into directories named `skip_dir`.
pub fn files_with_extension(root: &Path, extension: &str, skip_dir: &str) -> Vec<(PathBuf, Metadata)> {
    let mut files: Vec<_> = regular_files(root, |entry| {
        !(entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == skip_dir)
    })
    .filter(|(path, _)| path.extension().is_some_and(|ext| ext == extension))
    .collect();
    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    files
}

pub fn modified(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| Error::io(path, e))
}

fn regular_files<F>(root: &Path, descend: F) -> impl Iterator<Item = (PathBuf, Metadata)>
where
    F: FnMut(&DirEntry) -> bool,
{
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(descend)
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                trace!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            Some((entry.into_path(), meta))
        })
}
