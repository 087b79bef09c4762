//! Folder reuse for the archive worker (§4.7 step 1): before extracting an
//! archive, look for an existing extraction folder under the staging
//! directory and reuse it instead of re-extracting.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A candidate extraction folder already present in the staging directory.
#[derive(Clone, Debug)]
pub struct ReusableFolder {
    pub path: PathBuf,
    pub file_count: usize,
}

/// Scans `staging_dir` for a non-empty folder whose name starts with
/// `archive_stem`, returning the one with the most files (ties broken by
/// most-recent mtime). Folders are scanned one level deep only, one
/// directory per archive.
pub fn find_reusable_folder(staging_dir: &Path, archive_stem: &str) -> Option<ReusableFolder> {
    let entries = fs::read_dir(staging_dir).ok()?;

    let mut best: Option<(ReusableFolder, SystemTime)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if !name.starts_with(archive_stem) {
            continue;
        }

        let file_count = count_files(&path);
        if file_count == 0 {
            continue;
        }
        let mtime = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let candidate = ReusableFolder {
            path: path.clone(),
            file_count,
        };
        best = Some(match best {
            None => (candidate, mtime),
            Some((current, current_mtime)) => {
                if file_count > current.file_count
                    || (file_count == current.file_count && mtime > current_mtime)
                {
                    (candidate, mtime)
                } else {
                    (current, current_mtime)
                }
            }
        });
    }

    best.map(|(folder, _)| folder)
}

fn count_files(dir: &Path) -> usize {
    walk_count(dir)
}

fn walk_count(dir: &Path) -> usize {
    let mut count = 0;
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                count += walk_count(&path);
            } else {
                count += 1;
            }
        }
    }
    count
}

/// A fresh destination for extracting a new archive: `<staging>/<stem>_<timestamp>/`.
pub fn new_extraction_path(staging_dir: &Path, archive_stem: &str, timestamp: i64) -> PathBuf {
    staging_dir.join(format!("{archive_stem}_{timestamp}"))
}
