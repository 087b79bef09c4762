use std::path::{Path, PathBuf};

use bookmover_archive::{extract_archive, find_reusable_folder, new_extraction_path};
use bookmover_model::Fingerprint;

use crate::batch::FileItem;
use crate::error::Result;

/// Outcome of step 1 (§4.7): either an existing folder was reused, or the
/// archive was freshly extracted. `reused` gates cleanup: a reused folder
/// is left behind for whichever other process still has it in play.
pub struct ExtractionFolder {
    pub path: PathBuf,
    pub reused: bool,
}

pub fn extract_or_reuse(staging_dir: &Path, archive_path: &Path, now_ts: i64) -> Result<ExtractionFolder> {
    let stem = archive_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("archive");

    if let Some(reusable) = find_reusable_folder(staging_dir, stem) {
        tracing::info!(path = ?reusable.path, files = reusable.file_count, "reusing existing extraction folder");
        return Ok(ExtractionFolder {
            path: reusable.path,
            reused: true,
        });
    }

    let dest = new_extraction_path(staging_dir, stem, now_ts);
    let report = extract_archive(archive_path, &dest)?;
    tracing::info!(
        ?dest,
        files = report.files_extracted,
        skipped = report.entries_skipped,
        "extracted archive"
    );
    Ok(ExtractionFolder { path: dest, reused: false })
}

/// Recursively lists regular files under `dir` (§4.7 step 2's "stream files
/// under the extraction folder").
pub fn list_extracted_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(dir, &mut files);
    files
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => walk(&path, out),
            Ok(ft) if ft.is_file() => out.push(path),
            _ => {}
        }
    }
}

/// Fingerprints `files` in parallel (degree ≈ cores/2, §4.7 step 2) ahead of
/// the serialized dedup filter. A file that fails to fingerprint is passed
/// through without a precomputed value so the batch pipeline's own
/// unresolvable-file handling takes over.
pub async fn fingerprint_in_parallel(files: Vec<PathBuf>, degree: usize) -> Vec<FileItem> {
    use futures_util::{stream, StreamExt};

    stream::iter(files)
        .map(|path| async move {
            let result = tokio::task::spawn_blocking({
                let path = path.clone();
                move || bookmover_fingerprint::fingerprint(&path)
            })
            .await;
            match result {
                Ok(Ok(fp)) => build_item(path, Some(fp)),
                _ => build_item(path, None),
            }
        })
        .buffer_unordered(degree.max(1))
        .collect()
        .await
}

fn build_item(path: PathBuf, fingerprint: Option<Fingerprint>) -> FileItem {
    match fingerprint {
        Some(fp) => FileItem::with_fingerprint(path, fp),
        None => FileItem::from_path(path),
    }
}
