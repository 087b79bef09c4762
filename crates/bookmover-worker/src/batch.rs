use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher as StdHasher};
use std::path::{Path, PathBuf};

use bookmover_catalog::TargetService;
use bookmover_dedup::DedupCache;
use bookmover_metadata::MetadataTool;
use bookmover_model::{FileStatus, Fingerprint, UploadOutcome, WorkerProgress};
use bookmover_upload::{upload, NoProgressSignal, UploadConfig};
use chrono::Utc;
use futures_util::{stream, StreamExt};

/// One file to run through the dedup/metadata/upload pipeline. `C6`'s batch
/// items carry no precomputed fingerprint (dedup is checked cheaply by path
/// first); `C7`'s archive items arrive already fingerprinted by the parallel
/// fingerprinting stage (§4.7 step 2), so the dedup filter is the first
/// thing consulted for them.
pub struct FileItem {
    pub path: PathBuf,
    pub precomputed_fingerprint: Option<Fingerprint>,
}

impl FileItem {
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            path,
            precomputed_fingerprint: None,
        }
    }

    pub fn with_fingerprint(path: PathBuf, fingerprint: Fingerprint) -> Self {
        Self {
            path,
            precomputed_fingerprint: Some(fingerprint),
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub processed: u32,
    pub new_uploaded: u32,
    pub already_present: u32,
    pub failed: u32,
    /// §4.6: the batch key only advances once every record has reached a
    /// terminal outcome (new, duplicate, or permanent failure). A record
    /// that exhausted its retries and is still `TransientFailure` holds the
    /// whole batch back so it gets another attempt once the batch is
    /// refetched; records this worker already finished are protected from
    /// re-upload by the dedup cache, so retrying the batch is harmless.
    pub all_terminated: bool,
}

impl BatchOutcome {
    pub fn any_new_uploaded(&self) -> bool {
        self.new_uploaded > 0
    }
}

/// A fingerprint synthesized from the path alone, used only to give a
/// permanently unfingerprintable file (I/O error, vanished mid-batch) a key
/// in `completed_files` so it isn't retried forever. Never compared against
/// a real content fingerprint: the `unresolvable:` prefix can't collide with
/// a lowercase hex digest.
fn unresolvable_fingerprint(path: &Path) -> Fingerprint {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    Fingerprint::new(format!("unresolvable:{:016x}", hasher.finish()), 0)
}

fn already_resolved_by_path(progress: &WorkerProgress, path: &Path) -> bool {
    progress.completed_files.values().any(|cf| cf.path == path)
}

struct PendingUpload {
    path: PathBuf,
    fingerprint: Fingerprint,
}

/// Runs `items` through dedup filtering (serialized) and then metadata
/// extraction + upload (bounded concurrency pool, §4.6 step 4).
pub async fn process_items(
    items: &[FileItem],
    progress: &mut WorkerProgress,
    dedup: &mut DedupCache,
    target: &dyn TargetService,
    metadata_tool: &dyn MetadataTool,
    upload_config: UploadConfig,
    concurrency: usize,
) -> BatchOutcome {
    process_items_with_slow_threshold(
        items,
        progress,
        dedup,
        target,
        metadata_tool,
        upload_config,
        concurrency,
        std::time::Duration::from_secs(120),
    )
    .await
}

/// Same as [`process_items`] but with an explicit slow-upload threshold
/// (§4.6: "flag individual uploads exceeding 120 s as slow").
#[allow(clippy::too_many_arguments)]
pub async fn process_items_with_slow_threshold(
    items: &[FileItem],
    progress: &mut WorkerProgress,
    dedup: &mut DedupCache,
    target: &dyn TargetService,
    metadata_tool: &dyn MetadataTool,
    upload_config: UploadConfig,
    concurrency: usize,
    slow_upload_threshold: std::time::Duration,
) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        all_terminated: true,
        ..Default::default()
    };
    let mut pending = Vec::new();

    for item in items {
        outcome.processed += 1;

        if item.precomputed_fingerprint.is_none() && already_resolved_by_path(progress, &item.path) {
            continue;
        }

        let fingerprint = match &item.precomputed_fingerprint {
            Some(fp) => fp.clone(),
            None => match bookmover_fingerprint::fingerprint(&item.path) {
                Ok(fp) => fp,
                Err(error) => {
                    tracing::warn!(path = %item.path.display(), %error, "fingerprinting failed, recording unresolvable");
                    progress.record_completed(
                        unresolvable_fingerprint(&item.path),
                        item.path.clone(),
                        FileStatus::Unresolvable,
                        Utc::now(),
                    );
                    outcome.failed += 1;
                    continue;
                }
            },
        };

        let dedup_match = dedup.locate(progress, &fingerprint);
        if dedup_match.is_match() {
            if !progress.has_completed(&fingerprint) {
                progress.record_completed(
                    fingerprint.clone(),
                    item.path.clone(),
                    FileStatus::AlreadyPresentLocal,
                    Utc::now(),
                );
            }
            outcome.already_present += 1;
            dedup.record_processed();
            continue;
        }

        pending.push(PendingUpload {
            path: item.path.clone(),
            fingerprint,
        });
    }

    let results: Vec<(PendingUpload, UploadOutcome)> = stream::iter(pending)
        .map(|pending| async {
            let metadata = bookmover_metadata::extract_metadata(metadata_tool, &pending.path).await;
            let metadata_json = serde_json::to_vec(&metadata).unwrap_or_default();
            let started = std::time::Instant::now();
            let result = upload(
                target,
                &pending.fingerprint,
                &metadata_json,
                &pending.path,
                &NoProgressSignal,
                upload_config,
            )
            .await;
            if crate::metrics::is_slow_upload(started.elapsed(), slow_upload_threshold) {
                tracing::warn!(path = %pending.path.display(), elapsed = ?started.elapsed(), "slow upload");
            }
            (pending, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for (pending, result) in results {
        dedup.record_processed();
        let now = Utc::now();
        match result {
            UploadOutcome::NewUploaded => {
                progress.record_completed(pending.fingerprint.clone(), pending.path, FileStatus::Uploaded, now);
                progress.touch_activity(now, true);
                dedup.insert_uploaded(pending.fingerprint);
                outcome.new_uploaded += 1;
            }
            UploadOutcome::AlreadyPresent => {
                progress.record_completed(
                    pending.fingerprint,
                    pending.path,
                    FileStatus::AlreadyPresentRemote,
                    now,
                );
                progress.touch_activity(now, false);
                outcome.already_present += 1;
            }
            UploadOutcome::PermanentFailure(reason) => {
                tracing::warn!(path = %pending.path.display(), %reason, "upload permanently failed");
                progress.record_completed(pending.fingerprint, pending.path, FileStatus::Unresolvable, now);
                progress.touch_activity(now, false);
                outcome.failed += 1;
            }
            UploadOutcome::TransientFailure(reason) => {
                tracing::warn!(path = %pending.path.display(), %reason, "upload exhausted retries transiently");
                outcome.failed += 1;
                outcome.all_terminated = false;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bookmover_catalog::{FingerprintStream, UploadPayload, UploadResponse, UploadStatus};
    use bookmover_dedup::RefreshTrigger;
    use bookmover_metadata::RawMetadata;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::tempdir;

    struct AlwaysNewTarget {
        uploads: AtomicU32,
    }

    #[async_trait]
    impl TargetService for AlwaysNewTarget {
        async fn exists(&self, _fingerprint: &Fingerprint) -> bookmover_catalog::Result<bool> {
            Ok(false)
        }
        async fn all_fingerprints(&self) -> bookmover_catalog::Result<FingerprintStream> {
            Ok(Box::pin(stream::iter(vec![])))
        }
        async fn upload(&self, _payload: UploadPayload<'_>) -> bookmover_catalog::Result<UploadResponse> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(UploadResponse {
                status: UploadStatus::New,
                server_fingerprint: None,
            })
        }
    }

    struct NoopTool;

    #[async_trait]
    impl MetadataTool for NoopTool {
        async fn extract(&self, _path: &Path) -> bookmover_metadata::Result<RawMetadata> {
            Ok(RawMetadata {
                title: Some("Title".into()),
                authors: vec!["Author".into()],
                language: Some("en".into()),
                series: None,
                series_index: None,
            })
        }
    }

    fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn uploads_new_files_and_records_completion() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.epub", b"alpha");
        let b = write_file(dir.path(), "b.epub", b"beta");
        let items = vec![FileItem::from_path(a), FileItem::from_path(b)];

        let mut progress = WorkerProgress::new(0);
        let mut dedup = DedupCache::new(RefreshTrigger::default(), Utc::now());
        let target = AlwaysNewTarget { uploads: AtomicU32::new(0) };
        let tool = NoopTool;

        let outcome = process_items(
            &items,
            &mut progress,
            &mut dedup,
            &target,
            &tool,
            UploadConfig::default(),
            2,
        )
        .await;

        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.new_uploaded, 2);
        assert!(outcome.all_terminated);
        assert_eq!(progress.completed_files.len(), 2);
        assert_eq!(target.uploads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn local_dedup_skips_already_completed_path() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.epub", b"alpha");
        let fp = bookmover_fingerprint::fingerprint(&a).unwrap();

        let mut progress = WorkerProgress::new(0);
        progress.record_completed(fp, a.clone(), FileStatus::Uploaded, Utc::now());
        let mut dedup = DedupCache::new(RefreshTrigger::default(), Utc::now());
        let target = AlwaysNewTarget { uploads: AtomicU32::new(0) };
        let tool = NoopTool;

        let items = vec![FileItem::from_path(a)];
        let outcome = process_items(
            &items,
            &mut progress,
            &mut dedup,
            &target,
            &tool,
            UploadConfig::default(),
            1,
        )
        .await;

        assert_eq!(outcome.new_uploaded, 0);
        assert_eq!(target.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_file_is_recorded_unresolvable_not_retried_forever() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("ghost.epub");
        let mut progress = WorkerProgress::new(0);
        let mut dedup = DedupCache::new(RefreshTrigger::default(), Utc::now());
        let target = AlwaysNewTarget { uploads: AtomicU32::new(0) };
        let tool = NoopTool;

        let items = vec![FileItem::from_path(missing)];
        let outcome = process_items(
            &items,
            &mut progress,
            &mut dedup,
            &target,
            &tool,
            UploadConfig::default(),
            1,
        )
        .await;

        assert_eq!(outcome.failed, 1);
        assert!(outcome.all_terminated);
        assert_eq!(progress.completed_files.len(), 1);
    }

    #[tokio::test]
    async fn remote_mirror_dedup_hit_records_already_present_local() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.epub", b"alpha");
        let fp = bookmover_fingerprint::fingerprint(&a).unwrap();

        let mut progress = WorkerProgress::new(0);
        let mut dedup = DedupCache::new(RefreshTrigger::default(), Utc::now());
        dedup.replace_remote_mirror([fp], Utc::now());
        let target = AlwaysNewTarget { uploads: AtomicU32::new(0) };
        let tool = NoopTool;

        let items = vec![FileItem::from_path(a.clone())];
        let outcome = process_items(&items, &mut progress, &mut dedup, &target, &tool, UploadConfig::default(), 1).await;

        assert_eq!(outcome.already_present, 1);
        assert_eq!(target.uploads.load(Ordering::SeqCst), 0);
        let recorded = progress.completed_files.values().find(|cf| cf.path == a).unwrap();
        assert_eq!(recorded.status, FileStatus::AlreadyPresentLocal);
    }
}
