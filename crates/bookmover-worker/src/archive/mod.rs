mod orphan;
mod reuse_flow;

use std::path::PathBuf;

use bookmover_dedup::{DedupCache, RefreshTrigger};
use bookmover_model::{ArchiveSummary, WorkerStatus};
use bookmover_progress::ProgressStore;
use bookmover_upload::UploadConfig;
use chrono::Utc;

pub use orphan::{owning_shard, recover_orphaned_archives};
pub use reuse_flow::{extract_or_reuse, fingerprint_in_parallel, list_extracted_files, ExtractionFolder};

use crate::batch::process_items_with_slow_threshold;
use crate::error::Result;
use crate::pause::is_paused;
use crate::peers::{load_peers, peer_fingerprints};
use crate::pidfile::write_pid_file;
use crate::run::WorkerContext;

/// C7-specific inputs layered on top of the shared worker collaborators.
pub struct ArchiveWorkerContext {
    pub base: WorkerContext,
    pub archive_root: PathBuf,
    /// Every archive in the migration, used only to compute orphan
    /// ownership (§4.7); this worker's own slice is `assigned_archives`.
    pub all_archive_names: Vec<String>,
    pub assigned_archives: Vec<String>,
}

/// Runs the C7 state machine: drains `assigned_archives`, then claims
/// orphaned archives from dead peers until none remain.
pub async fn run_archive_worker(ctx: ArchiveWorkerContext) -> Result<()> {
    let config = &ctx.base.config;
    let store = ProgressStore::new(&config.progress_dir);
    let mut progress = store.load(config.shard_id)?;
    progress.status = WorkerStatus::Initializing;
    store.commit(&progress)?;
    if let Err(error) = write_pid_file(&config.progress_dir, config.shard_id) {
        tracing::warn!(%error, "failed to write pid file");
    }

    let now = Utc::now();
    let mut dedup = DedupCache::new(RefreshTrigger::default(), now);
    let mut stream = ctx.base.target.all_fingerprints().await?;
    {
        use futures_util::StreamExt;
        let mut fingerprints = Vec::new();
        while let Some(item) = stream.next().await {
            if let Ok(fp) = item {
                fingerprints.push(fp);
            }
        }
        dedup.replace_remote_mirror(fingerprints, now);
    }
    let peers = load_peers(&config.progress_dir, config.shard_id);
    dedup.replace_peer_mirror(peer_fingerprints(&peers));

    let mut queue: Vec<String> = ctx
        .assigned_archives
        .iter()
        .filter(|name| !progress.completed_archives.contains(*name))
        .cloned()
        .collect();

    loop {
        if queue.is_empty() {
            let orphaned = recover_orphaned_archives(
                &ctx.all_archive_names,
                &config.progress_dir,
                config.shard_id,
                config.n_shards,
            );
            let fresh: Vec<String> = orphaned
                .into_iter()
                .filter(|name| !progress.completed_archives.contains(name))
                .collect();
            if fresh.is_empty() {
                break;
            }
            tracing::info!(count = fresh.len(), "claimed orphaned archives from dead peers");
            queue.extend(fresh);
        }

        if is_paused(&config.pause_flag_dir, config.shard_id) {
            progress.status = WorkerStatus::Paused;
            store.commit(&progress)?;
            return Ok(());
        }

        let archive_name = queue.remove(0);
        let archive_path = ctx.archive_root.join(&archive_name);
        progress.current_archive = Some(archive_name.clone());
        progress.status = WorkerStatus::Processing;
        store.commit(&progress)?;

        let folder = match extract_or_reuse(&config.staging_dir, &archive_path, Utc::now().timestamp()) {
            Ok(folder) => folder,
            Err(error) => {
                tracing::warn!(%error, archive = %archive_name, "failed to extract or reuse archive, skipping for now");
                continue;
            }
        };

        let files = list_extracted_files(&folder.path);
        let total_files = files.len() as u64;
        let items = fingerprint_in_parallel(files, config.fingerprint_concurrency).await;

        let outcome = process_items_with_slow_threshold(
            &items,
            &mut progress,
            &mut dedup,
            ctx.base.target.as_ref(),
            ctx.base.metadata_tool.as_ref(),
            UploadConfig::default(),
            config.upload_concurrency,
            config.slow_upload_threshold,
        )
        .await;

        progress.archive_progress.insert(
            archive_name.clone(),
            ArchiveSummary {
                total_files,
                processed_files: outcome.processed as u64,
                new_uploaded: outcome.new_uploaded as u64,
                already_present: outcome.already_present as u64,
            },
        );

        if outcome.all_terminated {
            progress.completed_archives.insert(archive_name.clone());
            progress.current_archive = None;
            if !folder.reused {
                if let Err(error) = std::fs::remove_dir_all(&folder.path) {
                    tracing::warn!(%error, path = ?folder.path, "failed to clean up extraction folder");
                }
            }
        } else {
            tracing::warn!(archive = %archive_name, "archive left transient failures, retrying later");
            queue.push(archive_name);
        }

        store.commit(&progress)?;
    }

    progress.current_archive = None;
    store.commit(&progress)?;
    Ok(())
}
