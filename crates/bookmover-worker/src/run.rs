use std::sync::Arc;

use bookmover_catalog::{SourceCatalog, TargetService};
use bookmover_dedup::{DedupCache, RefreshTrigger};
use bookmover_metadata::MetadataTool;
use bookmover_model::WorkerStatus;
use bookmover_progress::{CommitGate, ProgressStore};
use bookmover_upload::UploadConfig;
use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::watch;

use crate::batch::{process_items_with_slow_threshold, FileItem};
use crate::config::WorkerConfig;
use crate::error::{Error, Result};
use crate::metrics::UploadRateTracker;
use crate::pause::is_paused;
use crate::peers::{load_peers, peer_fingerprints};
use crate::skip_ahead::SkipAheadTracker;

/// Collaborators a worker process needs; held behind trait objects so the
/// CLI binary can wire up HTTP-backed implementations while tests use
/// in-memory doubles.
pub struct WorkerContext {
    pub config: WorkerConfig,
    pub source: Arc<dyn SourceCatalog>,
    pub target: Arc<dyn TargetService>,
    pub metadata_tool: Arc<dyn MetadataTool>,
}

/// Runs the C6 state machine to completion: initializing, then
/// discovering/processing until the shard's key space is exhausted, a
/// shutdown is requested, or the supervisor's pause flag appears.
pub async fn run_worker(ctx: WorkerContext) -> Result<()> {
    let store = ProgressStore::new(&ctx.config.progress_dir);
    let mut progress = store.load(ctx.config.shard_id)?;
    progress.status = WorkerStatus::Initializing;
    store.commit(&progress)?;
    if let Err(error) = crate::pidfile::write_pid_file(&ctx.config.progress_dir, ctx.config.shard_id) {
        tracing::warn!(%error, "failed to write pid file, peer liveness checks will treat this worker as dead");
    }

    let now = Utc::now();
    let mut dedup = DedupCache::new(RefreshTrigger::default(), now);
    bootstrap_remote_mirror(&ctx, &mut dedup).await?;
    refresh_peer_mirror(&ctx, &mut dedup, &progress);

    let commit_gate = CommitGate::default();
    let mut skip_ahead = SkipAheadTracker::new(ctx.config.skip_ahead_threshold, ctx.config.skip_ahead_stride);
    let mut rate_tracker = UploadRateTracker::new(ctx.config.metrics_every, now);
    let mut last_commit = now;

    let shutdown = shutdown_signal();

    loop {
        if is_paused(&ctx.config.pause_flag_dir, ctx.config.shard_id) {
            tracing::info!(shard_id = ctx.config.shard_id, "pause flag set, halting");
            progress.status = WorkerStatus::Paused;
            store.commit(&progress)?;
            return Ok(());
        }
        if *shutdown.borrow() {
            tracing::info!(shard_id = ctx.config.shard_id, "shutdown requested, not starting a new batch");
            break;
        }

        progress.status = WorkerStatus::Discovering;
        let batch = ctx
            .source
            .next_batch(
                ctx.config.shard_id,
                ctx.config.n_shards,
                progress.last_processed_shard_key,
                ctx.config.batch_size,
            )
            .await?;

        if batch.is_empty() {
            tracing::info!(shard_id = ctx.config.shard_id, "no further records, draining");
            break;
        }

        progress.status = WorkerStatus::Processing;
        let max_key = batch.iter().map(|r| r.shard_key).max().unwrap_or(progress.last_processed_shard_key);
        let items: Vec<FileItem> = batch.into_iter().map(|r| FileItem::from_path(r.path)).collect();

        let transport = if ctx.config.use_symlinks {
            bookmover_upload::UploadTransport::ByReference
        } else {
            bookmover_upload::UploadTransport::ByValue
        };
        let upload_config = UploadConfig {
            transport,
            ..UploadConfig::default()
        };

        let processing = process_items_with_slow_threshold(
            &items,
            &mut progress,
            &mut dedup,
            ctx.target.as_ref(),
            ctx.metadata_tool.as_ref(),
            upload_config,
            ctx.config.upload_concurrency,
            ctx.config.slow_upload_threshold,
        );
        tokio::pin!(processing);
        let mut shutdown_during_batch = shutdown.clone();
        let outcome = if *shutdown_during_batch.borrow() {
            drain_with_deadline(&mut processing, ctx.config.drain_deadline, ctx.config.shard_id).await
        } else {
            loop {
                tokio::select! {
                    outcome = &mut processing => break Some(outcome),
                    result = shutdown_during_batch.changed() => {
                        match result {
                            // Sender gone without ever signaling shutdown (e.g. the
                            // SIGTERM handler failed to install): nothing will ever
                            // wake this branch again, so just finish the batch.
                            Err(_) => break Some((&mut processing).await),
                            Ok(()) if *shutdown_during_batch.borrow() => {
                                break drain_with_deadline(&mut processing, ctx.config.drain_deadline, ctx.config.shard_id).await;
                            }
                            Ok(()) => continue,
                        }
                    }
                }
            }
        };

        let Some(outcome) = outcome else {
            break;
        };

        if outcome.all_terminated {
            progress.advance_to(max_key);
        } else {
            tracing::warn!(
                shard_id = ctx.config.shard_id,
                "batch left transient failures, key held back for retry"
            );
        }

        for _ in 0..outcome.new_uploaded {
            if let Some(rate) = rate_tracker.record_upload(Utc::now()) {
                tracing::info!(shard_id = ctx.config.shard_id, uploads_per_minute = rate, "upload rate");
            }
        }

        if skip_ahead.record_batch(outcome.any_new_uploaded()) {
            tracing::warn!(
                shard_id = ctx.config.shard_id,
                stride = skip_ahead.stride(),
                "skip-ahead triggered, jumping past likely-migrated range"
            );
            progress.skip_ahead(skip_ahead.stride());
        }

        if outcome.new_uploaded == 0 {
            refresh_peer_mirror(&ctx, &mut dedup, &progress);
        }
        if dedup.needs_refresh(Utc::now()) {
            bootstrap_remote_mirror(&ctx, &mut dedup).await?;
        }

        let now = Utc::now();
        if commit_gate.should_commit(true, false, last_commit, now) {
            store.commit(&progress)?;
            last_commit = now;
        }
    }

    store.commit(&progress)?;
    Ok(())
}

/// Waits for an already-in-flight batch to finish, capped to `deadline`
/// (§4.6's SIGTERM drain contract). `None` means the deadline expired;
/// whatever the batch had already recorded into `progress` before that
/// point still gets committed by the caller, the rest is retried on the
/// next run since uploads are idempotent.
async fn drain_with_deadline<Fut>(processing: &mut Fut, deadline: std::time::Duration, shard_id: u32) -> Option<Fut::Output>
where
    Fut: std::future::Future + Unpin,
{
    tracing::info!(shard_id, ?deadline, "shutdown requested mid-batch, draining in-flight uploads with deadline");
    match tokio::time::timeout(deadline, processing).await {
        Ok(outcome) => Some(outcome),
        Err(_) => {
            tracing::warn!(
                shard_id,
                "drain deadline exceeded, committing recorded progress and exiting without waiting further"
            );
            None
        }
    }
}

async fn bootstrap_remote_mirror(ctx: &WorkerContext, dedup: &mut DedupCache) -> Result<()> {
    let mut stream = ctx.target.all_fingerprints().await?;
    let mut fingerprints = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(fp) => fingerprints.push(fp),
            Err(error) => tracing::warn!(%error, "skipping malformed remote fingerprint entry"),
        }
    }
    dedup.replace_remote_mirror(fingerprints, Utc::now());
    Ok(())
}

fn refresh_peer_mirror(ctx: &WorkerContext, dedup: &mut DedupCache, progress: &bookmover_model::WorkerProgress) {
    let peers = load_peers(&ctx.config.progress_dir, progress.shard_id);
    dedup.replace_peer_mirror(peer_fingerprints(&peers));
}

/// Spawns a SIGTERM listener and returns a watch receiver flipped to `true`
/// once received (§4.6: "on SIGTERM, refuse new records ... commit progress,
/// exit"). The main loop stops fetching new batches once this flips, and
/// caps how long it waits on an already in-flight batch to `drain_deadline`.
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(term) => term,
                Err(error) => {
                    tracing::warn!(%error, "failed to install SIGTERM handler");
                    return;
                }
            };
            term.recv().await;
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        let _ = tx.send(true);
    });
    rx
}
