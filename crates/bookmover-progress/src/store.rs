use std::path::{Path, PathBuf};

use bookmover_fs::{atomic_write, AtomicWriteOptions, WriteMode};
use bookmover_model::WorkerProgress;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::recovery::recover_last_complete;

/// Per-worker checkpoint file (§4.4). File layout is this module's own
/// business (JSON here); the contract the rest of the pipeline relies on is
/// `load`/`commit`/`touch_activity`.
pub struct ProgressStore {
    dir: PathBuf,
}

impl ProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, shard_id: u32) -> PathBuf {
        self.dir.join(format!("worker-{shard_id}.progress.json"))
    }

    /// Loads a worker's checkpoint, or a fresh one if absent. A corrupt tail
    /// (partial write interrupted mid-flush) is recovered by scanning
    /// backwards for the last complete JSON object rather than failing the
    /// worker on startup.
    pub fn load(&self, shard_id: u32) -> Result<WorkerProgress> {
        let path = self.path_for(shard_id);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(WorkerProgress::new(shard_id));
            }
            Err(e) => return Err(Error::CreationFailed { path, source: e }),
        };

        match serde_json::from_slice::<WorkerProgress>(&bytes) {
            Ok(progress) => Ok(progress),
            Err(_) => {
                tracing::warn!(?path, "progress file tail is corrupt, recovering last complete value");
                Ok(recover_last_complete(&bytes).unwrap_or_else(|| WorkerProgress::new(shard_id)))
            }
        }
    }

    /// Atomically commits `progress` to its shard's file. Returns whether
    /// the commit went through the atomic rename path or the direct-write
    /// fallback, so the caller can flag the degraded event (§7).
    pub fn commit(&self, progress: &WorkerProgress) -> Result<WriteMode> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::CreationFailed {
            path: self.dir.clone(),
            source: e,
        })?;
        let path = self.path_for(progress.shard_id);
        let bytes = serde_json::to_vec_pretty(progress).map_err(|e| Error::Serialize {
            shard_id: progress.shard_id,
            source: e,
        })?;
        let mode = atomic_write(&path, &bytes, AtomicWriteOptions::new().sync(true))?;
        if mode == WriteMode::DirectFallback {
            tracing::warn!(shard_id = progress.shard_id, "progress commit used direct-write fallback");
        }
        Ok(mode)
    }

    /// `kind=upload` updates both timers; any other activity updates only
    /// `last_activity_at` (§4.4).
    pub fn touch_activity(progress: &mut WorkerProgress, now: DateTime<Utc>, is_upload: bool) {
        progress.touch_activity(now, is_upload);
    }
}

/// Exists purely so `Path`-typed call sites don't need to construct a
/// `ProgressStore` just to compute a file name.
pub fn progress_file_name(shard_id: u32) -> String {
    format!("worker-{shard_id}.progress.json")
}

pub fn is_progress_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("worker-") && n.ends_with(".progress.json"))
}
