use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// Per-file outcome recorded in a worker's progress (§3 `completed_files`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Uploaded,
    AlreadyPresentRemote,
    AlreadyPresentLocal,
    Unresolvable,
}

/// One entry of `completed_files`: the path processed, its terminal status,
/// and when it was recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletedFile {
    pub path: PathBuf,
    pub status: FileStatus,
    pub ts: DateTime<Utc>,
}

/// Worker lifecycle state (§4.6's state machine, persisted so a restarted
/// worker and the supervisor can both read it back).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Initializing,
    Discovering,
    Processing,
    Paused,
}

/// Per-archive counters tracked in archive mode (§4.7).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub total_files: u64,
    pub processed_files: u64,
    pub new_uploaded: u64,
    pub already_present: u64,
}

/// Durable per-worker checkpoint (§3, §4.4). One file per `shard_id`, owned
/// exclusively by the worker that wrote it (I3); other processes only ever
/// read a deserialized copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkerProgress {
    pub shard_id: u32,
    pub last_processed_shard_key: i64,
    pub completed_files: HashMap<Fingerprint, CompletedFile>,
    pub last_uploaded_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub status: WorkerStatus,
    #[serde(default)]
    pub completed_archives: HashSet<String>,
    #[serde(default)]
    pub current_archive: Option<String>,
    #[serde(default)]
    pub archive_progress: HashMap<String, ArchiveSummary>,
}

impl WorkerProgress {
    pub fn new(shard_id: u32) -> Self {
        Self {
            shard_id,
            last_processed_shard_key: -1,
            completed_files: HashMap::new(),
            last_uploaded_at: None,
            last_activity_at: None,
            status: WorkerStatus::Initializing,
            completed_archives: HashSet::new(),
            current_archive: None,
            archive_progress: HashMap::new(),
        }
    }

    /// I2: records a terminal outcome for a fingerprint exactly once per
    /// worker. Returns `false` (no-op) if the fingerprint is already present,
    /// since a later write must never clobber an earlier terminal status.
    pub fn record_completed(
        &mut self,
        fingerprint: Fingerprint,
        path: PathBuf,
        status: FileStatus,
        ts: DateTime<Utc>,
    ) -> bool {
        if self.completed_files.contains_key(&fingerprint) {
            return false;
        }
        self.completed_files
            .insert(fingerprint, CompletedFile { path, status, ts });
        true
    }

    pub fn has_completed(&self, fingerprint: &Fingerprint) -> bool {
        self.completed_files.contains_key(fingerprint)
    }

    /// I1: advances the checkpoint key, refusing to move it backwards except
    /// through the explicit `skip_ahead` path.
    pub fn advance_to(&mut self, key: i64) {
        if key > self.last_processed_shard_key {
            self.last_processed_shard_key = key;
        }
    }

    /// Deliberate forward jump past a fully-migrated range (§4.6). Unlike
    /// `advance_to`, this does not require `key` to already be lower; it is
    /// the one sanctioned exception to I1's monotonicity-except-jump clause.
    pub fn skip_ahead(&mut self, stride: i64) {
        self.last_processed_shard_key += stride;
    }

    pub fn touch_activity(&mut self, now: DateTime<Utc>, is_upload: bool) {
        self.last_activity_at = Some(now);
        if is_upload {
            self.last_uploaded_at = Some(now);
        }
    }
}
