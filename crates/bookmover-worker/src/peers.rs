use std::path::Path;

use bookmover_model::{Fingerprint, WorkerProgress};
use bookmover_progress::{is_progress_file, ProgressStore};

/// Loads every other worker's progress file under `dir` (§4.3 peer mirror,
/// §4.7 orphan recovery). Unreadable files are skipped with a warning
/// rather than failing the whole scan — a peer mid-write is expected, not
/// exceptional.
pub fn load_peers(dir: &Path, own_shard_id: u32) -> Vec<WorkerProgress> {
    let store = ProgressStore::new(dir);
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(?dir, %error, "could not scan progress directory for peers");
            return Vec::new();
        }
    };

    let mut peers = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !is_progress_file(&path) {
            continue;
        }
        let Some(shard_id) = shard_id_from_progress_path(&path) else {
            continue;
        };
        if shard_id == own_shard_id {
            continue;
        }
        match store.load(shard_id) {
            Ok(progress) => peers.push(progress),
            Err(error) => tracing::warn!(?path, %error, "failed to load peer progress"),
        }
    }
    peers
}

fn shard_id_from_progress_path(path: &Path) -> Option<u32> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("worker-")?
        .split('.')
        .next()?
        .parse()
        .ok()
}

/// Union of every completed fingerprint across `peers`, for rebuilding the
/// dedup cache's peer-mirror layer (§4.3).
pub fn peer_fingerprints(peers: &[WorkerProgress]) -> impl Iterator<Item = Fingerprint> + '_ {
    peers.iter().flat_map(|p| p.completed_files.keys().cloned())
}
