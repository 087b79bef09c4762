use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher as StdHasher};
use std::path::Path;

use bookmover_model::WorkerProgress;

use crate::peers::load_peers;
use crate::pidfile::is_peer_alive;

/// Deterministic ownership of one archive name, the same partitioning idiom
/// as the catalog's `shard_key mod n_shards` (§4.6), applied to archive
/// names since archive assignment has no numeric key to shard on.
pub fn owning_shard(archive_name: &str, n_shards: u32) -> u32 {
    let mut hasher = DefaultHasher::new();
    archive_name.hash(&mut hasher);
    (hasher.finish() % n_shards as u64) as u32
}

fn assigned_to(archives: &[String], shard_id: u32, n_shards: u32) -> Vec<String> {
    archives
        .iter()
        .filter(|name| owning_shard(name, n_shards) == shard_id)
        .cloned()
        .collect()
}

/// §4.7 orphan recovery: once this worker exhausts its own assignment, it
/// looks for archives owned by a peer whose process is no longer alive and
/// that peer hasn't finished. Uploads are idempotent via fingerprint, so no
/// coordination primitive beyond "peer process is dead" is required to
/// claim them safely.
pub fn recover_orphaned_archives(
    all_archives: &[String],
    progress_dir: &Path,
    own_shard_id: u32,
    n_shards: u32,
) -> Vec<String> {
    let peers = load_peers(progress_dir, own_shard_id);
    let mut orphaned = Vec::new();
    for peer in &peers {
        if is_peer_alive(progress_dir, peer.shard_id) {
            continue;
        }
        let assigned = assigned_to(all_archives, peer.shard_id, n_shards);
        for archive in assigned {
            if !peer.completed_archives.contains(&archive) && !orphaned.contains(&archive) {
                orphaned.push(archive);
            }
        }
    }
    orphaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmover_progress::ProgressStore;
    use tempfile::tempdir;

    #[test]
    fn owning_shard_is_stable_for_the_same_name() {
        assert_eq!(owning_shard("lib-001.zip", 4), owning_shard("lib-001.zip", 4));
    }

    #[test]
    fn dead_peers_unfinished_archives_are_recovered() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::new(dir.path());

        let dead_shard = 1;
        let peer = WorkerProgress::new(dead_shard);
        store.commit(&peer).unwrap();
        // No pid file written for `dead_shard`, so it reads as not alive.

        let archives: Vec<String> = (0..50).map(|i| format!("archive-{i}.zip")).collect();
        let owned_by_dead = archives
            .iter()
            .filter(|name| owning_shard(name, 4) == dead_shard)
            .count();

        let recovered = recover_orphaned_archives(&archives, dir.path(), 0, 4);
        assert_eq!(recovered.len(), owned_by_dead);
    }

    #[test]
    fn live_peers_archives_are_not_recovered() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::new(dir.path());
        let live_shard = 2;
        let peer = WorkerProgress::new(live_shard);
        store.commit(&peer).unwrap();
        crate::pidfile::write_pid_file(dir.path(), live_shard).unwrap();

        let archives: Vec<String> = (0..50).map(|i| format!("archive-{i}.zip")).collect();
        let recovered = recover_orphaned_archives(&archives, dir.path(), 0, 4);
        assert!(recovered.iter().all(|name| owning_shard(name, 4) != live_shard));
    }
}
