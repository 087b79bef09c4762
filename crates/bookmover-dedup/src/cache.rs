use std::collections::HashSet;

use bookmover_model::{Fingerprint, WorkerProgress};
use chrono::{DateTime, Utc};

use crate::trigger::RefreshTrigger;

/// Which of the three dedup layers (§4.3) matched, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DedupMatch {
    Local,
    Peer,
    Remote,
    None,
}

impl DedupMatch {
    pub fn is_match(self) -> bool {
        self != DedupMatch::None
    }
}

/// Three-layer dedup cache (§4.3): local progress, peer progress, remote
/// mirror, consulted in that order. `seen` is a conservative approximation
/// — false negatives are expected and handled by the server; false
/// positives must never happen, so every layer here is exact set
/// membership, never a probabilistic filter.
pub struct DedupCache {
    peer_mirror: HashSet<Fingerprint>,
    remote_mirror: HashSet<Fingerprint>,
    trigger: RefreshTrigger,
    processed_since_refresh: u64,
    last_refresh: DateTime<Utc>,
}

impl DedupCache {
    pub fn new(trigger: RefreshTrigger, now: DateTime<Utc>) -> Self {
        Self {
            peer_mirror: HashSet::new(),
            remote_mirror: HashSet::new(),
            trigger,
            processed_since_refresh: 0,
            last_refresh: now,
        }
    }

    /// Layer 1 (local) is the caller's own `WorkerProgress`, never owned by
    /// this cache; layers 2 and 3 live here.
    pub fn seen(&self, local: &WorkerProgress, fp: &Fingerprint) -> bool {
        self.locate(local, fp).is_match()
    }

    /// Consults the three layers in order (local, peer, remote) and reports
    /// which one matched, so callers can distinguish
    /// `already_present_local` from `already_present_remote` (§3, §4.6 step
    /// 1).
    pub fn locate(&self, local: &WorkerProgress, fp: &Fingerprint) -> DedupMatch {
        if local.has_completed(fp) {
            DedupMatch::Local
        } else if self.peer_mirror.contains(fp) {
            DedupMatch::Peer
        } else if self.remote_mirror.contains(fp) {
            DedupMatch::Remote
        } else {
            DedupMatch::None
        }
    }

    /// Rebuilds the peer-progress layer from a lazily-loaded snapshot of
    /// peers' `completed_files` (§4.3: "reloaded lazily at worker startup
    /// and on demand when a batch produces zero new uploads").
    pub fn replace_peer_mirror(&mut self, fingerprints: impl IntoIterator<Item = Fingerprint>) {
        self.peer_mirror = fingerprints.into_iter().collect();
    }

    /// Rebuilds the remote-mirror layer from a bootstrap or refresh query
    /// against the target service.
    pub fn replace_remote_mirror(
        &mut self,
        fingerprints: impl IntoIterator<Item = Fingerprint>,
        now: DateTime<Utc>,
    ) {
        self.remote_mirror = fingerprints.into_iter().collect();
        self.processed_since_refresh = 0;
        self.last_refresh = now;
    }

    /// After every successful NewUploaded, insert into the local mirror so
    /// a subsequent lookup within the same worker sees it immediately,
    /// without waiting for the next remote refresh.
    pub fn insert_uploaded(&mut self, fp: Fingerprint) {
        self.remote_mirror.insert(fp);
    }

    pub fn record_processed(&mut self) {
        self.processed_since_refresh += 1;
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.trigger
            .should_refresh(self.processed_since_refresh, self.last_refresh, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fp(n: u64) -> Fingerprint {
        Fingerprint::new(format!("{n:040x}"), n)
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn unseen_fingerprint_reports_unseen_in_all_layers() {
        let cache = DedupCache::new(RefreshTrigger::default(), now());
        let local = WorkerProgress::new(0);
        assert!(!cache.seen(&local, &fp(1)));
    }

    #[test]
    fn local_layer_is_consulted_first() {
        let cache = DedupCache::new(RefreshTrigger::default(), now());
        let mut local = WorkerProgress::new(0);
        local.record_completed(
            fp(1),
            PathBuf::from("/a"),
            bookmover_model::FileStatus::Uploaded,
            now(),
        );
        assert!(cache.seen(&local, &fp(1)));
    }

    #[test]
    fn peer_mirror_layer_is_consulted() {
        let mut cache = DedupCache::new(RefreshTrigger::default(), now());
        cache.replace_peer_mirror([fp(2)]);
        let local = WorkerProgress::new(0);
        assert!(cache.seen(&local, &fp(2)));
        assert!(!cache.seen(&local, &fp(3)));
    }

    #[test]
    fn remote_mirror_layer_is_consulted_and_updated_after_upload() {
        let mut cache = DedupCache::new(RefreshTrigger::default(), now());
        let local = WorkerProgress::new(0);
        assert!(!cache.seen(&local, &fp(4)));
        cache.insert_uploaded(fp(4));
        assert!(cache.seen(&local, &fp(4)));
    }

    #[test]
    fn replace_remote_mirror_resets_refresh_counters() {
        let mut cache = DedupCache::new(RefreshTrigger::new(10, chrono::Duration::minutes(30)), now());
        for _ in 0..10 {
            cache.record_processed();
        }
        assert!(cache.needs_refresh(now()));
        cache.replace_remote_mirror([], now());
        assert!(!cache.needs_refresh(now()));
    }

    #[test]
    fn locate_distinguishes_which_layer_matched() {
        let mut cache = DedupCache::new(RefreshTrigger::default(), now());
        cache.replace_peer_mirror([fp(10)]);
        cache.replace_remote_mirror([fp(20)], now());
        let mut local = WorkerProgress::new(0);
        local.record_completed(fp(30), PathBuf::from("/a"), bookmover_model::FileStatus::Uploaded, now());

        assert_eq!(cache.locate(&local, &fp(30)), DedupMatch::Local);
        assert_eq!(cache.locate(&local, &fp(10)), DedupMatch::Peer);
        assert_eq!(cache.locate(&local, &fp(20)), DedupMatch::Remote);
        assert_eq!(cache.locate(&local, &fp(40)), DedupMatch::None);
    }
}
