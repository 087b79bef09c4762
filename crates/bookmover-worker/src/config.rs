use std::path::PathBuf;
use std::time::Duration;

/// Tunables for one worker process (§4.6, §6 CLI surface). Defaults match
/// the stated values; the CLI binary is the only place these get
/// overridden from flags.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub shard_id: u32,
    pub n_shards: u32,
    pub batch_size: u32,
    pub upload_concurrency: usize,
    pub skip_ahead_threshold: u32,
    pub skip_ahead_stride: i64,
    pub drain_deadline: Duration,
    pub slow_upload_threshold: Duration,
    pub metrics_every: u64,
    pub progress_dir: PathBuf,
    /// Root scanned for a pause flag file named `worker-<shard_id>.pause`.
    pub pause_flag_dir: PathBuf,
    /// Archive mode only: where archives are extracted and folder reuse is
    /// scanned for (§4.7).
    pub staging_dir: PathBuf,
    /// Archive mode only: parallel fingerprinting degree (§4.7 step 2).
    pub fingerprint_concurrency: usize,
    /// `--use-symlinks`: send the target only a path reference instead of
    /// file bytes (§6). Requires the target to share a filesystem with the
    /// source library.
    pub use_symlinks: bool,
}

impl WorkerConfig {
    pub fn new(shard_id: u32, n_shards: u32, progress_dir: PathBuf, staging_dir: PathBuf) -> Self {
        Self {
            shard_id,
            n_shards,
            batch_size: 1000,
            upload_concurrency: 1,
            skip_ahead_threshold: 5,
            skip_ahead_stride: 10_000,
            drain_deadline: Duration::from_secs(30),
            slow_upload_threshold: Duration::from_secs(120),
            metrics_every: 100,
            pause_flag_dir: progress_dir.clone(),
            progress_dir,
            staging_dir,
            fingerprint_concurrency: 4,
            use_symlinks: false,
        }
    }
}
