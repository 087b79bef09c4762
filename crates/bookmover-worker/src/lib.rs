//! Worker (C6) and archive worker (C7): the shard-owning process that pulls
//! records from the source catalog (or an assigned set of archives),
//! filters them through the dedup cache, fingerprints, extracts metadata,
//! uploads, and checkpoints its own progress file.

mod archive;
mod batch;
mod config;
mod error;
mod liveness;
mod metrics;
mod pause;
mod peers;
mod pidfile;
mod run;
mod skip_ahead;

pub use archive::{
    owning_shard, recover_orphaned_archives, run_archive_worker, ArchiveWorkerContext, ExtractionFolder,
};
pub use batch::{process_items, process_items_with_slow_threshold, BatchOutcome, FileItem};
pub use config::WorkerConfig;
pub use error::{Error, Result};
pub use liveness::process_is_alive;
pub use metrics::{is_slow_upload, UploadRateTracker};
pub use pause::{is_paused, pause_flag_path};
pub use pidfile::{is_peer_alive, pid_file_path, read_pid, write_pid_file};
pub use run::{run_worker, WorkerContext};
pub use skip_ahead::SkipAheadTracker;
