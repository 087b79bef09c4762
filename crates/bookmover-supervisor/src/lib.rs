//! C8: the supervisor. An independent long-lived process that reads worker
//! progress files and logs out-of-band, detects stuck/stopped workers,
//! scales the fleet by disk-I/O pressure, and applies bounded, cooldown-
//! gated fixes — restart, config change, or a validated code patch.

mod config;
mod cooldown;
mod diff_apply;
mod discovery;
mod diskio;
mod error;
mod fix_apply;
mod fix_history;
mod lifecycle;
mod liveness;
mod log_signals;
mod oracle_cache;
mod patch_apply;
mod recurrence;
mod run;
mod scaling;

pub use config::SupervisorConfig;
pub use cooldown::CooldownTracker;
pub use diskio::{DiskIoSampler, FixedUtilSampler, ProcDiskstatsSampler};
pub use error::{Error, Result};
pub use fix_apply::{attempts_since_last_verified, is_in_fix_cooldown, should_escalate, FixCoordinator, PendingVerification};
pub use fix_history::FixHistoryStore;
pub use lifecycle::{ScriptLifecycle, WorkerLifecycle};
pub use liveness::{is_stuck, process_start_time};
pub use log_signals::{extract_error_patterns, has_recent_progress_signal, FileLogSource, LogSource};
pub use oracle_cache::OracleCache;
pub use patch_apply::{apply_and_validate, PatchError};
pub use recurrence::{count_prior_occurrences, should_bias_toward_code};
pub use run::Supervisor;
pub use scaling::{decide_scaling, ScalingAction};
