use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Tunables for the §4.8 check loop. Field defaults match the literal
/// numbers (5 min stuck-after-upload, 10/20 min for the
/// never-uploaded case, 60 s cadence, 3 fix attempts, 10 min fix cooldown,
/// 2 min verification window, 5/10 min scaling cooldowns, fleet bounds
/// 1/4/8, 15 min oracle cache TTL).
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    pub check_interval: Duration,
    pub stuck_after_upload: Duration,
    pub stuck_initializing_process_age: Duration,
    pub stuck_initializing_no_signal: Duration,
    pub disk_scale_down_threshold: f64,
    pub disk_scale_up_threshold: f64,
    pub scale_down_cooldown: Duration,
    pub scale_up_cooldown: Duration,
    pub min_workers: u32,
    pub target_workers: u32,
    pub max_workers: u32,
    pub fix_cooldown: Duration,
    pub max_fix_attempts: u32,
    pub verification_window: Duration,
    pub llm_enabled: bool,
    pub dry_run: bool,
    pub oracle_cache_ttl: Duration,
    pub recurrence_keyword_overlap: usize,
    pub recurrence_min_occurrences: u32,
    pub recurrence_confidence_floor: f64,
    pub progress_dir: PathBuf,
    pub fix_history_path: PathBuf,
    pub log_lines_collected: usize,
    /// §9: the automated code-patch path is off by default; a deployment
    /// opts in explicitly (`--allow-code-patch` in `bookmover-cli`).
    pub allow_code_patch: bool,
    /// Which source file a worker's code patches may target, if any. Empty
    /// by default — even with `allow_code_patch` set, a worker with no
    /// entry here never receives a code fix.
    pub code_patch_targets: HashMap<u32, PathBuf>,
}

impl SupervisorConfig {
    pub fn new(progress_dir: impl Into<PathBuf>, fix_history_path: impl Into<PathBuf>) -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            stuck_after_upload: Duration::from_secs(5 * 60),
            stuck_initializing_process_age: Duration::from_secs(10 * 60),
            stuck_initializing_no_signal: Duration::from_secs(20 * 60),
            disk_scale_down_threshold: 90.0,
            disk_scale_up_threshold: 50.0,
            scale_down_cooldown: Duration::from_secs(5 * 60),
            scale_up_cooldown: Duration::from_secs(10 * 60),
            min_workers: 1,
            target_workers: 4,
            max_workers: 8,
            fix_cooldown: Duration::from_secs(10 * 60),
            max_fix_attempts: 3,
            verification_window: Duration::from_secs(2 * 60),
            llm_enabled: true,
            dry_run: false,
            oracle_cache_ttl: Duration::from_secs(15 * 60),
            recurrence_keyword_overlap: 3,
            recurrence_min_occurrences: 2,
            recurrence_confidence_floor: 0.7,
            progress_dir: progress_dir.into(),
            fix_history_path: fix_history_path.into(),
            log_lines_collected: 500,
            allow_code_patch: false,
            code_patch_targets: HashMap::new(),
        }
    }
}
