use bookmover_model::WorkerProgress;
use chrono::{DateTime, Utc};
use sysinfo::{Pid, System};

use crate::config::SupervisorConfig;

/// Reads back a live process's start time, used for the "has not uploaded
/// yet" stuck case (§4.8 step A), which measures age since process start
/// rather than since last activity.
pub fn process_start_time(pid: u32) -> Option<DateTime<Utc>> {
    let mut system = System::new();
    let pid = Pid::from_u32(pid);
    if !system.refresh_process(pid) {
        return None;
    }
    let process = system.process(pid)?;
    DateTime::from_timestamp(process.start_time() as i64, 0)
}

/// §4.8 step A's three-way stuck test. `has_recent_progress_signal` covers
/// the log-line reset condition ("Processed batch", "Found N new files",
/// db query lines, archive-extraction lines) for the not-yet-uploaded case.
pub fn is_stuck(
    progress: &WorkerProgress,
    process_started_at: Option<DateTime<Utc>>,
    has_recent_progress_signal: bool,
    now: DateTime<Utc>,
    config: &SupervisorConfig,
) -> bool {
    if let Some(last_uploaded) = progress.last_uploaded_at {
        return now.signed_duration_since(last_uploaded) > chrono::Duration::from_std(config.stuck_after_upload).unwrap();
    }

    if matches!(
        progress.status,
        bookmover_model::WorkerStatus::Initializing | bookmover_model::WorkerStatus::Discovering
    ) {
        let process_age = process_started_at
            .map(|start| now.signed_duration_since(start))
            .unwrap_or_default();
        let aged_out = process_age > chrono::Duration::from_std(config.stuck_initializing_process_age).unwrap();
        let no_signal_window = chrono::Duration::from_std(config.stuck_initializing_no_signal).unwrap();
        let no_signal_for_long_enough = !has_recent_progress_signal && process_age > no_signal_window;
        return aged_out && no_signal_for_long_enough;
    }

    match progress.last_activity_at {
        Some(last_activity) => {
            now.signed_duration_since(last_activity) > chrono::Duration::from_std(config.stuck_after_upload).unwrap()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmover_model::{FileStatus, WorkerStatus};
    use std::path::PathBuf;

    fn base_progress() -> WorkerProgress {
        WorkerProgress::new(0)
    }

    #[test]
    fn never_uploaded_discovering_within_grace_is_not_stuck() {
        let progress = base_progress();
        let start = Utc::now() - chrono::Duration::minutes(2);
        let config = SupervisorConfig::new("/tmp/p", "/tmp/f");
        assert!(!is_stuck(&progress, Some(start), true, Utc::now(), &config));
    }

    #[test]
    fn never_uploaded_discovering_aged_out_and_silent_is_stuck() {
        let progress = base_progress();
        let start = Utc::now() - chrono::Duration::minutes(25);
        let config = SupervisorConfig::new("/tmp/p", "/tmp/f");
        assert!(is_stuck(&progress, Some(start), false, Utc::now(), &config));
    }

    #[test]
    fn recent_progress_signal_prevents_stuck_even_if_aged_out() {
        let progress = base_progress();
        let start = Utc::now() - chrono::Duration::minutes(25);
        let config = SupervisorConfig::new("/tmp/p", "/tmp/f");
        assert!(!is_stuck(&progress, Some(start), true, Utc::now(), &config));
    }

    #[test]
    fn has_uploaded_before_uses_five_minute_threshold() {
        let mut progress = base_progress();
        progress.status = WorkerStatus::Processing;
        progress.record_completed(
            bookmover_model::Fingerprint::new("abcd", 4),
            PathBuf::from("/a"),
            FileStatus::Uploaded,
            Utc::now(),
        );
        progress.touch_activity(Utc::now() - chrono::Duration::minutes(6), true);
        let config = SupervisorConfig::new("/tmp/p", "/tmp/f");
        assert!(is_stuck(&progress, None, false, Utc::now(), &config));
    }

    #[test]
    fn has_uploaded_recently_is_not_stuck() {
        let mut progress = base_progress();
        progress.status = WorkerStatus::Processing;
        progress.touch_activity(Utc::now() - chrono::Duration::minutes(1), true);
        let config = SupervisorConfig::new("/tmp/p", "/tmp/f");
        assert!(!is_stuck(&progress, None, false, Utc::now(), &config));
    }
}
