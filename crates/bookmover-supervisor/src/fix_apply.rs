use std::collections::HashMap;

use bookmover_model::{FixAttempt, FixOutcome, FixType};
use chrono::{DateTime, Utc};

use crate::config::SupervisorConfig;

/// §4.8 step D.4: a fix that was just applied, waiting out the
/// verification window before its outcome can be recorded. Lives only in
/// the supervisor's own process memory — bridging a ~2 minute window across
/// 60 s check cycles does not need to survive a supervisor restart, unlike
/// the fix-history file itself.
#[derive(Clone, Debug)]
pub struct PendingVerification {
    pub worker_id: u32,
    pub root_cause: String,
    pub fix_type: FixType,
    pub params: String,
    pub attempt_index: u32,
    pub applied_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct FixCoordinator {
    pending: HashMap<u32, PendingVerification>,
}

impl FixCoordinator {
    pub fn new() -> Self {
        Self { pending: HashMap::new() }
    }

    pub fn record_pending(&mut self, pending: PendingVerification) {
        self.pending.insert(pending.worker_id, pending);
    }

    pub fn has_pending(&self, worker_id: u32) -> bool {
        self.pending.contains_key(&worker_id)
    }

    /// Workers whose verification window has elapsed as of `now`.
    pub fn due_for_verification(&self, config: &SupervisorConfig, now: DateTime<Utc>) -> Vec<u32> {
        self.pending
            .values()
            .filter(|p| now.signed_duration_since(p.applied_at) >= chrono::Duration::from_std(config.verification_window).unwrap())
            .map(|p| p.worker_id)
            .collect()
    }

    /// Removes and returns a due pending verification, turning it into a
    /// `FixAttempt` to append to the fix-history file. `still_stuck` is the
    /// result of re-running step A's stuck test against the worker's
    /// current state.
    pub fn resolve(&mut self, worker_id: u32, still_stuck: bool, now: DateTime<Utc>) -> Option<FixAttempt> {
        let pending = self.pending.remove(&worker_id)?;
        Some(FixAttempt {
            worker_id,
            ts: now,
            root_cause: pending.root_cause,
            fix_type: pending.fix_type,
            params: pending.params,
            outcome: if still_stuck { FixOutcome::NotRecovered } else { FixOutcome::VerifiedOk },
            attempt_index: pending.attempt_index,
        })
    }
}

/// Attempts since the most recent `verified_ok` for this worker (§4.8:
/// "mark verified_ok and reset its attempt counter"). Derived from history
/// on each read rather than tracked as separate mutable state, so a
/// supervisor restart doesn't lose the count.
pub fn attempts_since_last_verified(history: &[FixAttempt]) -> u32 {
    let mut sorted: Vec<&FixAttempt> = history.iter().collect();
    sorted.sort_by_key(|a| a.ts);
    sorted
        .iter()
        .rev()
        .take_while(|a| a.outcome != FixOutcome::VerifiedOk)
        .count() as u32
}

/// §4.8 step D: "for each stuck worker not in cooldown (default 10 min
/// since its last fix)".
pub fn is_in_fix_cooldown(history: &[FixAttempt], config: &SupervisorConfig, now: DateTime<Utc>) -> bool {
    history
        .iter()
        .map(|a| a.ts)
        .max()
        .is_some_and(|last| now.signed_duration_since(last) < chrono::Duration::from_std(config.fix_cooldown).unwrap())
}

/// §4.8 step D.5: "after 3 failed attempts: escalate".
pub fn should_escalate(history: &[FixAttempt], config: &SupervisorConfig) -> bool {
    attempts_since_last_verified(history) >= config.max_fix_attempts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SupervisorConfig {
        SupervisorConfig::new("/tmp/p", "/tmp/f")
    }

    fn attempt(ts: DateTime<Utc>, outcome: FixOutcome) -> FixAttempt {
        FixAttempt {
            worker_id: 1,
            ts,
            root_cause: "timeout".to_string(),
            fix_type: FixType::Restart,
            params: String::new(),
            outcome,
            attempt_index: 1,
        }
    }

    #[test]
    fn counts_reset_after_verified_ok() {
        let t0 = Utc::now();
        let history = vec![
            attempt(t0, FixOutcome::NotRecovered),
            attempt(t0 + chrono::Duration::minutes(10), FixOutcome::VerifiedOk),
            attempt(t0 + chrono::Duration::minutes(30), FixOutcome::NotRecovered),
        ];
        assert_eq!(attempts_since_last_verified(&history), 1);
    }

    #[test]
    fn three_failed_attempts_escalates() {
        let t0 = Utc::now();
        let history = vec![
            attempt(t0, FixOutcome::NotRecovered),
            attempt(t0 + chrono::Duration::minutes(11), FixOutcome::NotRecovered),
            attempt(t0 + chrono::Duration::minutes(22), FixOutcome::NotRecovered),
        ];
        assert!(should_escalate(&history, &config()));
    }

    #[test]
    fn two_failed_attempts_does_not_escalate() {
        let t0 = Utc::now();
        let history = vec![attempt(t0, FixOutcome::NotRecovered), attempt(t0 + chrono::Duration::minutes(11), FixOutcome::NotRecovered)];
        assert!(!should_escalate(&history, &config()));
    }

    #[test]
    fn recent_fix_is_in_cooldown() {
        let now = Utc::now();
        let history = vec![attempt(now - chrono::Duration::minutes(3), FixOutcome::NotRecovered)];
        assert!(is_in_fix_cooldown(&history, &config(), now));
    }

    #[test]
    fn fix_verification_round_trip() {
        let mut coordinator = FixCoordinator::new();
        let t0 = Utc::now();
        coordinator.record_pending(PendingVerification {
            worker_id: 5,
            root_cause: "connection reset".to_string(),
            fix_type: FixType::Restart,
            params: String::new(),
            attempt_index: 1,
            applied_at: t0,
        });
        assert!(coordinator.due_for_verification(&config(), t0 + chrono::Duration::seconds(30)).is_empty());
        let due = coordinator.due_for_verification(&config(), t0 + chrono::Duration::minutes(3));
        assert_eq!(due, vec![5]);

        let attempt = coordinator.resolve(5, false, t0 + chrono::Duration::minutes(3)).unwrap();
        assert_eq!(attempt.outcome, FixOutcome::VerifiedOk);
        assert!(!coordinator.has_pending(5));
    }
}
