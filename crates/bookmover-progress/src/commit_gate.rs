use chrono::{DateTime, Utc};

/// Commit cadence (§4.4): after each batch, after each archive completion,
/// and at most every 30 seconds regardless.
#[derive(Clone, Copy, Debug)]
pub struct CommitGate {
    pub max_interval: chrono::Duration,
}

impl Default for CommitGate {
    fn default() -> Self {
        Self {
            max_interval: chrono::Duration::seconds(30),
        }
    }
}

impl CommitGate {
    pub fn should_commit(
        &self,
        batch_completed: bool,
        archive_completed: bool,
        last_commit: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        batch_completed || archive_completed || now - last_commit >= self.max_interval
    }
}
