use chrono::{DateTime, Utc};

/// When the remote mirror is due for a refresh (§4.3): either a processed-
/// file count threshold or a wall-clock interval, whichever fires first.
#[derive(Clone, Copy, Debug)]
pub struct RefreshTrigger {
    pub count_threshold: u64,
    pub interval: chrono::Duration,
}

impl Default for RefreshTrigger {
    fn default() -> Self {
        Self {
            count_threshold: 1500,
            interval: chrono::Duration::minutes(15),
        }
    }
}

impl RefreshTrigger {
    pub fn new(count_threshold: u64, interval: chrono::Duration) -> Self {
        Self {
            count_threshold,
            interval,
        }
    }

    pub fn should_refresh(
        &self,
        processed_since_refresh: u64,
        last_refresh: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        processed_since_refresh >= self.count_threshold || now - last_refresh >= self.interval
    }
}
