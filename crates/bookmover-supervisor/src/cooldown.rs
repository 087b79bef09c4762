use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Tracks "last time an action of kind K happened" so scaling and fix
/// application can enforce their respective cooldowns (§4.8 steps C, D)
/// without duplicating the same HashMap-of-timestamps logic three times.
#[derive(Default)]
pub struct CooldownTracker<K: std::hash::Hash + Eq + Clone> {
    last_action: HashMap<K, DateTime<Utc>>,
}

impl<K: std::hash::Hash + Eq + Clone> CooldownTracker<K> {
    pub fn new() -> Self {
        Self { last_action: HashMap::new() }
    }

    pub fn is_in_cooldown(&self, key: &K, cooldown: Duration, now: DateTime<Utc>) -> bool {
        match self.last_action.get(key) {
            Some(last) => now.signed_duration_since(*last) < chrono::Duration::from_std(cooldown).unwrap_or_default(),
            None => false,
        }
    }

    pub fn record(&mut self, key: K, now: DateTime<Utc>) {
        self.last_action.insert(key, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_key_is_never_in_cooldown() {
        let tracker: CooldownTracker<u32> = CooldownTracker::new();
        assert!(!tracker.is_in_cooldown(&1, Duration::from_secs(300), Utc::now()));
    }

    #[test]
    fn recorded_action_stays_in_cooldown_until_elapsed() {
        let mut tracker = CooldownTracker::new();
        let t0 = Utc::now();
        tracker.record(1u32, t0);
        assert!(tracker.is_in_cooldown(&1, Duration::from_secs(300), t0 + chrono::Duration::seconds(60)));
        assert!(!tracker.is_in_cooldown(&1, Duration::from_secs(300), t0 + chrono::Duration::seconds(301)));
    }
}
