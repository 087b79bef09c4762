use std::collections::HashMap;
use std::time::Duration;

use bookmover_oracle::Recommendation;
use chrono::{DateTime, Utc};

/// §4.8 "LLM-request minimization": caches oracle results keyed by
/// `(worker_id, error-signature-hash)` for a configurable TTL so repeated
/// checks against the same still-stuck worker don't re-ask the oracle every
/// cycle.
#[derive(Default)]
pub struct OracleCache {
    entries: HashMap<(u32, u64), (Recommendation, DateTime<Utc>)>,
}

impl OracleCache {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn get(&self, worker_id: u32, error_signature: u64, ttl: Duration, now: DateTime<Utc>) -> Option<&Recommendation> {
        let (recommendation, cached_at) = self.entries.get(&(worker_id, error_signature))?;
        if now.signed_duration_since(*cached_at) < chrono::Duration::from_std(ttl).unwrap_or_default() {
            Some(recommendation)
        } else {
            None
        }
    }

    pub fn insert(&mut self, worker_id: u32, error_signature: u64, recommendation: Recommendation, now: DateTime<Utc>) {
        self.entries.insert((worker_id, error_signature), (recommendation, now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmover_model::FixType;

    fn recommendation() -> Recommendation {
        Recommendation {
            root_cause: "x".to_string(),
            fix_type: FixType::Restart,
            confidence: 0.9,
            description: "y".to_string(),
            patch: None,
            params: None,
        }
    }

    #[test]
    fn fresh_entry_is_returned_within_ttl() {
        let mut cache = OracleCache::new();
        let now = Utc::now();
        cache.insert(1, 42, recommendation(), now);
        let hit = cache.get(1, 42, Duration::from_secs(900), now + chrono::Duration::minutes(10));
        assert!(hit.is_some());
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let mut cache = OracleCache::new();
        let now = Utc::now();
        cache.insert(1, 42, recommendation(), now);
        let hit = cache.get(1, 42, Duration::from_secs(900), now + chrono::Duration::minutes(16));
        assert!(hit.is_none());
    }

    #[test]
    fn different_error_signature_is_a_miss() {
        let mut cache = OracleCache::new();
        let now = Utc::now();
        cache.insert(1, 42, recommendation(), now);
        assert!(cache.get(1, 99, Duration::from_secs(900), now).is_none());
    }
}
