use serde::Serialize;

/// Everything the supervisor collected about a stuck worker before asking
/// the oracle for a recommendation (§4.8 step D.1). `recent_log_lines` is
/// capped by the caller (§4.8: "last 500 log lines") — this type does not
/// enforce the cap itself.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostics {
    pub worker_id: u32,
    pub recent_log_lines: Vec<String>,
    pub error_patterns: Vec<String>,
    pub shard_key_range: (i64, i64),
    pub disk_util_percent: f64,
    pub recurrence: Option<RecurrenceInfo>,
}

/// Prior-occurrence context for the recurring-root-cause bias (§4.8).
#[derive(Clone, Debug, Serialize)]
pub struct RecurrenceInfo {
    pub prior_occurrences: u32,
    pub matched_keywords: Vec<String>,
}

impl Diagnostics {
    /// Stable hash of the parts of this diagnostic that identify "the same
    /// error happening again", used as half of the oracle result cache key
    /// (§4.8: "cache oracle results keyed by (worker_id, error-signature-hash)").
    pub fn error_signature(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        self.error_patterns.hash(&mut hasher);
        hasher.finish()
    }
}
