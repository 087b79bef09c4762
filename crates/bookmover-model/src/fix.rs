use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of corrective action the supervisor applied (§4.8 step D, §9's
/// structured patch interface). `Code` carries a serialized patch; the
/// patch's own shape lives in `bookmover-supervisor` since it is an
/// implementation concern of the fix-application step, not the shared
/// record of that a fix happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixType {
    Restart,
    Config,
    Code,
}

/// Verification result of a fix, checked after the §4.8 step D window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixOutcome {
    VerifiedOk,
    NotRecovered,
}

/// A single durable supervisor intervention (§3). Appended to the
/// fix-history file; never mutated in place once written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixAttempt {
    pub worker_id: u32,
    pub ts: DateTime<Utc>,
    pub root_cause: String,
    pub fix_type: FixType,
    pub params: String,
    pub outcome: FixOutcome,
    pub attempt_index: u32,
}

impl FixAttempt {
    /// Lowercased keyword set of `root_cause`, used by recurrence detection
    /// (§4.8) to compare this attempt's cause against past ones without
    /// requiring exact string equality.
    pub fn root_cause_keywords(&self) -> std::collections::HashSet<String> {
        self.root_cause
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_ascii_lowercase())
            .filter(|w| !w.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn attempt(root_cause: &str) -> FixAttempt {
        FixAttempt {
            worker_id: 3,
            ts: ts(),
            root_cause: root_cause.to_string(),
            fix_type: FixType::Restart,
            params: String::new(),
            outcome: FixOutcome::NotRecovered,
            attempt_index: 1,
        }
    }

    #[test]
    fn keyword_set_is_lowercase_and_punctuation_stripped() {
        let a = attempt("Connection Reset, Database timeout!");
        let keywords = a.root_cause_keywords();
        assert!(keywords.contains("connection"));
        assert!(keywords.contains("reset"));
        assert!(keywords.contains("database"));
        assert!(keywords.contains("timeout"));
    }

    #[test]
    fn overlapping_causes_share_keywords() {
        let a = attempt("database query timeout on shard range");
        let b = attempt("repeated database timeout same shard range");
        let overlap = a
            .root_cause_keywords()
            .intersection(&b.root_cause_keywords())
            .count();
        assert!(overlap >= 3, "expected overlap >= 3, got {overlap}");
    }
}
