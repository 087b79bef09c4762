use bookmover_model::FixAttempt;

use crate::config::SupervisorConfig;

/// §4.8 "recurring root cause detection": counts prior `FixAttempt`s for the
/// same worker whose root-cause keyword set overlaps this one's by at least
/// `config.recurrence_keyword_overlap` words.
pub fn count_prior_occurrences(history: &[FixAttempt], root_cause: &str, config: &SupervisorConfig) -> u32 {
    let candidate_keywords = FixAttempt {
        worker_id: 0,
        ts: chrono::Utc::now(),
        root_cause: root_cause.to_string(),
        fix_type: bookmover_model::FixType::Restart,
        params: String::new(),
        outcome: bookmover_model::FixOutcome::NotRecovered,
        attempt_index: 0,
    }
    .root_cause_keywords();

    history
        .iter()
        .filter(|attempt| {
            attempt
                .root_cause_keywords()
                .intersection(&candidate_keywords)
                .count()
                >= config.recurrence_keyword_overlap
        })
        .count() as u32
}

/// Whether recurrence should bias the next recommendation toward a `code`
/// fix (§4.8): at least `recurrence_min_occurrences` prior matches, and the
/// biased recommendation must clear `recurrence_confidence_floor`.
pub fn should_bias_toward_code(prior_occurrences: u32, confidence: f64, config: &SupervisorConfig) -> bool {
    prior_occurrences >= config.recurrence_min_occurrences && confidence >= config.recurrence_confidence_floor
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmover_model::{FixOutcome, FixType};

    fn config() -> SupervisorConfig {
        SupervisorConfig::new("/tmp/p", "/tmp/f")
    }

    fn attempt(root_cause: &str) -> FixAttempt {
        FixAttempt {
            worker_id: 1,
            ts: chrono::Utc::now(),
            root_cause: root_cause.to_string(),
            fix_type: FixType::Restart,
            params: String::new(),
            outcome: FixOutcome::NotRecovered,
            attempt_index: 1,
        }
    }

    #[test]
    fn counts_overlapping_root_causes() {
        let history = vec![
            attempt("database query timeout on shard range"),
            attempt("repeated database timeout same shard range"),
            attempt("disk full"),
        ];
        let count = count_prior_occurrences(&history, "database timeout shard range again", &config());
        assert_eq!(count, 2);
    }

    #[test]
    fn bias_requires_both_occurrence_count_and_confidence() {
        let config = config();
        assert!(should_bias_toward_code(2, 0.8, &config));
        assert!(!should_bias_toward_code(1, 0.9, &config));
        assert!(!should_bias_toward_code(3, 0.5, &config));
    }
}
