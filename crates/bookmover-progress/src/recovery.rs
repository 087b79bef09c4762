use bookmover_model::WorkerProgress;

/// Recovers the last complete `WorkerProgress` value from a possibly
/// truncated write (§4.4: "on partial/corrupt tail, recover the last
/// complete structure"). Scans backwards for a closing brace and attempts
/// to parse the prefix up to and including it, trying successive earlier
/// braces until one parses or none remain.
pub fn recover_last_complete(bytes: &[u8]) -> Option<WorkerProgress> {
    let mut search_end = bytes.len();
    while let Some(offset) = rfind_byte(&bytes[..search_end], b'}') {
        let candidate = &bytes[..=offset];
        if let Ok(progress) = serde_json::from_slice::<WorkerProgress>(candidate) {
            return Some(progress);
        }
        search_end = offset;
        if search_end == 0 {
            break;
        }
    }
    None
}

fn rfind_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().rposition(|&b| b == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmover_model::WorkerStatus;

    fn sample() -> WorkerProgress {
        let mut progress = WorkerProgress::new(3);
        progress.advance_to(40);
        progress.status = WorkerStatus::Processing;
        progress
    }

    #[test]
    fn recovers_progress_from_well_formed_bytes() {
        let progress = sample();
        let bytes = serde_json::to_vec(&progress).unwrap();
        let recovered = recover_last_complete(&bytes).unwrap();
        assert_eq!(recovered.shard_id, 3);
        assert_eq!(recovered.last_processed_shard_key, 40);
    }

    #[test]
    fn recovers_progress_from_truncated_tail() {
        let progress = sample();
        let mut bytes = serde_json::to_vec(&progress).unwrap();
        bytes.extend_from_slice(b"garbage-partial-write-tail");
        let recovered = recover_last_complete(&bytes).unwrap();
        assert_eq!(recovered.shard_id, 3);
    }

    #[test]
    fn returns_none_when_nothing_parses() {
        assert!(recover_last_complete(b"not json at all").is_none());
    }

    #[test]
    fn returns_none_on_empty_input() {
        assert!(recover_last_complete(b"").is_none());
    }
}
