/// Tracks consecutive batches with zero `NewUploaded` (§4.6). After
/// `threshold` such batches in a row, the caller should jump
/// `last_processed_shard_key` forward by `stride` to break away from a
/// fully-migrated range; `AlreadyPresent` does not reset the counter, only
/// an actual new upload does.
#[derive(Clone, Copy, Debug)]
pub struct SkipAheadTracker {
    threshold: u32,
    stride: i64,
    consecutive_zero_new: u32,
}

impl Default for SkipAheadTracker {
    fn default() -> Self {
        Self::new(5, 10_000)
    }
}

impl SkipAheadTracker {
    pub fn new(threshold: u32, stride: i64) -> Self {
        Self {
            threshold,
            stride,
            consecutive_zero_new: 0,
        }
    }

    pub fn stride(&self) -> i64 {
        self.stride
    }

    /// Records one batch's result. Returns `true` when the threshold is hit
    /// this call, resetting the counter so the next window starts fresh.
    pub fn record_batch(&mut self, any_new_uploaded: bool) -> bool {
        if any_new_uploaded {
            self.consecutive_zero_new = 0;
            return false;
        }
        self.consecutive_zero_new += 1;
        if self.consecutive_zero_new >= self.threshold {
            self.consecutive_zero_new = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_threshold_consecutive_zero_new_batches() {
        let mut tracker = SkipAheadTracker::new(3, 500);
        assert!(!tracker.record_batch(false));
        assert!(!tracker.record_batch(false));
        assert!(tracker.record_batch(false));
    }

    #[test]
    fn any_new_upload_resets_the_counter() {
        let mut tracker = SkipAheadTracker::new(3, 500);
        tracker.record_batch(false);
        tracker.record_batch(false);
        assert!(!tracker.record_batch(true));
        assert!(!tracker.record_batch(false));
        assert!(!tracker.record_batch(false));
    }

    #[test]
    fn already_present_only_does_not_reset_the_counter() {
        let mut tracker = SkipAheadTracker::new(2, 500);
        assert!(!tracker.record_batch(false));
        assert!(tracker.record_batch(false));
    }
}
