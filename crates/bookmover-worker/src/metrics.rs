use std::time::Duration;

use chrono::{DateTime, Utc};

/// Emits an uploads-per-minute rate every `report_every` `NewUploaded`
/// events (§4.6: "every 100 NewUploaded emit an uploads-per-minute rate").
#[derive(Debug)]
pub struct UploadRateTracker {
    report_every: u64,
    since_report: u64,
    window_start: DateTime<Utc>,
}

impl UploadRateTracker {
    pub fn new(report_every: u64, now: DateTime<Utc>) -> Self {
        Self {
            report_every,
            since_report: 0,
            window_start: now,
        }
    }

    /// Call once per `NewUploaded`. Returns `Some(rate_per_minute)` when the
    /// reporting threshold is hit, resetting the window.
    pub fn record_upload(&mut self, now: DateTime<Utc>) -> Option<f64> {
        self.since_report += 1;
        if self.since_report < self.report_every {
            return None;
        }
        let elapsed_minutes = (now - self.window_start).num_milliseconds() as f64 / 60_000.0;
        let rate = if elapsed_minutes > 0.0 {
            self.since_report as f64 / elapsed_minutes
        } else {
            f64::INFINITY
        };
        self.since_report = 0;
        self.window_start = now;
        Some(rate)
    }
}

/// Flags an individual upload exceeding the slow threshold (default 120 s).
pub fn is_slow_upload(elapsed: Duration, threshold: Duration) -> bool {
    elapsed > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_rate_only_once_threshold_is_hit() {
        let start = Utc::now();
        let mut tracker = UploadRateTracker::new(3, start);
        assert!(tracker.record_upload(start).is_none());
        assert!(tracker.record_upload(start).is_none());
        let later = start + chrono::Duration::seconds(60);
        assert!(tracker.record_upload(later).is_some());
    }

    #[test]
    fn slow_upload_flag_compares_against_threshold() {
        let threshold = Duration::from_secs(120);
        assert!(!is_slow_upload(Duration::from_secs(60), threshold));
        assert!(is_slow_upload(Duration::from_secs(121), threshold));
    }
}
