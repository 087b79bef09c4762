use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Progress signal seam for the upload watchdog (§4.5), so a
/// platform-specific implementation (cgroup I/O counters, `/proc` CPU
/// ticks) can be substituted without touching the retry/classify logic.
/// `snapshot` returns any monotonically-nondecreasing counter; the
/// watchdog only cares whether it changed between samples.
pub trait ProgressSignal: Send + Sync {
    fn snapshot(&self) -> u64;
}

/// Default signal for targets with no platform-specific counters
/// available: always reports no progress, which degrades the watchdog to
/// the hard ceiling `H` alone, as §4.5 specifies as the fallback.
pub struct NoProgressSignal;

impl ProgressSignal for NoProgressSignal {
    fn snapshot(&self) -> u64 {
        0
    }
}

/// Counts bytes actually streamed over the wire for a `ByValue` upload, fed
/// by the counter the request body increments chunk-by-chunk as it reads
/// the file. Gives the watchdog a real signal instead of always degrading
/// to the hard ceiling.
pub struct ByteProgressSignal(Arc<AtomicU64>);

impl ByteProgressSignal {
    /// Returns the signal plus the counter its body stream should update.
    pub fn new() -> (Self, Arc<AtomicU64>) {
        let counter = Arc::new(AtomicU64::new(0));
        (Self(counter.clone()), counter)
    }
}

impl ProgressSignal for ByteProgressSignal {
    fn snapshot(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct WatchdogConfig {
    /// `P`: how often to sample progress signals.
    pub sample_interval: Duration,
    /// `S`: how long without any signal advancing before declaring stuck.
    pub stuck_after: Duration,
    /// `H`: hard ceiling regardless of signals.
    pub hard_ceiling: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(60),
            stuck_after: Duration::from_secs(240),
            hard_ceiling: Duration::from_secs(600),
        }
    }
}

#[derive(Debug)]
pub enum WatchdogOutcome<T> {
    Completed(T),
    Stuck,
    HardCeilingExceeded,
}

/// Races `fut` against periodic progress sampling (§4.5). If no signal
/// advances for `stuck_after`, the future is dropped (cancelling it) and
/// `Stuck` is reported; `hard_ceiling` caps the whole attempt regardless of
/// signal activity, matching the "if platform-specific signals are
/// unavailable, fall back to H" clause.
pub async fn run_with_watchdog<Fut, T>(
    fut: Fut,
    signal: &dyn ProgressSignal,
    config: WatchdogConfig,
) -> WatchdogOutcome<T>
where
    Fut: std::future::Future<Output = T>,
{
    let body = async {
        tokio::pin!(fut);
        let mut last_seen = signal.snapshot();
        let mut last_change = tokio::time::Instant::now();
        loop {
            tokio::select! {
                biased;
                result = &mut fut => return WatchdogOutcome::Completed(result),
                _ = tokio::time::sleep(config.sample_interval) => {
                    let current = signal.snapshot();
                    if current != last_seen {
                        last_seen = current;
                        last_change = tokio::time::Instant::now();
                    } else if last_change.elapsed() >= config.stuck_after {
                        return WatchdogOutcome::Stuck;
                    }
                }
            }
        }
    };

    match tokio::time::timeout(config.hard_ceiling, body).await {
        Ok(outcome) => outcome,
        Err(_) => WatchdogOutcome::HardCeilingExceeded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn completes_normally_when_future_finishes_fast() {
        let outcome = run_with_watchdog(async { 42 }, &NoProgressSignal, WatchdogConfig::default()).await;
        assert!(matches!(outcome, WatchdogOutcome::Completed(42)));
    }

    #[tokio::test(start_paused = true)]
    async fn hard_ceiling_fires_when_future_never_completes() {
        let config = WatchdogConfig {
            sample_interval: Duration::from_secs(1),
            stuck_after: Duration::from_secs(1000),
            hard_ceiling: Duration::from_secs(5),
        };
        let outcome = run_with_watchdog(std::future::pending::<()>(), &NoProgressSignal, config).await;
        assert!(matches!(outcome, WatchdogOutcome::HardCeilingExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_fires_before_hard_ceiling_when_signal_never_advances() {
        let config = WatchdogConfig {
            sample_interval: Duration::from_secs(1),
            stuck_after: Duration::from_secs(3),
            hard_ceiling: Duration::from_secs(1000),
        };
        let outcome = run_with_watchdog(std::future::pending::<()>(), &NoProgressSignal, config).await;
        assert!(matches!(outcome, WatchdogOutcome::Stuck));
    }

    #[test]
    fn byte_progress_signal_reflects_counter_updates() {
        let (signal, counter) = ByteProgressSignal::new();
        assert_eq!(signal.snapshot(), 0);
        counter.fetch_add(4096, Ordering::Relaxed);
        assert_eq!(signal.snapshot(), 4096);
    }
}
