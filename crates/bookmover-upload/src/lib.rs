//! Upload execution (C5, §4.5): pre-check against the target service, retry
//! with exponential backoff, a progress watchdog guarding against stalled
//! transfers, and outcome classification feeding the worker's dedup cache
//! and progress store.

mod classify;
mod retry;
mod transport;
mod upload;
mod watchdog;

pub use classify::classify;
pub use retry::retry_delay;
pub use transport::UploadTransport;
pub use upload::{upload, UploadConfig};
pub use watchdog::{run_with_watchdog, ByteProgressSignal, NoProgressSignal, ProgressSignal, WatchdogConfig, WatchdogOutcome};
