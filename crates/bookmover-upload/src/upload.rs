use std::path::Path;
use std::time::Duration;

use bookmover_catalog::{TargetService, UploadPayload};
use bookmover_model::{Fingerprint, UploadOutcome};

use crate::classify::classify;
use crate::retry::retry_delay;
use crate::transport::UploadTransport;
use crate::watchdog::{run_with_watchdog, ByteProgressSignal, ProgressSignal, WatchdogConfig, WatchdogOutcome};

#[derive(Clone, Copy, Debug)]
pub struct UploadConfig {
    /// C5 retries up to this many times before giving up (§4.5).
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub watchdog: WatchdogConfig,
    pub transport: UploadTransport,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            watchdog: WatchdogConfig::default(),
            transport: UploadTransport::ByValue,
        }
    }
}

/// Runs the pre-check / retry / watchdog pipeline for one record (§4.5).
///
/// Short-circuits to `AlreadyPresent` if the target already reports the
/// fingerprint, without spending an upload attempt on it. Otherwise retries
/// `upload` through the target service, classifying each attempt and
/// backing off between attempts, until a terminal outcome or the attempt
/// budget is exhausted.
pub async fn upload(
    target: &dyn TargetService,
    fingerprint: &Fingerprint,
    metadata_json: &[u8],
    file_path: &Path,
    signal: &dyn ProgressSignal,
    config: UploadConfig,
) -> UploadOutcome {
    match target.exists(fingerprint).await {
        Ok(true) => return UploadOutcome::AlreadyPresent,
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "pre-check failed, proceeding to upload attempt"),
    }

    // `ByValue` uploads get a real byte-progress signal fed by the request
    // body itself, so the watchdog's "stuck" branch can fire from observed
    // data instead of always riding to the hard ceiling; `ByReference`
    // transfers no bytes, so the caller-supplied signal (typically
    // `NoProgressSignal`) is used as-is.
    let byte_signal = matches!(config.transport, UploadTransport::ByValue).then(ByteProgressSignal::new);

    let mut last_outcome = UploadOutcome::TransientFailure("not attempted".into());
    for attempt in 0..config.max_attempts {
        let payload = match config.transport {
            UploadTransport::ByValue => UploadPayload::ByValue {
                metadata_json,
                file_path,
                bytes_sent: byte_signal.as_ref().map(|(_, counter)| counter.clone()),
            },
            UploadTransport::ByReference => UploadPayload::ByReference { metadata_json, file_path },
        };

        let active_signal: &dyn ProgressSignal = match &byte_signal {
            Some((byte_signal, _)) => byte_signal,
            None => signal,
        };

        let watchdog_result =
            run_with_watchdog(target.upload(payload), active_signal, config.watchdog).await;

        last_outcome = match watchdog_result {
            WatchdogOutcome::Completed(result) => classify(result),
            WatchdogOutcome::Stuck => {
                UploadOutcome::TransientFailure("upload made no progress".into())
            }
            WatchdogOutcome::HardCeilingExceeded => {
                UploadOutcome::TransientFailure("upload exceeded hard ceiling".into())
            }
        };

        if !last_outcome.is_retryable() {
            return last_outcome;
        }

        if attempt + 1 < config.max_attempts {
            let delay = retry_delay(attempt, config.backoff_base);
            tracing::warn!(attempt, ?delay, "upload attempt failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }

    last_outcome
}
