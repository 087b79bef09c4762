use std::collections::HashMap;
use std::time::Instant;

/// Utilization sampler for the storage backing the source library (§4.8
/// step C). Abstracted behind a trait — like `ProgressSignal` in the
/// uploader — because "%util" has no portable cross-platform source; the
/// default implementation reads Linux's `/proc/diskstats`, a well-known
/// pseudo-file parsed the same way distro detection reads
/// `/etc/os-release`.
pub trait DiskIoSampler: Send + Sync {
    /// Percent of wall-clock time the device spent with at least one I/O in
    /// flight since the previous sample, in `[0, 100]`. The first call for a
    /// given device has no prior sample to diff against and returns `0.0`.
    fn sample_util_percent(&mut self, device: &str) -> f64;
}

#[derive(Clone, Copy)]
struct Sample {
    io_ticks_ms: u64,
    at: Instant,
}

/// Computes %util the way `iostat` does: the fraction of wall-clock time
/// between two samples during which the device had at least one I/O
/// outstanding, read from field 13 of `/proc/diskstats` (milliseconds spent
/// doing I/O, monotonically increasing).
pub struct ProcDiskstatsSampler {
    last: HashMap<String, Sample>,
}

impl Default for ProcDiskstatsSampler {
    fn default() -> Self {
        Self { last: HashMap::new() }
    }
}

impl ProcDiskstatsSampler {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_io_ticks_ms(device: &str) -> Option<u64> {
        let contents = std::fs::read_to_string("/proc/diskstats").ok()?;
        for line in contents.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 13 {
                continue;
            }
            if fields[2] == device {
                return fields[12].parse().ok();
            }
        }
        None
    }
}

impl DiskIoSampler for ProcDiskstatsSampler {
    fn sample_util_percent(&mut self, device: &str) -> f64 {
        let Some(io_ticks_ms) = Self::read_io_ticks_ms(device) else {
            return 0.0;
        };
        let now = Instant::now();
        let util = match self.last.get(device) {
            Some(prev) => {
                let elapsed_ms = now.duration_since(prev.at).as_millis().max(1) as u64;
                let delta_ticks = io_ticks_ms.saturating_sub(prev.io_ticks_ms);
                (delta_ticks as f64 / elapsed_ms as f64 * 100.0).min(100.0)
            }
            None => 0.0,
        };
        self.last.insert(device.to_string(), Sample { io_ticks_ms, at: now });
        util
    }
}

/// Fixed-value sampler for tests and deployments without `/proc/diskstats`
/// (non-Linux, containerized overlay filesystems).
pub struct FixedUtilSampler(pub f64);

impl DiskIoSampler for FixedUtilSampler {
    fn sample_util_percent(&mut self, _device: &str) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_device_yields_zero() {
        let mut sampler = ProcDiskstatsSampler::new();
        assert_eq!(sampler.sample_util_percent("definitely-not-a-real-device-xyz"), 0.0);
    }

    #[test]
    fn fixed_sampler_returns_configured_value() {
        let mut sampler = FixedUtilSampler(94.0);
        assert_eq!(sampler.sample_util_percent("sda"), 94.0);
    }
}
