use std::time::Duration;

/// Exponential backoff delay before a retry. With `base = 2s` this
/// produces a 2/4/8 second schedule for retry counts 0, 1, 2.
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}
