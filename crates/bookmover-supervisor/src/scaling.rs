use chrono::{DateTime, Utc};

use crate::config::SupervisorConfig;
use crate::cooldown::CooldownTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalingAction {
    ScaleDown { shard_id: u32 },
    ScaleUp { shard_id: u32 },
}

/// §4.8 step C, fallback-rule form: "disk ≥ 90% + stuck → scale down",
/// "disk < 50% and below target → scale up", bounded by `[MIN, MAX]` and
/// each direction's own cooldown. Callers needing the oracle-augmented path
/// run this first and let an oracle recommendation override only when this
/// returns `None` and the oracle is enabled — §4.8: "a fallback rule ...
/// applies whenever the oracle is disabled or returns unknown".
pub fn decide_scaling(
    live_shard_ids: &[u32],
    disk_util_percent: f64,
    any_worker_stuck: bool,
    config: &SupervisorConfig,
    cooldowns: &CooldownTracker<&'static str>,
    now: DateTime<Utc>,
) -> Option<ScalingAction> {
    let current_count = live_shard_ids.len() as u32;

    if disk_util_percent >= config.disk_scale_down_threshold
        && any_worker_stuck
        && current_count > config.min_workers
        && !cooldowns.is_in_cooldown(&"scale_down", config.scale_down_cooldown, now)
    {
        let highest = *live_shard_ids.iter().max().expect("current_count > min_workers implies non-empty");
        return Some(ScalingAction::ScaleDown { shard_id: highest });
    }

    if disk_util_percent < config.disk_scale_up_threshold
        && current_count < config.target_workers
        && current_count < config.max_workers
        && !cooldowns.is_in_cooldown(&"scale_up", config.scale_up_cooldown, now)
    {
        let next_free = (0..).find(|candidate| !live_shard_ids.contains(candidate)).unwrap_or(current_count);
        return Some(ScalingAction::ScaleUp { shard_id: next_free });
    }

    None
}
