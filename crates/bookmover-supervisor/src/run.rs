use std::sync::Arc;

use bookmover_model::{FixType, WorkerStatus};
use bookmover_oracle::{Diagnostics, OracleClient, RecurrenceInfo};
use bookmover_progress::ProgressStore;
use chrono::Utc;

use crate::config::SupervisorConfig;
use crate::cooldown::CooldownTracker;
use crate::diskio::DiskIoSampler;
use crate::discovery::known_shard_ids;
use crate::error::Result;
use crate::fix_apply::{attempts_since_last_verified, is_in_fix_cooldown, should_escalate, FixCoordinator, PendingVerification};
use crate::fix_history::FixHistoryStore;
use crate::lifecycle::WorkerLifecycle;
use crate::liveness::{is_stuck, process_start_time};
use crate::log_signals::{extract_error_patterns, has_recent_progress_signal, LogSource};
use crate::oracle_cache::OracleCache;
use crate::recurrence::{count_prior_occurrences, should_bias_toward_code};
use crate::scaling::{decide_scaling, ScalingAction};

/// Everything the 60 s check loop needs. One supervisor owns the entire
/// fleet; workers know nothing about it beyond reading the pause flag and
/// their own progress file.
pub struct Supervisor {
    pub config: SupervisorConfig,
    pub lifecycle: Arc<dyn WorkerLifecycle>,
    pub oracle: Option<Arc<dyn OracleClient>>,
    pub log_source: Arc<dyn LogSource>,
    pub disk_sampler: Box<dyn DiskIoSampler>,
    pub disk_device: String,
    fix_history: FixHistoryStore,
    oracle_cache: OracleCache,
    fix_coordinator: FixCoordinator,
    scale_cooldowns: CooldownTracker<&'static str>,
    restart_cooldowns: CooldownTracker<u32>,
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        lifecycle: Arc<dyn WorkerLifecycle>,
        oracle: Option<Arc<dyn OracleClient>>,
        log_source: Arc<dyn LogSource>,
        disk_sampler: Box<dyn DiskIoSampler>,
        disk_device: impl Into<String>,
    ) -> Self {
        let fix_history = FixHistoryStore::new(config.fix_history_path.clone());
        Self {
            config,
            lifecycle,
            oracle,
            log_source,
            disk_sampler,
            disk_device: disk_device.into(),
            fix_history,
            oracle_cache: OracleCache::new(),
            fix_coordinator: FixCoordinator::new(),
            scale_cooldowns: CooldownTracker::new(),
            restart_cooldowns: CooldownTracker::new(),
        }
    }

    /// Runs the check loop forever at `config.check_interval`.
    pub async fn run(mut self) -> Result<()> {
        loop {
            if let Err(error) = self.check_once().await {
                tracing::error!(%error, "supervisor check cycle failed");
            }
            tokio::time::sleep(self.config.check_interval).await;
        }
    }

    /// One full pass of §4.8 steps A-D plus resolving any fixes whose
    /// verification window has elapsed.
    pub async fn check_once(&mut self) -> Result<()> {
        let now = Utc::now();
        let store = ProgressStore::new(&self.config.progress_dir);

        let shard_ids = known_shard_ids(&self.config.progress_dir);
        let mut live_shard_ids = Vec::new();
        let mut stuck_shard_ids = Vec::new();

        for &shard_id in &shard_ids {
            let progress = store.load(shard_id)?;
            let pid = bookmover_worker::read_pid(&self.config.progress_dir, shard_id);
            let alive = pid.is_some_and(bookmover_worker::process_is_alive);

            if !alive {
                // Step B: a progress file with no live process behind it.
                if progress.status != WorkerStatus::Paused
                    && !self.restart_cooldowns.is_in_cooldown(&shard_id, self.config.fix_cooldown, now)
                {
                    tracing::warn!(shard_id, "worker process not alive, restarting");
                    if !self.config.dry_run {
                        self.lifecycle.restart(shard_id).await?;
                    }
                    self.restart_cooldowns.record(shard_id, now);
                }
                continue;
            }

            live_shard_ids.push(shard_id);

            let lines = self.log_source.recent_lines(shard_id, self.config.log_lines_collected);
            let has_signal = has_recent_progress_signal(&lines);
            let started_at = pid.and_then(process_start_time);

            if is_stuck(&progress, started_at, has_signal, now, &self.config) {
                stuck_shard_ids.push(shard_id);
            }
        }

        // Resolve any verification windows that have elapsed before
        // deciding whether to apply new fixes, so a just-recovered worker
        // doesn't get double-counted as still stuck this cycle.
        for worker_id in self.fix_coordinator.due_for_verification(&self.config, now) {
            let still_stuck = stuck_shard_ids.contains(&worker_id);
            if let Some(attempt) = self.fix_coordinator.resolve(worker_id, still_stuck, now) {
                tracing::info!(worker_id, outcome = ?attempt.outcome, "fix verification resolved");
                self.fix_history.append(&attempt)?;
            }
        }

        let disk_util = self.disk_sampler.sample_util_percent(&self.disk_device);
        let any_stuck = !stuck_shard_ids.is_empty();

        if let Some(action) = decide_scaling(&live_shard_ids, disk_util, any_stuck, &self.config, &self.scale_cooldowns, now) {
            self.apply_scaling(action, now).await?;
        }

        for shard_id in stuck_shard_ids {
            if self.fix_coordinator.has_pending(shard_id) {
                continue;
            }
            self.maybe_apply_fix(shard_id, disk_util, now).await?;
        }

        Ok(())
    }

    async fn apply_scaling(&mut self, action: ScalingAction, now: chrono::DateTime<Utc>) -> Result<()> {
        match action {
            ScalingAction::ScaleDown { shard_id } => {
                tracing::warn!(shard_id, %self.disk_device, "scaling down due to disk saturation");
                if !self.config.dry_run {
                    self.lifecycle.stop(shard_id).await?;
                }
                self.scale_cooldowns.record("scale_down", now);
            }
            ScalingAction::ScaleUp { shard_id } => {
                tracing::info!(shard_id, "scaling up, disk utilization is low");
                if !self.config.dry_run {
                    self.lifecycle.start(shard_id).await?;
                }
                self.scale_cooldowns.record("scale_up", now);
            }
        }
        Ok(())
    }

    /// §4.8 step D: collect diagnostics, optionally consult the oracle,
    /// apply one of restart/config/code, and record the pending
    /// verification for this cycle's resolution pass next time around.
    async fn maybe_apply_fix(&mut self, shard_id: u32, disk_util: f64, now: chrono::DateTime<Utc>) -> Result<()> {
        let history = self.fix_history.for_worker(shard_id)?;
        if is_in_fix_cooldown(&history, &self.config, now) {
            return Ok(());
        }
        if should_escalate(&history, &self.config) {
            tracing::error!(shard_id, "exhausted fix attempts, escalating to paused");
            if !self.config.dry_run {
                self.lifecycle.stop(shard_id).await?;
            }
            return Ok(());
        }

        let store = ProgressStore::new(&self.config.progress_dir);
        let progress = store.load(shard_id)?;
        let lines = self.log_source.recent_lines(shard_id, self.config.log_lines_collected);
        let error_patterns = extract_error_patterns(&lines);
        let root_cause = if error_patterns.is_empty() {
            "no activity".to_string()
        } else {
            error_patterns.join("; ")
        };
        let prior_occurrences = count_prior_occurrences(&history, &root_cause, &self.config);

        let diagnostics = Diagnostics {
            worker_id: shard_id,
            recent_log_lines: lines,
            error_patterns,
            shard_key_range: (0, progress.last_processed_shard_key),
            disk_util_percent: disk_util,
            recurrence: Some(RecurrenceInfo {
                prior_occurrences,
                matched_keywords: Vec::new(),
            }),
        };

        // §4.8: skip the oracle entirely when the fallback rule already
        // suffices (disk saturated and a worker is stuck).
        let skip_oracle_fallback_suffices = disk_util >= self.config.disk_scale_down_threshold;

        let mut fix_type = FixType::Restart;
        let mut params = String::new();
        let mut root_cause_for_record = root_cause.clone();

        if self.config.llm_enabled && !skip_oracle_fallback_suffices {
            if let Some(oracle) = &self.oracle {
                let signature = diagnostics.error_signature();
                let recommendation = if let Some(cached) = self.oracle_cache.get(shard_id, signature, self.config.oracle_cache_ttl, now) {
                    cached.clone()
                } else {
                    match oracle.analyze(&diagnostics).await {
                        Ok(recommendation) => {
                            self.oracle_cache.insert(shard_id, signature, recommendation.clone(), now);
                            recommendation
                        }
                        Err(error) => {
                            tracing::warn!(%error, shard_id, "oracle request failed, defaulting to restart");
                            bookmover_oracle::Recommendation::fallback()
                        }
                    }
                };

                let biased_to_code = should_bias_toward_code(prior_occurrences, recommendation.confidence, &self.config)
                    && recommendation.fix_type != FixType::Code;
                fix_type = if biased_to_code { FixType::Code } else { recommendation.fix_type };
                params = recommendation.params.clone().unwrap_or_default();
                root_cause_for_record = recommendation.root_cause.clone();

                if fix_type == FixType::Code {
                    if !self.config.allow_code_patch {
                        tracing::info!(shard_id, "fix_type=code recommended but code patching is disabled, falling back to restart");
                        fix_type = FixType::Restart;
                    } else if let Some(patch) = &recommendation.patch {
                        self.apply_code_patch(shard_id, patch).await?;
                    } else {
                        tracing::warn!(shard_id, "fix_type=code recommended with no patch, falling back to restart");
                        fix_type = FixType::Restart;
                    }
                }
            }
        }

        match fix_type {
            FixType::Restart => {
                if !self.config.dry_run {
                    self.lifecycle.restart(shard_id).await?;
                }
            }
            FixType::Config => {
                if !self.config.dry_run {
                    self.lifecycle.restart_with_config(shard_id, &params).await?;
                }
            }
            FixType::Code => {
                if !self.config.dry_run {
                    self.lifecycle.restart(shard_id).await?;
                }
            }
        }

        let attempt_index = attempts_since_last_verified(&history) + 1;
        self.fix_coordinator.record_pending(PendingVerification {
            worker_id: shard_id,
            root_cause: root_cause_for_record,
            fix_type,
            params,
            attempt_index,
            applied_at: now,
        });
        Ok(())
    }

    async fn apply_code_patch(&self, shard_id: u32, patch: &bookmover_oracle::PatchSpec) -> Result<()> {
        let Some(target_file) = self.config.code_patch_targets.get(&shard_id) else {
            tracing::warn!(shard_id, "code patch recommended but no patchable file is configured for this worker");
            return Ok(());
        };
        if self.config.dry_run {
            return Ok(());
        }
        match crate::patch_apply::apply_and_validate(target_file, patch).await {
            Ok(backup) => tracing::info!(shard_id, backup = %backup.display(), "code patch applied and validated"),
            Err(error) => tracing::warn!(shard_id, %error, "code patch failed, backup restored"),
        }
        Ok(())
    }
}
