use crate::error::{Error, Result};

/// Lifecycle operations the supervisor performs on a worker process (§4.8
/// step D.3: "invoke the worker's restart script"). Kept as a trait, not a
/// hardcoded `Command` call, so a test double can assert on invocations
/// without actually spawning processes.
#[async_trait::async_trait]
pub trait WorkerLifecycle: Send + Sync {
    /// Stops the stuck process, reads its `last_processed_shard_key` from
    /// the progress file, and relaunches it with the same shard_id. The
    /// restart script itself owns that read; this call just invokes it.
    async fn restart(&self, shard_id: u32) -> Result<()>;
    /// Restart with one or more changed operational parameters (parallel
    /// upload degree, batch size, ...).
    async fn restart_with_config(&self, shard_id: u32, params: &str) -> Result<()>;
    /// Launches a brand-new worker at `shard_id` (fleet scale-up).
    async fn start(&self, shard_id: u32) -> Result<()>;
    /// Stops a worker and does not relaunch it (fleet scale-down, or the
    /// terminal "paused/stopped" escalation after exhausted fix attempts).
    async fn stop(&self, shard_id: u32) -> Result<()>;
}

/// Shells out to an external restart script: the same "spawn and wait on an
/// external process" shape the metadata extractor uses.
pub struct ScriptLifecycle {
    script_path: std::path::PathBuf,
    source_library: std::path::PathBuf,
}

impl ScriptLifecycle {
    pub fn new(script_path: impl Into<std::path::PathBuf>, source_library: impl Into<std::path::PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            source_library: source_library.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<()> {
        let output = tokio::process::Command::new(&self.script_path)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::Lifecycle(format!("spawning {}: {e}", self.script_path.display())))?;
        if !output.status.success() {
            return Err(Error::Lifecycle(format!(
                "{} exited with {}: {}",
                self.script_path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WorkerLifecycle for ScriptLifecycle {
    async fn restart(&self, shard_id: u32) -> Result<()> {
        let shard_id = shard_id.to_string();
        let source = self.source_library.to_string_lossy();
        self.run(&["restart", "--shard-id", &shard_id, &source]).await
    }

    async fn restart_with_config(&self, shard_id: u32, params: &str) -> Result<()> {
        let shard_id = shard_id.to_string();
        let source = self.source_library.to_string_lossy();
        self.run(&["restart", "--shard-id", &shard_id, "--params", params, &source]).await
    }

    async fn start(&self, shard_id: u32) -> Result<()> {
        let shard_id = shard_id.to_string();
        let source = self.source_library.to_string_lossy();
        self.run(&["start", "--shard-id", &shard_id, &source]).await
    }

    async fn stop(&self, shard_id: u32) -> Result<()> {
        let shard_id = shard_id.to_string();
        self.run(&["stop", "--shard-id", &shard_id]).await
    }
}
