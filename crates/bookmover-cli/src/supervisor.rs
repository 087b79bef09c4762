use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bookmover_oracle::HttpOracleClient;
use bookmover_supervisor::{FileLogSource, ProcDiskstatsSampler, ScriptLifecycle, Supervisor, SupervisorConfig};
use clap::Parser;

/// §6 supervisor CLI surface: `--check-interval S`, `--threshold M`,
/// `--llm-enabled`, `--dry-run`, plus the ambient wiring (paths, restart
/// script, oracle endpoint) the reference surface leaves unspecified.
#[derive(Parser, Debug)]
#[command(name = "bookmover-supervisor", version, about = "Fleet supervisor (C8): liveness, scaling, fix application")]
pub struct Args {
    /// Directory every worker's progress file and log file live in.
    pub progress_dir: PathBuf,

    #[arg(long, default_value_t = 60)]
    pub check_interval: u64,
    /// Disk %util above which step C scales down and the fallback rule
    /// short-circuits the oracle (§4.8).
    #[arg(long, default_value_t = 90.0)]
    pub threshold: f64,
    #[arg(long, default_value_t = true, value_parser = clap::value_parser!(bool))]
    pub llm_enabled: bool,
    #[arg(long)]
    pub dry_run: bool,

    /// Source library base URL, passed through to the restart script the
    /// same way the worker binary receives it.
    #[arg(long)]
    pub source_library: String,
    /// External script invoked for restart/start/stop/config-change
    /// (§4.8 step D.3).
    #[arg(long)]
    pub restart_script: PathBuf,
    /// Append-only `FixAttempt` log (§6).
    #[arg(long)]
    pub fix_history_path: PathBuf,
    /// Block device backing the source library, sampled via
    /// `/proc/diskstats` for step C.
    #[arg(long, default_value = "sda")]
    pub disk_device: String,

    /// Advisory oracle base URL; omit to run with the oracle disabled even
    /// if `--llm-enabled` is set.
    #[arg(long)]
    pub oracle_url: Option<String>,

    /// Opt-in to the code-patch fix path (§9); off by default.
    #[arg(long)]
    pub allow_code_patch: bool,
    /// `shard_id=path` pairs naming which file a worker's code patches may
    /// target. Repeatable. Ignored unless `--allow-code-patch` is set.
    #[arg(long = "code-patch-target", value_parser = parse_code_patch_target)]
    pub code_patch_targets: Vec<(u32, PathBuf)>,
}

fn parse_code_patch_target(raw: &str) -> std::result::Result<(u32, PathBuf), String> {
    let (shard_id, path) = raw.split_once('=').ok_or_else(|| format!("expected shard_id=path, got {raw:?}"))?;
    let shard_id: u32 = shard_id.parse().map_err(|e| format!("invalid shard_id in {raw:?}: {e}"))?;
    Ok((shard_id, PathBuf::from(path)))
}

pub async fn run(args: Args) -> Result<()> {
    let mut config = SupervisorConfig::new(args.progress_dir, args.fix_history_path);
    config.check_interval = std::time::Duration::from_secs(args.check_interval);
    config.disk_scale_down_threshold = args.threshold;
    config.llm_enabled = args.llm_enabled;
    config.dry_run = args.dry_run;
    config.allow_code_patch = args.allow_code_patch;
    config.code_patch_targets = args.code_patch_targets.into_iter().collect::<HashMap<_, _>>();

    let lifecycle = Arc::new(ScriptLifecycle::new(args.restart_script, args.source_library));
    let log_source = Arc::new(FileLogSource::new(config.progress_dir.clone()));
    let disk_sampler = Box::new(ProcDiskstatsSampler::new());

    let oracle = args
        .oracle_url
        .map(|base_url| -> Result<_> {
            let oracle_key = std::env::var("BOOKMOVER_ORACLE_API_KEY").ok();
            let client = build_oracle_client(oracle_key.as_deref())?;
            Ok(Arc::new(HttpOracleClient::new(client, base_url)) as Arc<dyn bookmover_oracle::OracleClient>)
        })
        .transpose()?;

    let supervisor = Supervisor::new(config, lifecycle, oracle, log_source, disk_sampler, args.disk_device);
    supervisor.run().await.context("supervisor check loop failed")
}

fn build_oracle_client(api_key: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(key) = api_key {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {key}"))
            .context("oracle API key is not a valid header value")?;
        value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, value);
        builder = builder.default_headers(headers);
    }
    builder.build().context("building oracle HTTP client")
}
