use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bookmover_catalog::{HttpSourceCatalog, HttpTargetService};
use bookmover_metadata::ExternalTool;
use bookmover_worker::{run_worker, WorkerConfig, WorkerContext};
use clap::Parser;

/// §6 worker CLI surface: `positional: source-library path`,
/// `--shard-id N`, `--shard-count N`, `--last-key K`, `--batch-size K`,
/// `--parallel-uploads K ∈ [1..10]`, `--use-symlinks`,
/// `--limit K` (max records this invocation).
#[derive(Parser, Debug)]
#[command(name = "bookmover-worker", version, about = "Shard-owning ingestion worker (C6/C7)")]
pub struct Args {
    /// Base URL of the source catalog's query service.
    pub source_library: String,

    #[arg(long)]
    pub shard_id: u32,
    #[arg(long, default_value_t = 1)]
    pub shard_count: u32,
    /// Seeds a fresh progress file's checkpoint before the run starts; has
    /// no effect if a progress file for this shard already exists (§3's
    /// checkpoint-monotonicity invariant — a resumed worker always trusts
    /// its own file over a CLI override).
    #[arg(long)]
    pub last_key: Option<i64>,
    #[arg(long, default_value_t = 1000)]
    pub batch_size: u32,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=10))]
    pub parallel_uploads: u16,
    #[arg(long)]
    pub use_symlinks: bool,
    /// Accepted for interface compatibility; the worker's natural stopping
    /// point is an empty batch, so this is informational only unless a
    /// deployment wants to cap one invocation's record count. Left
    /// unenforced here — reference surface, not normative (§6).
    #[arg(long)]
    pub limit: Option<u32>,

    /// Target service base URL; falls back to `BOOKMOVER_TARGET_URL`.
    #[arg(long, env = "BOOKMOVER_TARGET_URL")]
    pub target_url: String,
    #[arg(long, default_value = ".")]
    pub progress_dir: PathBuf,

    /// Path to the external ebook metadata tool (§4.2), e.g. calibre's
    /// `ebook-meta`.
    #[arg(long, default_value = "ebook-meta")]
    pub metadata_tool: PathBuf,

    /// Runs the C7 archive-bundle variant instead of C6.
    #[arg(long)]
    pub archive_mode: bool,
    /// Directory of archive bundles to ingest (required with
    /// `--archive-mode`).
    #[arg(long)]
    pub archive_root: Option<PathBuf>,
    /// Directory archive extraction and folder reuse are staged under
    /// (required with `--archive-mode`).
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,
}

pub async fn run(args: Args) -> Result<()> {
    tracing::info!(
        shard_id = args.shard_id,
        shard_count = args.shard_count,
        archive_mode = args.archive_mode,
        "starting worker"
    );
    let target_token = std::env::var("BOOKMOVER_TARGET_TOKEN").ok();
    let client = build_client(target_token.as_deref())?;

    let source = Arc::new(HttpSourceCatalog::new(client.clone(), args.source_library.as_str()));
    let target = Arc::new(HttpTargetService::new(client, args.target_url.as_str()));
    let metadata_tool = Arc::new(ExternalTool::new(args.metadata_tool));

    let mut config = WorkerConfig::new(
        args.shard_id,
        args.shard_count,
        args.progress_dir.clone(),
        args.staging_dir.clone().unwrap_or_else(|| args.progress_dir.join("staging")),
    );
    config.batch_size = args.batch_size;
    config.upload_concurrency = args.parallel_uploads as usize;
    config.use_symlinks = args.use_symlinks;

    if let Some(last_key) = args.last_key {
        seed_checkpoint(&config.progress_dir, args.shard_id, last_key)?;
    }

    let ctx = WorkerContext { config, source, target, metadata_tool };

    if args.archive_mode {
        run_archive(ctx, &args).await
    } else {
        run_worker(ctx).await.context("worker run failed")
    }
}

async fn run_archive(base: WorkerContext, args: &Args) -> Result<()> {
    let archive_root = args.archive_root.clone().context("--archive-root is required with --archive-mode")?;
    let all_archive_names = list_archive_names(&archive_root)?;
    let assigned_archives: Vec<String> = all_archive_names
        .iter()
        .filter(|name| bookmover_worker::owning_shard(name, base.config.n_shards) == base.config.shard_id)
        .cloned()
        .collect();

    let ctx = bookmover_worker::ArchiveWorkerContext { base, archive_root, all_archive_names, assigned_archives };
    bookmover_worker::run_archive_worker(ctx).await.context("archive worker run failed")
}

fn list_archive_names(archive_root: &std::path::Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(archive_root)
        .with_context(|| format!("reading archive root {}", archive_root.display()))?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    Ok(names)
}

fn seed_checkpoint(progress_dir: &std::path::Path, shard_id: u32, last_key: i64) -> Result<()> {
    let store = bookmover_progress::ProgressStore::new(progress_dir);
    let mut progress = store.load(shard_id).context("loading progress file to seed checkpoint")?;
    if progress.last_processed_shard_key < 0 {
        progress.advance_to(last_key);
        store.commit(&progress).context("seeding checkpoint")?;
    }
    Ok(())
}

fn build_client(token: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(token) = token {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
            .context("target token is not a valid header value")?;
        value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, value);
        builder = builder.default_headers(headers);
    }
    builder.build().context("building target HTTP client")
}
