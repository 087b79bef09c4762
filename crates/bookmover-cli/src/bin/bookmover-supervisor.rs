use anyhow::Result;
use bookmover_cli::supervisor::Args;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    bookmover_cli::tracing_init::init("bookmover_supervisor=info,bookmover_cli=info");
    bookmover_cli::supervisor::run(args).await
}
