use anyhow::Result;
use bookmover_cli::worker::Args;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    bookmover_cli::tracing_init::init("bookmover_worker=info,bookmover_cli=info");
    bookmover_cli::worker::run(args).await
}
