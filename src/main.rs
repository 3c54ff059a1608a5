use anyhow::Result;
use clap::Parser;
use tracing_log::AsTrace;

use kubemem::Cli;

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_max_level(cli.verbose.log_level_filter().as_trace())
    .with_target(false)
    .init();

  kubemem::analyze().await
}
