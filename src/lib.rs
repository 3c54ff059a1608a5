pub mod analysis;
pub mod clients;
pub mod k8s;
pub mod metrics;
pub mod output;
pub mod quantity;

use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};

use crate::clients::RealClusterClients;

/// Inspect a Kubernetes cluster's memory usage: rank nodes by
/// utilization, drill into the heaviest pods on high-usage nodes, and
/// show usage across the owning controller's replicas
#[derive(Parser, Debug)]
#[command(author, about, version)]
pub struct Cli {
  #[clap(flatten)]
  pub verbose: Verbosity<WarnLevel>,
}

/// Run the full three-tier analysis against the currently configured
/// cluster context
pub async fn analyze() -> Result<()> {
  let client = kube::Client::try_default().await?;
  let clients = RealClusterClients::new(client);

  analysis::run(&clients).await
}
