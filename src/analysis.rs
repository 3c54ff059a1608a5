use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::{
  clients::ClusterClients,
  k8s::{
    controller,
    resources::{ControllerKind, OwnerRef, Pod},
  },
  output::{ControllerRow, NodeRow, PodRow, Report, UtilizationStatus},
};

/// Node utilization above this percentage flags the node for drill-down
const HIGH_USAGE_THRESHOLD: f64 = 80.0;

/// Tier-one results: every node that produced a measurement, plus the
/// names of the nodes flagged for drill-down, in listing order
#[derive(Debug, Default)]
pub struct NodeReport {
  pub rows: Vec<NodeRow>,
  pub high_usage_nodes: Vec<String>,
}

/// Tier-two results for a single node
#[derive(Debug, Default)]
pub struct PodReport {
  pub rows: Vec<PodRow>,
  pub top_pod: Option<TopPod>,
}

/// The heaviest pod found on a node
#[derive(Clone, Debug)]
pub struct TopPod {
  pub pod: Pod,
  pub usage_mib: u64,
}

fn progress_bar(len: usize, message: String) -> ProgressBar {
  ProgressBar::new(len as u64)
    .with_style(ProgressStyle::with_template("{msg} {wide_bar} {pos}/{len}").unwrap())
    .with_message(message)
}

/// Measure every node's memory utilization and flag the high-usage ones
///
/// Nodes missing a capacity entry or whose metrics fetch fails are
/// reported as warnings and left out of the table; they never abort
/// the run.
pub async fn analyze_nodes<C: ClusterClients>(clients: &C) -> Result<NodeReport> {
  let nodes = clients.list_nodes().await?;

  let progress = progress_bar(nodes.len(), "Analyzing node memory utilization".to_owned());
  let mut report = NodeReport::default();

  for node in &nodes {
    progress.inc(1);

    let capacity_mib = match node.capacity_mib() {
      Ok(capacity) => capacity,
      Err(err) => {
        warn!("Skipping node {}: {:#}", node.name, err);
        continue;
      }
    };

    let usage_mib = match clients.node_memory_usage(&node.name).await {
      Ok(usage) => usage,
      Err(err) => {
        warn!("Error fetching memory for node {}: {:#}", node.name, err);
        continue;
      }
    };

    let utilization = usage_mib as f64 / capacity_mib * 100.0;
    let status = if utilization > HIGH_USAGE_THRESHOLD {
      report.high_usage_nodes.push(node.name.clone());
      UtilizationStatus::High
    } else {
      UtilizationStatus::Ok
    };

    report.rows.push(NodeRow {
      name: node.name.clone(),
      capacity_mib: capacity_mib.ceil() as u64,
      usage_mib,
      utilization: format!("{utilization:.2}"),
      status,
    });
  }

  progress.finish_and_clear();
  Ok(report)
}

/// Measure every pod scheduled on a node and track the heaviest one
///
/// The top pod is selected by strict greater-than comparison, so the
/// first pod to reach the maximum wins ties, and a pod must exceed
/// 0 MiB to be selected at all.
pub async fn analyze_node_pods<C: ClusterClients>(clients: &C, node: &str) -> Result<PodReport> {
  let pods = clients.list_pods_on_node(node).await?;

  let progress = progress_bar(pods.len(), format!("Analyzing pods on {node}"));
  let mut report = PodReport::default();
  let mut highest_usage = 0;

  for pod in pods {
    progress.inc(1);

    let usage_mib = match clients.pod_memory_usage(&pod.namespace, &pod.name).await {
      Ok(usage) => usage,
      Err(err) => {
        warn!("Error fetching memory for pod {}/{}: {:#}", pod.namespace, pod.name, err);
        continue;
      }
    };

    report.rows.push(PodRow {
      name: pod.name.clone(),
      namespace: pod.namespace.clone(),
      usage_mib,
    });

    if usage_mib > highest_usage {
      highest_usage = usage_mib;
      report.top_pod = Some(TopPod { pod, usage_mib });
    }
  }

  progress.finish_and_clear();
  Ok(report)
}

/// Measure every pod managed by a controller
pub async fn analyze_controller<C: ClusterClients>(
  clients: &C,
  kind: ControllerKind,
  name: &str,
  namespace: &str,
) -> Result<Vec<ControllerRow>> {
  let pods = controller::pods_for_controller(clients, kind, name, namespace).await?;

  let progress = progress_bar(pods.len(), format!("Analyzing pods for {kind} {name}"));
  let mut rows = Vec::new();

  for pod in pods {
    progress.inc(1);

    let usage_mib = match clients.pod_memory_usage(&pod.namespace, &pod.name).await {
      Ok(usage) => usage,
      Err(err) => {
        warn!("Error fetching memory for pod {}/{}: {:#}", pod.namespace, pod.name, err);
        continue;
      }
    };

    rows.push(ControllerRow {
      name: pod.name,
      node_name: pod.node_name.unwrap_or_default(),
      usage_mib,
    });
  }

  progress.finish_and_clear();
  Ok(rows)
}

async fn controller_tier<C: ClusterClients>(clients: &C, owner: &OwnerRef, namespace: &str) -> Result<()> {
  let kind: ControllerKind = owner.kind.parse()?;
  let rows = analyze_controller(clients, kind, &owner.name, namespace).await?;

  println!("Memory Utilization for {kind} {}", owner.name);
  println!("{}", rows.to_stdout_table());

  Ok(())
}

/// Full three-tier drill-down: all nodes, then the pods on each
/// high-usage node, then the controller behind each node's heaviest pod
pub async fn run<C: ClusterClients>(clients: &C) -> Result<()> {
  let node_report = analyze_nodes(clients).await?;
  println!("Kubernetes Node Memory Utilization");
  println!("{}", node_report.rows.to_stdout_table());

  for node in &node_report.high_usage_nodes {
    let pod_report = analyze_node_pods(clients, node).await?;
    println!("Pods Memory Utilization on Node: {node}");
    println!("{}", pod_report.rows.to_stdout_table());

    let Some(top) = pod_report.top_pod else {
      continue;
    };
    let Some(owner) = controller::owner_of(&top.pod).cloned() else {
      continue;
    };

    // Best-effort tier: resolver errors, including unsupported owner
    // kinds, are reported and the run moves on to the next node.
    if let Err(err) = controller_tier(clients, &owner, &top.pod.namespace).await {
      warn!("Error analyzing {} {}: {:#}", owner.kind, owner.name, err);
    }
  }

  Ok(())
}
