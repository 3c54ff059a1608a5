use std::collections::BTreeMap;

use anyhow::{Result, bail};

use kubemem::clients::ClusterClients;
use kubemem::k8s::resources::{ControllerKind, Node, Pod, ReplicaSet};

/// Pods with the labels they carry, matched against label selectors
pub type LabeledPods = Vec<(BTreeMap<String, String>, Pod)>;

/// Mock cluster for testing: canned objects plus per-entity usage maps
///
/// Entities absent from the usage maps fail their metrics fetch, which
/// is how the skip paths are exercised.
#[derive(Clone, Default)]
pub struct MockClusterClients {
  pub nodes: Vec<Node>,
  /// node name -> pods scheduled on it
  pub pods_by_node: BTreeMap<String, Vec<Pod>>,
  /// namespace -> replicasets
  pub replicasets: BTreeMap<String, Vec<ReplicaSet>>,
  /// (kind, namespace, name) -> matchLabels
  pub selectors: BTreeMap<(String, String, String), BTreeMap<String, String>>,
  /// namespace -> labeled pods
  pub labeled_pods: BTreeMap<String, LabeledPods>,
  /// node name -> usage MiB
  pub node_usage: BTreeMap<String, u64>,
  /// (namespace, pod name) -> usage MiB
  pub pod_usage: BTreeMap<(String, String), u64>,
}

impl ClusterClients for MockClusterClients {
  async fn list_nodes(&self) -> Result<Vec<Node>> {
    Ok(self.nodes.clone())
  }

  async fn list_pods_on_node(&self, node: &str) -> Result<Vec<Pod>> {
    Ok(self.pods_by_node.get(node).cloned().unwrap_or_default())
  }

  async fn list_pods_by_labels(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>> {
    let required: Vec<(&str, &str)> = selector
      .split(',')
      .filter(|pair| !pair.is_empty())
      .map(|pair| pair.split_once('=').expect("label selector pairs are k=v"))
      .collect();

    let pods = self
      .labeled_pods
      .get(namespace)
      .map(|pods| {
        pods
          .iter()
          .filter(|(labels, _)| {
            required
              .iter()
              .all(|(key, value)| labels.get(*key).map(String::as_str) == Some(*value))
          })
          .map(|(_, pod)| pod.clone())
          .collect()
      })
      .unwrap_or_default();

    Ok(pods)
  }

  async fn list_replicasets(&self, namespace: &str) -> Result<Vec<ReplicaSet>> {
    Ok(self.replicasets.get(namespace).cloned().unwrap_or_default())
  }

  async fn controller_match_labels(
    &self,
    kind: ControllerKind,
    name: &str,
    namespace: &str,
  ) -> Result<BTreeMap<String, String>> {
    match self.selectors.get(&(kind.to_string(), namespace.to_owned(), name.to_owned())) {
      Some(match_labels) => Ok(match_labels.clone()),
      None => bail!("{kind} {namespace}/{name} not found"),
    }
  }

  async fn node_memory_usage(&self, node: &str) -> Result<u64> {
    match self.node_usage.get(node) {
      Some(usage) => Ok(*usage),
      None => bail!("no metrics available for node {node}"),
    }
  }

  async fn pod_memory_usage(&self, namespace: &str, pod: &str) -> Result<u64> {
    match self.pod_usage.get(&(namespace.to_owned(), pod.to_owned())) {
      Some(usage) => Ok(*usage),
      None => bail!("no metrics available for pod {namespace}/{pod}"),
    }
  }
}
