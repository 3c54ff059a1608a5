use std::collections::BTreeMap;

use anyhow::Result;
use kube::Client;

use crate::{
  k8s::resources::{self, ControllerKind, Node, Pod, ReplicaSet},
  metrics,
};

/// Trait abstracting all Kubernetes API operations used by kubemem
pub trait ClusterClients {
  fn list_nodes(&self) -> impl std::future::Future<Output = Result<Vec<Node>>> + Send;
  fn list_pods_on_node(&self, node: &str) -> impl std::future::Future<Output = Result<Vec<Pod>>> + Send;
  fn list_pods_by_labels(
    &self,
    namespace: &str,
    selector: &str,
  ) -> impl std::future::Future<Output = Result<Vec<Pod>>> + Send;
  fn list_replicasets(&self, namespace: &str) -> impl std::future::Future<Output = Result<Vec<ReplicaSet>>> + Send;
  fn controller_match_labels(
    &self,
    kind: ControllerKind,
    name: &str,
    namespace: &str,
  ) -> impl std::future::Future<Output = Result<BTreeMap<String, String>>> + Send;
  fn node_memory_usage(&self, node: &str) -> impl std::future::Future<Output = Result<u64>> + Send;
  fn pod_memory_usage(&self, namespace: &str, pod: &str) -> impl std::future::Future<Output = Result<u64>> + Send;
}

/// Real cluster client implementation wrapping the kube client
///
/// Constructed once at startup and passed explicitly to the analysis;
/// nothing holds it as global state.
pub struct RealClusterClients {
  client: Client,
}

impl RealClusterClients {
  pub fn new(client: Client) -> Self {
    Self { client }
  }
}

impl ClusterClients for RealClusterClients {
  async fn list_nodes(&self) -> Result<Vec<Node>> {
    resources::get_nodes(&self.client).await
  }

  async fn list_pods_on_node(&self, node: &str) -> Result<Vec<Pod>> {
    resources::get_pods_on_node(&self.client, node).await
  }

  async fn list_pods_by_labels(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>> {
    resources::get_pods_by_labels(&self.client, namespace, selector).await
  }

  async fn list_replicasets(&self, namespace: &str) -> Result<Vec<ReplicaSet>> {
    resources::get_replicasets(&self.client, namespace).await
  }

  async fn controller_match_labels(
    &self,
    kind: ControllerKind,
    name: &str,
    namespace: &str,
  ) -> Result<BTreeMap<String, String>> {
    resources::get_match_labels(&self.client, kind, name, namespace).await
  }

  async fn node_memory_usage(&self, node: &str) -> Result<u64> {
    metrics::get_node_usage(&self.client, node).await
  }

  async fn pod_memory_usage(&self, namespace: &str, pod: &str) -> Result<u64> {
    metrics::get_pod_usage(&self.client, namespace, pod).await
  }
}
