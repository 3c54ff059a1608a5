use anyhow::Result;
use kube::{
  Client,
  api::{Api, ObjectMeta},
};
use serde::Deserialize;

use crate::quantity::{self, InvalidQuantity};

/// CPU and memory usage as reported by the metrics API
///
/// CPU is carried so the response validates against the full object
/// shape, but only the memory side feeds the reports.
#[derive(Clone, Debug, Deserialize)]
pub struct Usage {
  pub cpu: String,
  pub memory: String,
}

/// A single node's usage from `metrics.k8s.io/v1beta1`
///
/// Required fields are non-optional so a malformed response fails
/// deserialization rather than producing a partial measurement.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeMetrics {
  pub metadata: ObjectMeta,
  pub timestamp: String,
  pub window: String,
  pub usage: Usage,
}

/// Per-container usage within a pod metrics object
#[derive(Clone, Debug, Deserialize)]
pub struct ContainerMetrics {
  pub name: String,
  pub usage: Usage,
}

/// A single pod's usage from `metrics.k8s.io/v1beta1`
#[derive(Clone, Debug, Deserialize)]
pub struct PodMetrics {
  pub metadata: ObjectMeta,
  pub timestamp: String,
  pub window: String,
  pub containers: Vec<ContainerMetrics>,
}

// The metrics API has no generated bindings in k8s-openapi, so the
// Resource/Metadata impls are written out by hand to make these types
// fetchable through kube::Api.
// https://github.com/kubernetes/metrics#resource-metrics-api

impl k8s_openapi::Resource for NodeMetrics {
  const API_VERSION: &'static str = "metrics.k8s.io/v1beta1";
  const GROUP: &'static str = "metrics.k8s.io";
  const KIND: &'static str = "NodeMetrics";
  const VERSION: &'static str = "v1beta1";
  const URL_PATH_SEGMENT: &'static str = "nodes";
  type Scope = k8s_openapi::ClusterResourceScope;
}

impl k8s_openapi::Metadata for NodeMetrics {
  type Ty = ObjectMeta;

  fn metadata(&self) -> &Self::Ty {
    &self.metadata
  }

  fn metadata_mut(&mut self) -> &mut Self::Ty {
    &mut self.metadata
  }
}

impl k8s_openapi::Resource for PodMetrics {
  const API_VERSION: &'static str = "metrics.k8s.io/v1beta1";
  const GROUP: &'static str = "metrics.k8s.io";
  const KIND: &'static str = "PodMetrics";
  const VERSION: &'static str = "v1beta1";
  const URL_PATH_SEGMENT: &'static str = "pods";
  type Scope = k8s_openapi::NamespaceResourceScope;
}

impl k8s_openapi::Metadata for PodMetrics {
  type Ty = ObjectMeta;

  fn metadata(&self) -> &Self::Ty {
    &self.metadata
  }

  fn metadata_mut(&mut self) -> &mut Self::Ty {
    &mut self.metadata
  }
}

/// Memory usage of a node in MiB
pub fn node_usage_mib(metrics: &NodeMetrics) -> Result<u64, InvalidQuantity> {
  quantity::parse(&metrics.usage.memory)
}

/// Total memory usage of a pod in MiB, summed across its containers
pub fn pod_usage_mib(metrics: &PodMetrics) -> Result<u64, InvalidQuantity> {
  metrics.containers.iter().map(|c| quantity::parse(&c.usage.memory)).sum()
}

/// Fetch a node's memory usage in MiB from the metrics API
pub async fn get_node_usage(client: &Client, name: &str) -> Result<u64> {
  let api = Api::<NodeMetrics>::all(client.clone());
  let metrics = api.get(name).await?;
  let usage = node_usage_mib(&metrics)?;

  Ok(usage)
}

/// Fetch a pod's memory usage in MiB from the metrics API
pub async fn get_pod_usage(client: &Client, namespace: &str, name: &str) -> Result<u64> {
  let api = Api::<PodMetrics>::namespaced(client.clone(), namespace);
  let metrics = api.get(name).await?;
  let usage = pod_usage_mib(&metrics)?;

  Ok(usage)
}
