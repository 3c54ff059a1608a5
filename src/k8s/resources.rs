use std::{collections::BTreeMap, str::FromStr};

use anyhow::{Context, Result, bail};
use k8s_openapi::api::{apps, core};
use kube::{
  Client,
  api::{Api, ListParams},
};
use thiserror::Error;

/// A node as viewed by the drill-down: its name and the raw memory
/// capacity quantity from `status.capacity["memory"]`
#[derive(Clone, Debug, Default)]
pub struct Node {
  pub name: String,
  pub memory_capacity: Option<String>,
}

impl Node {
  /// Memory capacity in MiB
  ///
  /// The kubelet reports capacity as a Ki quantity, so the suffix is
  /// stripped and the value divided by 1024.
  pub fn capacity_mib(&self) -> Result<f64> {
    let raw = self
      .memory_capacity
      .as_deref()
      .context("no memory capacity reported")?;
    let kib: u64 = raw
      .trim_end_matches("Ki")
      .parse()
      .with_context(|| format!("invalid capacity quantity: {raw}"))?;

    Ok(kib as f64 / 1024.0)
  }
}

/// The controller a resource reports as its manager
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerRef {
  pub kind: String,
  pub name: String,
}

/// A pod as viewed by the drill-down
#[derive(Clone, Debug, Default)]
pub struct Pod {
  pub name: String,
  pub namespace: String,
  pub node_name: Option<String>,
  /// First owner reference, if the pod has one
  pub owner: Option<OwnerRef>,
}

/// ReplicaSet projection used only to resolve the Deployment indirection
#[derive(Clone, Debug, Default)]
pub struct ReplicaSet {
  pub name: String,
  pub owners: Vec<OwnerRef>,
}

/// Workload controllers the drill-down knows how to resolve
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerKind {
  Deployment,
  ReplicaSet,
  StatefulSet,
  DaemonSet,
}

/// An owner kind the drill-down cannot resolve to a pod set
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported controller kind: {0}")]
pub struct UnsupportedControllerKind(pub String);

impl FromStr for ControllerKind {
  type Err = UnsupportedControllerKind;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "Deployment" => Ok(Self::Deployment),
      "ReplicaSet" => Ok(Self::ReplicaSet),
      "StatefulSet" => Ok(Self::StatefulSet),
      "DaemonSet" => Ok(Self::DaemonSet),
      other => Err(UnsupportedControllerKind(other.to_owned())),
    }
  }
}

impl std::fmt::Display for ControllerKind {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match *self {
      ControllerKind::Deployment => write!(f, "Deployment"),
      ControllerKind::ReplicaSet => write!(f, "ReplicaSet"),
      ControllerKind::StatefulSet => write!(f, "StatefulSet"),
      ControllerKind::DaemonSet => write!(f, "DaemonSet"),
    }
  }
}

fn first_owner(refs: Option<&Vec<k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference>>) -> Option<OwnerRef> {
  refs.and_then(|refs| refs.first()).map(|owner| OwnerRef {
    kind: owner.kind.clone(),
    name: owner.name.clone(),
  })
}

fn pod_from_api(pod: &core::v1::Pod) -> Pod {
  Pod {
    name: pod.metadata.name.clone().unwrap_or_default(),
    namespace: pod.metadata.namespace.clone().unwrap_or_default(),
    node_name: pod.spec.as_ref().and_then(|spec| spec.node_name.clone()),
    owner: first_owner(pod.metadata.owner_references.as_ref()),
  }
}

/// Returns all of the nodes in the cluster
pub async fn get_nodes(client: &Client) -> Result<Vec<Node>> {
  let api: Api<core::v1::Node> = Api::all(client.clone());
  let node_list = api.list(&Default::default()).await?;

  let nodes = node_list
    .items
    .iter()
    .map(|node| Node {
      name: node.metadata.name.clone().unwrap_or_default(),
      memory_capacity: node
        .status
        .as_ref()
        .and_then(|status| status.capacity.as_ref())
        .and_then(|capacity| capacity.get("memory"))
        .map(|quantity| quantity.0.clone()),
    })
    .collect();

  Ok(nodes)
}

/// Returns all pods scheduled on the given node, across all namespaces
pub async fn get_pods_on_node(client: &Client, node: &str) -> Result<Vec<Pod>> {
  let api: Api<core::v1::Pod> = Api::all(client.clone());
  let params = ListParams::default().fields(&format!("spec.nodeName={node}"));
  let pod_list = api.list(&params).await?;

  Ok(pod_list.items.iter().map(pod_from_api).collect())
}

/// Returns the namespaced pods matching a label selector
pub async fn get_pods_by_labels(client: &Client, namespace: &str, selector: &str) -> Result<Vec<Pod>> {
  let api: Api<core::v1::Pod> = Api::namespaced(client.clone(), namespace);
  let params = ListParams::default().labels(selector);
  let pod_list = api.list(&params).await?;

  Ok(pod_list.items.iter().map(pod_from_api).collect())
}

/// Returns the ReplicaSets in a namespace with their owner references
pub async fn get_replicasets(client: &Client, namespace: &str) -> Result<Vec<ReplicaSet>> {
  let api: Api<apps::v1::ReplicaSet> = Api::namespaced(client.clone(), namespace);
  let replicaset_list = api.list(&Default::default()).await?;

  let replicasets = replicaset_list
    .items
    .iter()
    .map(|repl| ReplicaSet {
      name: repl.metadata.name.clone().unwrap_or_default(),
      owners: repl
        .metadata
        .owner_references
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|owner| OwnerRef {
          kind: owner.kind.clone(),
          name: owner.name.clone(),
        })
        .collect(),
    })
    .collect();

  Ok(replicasets)
}

/// Reads a controller object and returns its label-selector matchLabels
///
/// Deployments never reach this lookup: the resolver routes them
/// through their backing ReplicaSet first.
pub async fn get_match_labels(
  client: &Client,
  kind: ControllerKind,
  name: &str,
  namespace: &str,
) -> Result<BTreeMap<String, String>> {
  let match_labels = match kind {
    ControllerKind::ReplicaSet => {
      let api: Api<apps::v1::ReplicaSet> = Api::namespaced(client.clone(), namespace);
      let controller = api.get(name).await?;
      controller.spec.map(|spec| spec.selector.match_labels)
    }
    ControllerKind::StatefulSet => {
      let api: Api<apps::v1::StatefulSet> = Api::namespaced(client.clone(), namespace);
      let controller = api.get(name).await?;
      controller.spec.map(|spec| spec.selector.match_labels)
    }
    ControllerKind::DaemonSet => {
      let api: Api<apps::v1::DaemonSet> = Api::namespaced(client.clone(), namespace);
      let controller = api.get(name).await?;
      controller.spec.map(|spec| spec.selector.match_labels)
    }
    ControllerKind::Deployment => {
      bail!("Deployment selectors are resolved through their backing ReplicaSet")
    }
  };

  Ok(match_labels.flatten().unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn capacity_converts_ki_to_mib() {
    let node = Node {
      name: "node-1".to_owned(),
      memory_capacity: Some("2048Ki".to_owned()),
    };
    assert_eq!(node.capacity_mib().unwrap(), 2.0);
  }

  #[test]
  fn capacity_keeps_fractional_mib() {
    let node = Node {
      name: "node-1".to_owned(),
      memory_capacity: Some("1536Ki".to_owned()),
    };
    assert_eq!(node.capacity_mib().unwrap(), 1.5);
  }

  #[test]
  fn missing_capacity_is_an_error() {
    let node = Node {
      name: "node-1".to_owned(),
      memory_capacity: None,
    };
    assert!(node.capacity_mib().is_err());
  }

  #[test]
  fn malformed_capacity_is_an_error() {
    let node = Node {
      name: "node-1".to_owned(),
      memory_capacity: Some("lots".to_owned()),
    };
    assert!(node.capacity_mib().is_err());
  }

  #[test]
  fn controller_kind_parses_supported_kinds() {
    assert_eq!("Deployment".parse(), Ok(ControllerKind::Deployment));
    assert_eq!("ReplicaSet".parse(), Ok(ControllerKind::ReplicaSet));
    assert_eq!("StatefulSet".parse(), Ok(ControllerKind::StatefulSet));
    assert_eq!("DaemonSet".parse(), Ok(ControllerKind::DaemonSet));
  }

  #[test]
  fn controller_kind_rejects_other_kinds() {
    let err = "Job".parse::<ControllerKind>().unwrap_err();
    assert_eq!(err, UnsupportedControllerKind("Job".to_owned()));
    assert!(err.to_string().contains("Job"));
  }
}
