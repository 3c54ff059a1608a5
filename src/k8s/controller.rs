use std::collections::BTreeMap;

use anyhow::Result;
use tracing::debug;

use crate::{
  clients::ClusterClients,
  k8s::resources::{ControllerKind, OwnerRef, Pod},
};

/// The controller managing a pod, taken from its first owner reference
pub fn owner_of(pod: &Pod) -> Option<&OwnerRef> {
  pod.owner.as_ref()
}

/// Joins matchLabels into a kube label selector (AND semantics)
fn selector(match_labels: &BTreeMap<String, String>) -> String {
  match_labels
    .iter()
    .map(|(key, value)| format!("{key}={value}"))
    .collect::<Vec<_>>()
    .join(",")
}

/// Returns all pods managed by the given controller
///
/// ReplicaSets, StatefulSets and DaemonSets select their pods directly
/// by label. Deployments manage pods through an intermediate
/// ReplicaSet, so the backing ReplicaSet is located by owner reference
/// first; when none exists the pod set is empty.
pub async fn pods_for_controller<C: ClusterClients>(
  clients: &C,
  kind: ControllerKind,
  name: &str,
  namespace: &str,
) -> Result<Vec<Pod>> {
  match kind {
    ControllerKind::Deployment => {
      let replicasets = clients.list_replicasets(namespace).await?;
      let backing = replicasets
        .iter()
        .find(|repl| repl.owners.iter().any(|owner| owner.kind == "Deployment" && owner.name == name));

      match backing {
        Some(repl) => selected_pods(clients, ControllerKind::ReplicaSet, &repl.name, namespace).await,
        None => {
          debug!("No ReplicaSet owned by Deployment {}/{}; returning an empty pod set", namespace, name);
          Ok(Vec::new())
        }
      }
    }
    _ => selected_pods(clients, kind, name, namespace).await,
  }
}

async fn selected_pods<C: ClusterClients>(
  clients: &C,
  kind: ControllerKind,
  name: &str,
  namespace: &str,
) -> Result<Vec<Pod>> {
  let match_labels = clients.controller_match_labels(kind, name, namespace).await?;

  clients.list_pods_by_labels(namespace, &selector(&match_labels)).await
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn selector_joins_labels_with_commas() {
    let match_labels = BTreeMap::from([
      ("app".to_owned(), "web".to_owned()),
      ("tier".to_owned(), "frontend".to_owned()),
    ]);
    assert_eq!(selector(&match_labels), "app=web,tier=frontend");
  }

  #[test]
  fn selector_of_single_label() {
    let match_labels = BTreeMap::from([("app".to_owned(), "web".to_owned())]);
    assert_eq!(selector(&match_labels), "app=web");
  }

  #[test]
  fn selector_of_no_labels_is_empty() {
    assert_eq!(selector(&BTreeMap::new()), "");
  }

  #[test]
  fn owner_of_returns_first_owner() {
    let pod = Pod {
      name: "web-0".to_owned(),
      namespace: "default".to_owned(),
      node_name: None,
      owner: Some(OwnerRef {
        kind: "StatefulSet".to_owned(),
        name: "web".to_owned(),
      }),
    };
    assert_eq!(owner_of(&pod).map(|owner| owner.name.as_str()), Some("web"));
  }

  #[test]
  fn owner_of_unowned_pod_is_none() {
    let pod = Pod::default();
    assert!(owner_of(&pod).is_none());
  }
}
