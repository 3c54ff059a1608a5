use std::collections::BTreeMap;

use kubemem::k8s::resources::{Node, OwnerRef, Pod, ReplicaSet};

/// Creates a node reporting the given capacity in Ki
pub fn make_node(name: &str, capacity_kib: u64) -> Node {
  Node {
    name: name.into(),
    memory_capacity: Some(format!("{capacity_kib}Ki")),
  }
}

/// Creates a pod scheduled on a node, optionally owned by a controller
pub fn make_pod(name: &str, namespace: &str, node: &str, owner: Option<OwnerRef>) -> Pod {
  Pod {
    name: name.into(),
    namespace: namespace.into(),
    node_name: Some(node.into()),
    owner,
  }
}

/// Creates an owner reference of the given kind
pub fn owner(kind: &str, name: &str) -> OwnerRef {
  OwnerRef {
    kind: kind.into(),
    name: name.into(),
  }
}

/// Creates a ReplicaSet owned by the named Deployment
pub fn make_replicaset(name: &str, deployment: &str) -> ReplicaSet {
  ReplicaSet {
    name: name.into(),
    owners: vec![owner("Deployment", deployment)],
  }
}

/// Builds a label map from key/value pairs
pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
  pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
}
