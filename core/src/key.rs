//! Stable identities for tree entities.
//!
//! A key survives snapshot replacement: the same pod on the same node maps to
//! the same key on every refresh, so expand/collapse state and the graph's
//! selection can be carried across rebuilds without holding references into
//! the tree.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Node {
        node: String,
    },
    Pod {
        node: String,
        namespace: String,
        pod: String,
    },
    Container {
        node: String,
        namespace: String,
        pod: String,
        container: String,
    },
}

impl EntityKey {
    pub fn node(node: &str) -> Self {
        EntityKey::Node {
            node: node.to_string(),
        }
    }

    pub fn pod(node: &str, namespace: &str, pod: &str) -> Self {
        EntityKey::Pod {
            node: node.to_string(),
            namespace: namespace.to_string(),
            pod: pod.to_string(),
        }
    }

    pub fn container(node: &str, namespace: &str, pod: &str, container: &str) -> Self {
        EntityKey::Container {
            node: node.to_string(),
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            container: container.to_string(),
        }
    }

    /// Name of the node that owns this entity.
    pub fn owning_node(&self) -> &str {
        match self {
            EntityKey::Node { node }
            | EntityKey::Pod { node, .. }
            | EntityKey::Container { node, .. } => node,
        }
    }

    /// Leaf name as shown in the table.
    pub fn name(&self) -> &str {
        match self {
            EntityKey::Node { node } => node,
            EntityKey::Pod { pod, .. } => pod,
            EntityKey::Container { container, .. } => container,
        }
    }

    /// Containers are leaves and never expand.
    pub fn is_expandable(&self) -> bool {
        !matches!(self, EntityKey::Container { .. })
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Node { node } => write!(f, "node/{node}"),
            EntityKey::Pod {
                node,
                namespace,
                pod,
            } => write!(f, "pod/{node}/{namespace}/{pod}"),
            EntityKey::Container {
                node,
                namespace,
                pod,
                container,
            } => write!(f, "container/{node}/{namespace}/{pod}/{container}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed entity key `{0}`")]
pub struct ParseKeyError(String);

impl FromStr for EntityKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            ["node", node] => Ok(EntityKey::node(node)),
            ["pod", node, namespace, pod] => Ok(EntityKey::pod(node, namespace, pod)),
            ["container", node, namespace, pod, container] => {
                Ok(EntityKey::container(node, namespace, pod, container))
            }
            _ => Err(ParseKeyError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keys_render_and_parse_back() {
        let key = EntityKey::container("n1", "default", "p1", "c1");
        assert_eq!(key.to_string(), "container/n1/default/p1/c1");
        assert_eq!("container/n1/default/p1/c1".parse::<EntityKey>(), Ok(key));
        assert_eq!("node/n1".parse::<EntityKey>(), Ok(EntityKey::node("n1")));
    }

    #[test]
    fn same_name_different_kind_is_a_different_key() {
        assert_ne!(
            EntityKey::node("x").to_string(),
            EntityKey::pod("x", "x", "x").to_string()
        );
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!("pod/n1/p1".parse::<EntityKey>().is_err());
        assert!("message".parse::<EntityKey>().is_err());
    }

    #[test]
    fn owning_node_and_name() {
        let key = EntityKey::pod("n2", "kube-system", "coredns");
        assert_eq!(key.owning_node(), "n2");
        assert_eq!(key.name(), "coredns");
        assert!(key.is_expandable());
        assert!(!EntityKey::container("n", "ns", "p", "c").is_expandable());
    }
}
