//! The node → pod → container usage tree for one refresh.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::filter::Filters;
use crate::inventory::Inventory;
use crate::key::EntityKey;
use crate::quantity::ResourceQuantities;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerUsage {
    pub usage: ResourceQuantities,
}

/// A pod's identity within a node: names are only unique per namespace.
/// Orders by namespace, then name.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PodId {
    pub namespace: String,
    pub name: String,
}

impl PodId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodUsage {
    /// Sum over every container of the pod, including ones hidden by the
    /// container filter.
    pub usage: ResourceQuantities,
    pub containers: BTreeMap<String, ContainerUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeUsage {
    pub capacity: ResourceQuantities,
    pub allocatable: ResourceQuantities,
    pub usage: ResourceQuantities,
    pub pods: BTreeMap<PodId, PodUsage>,
}

/// Usage of a single entity together with the limits of the node it runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEntity<'a> {
    pub usage: &'a ResourceQuantities,
    pub allocatable: &'a ResourceQuantities,
    pub capacity: &'a ResourceQuantities,
}

/// Immutable once built. Maps are ordered so every walk is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub nodes: BTreeMap<String, NodeUsage>,
}

impl Snapshot {
    /// Build the tree from one fetch cycle.
    ///
    /// Nodes are taken from the node metrics that pass the node filter; their
    /// capacity/allocatable come from the node list by exact name and are
    /// empty when the node is missing there. Pods pass on their name alone
    /// and are dropped when their node did not make it into the tree. A pod
    /// metric is matched to its pod by namespace and name; only a metric
    /// without a namespace falls back to the name.
    pub fn build(inventory: &Inventory, filters: &Filters) -> Self {
        let node_status: HashMap<&str, _> = inventory
            .nodes
            .iter()
            .map(|n| (n.name.as_str(), n))
            .collect();

        let mut nodes = BTreeMap::new();
        for metric in inventory
            .node_metrics
            .iter()
            .filter(|m| filters.match_node(&m.name))
        {
            let (capacity, allocatable) = match node_status.get(metric.name.as_str()) {
                Some(info) => (info.capacity.clone(), info.allocatable.clone()),
                None => Default::default(),
            };
            nodes.insert(
                metric.name.clone(),
                NodeUsage {
                    capacity,
                    allocatable,
                    usage: metric.usage.clone(),
                    pods: BTreeMap::new(),
                },
            );
        }

        // Assignment is resolved from the unfiltered pod list.
        let by_namespaced_name: HashMap<(&str, &str), Option<&str>> = inventory
            .pods
            .iter()
            .map(|p| ((p.namespace.as_str(), p.name.as_str()), p.node_name.as_deref()))
            .collect();
        let by_name: HashMap<&str, Option<&str>> = inventory
            .pods
            .iter()
            .map(|p| (p.name.as_str(), p.node_name.as_deref()))
            .collect();

        for metric in inventory
            .pod_metrics
            .iter()
            .filter(|m| filters.match_pod(&m.name))
        {
            let assigned = if metric.namespace.is_empty() {
                by_name.get(metric.name.as_str())
            } else {
                by_namespaced_name.get(&(metric.namespace.as_str(), metric.name.as_str()))
            };
            let assigned = assigned.copied().flatten();
            let Some(node) = assigned.and_then(|name| nodes.get_mut(name)) else {
                continue;
            };

            let usage = ResourceQuantities::sum(metric.containers.iter().map(|c| &c.usage));
            let containers = metric
                .containers
                .iter()
                .filter(|c| filters.match_container(&c.name))
                .map(|c| {
                    (
                        c.name.clone(),
                        ContainerUsage {
                            usage: c.usage.clone(),
                        },
                    )
                })
                .collect();
            node.pods.insert(
                PodId::new(metric.namespace.as_str(), metric.name.as_str()),
                PodUsage { usage, containers },
            );
        }

        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn pod_count(&self) -> usize {
        self.nodes.values().map(|n| n.pods.len()).sum()
    }

    pub fn container_count(&self) -> usize {
        self.nodes
            .values()
            .flat_map(|n| n.pods.values())
            .map(|p| p.containers.len())
            .sum()
    }

    /// Look an entity up by key. Pods and containers are found by namespace
    /// and name; a pod that moved namespaces is a new entity.
    pub fn resolve(&self, key: &EntityKey) -> Option<ResolvedEntity<'_>> {
        let node = self.nodes.get(key.owning_node())?;
        let usage = match key {
            EntityKey::Node { .. } => &node.usage,
            EntityKey::Pod { namespace, pod, .. } => {
                &node.pods.get(&PodId::new(namespace.as_str(), pod.as_str()))?.usage
            }
            EntityKey::Container {
                namespace,
                pod,
                container,
                ..
            } => {
                let pod = node.pods.get(&PodId::new(namespace.as_str(), pod.as_str()))?;
                &pod.containers.get(container)?.usage
            }
        };
        Some(ResolvedEntity {
            usage,
            allocatable: &node.allocatable,
            capacity: &node.capacity,
        })
    }
}
