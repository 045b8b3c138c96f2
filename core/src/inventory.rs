//! Raw, unfiltered results of one fetch cycle and the trait that produces them.

use async_trait::async_trait;

use crate::error::Result;
use crate::quantity::ResourceQuantities;

/// Node metadata from the inventory list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeInfo {
    pub name: String,
    pub capacity: ResourceQuantities,
    pub allocatable: ResourceQuantities,
}

/// Current usage of one node as reported by the metrics API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMetric {
    pub name: String,
    pub usage: ResourceQuantities,
}

/// Pod metadata: where it is scheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    /// `None` for pods that are not yet scheduled.
    pub node_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerMetric {
    pub name: String,
    pub usage: ResourceQuantities,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodMetric {
    pub name: String,
    pub namespace: String,
    pub containers: Vec<ContainerMetric>,
}

/// Everything a single refresh needs, straight from the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub nodes: Vec<NodeInfo>,
    pub node_metrics: Vec<NodeMetric>,
    pub pods: Vec<PodInfo>,
    pub pod_metrics: Vec<PodMetric>,
}

/// Supplies node/pod inventory and usage metrics on demand.
///
/// Any failing list or metrics call must fail the whole fetch.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(&self) -> Result<Inventory>;
}
