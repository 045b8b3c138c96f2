//! Mapping Kubernetes API objects onto the engine's inventory types.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::ResourceExt;
use kube::core::DynamicObject;
use ktop_core::ResourceQuantities;
use ktop_core::inventory::ContainerMetric;
use ktop_core::inventory::NodeInfo;
use ktop_core::inventory::NodeMetric;
use ktop_core::inventory::PodInfo;
use ktop_core::inventory::PodMetric;
use serde_json::Value;

fn quantities(map: Option<&BTreeMap<String, Quantity>>) -> ResourceQuantities {
    map.into_iter()
        .flatten()
        .map(|(name, quantity)| (name.as_str(), quantity.0.as_str()))
        .collect()
}

/// `{"cpu": "250m", "memory": "120Mi"}` as served by metrics.k8s.io.
fn usage_from_value(value: &Value) -> ResourceQuantities {
    value
        .as_object()
        .into_iter()
        .flatten()
        .filter_map(|(name, raw)| Some((name.as_str(), raw.as_str()?)))
        .collect()
}

/// Objects without a name are skipped.
pub(crate) fn node_info(node: &Node) -> Option<NodeInfo> {
    let status = node.status.as_ref();
    Some(NodeInfo {
        name: node.metadata.name.clone()?,
        capacity: quantities(status.and_then(|s| s.capacity.as_ref())),
        allocatable: quantities(status.and_then(|s| s.allocatable.as_ref())),
    })
}

pub(crate) fn pod_info(pod: &Pod) -> Option<PodInfo> {
    Some(PodInfo {
        name: pod.metadata.name.clone()?,
        namespace: pod.namespace().unwrap_or_default(),
        node_name: pod.spec.as_ref().and_then(|spec| spec.node_name.clone()),
    })
}

pub(crate) fn node_metric(object: &DynamicObject) -> Option<NodeMetric> {
    Some(NodeMetric {
        name: object.metadata.name.clone()?,
        usage: usage_from_value(&object.data["usage"]),
    })
}

pub(crate) fn pod_metric(object: &DynamicObject) -> Option<PodMetric> {
    let containers = object.data["containers"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|container| {
            Some(ContainerMetric {
                name: container["name"].as_str()?.to_string(),
                usage: usage_from_value(&container["usage"]),
            })
        })
        .collect();
    Some(PodMetric {
        name: object.metadata.name.clone()?,
        namespace: object.namespace().unwrap_or_default(),
        containers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn node_status_quantities_are_parsed() {
        let node: Node = serde_json::from_value(json!({
            "metadata": { "name": "n1" },
            "status": {
                "capacity": { "cpu": "4", "memory": "16393244Ki", "pods": "110" },
                "allocatable": { "cpu": "3800m", "memory": "15Gi" }
            }
        }))
        .unwrap();
        let info = node_info(&node).unwrap();
        assert_eq!(info.name, "n1");
        assert_eq!(info.capacity.cpu_millis(), 4000);
        assert_eq!(info.capacity.memory_bytes(), 16393244 * 1024);
        assert_eq!(info.capacity.get("pods"), Some(110));
        assert_eq!(info.allocatable.cpu_millis(), 3800);
        assert_eq!(info.allocatable.memory_bytes(), 15 << 30);
    }

    #[test]
    fn node_without_status_has_no_limits() {
        let node: Node = serde_json::from_value(json!({ "metadata": { "name": "n1" } })).unwrap();
        let info = node_info(&node).unwrap();
        assert!(info.capacity.is_empty());
        assert!(info.allocatable.is_empty());
    }

    #[test]
    fn pending_pod_has_no_node() {
        let pod: Pod = serde_json::from_value(json!({
            "metadata": { "name": "p1", "namespace": "kube-system" },
            "spec": { "containers": [{ "name": "c1" }] }
        }))
        .unwrap();
        assert_eq!(
            pod_info(&pod),
            Some(PodInfo {
                name: "p1".into(),
                namespace: "kube-system".into(),
                node_name: None,
            })
        );
    }

    #[test]
    fn pod_metrics_keep_every_container() {
        let object: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "metrics.k8s.io/v1beta1",
            "kind": "PodMetrics",
            "metadata": { "name": "p1", "namespace": "default" },
            "timestamp": "2024-01-01T00:00:00Z",
            "window": "15s",
            "containers": [
                { "name": "c1", "usage": { "cpu": "99500000n", "memory": "120Mi" } },
                { "name": "c2", "usage": { "cpu": "50m", "memory": "8388608" } },
                { "usage": { "cpu": "1m" } }
            ]
        }))
        .unwrap();
        let metric = pod_metric(&object).unwrap();
        assert_eq!(metric.namespace, "default");
        let names: Vec<_> = metric.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c1", "c2"]);
        assert_eq!(metric.containers[0].usage.cpu_millis(), 100);
        assert_eq!(metric.containers[1].usage.memory_bytes(), 8 << 20);
    }

    #[test]
    fn node_metrics_usage_is_read_from_data() {
        let object: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "metrics.k8s.io/v1beta1",
            "kind": "NodeMetrics",
            "metadata": { "name": "n1" },
            "usage": { "cpu": "912m", "memory": "2Gi" }
        }))
        .unwrap();
        let metric = node_metric(&object).unwrap();
        assert_eq!(metric.usage.cpu_millis(), 912);
        assert_eq!(metric.usage.memory_bytes(), 2 << 30);
    }
}
