//! Flattening a (snapshot, visibility) pair into display rows.

use crate::format;
use crate::key::EntityKey;
use crate::quantity::ResourceKind;
use crate::quantity::ResourceQuantities;
use crate::snapshot::Snapshot;
use crate::visibility::VisibilityState;

pub const RESOURCE_HEADERS: [&str; 4] = ["name", "namespace", "usage.cpu", "usage.memory"];
pub const MESSAGE_HEADERS: [&str; 1] = ["message"];
pub const NO_MATCH_MESSAGE: &str = "no nodes, pods, or containers match";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Node,
    Pod,
    Container,
    /// Informational row standing in for an empty tree.
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// `EntityKey` rendered as a string; empty for message rows.
    pub key: String,
    pub depth: u8,
    pub kind: RowKind,
    pub elems: Vec<String>,
}

impl Row {
    fn entity(
        key: &EntityKey,
        depth: u8,
        kind: RowKind,
        name: String,
        namespace: &str,
        usage: &ResourceQuantities,
    ) -> Self {
        Self {
            key: key.to_string(),
            depth,
            kind,
            elems: vec![
                name,
                namespace.to_string(),
                format::resource(ResourceKind::Cpu, usage),
                format::resource(ResourceKind::Memory, usage),
            ],
        }
    }

    pub fn message(text: &str) -> Self {
        Self {
            key: String::new(),
            depth: 0,
            kind: RowKind::Message,
            elems: vec![text.to_string()],
        }
    }

    pub fn entity_key(&self) -> Option<EntityKey> {
        match self.kind {
            RowKind::Message => None,
            _ => self.key.parse().ok(),
        }
    }

    pub fn is_expandable(&self) -> bool {
        matches!(self.kind, RowKind::Node | RowKind::Pod)
    }
}

/// Column headers matching the shape of `rows`.
pub fn headers(rows: &[Row]) -> &'static [&'static str] {
    match rows.first().map(|r| r.kind) {
        Some(RowKind::Message) | None => &MESSAGE_HEADERS,
        Some(_) => &RESOURCE_HEADERS,
    }
}

/// Depth-first walk: nodes and containers in name order, pods by namespace
/// then name. Node rows are always emitted; pods only under an expanded node;
/// containers only under an expanded pod of an expanded node. Only pod rows
/// fill the namespace cell. Never returns an empty list.
pub fn project(snapshot: &Snapshot, visibility: &VisibilityState) -> Vec<Row> {
    if snapshot.is_empty() {
        return vec![Row::message(NO_MATCH_MESSAGE)];
    }

    let mut rows = Vec::new();
    for (node_name, node) in &snapshot.nodes {
        let node_key = EntityKey::node(node_name);
        let node_open = visibility.contains(&node_key.to_string());
        rows.push(Row::entity(
            &node_key,
            0,
            RowKind::Node,
            format::node_name_field(node_name, node_open),
            "",
            &node.usage,
        ));
        if !node_open {
            continue;
        }

        for (id, pod) in &node.pods {
            let pod_key = EntityKey::pod(node_name, &id.namespace, &id.name);
            let pod_open = visibility.contains(&pod_key.to_string());
            rows.push(Row::entity(
                &pod_key,
                1,
                RowKind::Pod,
                format::pod_name_field(&id.name, pod_open),
                &id.namespace,
                &pod.usage,
            ));
            if !pod_open {
                continue;
            }

            for (container_name, container) in &pod.containers {
                let container_key =
                    EntityKey::container(node_name, &id.namespace, &id.name, container_name);
                rows.push(Row::entity(
                    &container_key,
                    2,
                    RowKind::Container,
                    format::container_name_field(container_name),
                    "",
                    &container.usage,
                ));
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ContainerUsage;
    use crate::snapshot::NodeUsage;
    use crate::snapshot::PodId;
    use crate::snapshot::PodUsage;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn usage(millis: u64) -> ResourceQuantities {
        ResourceQuantities::new()
            .with_cpu_millis(millis)
            .with_memory_bytes(millis << 20)
    }

    fn snapshot() -> Snapshot {
        let pod = |containers: &[(&str, u64)]| PodUsage {
            usage: usage(containers.iter().map(|(_, m)| m).sum()),
            containers: containers
                .iter()
                .map(|(n, m)| (n.to_string(), ContainerUsage { usage: usage(*m) }))
                .collect(),
        };
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "n2".to_string(),
            NodeUsage {
                usage: usage(10),
                pods: [(PodId::new("default", "b"), pod(&[("z", 1)]))].into(),
                ..Default::default()
            },
        );
        nodes.insert(
            "n1".to_string(),
            NodeUsage {
                usage: usage(900),
                pods: [
                    (PodId::new("default", "p2"), pod(&[("x", 3)])),
                    (PodId::new("default", "p1"), pod(&[("c2", 50), ("c1", 100)])),
                ]
                .into(),
                ..Default::default()
            },
        );
        Snapshot { nodes }
    }

    fn names(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.elems[0].as_str()).collect()
    }

    #[test]
    fn collapsed_tree_shows_sorted_nodes_only() {
        let rows = project(&snapshot(), &VisibilityState::new());
        assert_eq!(names(&rows), vec!["▶n1", "▶n2"]);
        assert_eq!(rows[0].elems, vec!["▶n1", "", "900m", "900Mi"]);
        assert_eq!(headers(&rows), &RESOURCE_HEADERS);
    }

    #[test]
    fn expanding_node_then_pod_reveals_sorted_children() {
        let mut visibility = VisibilityState::new();
        visibility.toggle("node/n1");
        visibility.toggle("pod/n1/default/p1");
        let rows = project(&snapshot(), &visibility);
        assert_eq!(
            names(&rows),
            vec!["▼n1", " ▼p1", "    c1", "    c2", " ▶p2", "▶n2"]
        );
        assert_eq!(
            rows.iter().map(|r| r.depth).collect::<Vec<_>>(),
            vec![0, 1, 2, 2, 1, 0]
        );
        assert_eq!(rows[1].elems[1], "default");
        assert_eq!(rows[1].elems[2], "150m");
        assert_eq!(rows[2].key, "container/n1/default/p1/c1");
        assert_eq!(rows[2].elems, vec!["    c1", "", "100m", "100Mi"]);
    }

    #[test]
    fn expanded_pod_under_collapsed_node_stays_hidden() {
        let mut visibility = VisibilityState::new();
        visibility.toggle("pod/n1/default/p1");
        let rows = project(&snapshot(), &visibility);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.kind == RowKind::Node));
    }

    #[test]
    fn empty_snapshot_projects_single_message_row() {
        let rows = project(&Snapshot::default(), &VisibilityState::new());
        assert_eq!(rows, vec![Row::message(NO_MATCH_MESSAGE)]);
        assert_eq!(headers(&rows), &MESSAGE_HEADERS);
        assert_eq!(rows[0].entity_key(), None);
        assert!(!rows[0].is_expandable());
    }

    #[test]
    fn same_named_pods_are_listed_per_namespace() {
        let node = NodeUsage {
            pods: [
                (PodId::new("staging", "web-0"), PodUsage::default()),
                (PodId::new("prod", "web-0"), PodUsage::default()),
                (PodId::new("prod", "api"), PodUsage::default()),
            ]
            .into(),
            ..Default::default()
        };
        let snapshot = Snapshot {
            nodes: [("n1".to_string(), node)].into(),
        };
        let mut visibility = VisibilityState::new();
        visibility.toggle("node/n1");
        let rows = project(&snapshot, &visibility);
        let pods: Vec<_> = rows[1..]
            .iter()
            .map(|r| (r.elems[0].as_str(), r.elems[1].as_str()))
            .collect();
        assert_eq!(
            pods,
            vec![(" ▶api", "prod"), (" ▶web-0", "prod"), (" ▶web-0", "staging")]
        );
        assert_eq!(rows[3].key, "pod/n1/staging/web-0");
    }

    #[test]
    fn row_keys_parse_back_to_entities() {
        let rows = project(&snapshot(), &VisibilityState::new());
        assert_eq!(rows[1].entity_key(), Some(EntityKey::node("n2")));
    }
}
