//! Rolling usage history for the currently selected entity.

use std::collections::VecDeque;

use crate::format;
use crate::key::EntityKey;
use crate::quantity::ResourceKind;
use crate::quantity::ResourceQuantities;
use crate::snapshot::Snapshot;

pub const DEFAULT_HISTORY: usize = 256;

/// What the renderer needs to draw one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSeries {
    pub title: &'static str,
    /// Oldest first.
    pub values: Vec<f64>,
    /// Allocatable of the owning node, in the same unit as `values`.
    pub limit: Option<f64>,
    pub usage_label: String,
    pub limit_label: String,
}

#[derive(Debug, Clone, Default)]
struct Track {
    values: VecDeque<f64>,
    limit: Option<f64>,
    usage_label: String,
    limit_label: String,
}

impl Track {
    fn clear(&mut self) {
        self.values.clear();
        self.limit = None;
        self.usage_label.clear();
        self.limit_label.clear();
    }

    fn push(
        &mut self,
        kind: ResourceKind,
        usage: &ResourceQuantities,
        allocatable: &ResourceQuantities,
        capacity: usize,
    ) {
        let amount = usage.kind(kind).unwrap_or(0);
        while self.values.len() >= capacity {
            self.values.pop_front();
        }
        self.values.push_back(format::plot_value(kind, amount));
        self.usage_label = format!("usage: {}", format::resource(kind, usage));
        self.limit = allocatable.kind(kind).map(|a| format::plot_value(kind, a));
        self.limit_label = format!("allocatable: {}", format::resource(kind, allocatable));
    }
}

/// Bounded CPU and memory histories tied to one entity key.
///
/// Samples of two different entities never share a history: observing a key
/// other than the tracked one starts over.
#[derive(Debug, Clone)]
pub struct GraphFeed {
    capacity: usize,
    tracked: Option<String>,
    cpu: Track,
    memory: Track,
}

impl Default for GraphFeed {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl GraphFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tracked: None,
            cpu: Track::default(),
            memory: Track::default(),
        }
    }

    /// Record one sample for `selected_key` from `snapshot`.
    ///
    /// When the key is missing from the snapshot (the entity vanished or was
    /// filtered away) or is `None` (informational row), the history is
    /// cleared and nothing is recorded. Returns whether a sample was taken.
    pub fn observe(&mut self, selected_key: Option<&str>, snapshot: &Snapshot) -> bool {
        let resolved = selected_key.and_then(|key| {
            let entity = key.parse::<EntityKey>().ok()?;
            snapshot.resolve(&entity)
        });
        let (Some(key), Some(entity)) = (selected_key, resolved) else {
            self.clear();
            return false;
        };

        if self.tracked.as_deref() != Some(key) {
            self.clear();
            self.tracked = Some(key.to_string());
        }
        self.cpu.push(
            ResourceKind::Cpu,
            entity.usage,
            entity.allocatable,
            self.capacity,
        );
        self.memory.push(
            ResourceKind::Memory,
            entity.usage,
            entity.allocatable,
            self.capacity,
        );
        true
    }

    pub fn clear(&mut self) {
        self.tracked = None;
        self.cpu.clear();
        self.memory.clear();
    }

    pub fn tracked_key(&self) -> Option<&str> {
        self.tracked.as_deref()
    }

    pub fn len(&self) -> usize {
        self.cpu.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.values.is_empty()
    }

    pub fn series(&self, kind: ResourceKind) -> GraphSeries {
        let (title, track) = match kind {
            ResourceKind::Cpu => ("CPU", &self.cpu),
            ResourceKind::Memory => ("Memory", &self.memory),
        };
        GraphSeries {
            title,
            values: track.values.iter().copied().collect(),
            limit: track.limit,
            usage_label: track.usage_label.clone(),
            limit_label: track.limit_label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::NodeUsage;
    use crate::snapshot::PodId;
    use crate::snapshot::PodUsage;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn snapshot(node_cpu: u64, pod_cpu: u64) -> Snapshot {
        let pod = PodUsage {
            usage: ResourceQuantities::new()
                .with_cpu_millis(pod_cpu)
                .with_memory_bytes(64 << 20),
            containers: BTreeMap::new(),
        };
        let node = NodeUsage {
            allocatable: ResourceQuantities::new()
                .with_cpu_millis(4000)
                .with_memory_bytes(8 << 30),
            usage: ResourceQuantities::new()
                .with_cpu_millis(node_cpu)
                .with_memory_bytes(1 << 30),
            pods: [(PodId::new("default", "p1"), pod)].into(),
            ..Default::default()
        };
        Snapshot {
            nodes: [("n1".to_string(), node)].into(),
        }
    }

    #[test]
    fn node_samples_carry_allocatable_limit() {
        let mut feed = GraphFeed::new(10);
        assert!(feed.observe(Some("node/n1"), &snapshot(900, 150)));
        assert!(feed.observe(Some("node/n1"), &snapshot(950, 150)));
        let cpu = feed.series(ResourceKind::Cpu);
        assert_eq!(cpu.values, vec![900.0, 950.0]);
        assert_eq!(cpu.limit, Some(4000.0));
        assert_eq!(cpu.usage_label, "usage: 950m");
        assert_eq!(cpu.limit_label, "allocatable: 4000m");
        let memory = feed.series(ResourceKind::Memory);
        assert_eq!(memory.values, vec![1024.0, 1024.0]);
        assert_eq!(memory.limit, Some(8192.0));
    }

    #[test]
    fn pod_samples_use_owning_node_limit() {
        let mut feed = GraphFeed::new(10);
        feed.observe(Some("pod/n1/default/p1"), &snapshot(900, 150));
        let cpu = feed.series(ResourceKind::Cpu);
        assert_eq!(cpu.values, vec![150.0]);
        assert_eq!(cpu.limit, Some(4000.0));
    }

    #[test]
    fn vanished_key_clears_history_without_sample() {
        let mut feed = GraphFeed::new(10);
        feed.observe(Some("pod/n1/default/p1"), &snapshot(900, 150));
        assert!(!feed.observe(Some("pod/n1/default/evicted"), &snapshot(900, 150)));
        assert!(feed.is_empty());
        assert_eq!(feed.tracked_key(), None);
        assert!(!feed.observe(None, &snapshot(900, 150)));
        assert!(feed.is_empty());
    }

    #[test]
    fn switching_entities_starts_a_new_history() {
        let mut feed = GraphFeed::new(10);
        feed.observe(Some("node/n1"), &snapshot(900, 150));
        feed.observe(Some("pod/n1/default/p1"), &snapshot(900, 150));
        assert_eq!(feed.series(ResourceKind::Cpu).values, vec![150.0]);
    }

    #[test]
    fn history_is_bounded() {
        let mut feed = GraphFeed::new(3);
        for cpu in 1..=5 {
            feed.observe(Some("node/n1"), &snapshot(cpu, 0));
        }
        assert_eq!(feed.series(ResourceKind::Cpu).values, vec![3.0, 4.0, 5.0]);
    }
}
