//! Display strings for table cells and graph labels.

use crate::quantity::ResourceKind;
use crate::quantity::ResourceQuantities;

pub const COLLAPSED: &str = "▶";
pub const EXPANDED: &str = "▼";

const MIB: u64 = 1024 * 1024;

fn disclosure(expanded: bool) -> &'static str {
    if expanded { EXPANDED } else { COLLAPSED }
}

pub fn node_name_field(name: &str, expanded: bool) -> String {
    format!("{}{name}", disclosure(expanded))
}

pub fn pod_name_field(name: &str, expanded: bool) -> String {
    format!(" {}{name}", disclosure(expanded))
}

/// Containers have no disclosure glyph; they are indented past the pod's
/// glyph column instead. The indent uses the glyph's UTF-8 byte length.
pub fn container_name_field(name: &str) -> String {
    let indent = COLLAPSED.len() + 1;
    format!("{:indent$}{name}", "")
}

pub fn cpu(millis: u64) -> String {
    format!("{millis}m")
}

pub fn memory(bytes: u64) -> String {
    format!("{}Mi", bytes / MIB)
}

/// Numeric value plotted on a graph: millicores for CPU, MiB for memory.
pub fn plot_value(kind: ResourceKind, amount: u64) -> f64 {
    match kind {
        ResourceKind::Cpu => amount as f64,
        ResourceKind::Memory => (amount / MIB) as f64,
    }
}

/// Formatted cell for one resource, `-` when the resource was never reported.
pub fn resource(kind: ResourceKind, quantities: &ResourceQuantities) -> String {
    match (kind, quantities.kind(kind)) {
        (ResourceKind::Cpu, Some(millis)) => cpu(millis),
        (ResourceKind::Memory, Some(bytes)) => memory(bytes),
        (_, None) => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn name_fields_carry_disclosure_and_indent() {
        assert_eq!(node_name_field("n1", false), "▶n1");
        assert_eq!(node_name_field("n1", true), "▼n1");
        assert_eq!(pod_name_field("p1", false), " ▶p1");
        assert_eq!(pod_name_field("p1", true), " ▼p1");
        assert_eq!(container_name_field("c1"), "    c1");
    }

    #[test]
    fn resource_cells() {
        let q = ResourceQuantities::new()
            .with_cpu_millis(150)
            .with_memory_bytes(3 * MIB + 12);
        assert_eq!(resource(ResourceKind::Cpu, &q), "150m");
        assert_eq!(resource(ResourceKind::Memory, &q), "3Mi");
        assert_eq!(resource(ResourceKind::Cpu, &ResourceQuantities::new()), "-");
    }

    #[test]
    fn plot_values_use_display_units() {
        assert_eq!(plot_value(ResourceKind::Cpu, 250), 250.0);
        assert_eq!(plot_value(ResourceKind::Memory, 5 * MIB + 1), 5.0);
    }
}
