//! Resource quantities and Kubernetes quantity-string parsing.
//!
//! CPU is held in millicores and memory in bytes. Any other named resource
//! (`ephemeral-storage`, `nvidia.com/gpu`, ...) is held in whole base units.
//! Parsing rounds up, matching `MilliValue()`/`Value()` on the API side.

use std::collections::BTreeMap;
use std::fmt;

pub const CPU: &str = "cpu";
pub const MEMORY: &str = "memory";

/// The two resources the dashboard graphs and tabulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Cpu, ResourceKind::Memory];

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Cpu => CPU,
            ResourceKind::Memory => MEMORY,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of named resource amounts. Missing entries are distinct from zero:
/// a node whose status was never reported has no `cpu` entry at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuantities {
    values: BTreeMap<String, u64>,
}

impl ResourceQuantities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero CPU and memory, present. Starting point for aggregations.
    pub fn zeroed() -> Self {
        Self::new().with_cpu_millis(0).with_memory_bytes(0)
    }

    pub fn with_cpu_millis(mut self, millis: u64) -> Self {
        self.values.insert(CPU.to_string(), millis);
        self
    }

    pub fn with_memory_bytes(mut self, bytes: u64) -> Self {
        self.values.insert(MEMORY.to_string(), bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, amount: u64) {
        self.values.insert(name.into(), amount);
    }

    /// Parse a raw quantity string for `name` and store it. CPU is stored in
    /// millicores, everything else in base units. Unparseable values are
    /// skipped so one odd entry never poisons a whole node.
    pub fn insert_quantity(&mut self, name: &str, raw: &str) {
        let scale = if name == CPU { 3 } else { 0 };
        match parse_quantity(raw, scale) {
            Some(amount) => {
                self.values.insert(name.to_string(), amount);
            }
            None => tracing::debug!(resource = name, raw, "ignoring unparseable quantity"),
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }

    pub fn kind(&self, kind: ResourceKind) -> Option<u64> {
        self.get(kind.name())
    }

    pub fn cpu_millis(&self) -> u64 {
        self.kind(ResourceKind::Cpu).unwrap_or(0)
    }

    pub fn memory_bytes(&self) -> u64 {
        self.kind(ResourceKind::Memory).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add every entry of `other` into `self`, saturating.
    pub fn accumulate(&mut self, other: &ResourceQuantities) {
        for (name, amount) in &other.values {
            let slot = self.values.entry(name.clone()).or_insert(0);
            *slot = slot.saturating_add(*amount);
        }
    }

    /// Sum of all inputs. CPU and memory are always present in the result,
    /// even for an empty iterator.
    pub fn sum<'a>(items: impl IntoIterator<Item = &'a ResourceQuantities>) -> Self {
        let mut total = Self::zeroed();
        for item in items {
            total.accumulate(item);
        }
        total
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ResourceQuantities {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut quantities = ResourceQuantities::new();
        for (name, raw) in iter {
            quantities.insert_quantity(name, raw);
        }
        quantities
    }
}

enum Suffix {
    Decimal(i32),
    Binary(u32),
}

const BINARY_SUFFIXES: [(&str, u32); 6] = [
    ("Ki", 10),
    ("Mi", 20),
    ("Gi", 30),
    ("Ti", 40),
    ("Pi", 50),
    ("Ei", 60),
];

const DECIMAL_SUFFIXES: [(&str, i32); 9] = [
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

fn split_suffix(raw: &str) -> (&str, Suffix) {
    for (suffix, power) in BINARY_SUFFIXES {
        if let Some(number) = raw.strip_suffix(suffix) {
            return (number, Suffix::Binary(power));
        }
    }
    // Scientific notation (`1e3`, `5E-2`) must be checked before the bare
    // `E` exa suffix.
    if let Some(idx) = raw.find(['e', 'E']) {
        let (number, exponent) = (&raw[..idx], &raw[idx + 1..]);
        if !exponent.is_empty()
            && let Ok(exp) = exponent.parse::<i32>()
        {
            return (number, Suffix::Decimal(exp));
        }
    }
    for (suffix, exp) in DECIMAL_SUFFIXES {
        if let Some(number) = raw.strip_suffix(suffix) {
            return (number, Suffix::Decimal(exp));
        }
    }
    (raw, Suffix::Decimal(0))
}

fn pow10(exp: u32) -> Option<u128> {
    10u128.checked_pow(exp)
}

/// Parse a Kubernetes quantity (`"250m"`, `"1"`, `"128974848"`, `"64Mi"`,
/// `"12345n"`, `"1e3"`) and return `ceil(value * 10^scale)`.
///
/// Negative and malformed quantities yield `None`. Values that overflow
/// saturate at `u64::MAX`.
pub fn parse_quantity(raw: &str, scale: i32) -> Option<u64> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    if raw.is_empty() || raw.starts_with('-') {
        return None;
    }

    let (number, suffix) = split_suffix(raw);
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let digits: String = format!("{int_part}{frac_part}");
    let digits = digits.trim_start_matches('0');
    let mut numerator: u128 = if digits.is_empty() {
        0
    } else {
        match digits.parse::<u128>() {
            Ok(n) => n,
            Err(_) => return Some(u64::MAX),
        }
    };
    let mut denominator: u128 = pow10(u32::try_from(frac_part.len()).ok()?)?;

    let exp10 = match suffix {
        Suffix::Decimal(exp) => exp.checked_add(scale)?,
        Suffix::Binary(power) => {
            numerator = match numerator.checked_mul(1u128 << power) {
                Some(n) => n,
                None => return Some(u64::MAX),
            };
            scale
        }
    };
    if exp10 >= 0 {
        let factor = match pow10(exp10.unsigned_abs()) {
            Some(f) => f,
            None if numerator == 0 => return Some(0),
            None => return Some(u64::MAX),
        };
        numerator = match numerator.checked_mul(factor) {
            Some(n) => n,
            None => return Some(u64::MAX),
        };
    } else {
        denominator = match pow10(exp10.unsigned_abs()).and_then(|f| denominator.checked_mul(f)) {
            Some(d) => d,
            // Too small to register even one unit; anything non-zero rounds up to 1.
            None => return Some(u64::from(numerator > 0)),
        };
    }

    let value = numerator.div_ceil(denominator);
    Some(u64::try_from(value).unwrap_or(u64::MAX))
}

pub fn parse_cpu_millis(raw: &str) -> Option<u64> {
    parse_quantity(raw, 3)
}

pub fn parse_memory_bytes(raw: &str) -> Option<u64> {
    parse_quantity(raw, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_cpu_quantities_into_millicores() {
        assert_eq!(parse_cpu_millis("250m"), Some(250));
        assert_eq!(parse_cpu_millis("1"), Some(1000));
        assert_eq!(parse_cpu_millis("1.5"), Some(1500));
        assert_eq!(parse_cpu_millis("4"), Some(4000));
        // metrics-server reports nanocores; round up like MilliValue().
        assert_eq!(parse_cpu_millis("12345678n"), Some(13));
        assert_eq!(parse_cpu_millis("1n"), Some(1));
        assert_eq!(parse_cpu_millis("0"), Some(0));
        assert_eq!(parse_cpu_millis("500u"), Some(1));
    }

    #[test]
    fn parses_memory_quantities_into_bytes() {
        assert_eq!(parse_memory_bytes("128974848"), Some(128_974_848));
        assert_eq!(parse_memory_bytes("64Mi"), Some(64 * 1024 * 1024));
        assert_eq!(parse_memory_bytes("1Gi"), Some(1 << 30));
        assert_eq!(parse_memory_bytes("16318664Ki"), Some(16_318_664 * 1024));
        assert_eq!(parse_memory_bytes("1k"), Some(1000));
        assert_eq!(parse_memory_bytes("129M"), Some(129_000_000));
        assert_eq!(parse_memory_bytes("1e3"), Some(1000));
        assert_eq!(parse_memory_bytes("1E"), Some(1_000_000_000_000_000_000));
        assert_eq!(parse_memory_bytes("0.5Ki"), Some(512));
    }

    #[test]
    fn rejects_malformed_quantities() {
        assert_eq!(parse_memory_bytes(""), None);
        assert_eq!(parse_memory_bytes("-1"), None);
        assert_eq!(parse_memory_bytes("abc"), None);
        assert_eq!(parse_memory_bytes("1Xi"), None);
        assert_eq!(parse_memory_bytes("."), None);
    }

    #[test]
    fn huge_quantities_saturate() {
        assert_eq!(parse_memory_bytes("100Ei"), Some(u64::MAX));
        assert_eq!(parse_cpu_millis("1e30"), Some(u64::MAX));
    }

    #[test]
    fn sum_keeps_cpu_and_memory_present() {
        let empty = ResourceQuantities::sum(std::iter::empty());
        assert_eq!(empty.kind(ResourceKind::Cpu), Some(0));
        assert_eq!(empty.kind(ResourceKind::Memory), Some(0));

        let a = ResourceQuantities::new().with_cpu_millis(100).with_memory_bytes(10);
        let b: ResourceQuantities = [("cpu", "50m"), ("nvidia.com/gpu", "1")]
            .into_iter()
            .collect();
        let total = ResourceQuantities::sum([&a, &b]);
        assert_eq!(total.cpu_millis(), 150);
        assert_eq!(total.memory_bytes(), 10);
        assert_eq!(total.get("nvidia.com/gpu"), Some(1));
    }
}
