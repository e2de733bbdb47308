//! Entity Registry Metrics

use std::collections::BTreeMap;

use super::ContainerMetrics;

/// Snapshot of an [`EntityRegistry`](crate::EntityRegistry)'s counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryMetrics {
    /// Entities stored by name.
    pub entries: usize,
    /// Entities reachable by token.
    pub tokens: usize,
    /// Current structural version.
    pub version: u64,
    /// Successful `add` calls.
    pub adds: u64,
    /// Successful `remove` calls.
    pub removes: u64,
    /// Successful `rename` calls.
    pub renames: u64,
    /// `set` calls that replaced an existing value.
    pub overwrites: u64,
}

impl RegistryMetrics {
    /// Converts the snapshot to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("entries".to_string(), self.entries as f64);
        metrics.insert("tokens".to_string(), self.tokens as f64);
        metrics.insert(
            "untokened_entries".to_string(),
            self.entries.saturating_sub(self.tokens) as f64,
        );
        metrics.insert("version".to_string(), self.version as f64);
        metrics.insert("adds".to_string(), self.adds as f64);
        metrics.insert("removes".to_string(), self.removes as f64);
        metrics.insert("renames".to_string(), self.renames as f64);
        metrics.insert("overwrites".to_string(), self.overwrites as f64);

        metrics
    }
}

impl ContainerMetrics for RegistryMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn container_name(&self) -> &'static str {
        "EntityRegistry"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_metrics_report() {
        let snapshot = RegistryMetrics {
            entries: 4,
            tokens: 3,
            version: 9,
            adds: 4,
            ..RegistryMetrics::default()
        };
        let metrics = snapshot.metrics();
        assert_eq!(metrics["entries"], 4.0);
        assert_eq!(metrics["untokened_entries"], 1.0);
        assert_eq!(metrics["version"], 9.0);
        assert_eq!(
            metrics.keys().next().map(String::as_str),
            Some("adds")
        );
    }
}
