//! Per-request accumulation of newly observed lookup-table codes.

use geofan_providers::{Table, TableMap};
use serde_json::Value;

/// Accumulates codes discovered during one request, keyed by table
/// namespace. Namespaces are seeded from the loaded table names so an
/// empty accumulator still knows what it may be asked to track.
/// Non-empty namespaces trigger exactly one whole-table persistence
/// call at end of request.
#[derive(Debug, Default)]
pub struct TableUpdateAggregator {
    updates: TableMap,
}

impl TableUpdateAggregator {
    /// Seeds the accumulator with one empty namespace per known table.
    pub fn seeded<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        let mut updates = TableMap::new();
        for name in names {
            updates.insert(name.clone(), Table::new());
        }
        Self { updates }
    }

    /// Records one discovered code.
    pub fn record(&mut self, table: &str, code: &str, value: Value) {
        self.updates
            .entry(table.to_string())
            .or_default()
            .insert(code.to_string(), value);
    }

    /// Merges a batch of discovered codes, namespace by namespace.
    pub fn record_map(&mut self, batch: &TableMap) {
        for (table, codes) in batch {
            let namespace = self.updates.entry(table.clone()).or_default();
            for (code, value) in codes {
                namespace.insert(code.clone(), value.clone());
            }
        }
    }

    /// Names of namespaces that accumulated at least one code.
    pub fn dirty_tables(&self) -> Vec<&str> {
        self.updates
            .iter()
            .filter(|(_, codes)| !codes.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// The accumulated codes for one namespace.
    pub fn updates_for(&self, table: &str) -> Option<&Table> {
        self.updates.get(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seeded_namespaces_start_clean() {
        let names = vec!["generic".to_string(), "province".to_string()];
        let aggregator = TableUpdateAggregator::seeded(&names);
        assert!(aggregator.dirty_tables().is_empty());
    }

    #[test]
    fn test_two_sources_merge_into_one_namespace() {
        let names = vec!["province".to_string()];
        let mut aggregator = TableUpdateAggregator::seeded(&names);

        // Two services independently report codes for the same table.
        aggregator.record("province", "NB", json!("NB"));
        let mut batch = TableMap::new();
        let mut codes = Table::new();
        codes.insert("YT".to_string(), json!("YT"));
        batch.insert("province".to_string(), codes);
        aggregator.record_map(&batch);

        assert_eq!(aggregator.dirty_tables(), vec!["province"]);
        let updates = aggregator.updates_for("province").unwrap();
        assert!(updates.contains_key("NB"));
        assert!(updates.contains_key("YT"));
    }

    #[test]
    fn test_unseeded_namespace_is_created() {
        let mut aggregator = TableUpdateAggregator::default();
        aggregator.record("generic", "hwy", json!("highway"));
        assert_eq!(aggregator.dirty_tables(), vec!["generic"]);
    }
}
