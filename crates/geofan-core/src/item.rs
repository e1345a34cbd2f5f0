use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized geolocation result record produced by a per-service
/// normalization adapter. Items are plain JSON objects; the `key`
/// member identifies the record for cross-service deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultItem(Value);

impl ResultItem {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The deduplication key, when the item carries one.
    pub fn dedup_key(&self) -> Option<&str> {
        self.0.get("key").and_then(Value::as_str)
    }
}

impl From<Value> for ResultItem {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Per-request tracking set for item keys already emitted, shared
/// across all services in a fan-out so duplicates collapse to the
/// first occurrence.
#[derive(Debug, Default)]
pub struct DedupKeys {
    seen: HashSet<String>,
}

impl DedupKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the key and reports whether it was new. Items without a
    /// key are never treated as duplicates.
    pub fn insert(&mut self, key: &str) -> bool {
        self.seen.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dedup_key_extraction() {
        let item = ResultItem::new(json!({"key": "ON-ottawa", "name": "Ottawa"}));
        assert_eq!(item.dedup_key(), Some("ON-ottawa"));

        let keyless = ResultItem::new(json!({"name": "Ottawa"}));
        assert_eq!(keyless.dedup_key(), None);
    }

    #[test]
    fn test_dedup_set_first_wins() {
        let mut keys = DedupKeys::new();
        assert!(keys.insert("ON-ottawa"));
        assert!(!keys.insert("ON-ottawa"));
        assert!(keys.contains("ON-ottawa"));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_transparent_serialization() {
        let item = ResultItem::new(json!({"key": "k1"}));
        let serialized = serde_json::to_string(&item).unwrap();
        assert_eq!(serialized, r#"{"key":"k1"}"#);
    }
}
