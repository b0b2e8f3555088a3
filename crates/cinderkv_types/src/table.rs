//! String-keyed map payload.

use crate::error::{TypeError, TypeResult};
use crate::kind::Kind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A string-keyed map of arbitrary JSON values, with an optional
/// time-to-live.
///
/// JSON binding shape: `{"table": {"name": "dinner", "count": 2}, "ttl": 0}`.
/// Values are opaque trees; the engine never inspects them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// The map contents.
    pub table: HashMap<String, Value>,
    /// Time-to-live in seconds; 0 means no expiry.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl Table {
    /// Creates an empty table with no expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the map to msgpack value bytes.
    pub fn to_value_bytes(&self) -> TypeResult<Vec<u8>> {
        Ok(rmp_serde::to_vec(&self.table)?)
    }

    /// Decodes a table from record value bytes, checking the stored kind.
    pub fn from_value_bytes(kind: Kind, bytes: &[u8]) -> TypeResult<Self> {
        if kind != Kind::Table {
            return Err(TypeError::kind_mismatch(Kind::Table, kind));
        }
        let table: HashMap<String, Value> = rmp_serde::from_slice(bytes)?;
        Ok(Self { table, ttl: 0 })
    }

    /// Inserts or replaces an item.
    pub fn add_item(&mut self, key: impl Into<String>, value: Value) {
        self.table.insert(key.into(), value);
    }

    /// Removes an item.
    pub fn remove_item(&mut self, key: &str) {
        self.table.remove(key);
    }

    /// Checks whether the table contains `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Returns an item by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.table.get(key)
    }

    /// Returns the item count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true when the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_bytes_round_trip() {
        let mut table = Table::new();
        table.add_item("name", json!("dinner"));
        table.add_item("count", json!(2));
        table.add_item("tags", json!(["a", "b"]));

        let bytes = table.to_value_bytes().unwrap();
        let back = Table::from_value_bytes(Kind::Table, &bytes).unwrap();
        assert_eq!(back.get("name"), Some(&json!("dinner")));
        assert_eq!(back.get("tags"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn rejects_other_kinds() {
        let bytes = Table::new().to_value_bytes().unwrap();
        assert!(Table::from_value_bytes(Kind::Collection, &bytes).is_err());
    }

    #[test]
    fn json_binding_shape() {
        let table: Table = serde_json::from_str(r#"{"table":{"k":[1,2,3]}}"#).unwrap();
        assert_eq!(table.get("k"), Some(&json!([1, 2, 3])));
        assert_eq!(table.ttl, 0);
    }

    #[test]
    fn item_operations() {
        let mut table = Table::new();
        table.add_item("k", json!(1));
        assert!(table.contains_key("k"));
        table.remove_item("k");
        assert!(table.is_empty());
    }
}
