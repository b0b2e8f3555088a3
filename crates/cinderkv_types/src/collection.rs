//! Ordered list payload.

use crate::error::{TypeError, TypeResult};
use crate::kind::Kind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered list of arbitrary JSON values, with an optional time-to-live.
///
/// JSON binding shape: `{"collection": [1, "two", {"three": 3}], "ttl": 0}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// The list contents.
    pub collection: Vec<Value>,
    /// Time-to-live in seconds; 0 means no expiry.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl Collection {
    /// Creates an empty collection with no expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the list to msgpack value bytes.
    pub fn to_value_bytes(&self) -> TypeResult<Vec<u8>> {
        Ok(rmp_serde::to_vec(&self.collection)?)
    }

    /// Decodes a collection from record value bytes, checking the stored
    /// kind.
    pub fn from_value_bytes(kind: Kind, bytes: &[u8]) -> TypeResult<Self> {
        if kind != Kind::Collection {
            return Err(TypeError::kind_mismatch(Kind::Collection, kind));
        }
        let collection: Vec<Value> = rmp_serde::from_slice(bytes)?;
        Ok(Self { collection, ttl: 0 })
    }

    /// Appends an item.
    pub fn add_item(&mut self, item: Value) {
        self.collection.push(item);
    }

    /// Returns the item at `index`.
    #[must_use]
    pub fn get_item(&self, index: usize) -> Option<&Value> {
        self.collection.get(index)
    }

    /// Removes the first occurrence of `item`, returning whether one was
    /// removed.
    pub fn remove_item(&mut self, item: &Value) -> bool {
        if let Some(pos) = self.collection.iter().position(|v| v == item) {
            self.collection.remove(pos);
            return true;
        }
        false
    }

    /// Returns the item count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    /// Returns true when the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }
}
