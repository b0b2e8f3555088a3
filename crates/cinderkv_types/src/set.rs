//! Unordered string set payload.

use crate::error::{TypeError, TypeResult};
use crate::kind::Kind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An unordered string set with an optional time-to-live.
///
/// JSON binding shape: `{"set": {"a": true, "b": true}, "ttl": 0}`. Members
/// are map keys so the wire shape matches the original string->bool map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Set {
    /// The set members.
    pub set: HashMap<String, bool>,
    /// Time-to-live in seconds; 0 means no expiry.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl Set {
    /// Creates an empty set with no expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the members to msgpack value bytes.
    pub fn to_value_bytes(&self) -> TypeResult<Vec<u8>> {
        Ok(rmp_serde::to_vec(&self.set)?)
    }

    /// Decodes a set from record value bytes, checking the stored kind.
    pub fn from_value_bytes(kind: Kind, bytes: &[u8]) -> TypeResult<Self> {
        if kind != Kind::Set {
            return Err(TypeError::kind_mismatch(Kind::Set, kind));
        }
        let set: HashMap<String, bool> = rmp_serde::from_slice(bytes)?;
        Ok(Self { set, ttl: 0 })
    }

    /// Adds a member.
    pub fn add(&mut self, value: impl Into<String>) {
        self.set.insert(value.into(), true);
    }

    /// Checks membership.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.set.get(value).copied().unwrap_or(false)
    }

    /// Removes a member.
    pub fn remove(&mut self, value: &str) {
        self.set.remove(value);
    }

    /// Returns the member count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns true when the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_bytes_round_trip() {
        let mut set = Set::new();
        set.add("a");
        set.add("b");

        let bytes = set.to_value_bytes().unwrap();
        let back = Set::from_value_bytes(Kind::Set, &bytes).unwrap();
        assert!(back.contains("a"));
        assert!(back.contains("b"));
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn rejects_other_kinds() {
        let bytes = Set::new().to_value_bytes().unwrap();
        assert!(Set::from_value_bytes(Kind::ZSet, &bytes).is_err());
    }

    #[test]
    fn json_binding_shape() {
        let set: Set = serde_json::from_str(r#"{"set":{"a":true,"b":true},"ttl":1}"#).unwrap();
        assert!(set.contains("a"));
        assert_eq!(set.ttl, 1);
    }

    #[test]
    fn membership() {
        let mut set = Set::new();
        set.add("x");
        assert!(set.contains("x"));
        set.remove("x");
        assert!(!set.contains("x"));
        assert!(set.is_empty());
    }
}
