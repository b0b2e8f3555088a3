//! String -> score sorted set payload.

use crate::error::{TypeError, TypeResult};
use crate::kind::Kind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A sorted set mapping members to float scores, with an optional
/// time-to-live.
///
/// JSON binding shape: `{"zset": {"a": 1.5, "b": 2.0}, "ttl": 0}`. Only the
/// member->score map is persisted; ordering is recomputed on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZSet {
    /// Member -> score.
    pub zset: HashMap<String, f64>,
    /// Time-to-live in seconds; 0 means no expiry.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl ZSet {
    /// Creates an empty sorted set with no expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the member->score map to msgpack value bytes.
    pub fn to_value_bytes(&self) -> TypeResult<Vec<u8>> {
        Ok(rmp_serde::to_vec(&self.zset)?)
    }

    /// Decodes a sorted set from record value bytes, checking the stored
    /// kind.
    pub fn from_value_bytes(kind: Kind, bytes: &[u8]) -> TypeResult<Self> {
        if kind != Kind::ZSet {
            return Err(TypeError::kind_mismatch(Kind::ZSet, kind));
        }
        let zset: HashMap<String, f64> = rmp_serde::from_slice(bytes)?;
        Ok(Self { zset, ttl: 0 })
    }

    /// Adds a member with the given score, replacing any previous score.
    pub fn add(&mut self, member: impl Into<String>, score: f64) {
        self.zset.insert(member.into(), score);
    }

    /// Removes a member.
    pub fn remove(&mut self, member: &str) {
        self.zset.remove(member);
    }

    /// Returns a member's score.
    #[must_use]
    pub fn score(&self, member: &str) -> Option<f64> {
        self.zset.get(member).copied()
    }

    /// Returns members ordered by ascending score, ties broken by name.
    #[must_use]
    pub fn sorted_members(&self) -> Vec<&str> {
        let mut members: Vec<(&str, f64)> =
            self.zset.iter().map(|(m, &s)| (m.as_str(), s)).collect();
        members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        members.into_iter().map(|(m, _)| m).collect()
    }

    /// Returns the member count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zset.len()
    }

    /// Returns true when the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zset.is_empty()
    }
}
