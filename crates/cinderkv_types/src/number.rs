//! Signed integer payload.

use crate::error::{TypeError, TypeResult};
use crate::kind::Kind;
use serde::{Deserialize, Serialize};

/// A signed 64-bit integer with an optional time-to-live.
///
/// JSON binding shape: `{"number": 7, "ttl": 0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Number {
    /// The integer value.
    #[serde(rename = "number")]
    pub value: i64,
    /// Time-to-live in seconds; 0 means no expiry.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl Number {
    /// Creates a number value with no expiry.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self { value, ttl: 0 }
    }

    /// Serializes the value to msgpack value bytes.
    pub fn to_value_bytes(&self) -> TypeResult<Vec<u8>> {
        Ok(rmp_serde::to_vec(&self.value)?)
    }

    /// Decodes a number from record value bytes, checking the stored kind.
    pub fn from_value_bytes(kind: Kind, bytes: &[u8]) -> TypeResult<Self> {
        if kind != Kind::Number {
            return Err(TypeError::kind_mismatch(Kind::Number, kind));
        }
        let value: i64 = rmp_serde::from_slice(bytes)?;
        Ok(Self { value, ttl: 0 })
    }

    /// Adds `delta`, returning the new value.
    pub fn add(&mut self, delta: i64) -> i64 {
        self.value = self.value.wrapping_add(delta);
        self.value
    }

    /// Subtracts `delta`, returning the new value.
    pub fn sub(&mut self, delta: i64) -> i64 {
        self.add(delta.wrapping_neg())
    }

    /// Increments by one.
    pub fn increment(&mut self) -> i64 {
        self.add(1)
    }

    /// Decrements by one.
    pub fn decrement(&mut self) -> i64 {
        self.sub(1)
    }
}
