//! UTF-8 text payload.

use crate::error::{TypeError, TypeResult};
use crate::kind::Kind;
use serde::{Deserialize, Serialize};

/// A text value with an optional time-to-live.
///
/// The JSON binding shape is `{"content": "...", "ttl": 0}`; only the
/// content is msgpack-encoded into the record value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// The text content.
    pub content: String,
    /// Time-to-live in seconds; 0 means no expiry.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl Text {
    /// Creates a text value with no expiry.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ttl: 0,
        }
    }

    /// Serializes the content to msgpack value bytes.
    pub fn to_value_bytes(&self) -> TypeResult<Vec<u8>> {
        Ok(rmp_serde::to_vec(&self.content)?)
    }

    /// Decodes text from record value bytes, checking the stored kind.
    pub fn from_value_bytes(kind: Kind, bytes: &[u8]) -> TypeResult<Self> {
        if kind != Kind::Text {
            return Err(TypeError::kind_mismatch(Kind::Text, kind));
        }
        let content: String = rmp_serde::from_slice(bytes)?;
        Ok(Self { content, ttl: 0 })
    }

    /// Returns the content length in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Appends more content.
    pub fn append(&mut self, content: &str) {
        self.content.push_str(content);
    }

    /// Checks whether the content contains `target`.
    #[must_use]
    pub fn contains(&self, target: &str) -> bool {
        self.content.contains(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_bytes_round_trip() {
        let text = Text::new("world");
        let bytes = text.to_value_bytes().unwrap();
        let back = Text::from_value_bytes(Kind::Text, &bytes).unwrap();
        assert_eq!(back.content, "world");
    }

    #[test]
    fn rejects_other_kinds() {
        let bytes = Text::new("x").to_value_bytes().unwrap();
        let result = Text::from_value_bytes(Kind::Number, &bytes);
        assert!(matches!(result, Err(TypeError::KindMismatch { .. })));
    }

    #[test]
    fn json_binding_shape() {
        let text: Text = serde_json::from_str(r#"{"content":"world","ttl":3}"#).unwrap();
        assert_eq!(text.content, "world");
        assert_eq!(text.ttl, 3);

        let text: Text = serde_json::from_str(r#"{"content":"world"}"#).unwrap();
        assert_eq!(text.ttl, 0);
    }

    #[test]
    fn helpers() {
        let mut text = Text::new("hello");
        text.append(" world");
        assert!(text.contains("lo wo"));
        assert_eq!(text.size(), 11);
    }
}
