//! The value kind tag stored in every record header.

use std::fmt;

/// Kind of value a record carries.
///
/// The byte values are part of the on-disk format and must not change.
/// `Unknown` is reserved for tombstones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    /// Unordered string set.
    Set = 0,
    /// String -> score sorted set.
    ZSet = 1,
    /// UTF-8 text.
    Text = 2,
    /// String-keyed map of arbitrary values.
    Table = 3,
    /// Signed 64-bit integer.
    Number = 4,
    /// Reserved for tombstones.
    Unknown = 5,
    /// Ordered list of arbitrary values.
    Collection = 6,
}

impl Kind {
    /// Converts a raw byte to a kind.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Set),
            1 => Some(Self::ZSet),
            2 => Some(Self::Text),
            3 => Some(Self::Table),
            4 => Some(Self::Number),
            5 => Some(Self::Unknown),
            6 => Some(Self::Collection),
            _ => None,
        }
    }

    /// Returns the on-disk byte value.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns the lowercase name used in URLs and responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::ZSet => "zset",
            Self::Text => "text",
            Self::Table => "table",
            Self::Number => "number",
            Self::Unknown => "unknown",
            Self::Collection => "collection",
        }
    }

    /// Parses a kind from its URL segment name.
    #[must_use]
    pub fn from_str_name(name: &str) -> Option<Self> {
        match name {
            "set" => Some(Self::Set),
            "zset" => Some(Self::ZSet),
            "text" => Some(Self::Text),
            "table" => Some(Self::Table),
            "number" => Some(Self::Number),
            "collection" => Some(Self::Collection),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        for b in 0..=6u8 {
            let kind = Kind::from_byte(b).unwrap();
            assert_eq!(kind.as_byte(), b);
        }
        assert!(Kind::from_byte(7).is_none());
        assert!(Kind::from_byte(0xFF).is_none());
    }

    #[test]
    fn name_round_trip() {
        for kind in [
            Kind::Set,
            Kind::ZSet,
            Kind::Text,
            Kind::Table,
            Kind::Number,
            Kind::Collection,
        ] {
            assert_eq!(Kind::from_str_name(kind.as_str()), Some(kind));
        }
        // Tombstones are never addressable by name.
        assert!(Kind::from_str_name("unknown").is_none());
    }
}
