//! # CinderKV Types
//!
//! The six typed payloads a CinderKV record can carry, their JSON binding
//! shapes, and the msgpack value codec.
//!
//! The storage engine treats values as opaque byte strings; everything here
//! runs **outside** the engine. A payload serializes only its inner value
//! (never the TTL, which travels in the record header):
//!
//! - [`Text`] - a UTF-8 string
//! - [`Number`] - a signed 64-bit integer
//! - [`Set`] - an unordered string set
//! - [`ZSet`] - a string -> score sorted set
//! - [`Table`] - a string-keyed map of arbitrary JSON values
//! - [`Collection`] - an ordered list of arbitrary JSON values
//!
//! ## Example
//!
//! ```rust
//! use cinderkv_types::{Kind, Text};
//!
//! let text = Text::new("world");
//! let bytes = text.to_value_bytes().unwrap();
//! let back = Text::from_value_bytes(Kind::Text, &bytes).unwrap();
//! assert_eq!(back.content, "world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod error;
mod kind;
mod number;
mod set;
mod table;
mod text;
mod zset;

pub use collection::Collection;
pub use error::{TypeError, TypeResult};
pub use kind::Kind;
pub use number::Number;
pub use set::Set;
pub use table::Table;
pub use text::Text;
pub use zset::ZSet;
