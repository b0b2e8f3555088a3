//! # CinderKV Core
//!
//! The log-structured storage engine behind CinderKV.
//!
//! This crate provides:
//! - the segment record codec (fixed 26-byte header, trailing CRC32)
//! - the optional compress-then-encrypt value transform pipeline
//! - the in-memory key directory with per-key MVCC versions
//! - the [`LogStore`] engine: open/recover, put/get/delete, active-file
//!   rotation, region compaction, and periodic checkpointing
//!
//! ## Example
//!
//! ```no_run
//! use cinderkv_core::{LogStore, StoreOptions};
//! use cinderkv_types::Kind;
//!
//! let store = LogStore::open("/tmp/cinderkv", StoreOptions::default())?;
//! let version = store.put(b"greeting", Kind::Text, b"\xa5world", 0)?;
//! let fetched = store.get(b"greeting")?;
//! assert_eq!(fetched.version, version);
//! store.close()?;
//! # Ok::<(), cinderkv_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod checkpoint;
mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod index;
pub mod segment;
pub mod store;
pub mod transform;

pub use config::StoreOptions;
pub use error::{CoreError, CoreResult};
pub use index::{IndexEntry, KeyDir};
pub use segment::record::Record;
pub use store::{CompactionState, CompactionStats, Fetched, LogStore};
pub use transform::Transformer;
