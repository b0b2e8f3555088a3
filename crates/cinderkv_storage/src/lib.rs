//! # CinderKV Storage
//!
//! Low-level storage backends for CinderKV segment files.
//!
//! Backends are **opaque byte stores**: they append, read positionally, and
//! sync. All record framing, CRC validation, and segment bookkeeping live in
//! `cinderkv_core` - a backend never interprets the bytes it holds.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - persistent storage using OS file APIs
//! - [`MemoryBackend`] - for tests and ephemeral scratch data
//!
//! ## Example
//!
//! ```rust
//! use cinderkv_storage::{StorageBackend, MemoryBackend};
//!
//! let mut backend = MemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
