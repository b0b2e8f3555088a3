//! Storage backend trait definition.

use crate::error::StorageResult;

/// An append-only byte store backing one segment file.
///
/// # Invariants
///
/// - `append` returns the offset at which the data begins
/// - `read_at` returns exactly the bytes previously written at that offset
///   and never moves the append cursor
/// - after `sync` returns, all appended bytes survive process termination
/// - backends are `Send + Sync` so sealed segments can serve concurrent reads
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageError::ReadPastEnd`](crate::StorageError) if the
    /// range extends beyond the current size, or on any I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data at the end, returning the offset where it was written.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Returns the current size in bytes; the offset the next `append` uses.
    fn size(&self) -> StorageResult<u64>;

    /// Forces all data and metadata down to durable storage.
    fn sync(&mut self) -> StorageResult<()>;

    /// Truncates the store to `new_size` bytes.
    ///
    /// Used by recovery to discard a torn tail. `new_size` must not exceed
    /// the current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}
