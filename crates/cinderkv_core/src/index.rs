//! The in-memory key directory.
//!
//! Maps key bytes to the newest record location. Never persisted - the log
//! is the source of truth and the directory is rebuilt by the open-time
//! scan.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Location and metadata of the newest record for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Segment file holding the record.
    pub segment_id: u64,
    /// Byte offset of the record within that segment.
    pub offset: u64,
    /// Total framed record length, enabling a single sequential read.
    pub length: u64,
    /// Write timestamp in nanoseconds.
    pub created_at: u64,
    /// Absolute expiry in nanoseconds; 0 means never.
    pub expires_at: u64,
    /// Per-key version at the time of this write.
    pub version: u64,
}

impl IndexEntry {
    /// Returns whether the entry is logically absent at `now_ns`.
    #[must_use]
    pub fn is_expired(&self, now_ns: u64) -> bool {
        self.expires_at > 0 && now_ns >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct KeyDirInner {
    entries: HashMap<Vec<u8>, IndexEntry>,
    /// Per-key write counters. Kept separately so a tombstone removes the
    /// entry without resetting the version sequence.
    versions: HashMap<Vec<u8>, u64>,
}

/// The engine's key -> newest-record directory.
#[derive(Debug, Default)]
pub struct KeyDir {
    inner: RwLock<KeyDirInner>,
}

impl KeyDir {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a key. Entries past their expiry are treated as absent and
    /// lazily removed.
    pub fn get(&self, key: &[u8], now_ns: u64) -> Option<IndexEntry> {
        {
            let inner = self.inner.read();
            match inner.entries.get(key) {
                Some(entry) if !entry.is_expired(now_ns) => return Some(*entry),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it under the write lock, re-checking in case a
        // writer replaced it meanwhile.
        let mut inner = self.inner.write();
        if let Some(entry) = inner.entries.get(key).copied() {
            if entry.is_expired(now_ns) {
                inner.entries.remove(key);
            } else {
                return Some(entry);
            }
        }
        None
    }

    /// Inserts or overwrites the entry for a key, bumping and returning the
    /// per-key version.
    pub fn put(
        &self,
        key: &[u8],
        segment_id: u64,
        offset: u64,
        length: u64,
        created_at: u64,
        expires_at: u64,
    ) -> u64 {
        let mut inner = self.inner.write();
        let version = inner
            .versions
            .entry(key.to_vec())
            .and_modify(|v| *v += 1)
            .or_insert(1)
            .to_owned();

        inner.entries.insert(
            key.to_vec(),
            IndexEntry {
                segment_id,
                offset,
                length,
                created_at,
                expires_at,
                version,
            },
        );
        version
    }

    /// Bumps and returns the per-key version without touching the entry.
    ///
    /// Recovery uses this for records that are superseded by a newer write
    /// already replayed: the historical write still counts.
    pub fn bump_version(&self, key: &[u8]) -> u64 {
        let mut inner = self.inner.write();
        inner
            .versions
            .entry(key.to_vec())
            .and_modify(|v| *v += 1)
            .or_insert(1)
            .to_owned()
    }

    /// Removes the entry for a key (a tombstone write), bumping and
    /// returning the per-key version.
    pub fn remove(&self, key: &[u8]) -> u64 {
        let mut inner = self.inner.write();
        let version = inner
            .versions
            .entry(key.to_vec())
            .and_modify(|v| *v += 1)
            .or_insert(1)
            .to_owned();

        inner.entries.remove(key);
        version
    }

    /// Atomically moves the entry for `key` from one record location to
    /// another, keeping expiry and version.
    ///
    /// Returns false - and changes nothing - when the entry no longer
    /// points at the old location, so a concurrent overwrite is never
    /// clobbered by the compactor.
    pub fn repoint(
        &self,
        key: &[u8],
        old_segment: u64,
        old_offset: u64,
        new_segment: u64,
        new_offset: u64,
    ) -> bool {
        let mut inner = self.inner.write();
        match inner.entries.get_mut(key) {
            Some(entry) if entry.segment_id == old_segment && entry.offset == old_offset => {
                entry.segment_id = new_segment;
                entry.offset = new_offset;
                true
            }
            _ => false,
        }
    }

    /// Returns whether the entry for `key` currently points at the given
    /// location and is not expired.
    pub fn points_at(&self, key: &[u8], segment_id: u64, offset: u64, now_ns: u64) -> bool {
        let inner = self.inner.read();
        match inner.entries.get(key) {
            Some(entry) => {
                entry.segment_id == segment_id
                    && entry.offset == offset
                    && !entry.is_expired(now_ns)
            }
            None => false,
        }
    }

    /// Counts live (unexpired) entries.
    pub fn len(&self, now_ns: u64) -> usize {
        let inner = self.inner.read();
        inner
            .entries
            .values()
            .filter(|e| !e.is_expired(now_ns))
            .count()
    }

    /// Returns true when no live entries remain.
    pub fn is_empty(&self, now_ns: u64) -> bool {
        self.len(now_ns) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_absent_key() {
        let keydir = KeyDir::new();
        assert!(keydir.get(b"missing", 0).is_none());
    }

    #[test]
    fn put_then_get() {
        let keydir = KeyDir::new();
        let version = keydir.put(b"k", 1, 0, 40, 7, 0);
        assert_eq!(version, 1);

        let entry = keydir.get(b"k", 100).unwrap();
        assert_eq!(entry.segment_id, 1);
        assert_eq!(entry.offset, 0);
        assert_eq!(entry.length, 40);
        assert_eq!(entry.version, 1);
    }

    #[test]
    fn versions_count_puts_and_removes() {
        let keydir = KeyDir::new();
        assert_eq!(keydir.put(b"k", 1, 0, 10, 1, 0), 1);
        assert_eq!(keydir.put(b"k", 1, 10, 10, 2, 0), 2);
        assert_eq!(keydir.remove(b"k"), 3);
        assert_eq!(keydir.put(b"k", 1, 20, 10, 3, 0), 4);
    }

    #[test]
    fn remove_of_absent_key_still_bumps() {
        let keydir = KeyDir::new();
        assert_eq!(keydir.remove(b"never-seen"), 1);
        assert!(keydir.get(b"never-seen", 0).is_none());
    }

    #[test]
    fn expired_entries_are_lazily_dropped() {
        let keydir = KeyDir::new();
        keydir.put(b"k", 1, 0, 10, 1, 50);

        assert!(keydir.get(b"k", 49).is_some());
        assert_eq!(keydir.len(49), 1);

        assert!(keydir.get(b"k", 50).is_none());
        // The entry is gone now, even for an earlier clock.
        assert!(keydir.get(b"k", 0).is_none());
    }

    #[test]
    fn len_skips_expired() {
        let keydir = KeyDir::new();
        keydir.put(b"a", 1, 0, 10, 1, 0);
        keydir.put(b"b", 1, 10, 10, 1, 5);

        assert_eq!(keydir.len(4), 2);
        assert_eq!(keydir.len(5), 1);
        assert!(!keydir.is_empty(5));
    }

    #[test]
    fn repoint_moves_only_matching_location() {
        let keydir = KeyDir::new();
        keydir.put(b"k", 1, 16, 40, 1, 0);

        assert!(!keydir.repoint(b"k", 1, 0, 9, 0));
        assert!(keydir.repoint(b"k", 1, 16, 9, 128));

        let entry = keydir.get(b"k", 0).unwrap();
        assert_eq!(entry.segment_id, 9);
        assert_eq!(entry.offset, 128);
        assert_eq!(entry.version, 1);
    }

    #[test]
    fn points_at_respects_expiry() {
        let keydir = KeyDir::new();
        keydir.put(b"k", 2, 64, 40, 1, 100);

        assert!(keydir.points_at(b"k", 2, 64, 99));
        assert!(!keydir.points_at(b"k", 2, 64, 100));
        assert!(!keydir.points_at(b"k", 2, 65, 99));
        assert!(!keydir.points_at(b"other", 2, 64, 99));
    }
}
