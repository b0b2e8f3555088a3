//! Segment record codec.
//!
//! On-disk layout, all integers big-endian:
//!
//! ```text
//! | Tombstone 1 | Kind 1 | ExpiresAt 8 | CreatedAt 8 | KeySize 4 | ValueSize 4 | Key | Value | CRC32 4 |
//! ```
//!
//! The trailing CRC32 (IEEE) covers every preceding byte of the record.

use crate::clock::NANOS_PER_SEC;
use crate::error::{CoreError, CoreResult};
use cinderkv_storage::StorageBackend;
use cinderkv_types::Kind;
use crc32fast::Hasher as Crc32;

/// Fixed header size in bytes.
pub const HEADER_SIZE: usize = 26;
/// Trailing checksum size in bytes.
pub const CRC_SIZE: usize = 4;

/// Computes the IEEE CRC32 of a byte slice.
#[must_use]
pub fn compute_crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finalize()
}

/// A single record as appended to a segment file.
///
/// `value` holds the **post-transform** bytes; the transform pipeline runs
/// before a record is framed and after it is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// True for deletion markers.
    pub tombstone: bool,
    /// Kind of the stored value; `Unknown` for tombstones.
    pub kind: Kind,
    /// Absolute expiry in nanoseconds since the Unix epoch; 0 means never.
    pub expires_at: u64,
    /// Write timestamp in nanoseconds since the Unix epoch.
    pub created_at: u64,
    /// Raw key bytes.
    pub key: Vec<u8>,
    /// Post-transform value bytes; empty for tombstones.
    pub value: Vec<u8>,
}

impl Record {
    /// Creates a live record.
    #[must_use]
    pub fn put(key: Vec<u8>, kind: Kind, value: Vec<u8>, expires_at: u64, created_at: u64) -> Self {
        Self {
            tombstone: false,
            kind,
            expires_at,
            created_at,
            key,
            value,
        }
    }

    /// Creates a deletion marker for `key`.
    #[must_use]
    pub fn tombstone(key: Vec<u8>, created_at: u64) -> Self {
        Self {
            tombstone: true,
            kind: Kind::Unknown,
            expires_at: 0,
            created_at,
            key,
            value: Vec::new(),
        }
    }

    /// Returns whether this record is a deletion marker.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.tombstone
    }

    /// Returns whether the record is logically absent at `now_ns`.
    #[must_use]
    pub fn is_expired(&self, now_ns: u64) -> bool {
        self.expires_at > 0 && now_ns >= self.expires_at
    }

    /// Whole seconds until expiry at `now_ns`.
    ///
    /// Returns -1 both when the record never expires and when it has
    /// already expired, matching the query API contract.
    #[must_use]
    pub fn ttl_remaining(&self, now_ns: u64) -> i64 {
        if self.expires_at > 0 && self.expires_at > now_ns {
            ((self.expires_at - now_ns) / NANOS_PER_SEC) as i64
        } else {
            -1
        }
    }

    /// Total encoded size: header + key + value + CRC.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.key.len() + self.value.len() + CRC_SIZE
    }

    /// Frames the record for appending.
    ///
    /// Total for any record whose key and value fit in u32 lengths.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());

        buf.push(u8::from(self.tombstone));
        buf.push(self.kind.as_byte());
        buf.extend_from_slice(&self.expires_at.to_be_bytes());
        buf.extend_from_slice(&self.created_at.to_be_bytes());
        buf.extend_from_slice(&(self.key.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(self.value.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);

        let crc = compute_crc32(&buf);
        buf.extend_from_slice(&crc.to_be_bytes());

        buf
    }

    /// Parses a record from a buffer holding exactly one framed record.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ShortRead`] when fewer bytes remain than the header
    ///   and sizes demand
    /// - [`CoreError::ChecksumMismatch`] when the trailing CRC32 does not
    ///   match
    /// - [`CoreError::Corrupt`] for an invalid tombstone or kind byte
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() < HEADER_SIZE + CRC_SIZE {
            return Err(CoreError::ShortRead {
                needed: (HEADER_SIZE + CRC_SIZE) as u64,
                available: data.len() as u64,
            });
        }

        let key_size = u32::from_be_bytes([data[18], data[19], data[20], data[21]]) as usize;
        let value_size = u32::from_be_bytes([data[22], data[23], data[24], data[25]]) as usize;
        let total = HEADER_SIZE + key_size + value_size + CRC_SIZE;

        if data.len() < total {
            return Err(CoreError::ShortRead {
                needed: total as u64,
                available: data.len() as u64,
            });
        }

        let stored_crc = u32::from_be_bytes([
            data[total - 4],
            data[total - 3],
            data[total - 2],
            data[total - 1],
        ]);
        let computed_crc = compute_crc32(&data[..total - CRC_SIZE]);
        if stored_crc != computed_crc {
            return Err(CoreError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let tombstone = match data[0] {
            0 => false,
            1 => true,
            b => return Err(CoreError::corrupt(format!("invalid tombstone byte {b:#x}"))),
        };

        let kind = Kind::from_byte(data[1])
            .ok_or_else(|| CoreError::corrupt(format!("invalid kind byte {:#x}", data[1])))?;

        let expires_at = u64::from_be_bytes([
            data[2], data[3], data[4], data[5], data[6], data[7], data[8], data[9],
        ]);
        let created_at = u64::from_be_bytes([
            data[10], data[11], data[12], data[13], data[14], data[15], data[16], data[17],
        ]);

        let key = data[HEADER_SIZE..HEADER_SIZE + key_size].to_vec();
        let value = data[HEADER_SIZE + key_size..HEADER_SIZE + key_size + value_size].to_vec();

        Ok(Self {
            tombstone,
            kind,
            expires_at,
            created_at,
            key,
            value,
        })
    }
}

/// Reads one record from `backend` starting at `offset`.
///
/// Returns `Ok(None)` at a clean end of file (offset equals size). A torn
/// or corrupt tail surfaces as an error whose offset the caller records for
/// truncation.
pub fn read_record_at(
    backend: &dyn StorageBackend,
    offset: u64,
) -> CoreResult<Option<(Record, u64)>> {
    let size = backend.size()?;

    if offset == size {
        return Ok(None);
    }

    if offset + (HEADER_SIZE + CRC_SIZE) as u64 > size {
        return Err(CoreError::ShortRead {
            needed: (HEADER_SIZE + CRC_SIZE) as u64,
            available: size - offset,
        });
    }

    let header = backend.read_at(offset, HEADER_SIZE)?;
    let key_size = u32::from_be_bytes([header[18], header[19], header[20], header[21]]) as u64;
    let value_size = u32::from_be_bytes([header[22], header[23], header[24], header[25]]) as u64;
    let total = HEADER_SIZE as u64 + key_size + value_size + CRC_SIZE as u64;

    if offset + total > size {
        return Err(CoreError::ShortRead {
            needed: total,
            available: size - offset,
        });
    }

    let data = backend.read_at(offset, total as usize)?;
    let record = Record::decode(&data)?;

    Ok(Some((record, total)))
}
