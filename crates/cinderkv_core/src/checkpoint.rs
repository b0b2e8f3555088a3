//! The `CHECKPOINT` marker file.
//!
//! A tiny CRC-guarded record of the active segment id and its durable size,
//! rewritten by the periodic checkpoint worker and at clean shutdown.
//! Recovery treats it purely as a hint - the tail of every file is still
//! verified by the open-time scan.

use crate::error::{CoreError, CoreResult};
use crate::segment::record::compute_crc32;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Marker file name within the data directory.
pub const CHECKPOINT_FILE: &str = "CHECKPOINT";

const MARKER_MAGIC: [u8; 4] = *b"CKPT";
const MARKER_SIZE: usize = 4 + 8 + 8 + 1 + 4;

/// Contents of the `CHECKPOINT` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointMarker {
    /// Id of the active segment at marker time.
    pub active_id: u64,
    /// Durable size of the active segment at marker time.
    pub durable_size: u64,
    /// True when the marker was written by a clean shutdown.
    pub clean: bool,
}

impl CheckpointMarker {
    /// Serializes the marker, big-endian with a trailing CRC32.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MARKER_SIZE);
        buf.extend_from_slice(&MARKER_MAGIC);
        buf.extend_from_slice(&self.active_id.to_be_bytes());
        buf.extend_from_slice(&self.durable_size.to_be_bytes());
        buf.push(u8::from(self.clean));

        let crc = compute_crc32(&buf);
        buf.extend_from_slice(&crc.to_be_bytes());
        buf
    }

    /// Parses a marker, validating magic and CRC.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() != MARKER_SIZE {
            return Err(CoreError::corrupt("checkpoint marker has wrong size"));
        }
        if data[..4] != MARKER_MAGIC {
            return Err(CoreError::corrupt("checkpoint marker has wrong magic"));
        }

        let stored_crc = u32::from_be_bytes([
            data[MARKER_SIZE - 4],
            data[MARKER_SIZE - 3],
            data[MARKER_SIZE - 2],
            data[MARKER_SIZE - 1],
        ]);
        let computed = compute_crc32(&data[..MARKER_SIZE - 4]);
        if stored_crc != computed {
            return Err(CoreError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed,
            });
        }

        let active_id = u64::from_be_bytes([
            data[4], data[5], data[6], data[7], data[8], data[9], data[10], data[11],
        ]);
        let durable_size = u64::from_be_bytes([
            data[12], data[13], data[14], data[15], data[16], data[17], data[18], data[19],
        ]);
        let clean = data[20] == 1;

        Ok(Self {
            active_id,
            durable_size,
            clean,
        })
    }
}

/// Atomically writes the marker: temp file, sync, rename.
pub fn write_marker(dir: &Path, marker: &CheckpointMarker) -> CoreResult<()> {
    let final_path = dir.join(CHECKPOINT_FILE);
    let temp_path = dir.join(format!("{CHECKPOINT_FILE}.tmp"));

    let mut file = File::create(&temp_path)?;
    file.write_all(&marker.encode())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, &final_path)?;
    sync_directory(dir)?;
    Ok(())
}

/// Reads the marker if one exists.
///
/// A damaged marker is only a lost hint, so it is logged and ignored
/// rather than failing the open.
pub fn read_marker(dir: &Path) -> CoreResult<Option<CheckpointMarker>> {
    let path = dir.join(CHECKPOINT_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let data = fs::read(&path)?;
    match CheckpointMarker::decode(&data) {
        Ok(marker) => Ok(Some(marker)),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable checkpoint marker");
            Ok(None)
        }
    }
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> CoreResult<()> {
    let handle = File::open(dir)?;
    handle.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> CoreResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn marker_round_trip() {
        let marker = CheckpointMarker {
            active_id: 12,
            durable_size: 4096,
            clean: true,
        };
        let decoded = CheckpointMarker::decode(&marker.encode()).unwrap();
        assert_eq!(marker, decoded);
    }

    #[test]
    fn corrupt_marker_is_rejected() {
        let marker = CheckpointMarker {
            active_id: 1,
            durable_size: 2,
            clean: false,
        };
        let mut encoded = marker.encode();
        encoded[6] ^= 0x01;
        assert!(CheckpointMarker::decode(&encoded).is_err());

        assert!(CheckpointMarker::decode(b"CKPT").is_err());
        assert!(CheckpointMarker::decode(&[0u8; MARKER_SIZE]).is_err());
    }

    #[test]
    fn write_and_read_marker() {
        let dir = tempdir().unwrap();
        let marker = CheckpointMarker {
            active_id: 3,
            durable_size: 77,
            clean: true,
        };

        write_marker(dir.path(), &marker).unwrap();
        let read = read_marker(dir.path()).unwrap().unwrap();
        assert_eq!(read, marker);
    }

    #[test]
    fn missing_marker_is_none() {
        let dir = tempdir().unwrap();
        assert!(read_marker(dir.path()).unwrap().is_none());
    }

    #[test]
    fn damaged_marker_file_is_ignored() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CHECKPOINT_FILE), b"garbage").unwrap();
        assert!(read_marker(dir.path()).unwrap().is_none());
    }
}
