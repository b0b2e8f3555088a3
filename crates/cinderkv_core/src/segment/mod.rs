//! Segment records and file naming.
//!
//! A *segment* is both a single framed record and, in file context, an
//! append-only file holding a sequence of records. Sealed files are named
//! `<id>.seg`, the single active file `<id>.active`, and an uncommitted
//! compaction output `<id>.compact`; ids are zero-padded monotonic
//! integers.

pub mod record;

use std::path::{Path, PathBuf};

pub(crate) const SEALED_EXT: &str = "seg";
pub(crate) const ACTIVE_EXT: &str = "active";
pub(crate) const COMPACT_EXT: &str = "compact";

/// Role a segment file plays, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentRole {
    /// Rotated out, read-only until compacted away.
    Sealed,
    /// The sole file receiving appends.
    Active,
    /// A compaction output not yet committed.
    Compact,
}

pub(crate) fn sealed_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{id:010}.{SEALED_EXT}"))
}

pub(crate) fn active_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{id:010}.{ACTIVE_EXT}"))
}

pub(crate) fn compact_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{id:010}.{COMPACT_EXT}"))
}

/// Parses `0000000012.seg`-style names; anything else returns `None`.
pub(crate) fn parse_segment_name(name: &str) -> Option<(u64, SegmentRole)> {
    let (stem, ext) = name.split_once('.')?;
    let role = match ext {
        SEALED_EXT => SegmentRole::Sealed,
        ACTIVE_EXT => SegmentRole::Active,
        COMPACT_EXT => SegmentRole::Compact,
        _ => return None,
    };
    let id: u64 = stem.parse().ok()?;
    Some((id, role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        let dir = Path::new("/data");
        assert_eq!(
            sealed_path(dir, 7).file_name().unwrap(),
            "0000000007.seg"
        );
        assert_eq!(
            parse_segment_name("0000000007.seg"),
            Some((7, SegmentRole::Sealed))
        );
        assert_eq!(
            parse_segment_name("0000000123.active"),
            Some((123, SegmentRole::Active))
        );
        assert_eq!(
            parse_segment_name("0000000124.compact"),
            Some((124, SegmentRole::Compact))
        );
    }

    #[test]
    fn foreign_names_are_ignored() {
        assert!(parse_segment_name("CHECKPOINT").is_none());
        assert!(parse_segment_name("LOCK").is_none());
        assert!(parse_segment_name("config.yaml").is_none());
        assert!(parse_segment_name("abc.seg").is_none());
    }
}
