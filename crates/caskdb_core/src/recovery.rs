//! Index recovery.
//!
//! On open, the store rebuilds its in-memory state from the segment
//! files on disk. Files are scanned in modification-time order,
//! oldest first, so a later segment's entry for a key overwrites an
//! earlier one and the rebuilt index is last-write-wins.
//!
//! A clean end-of-file at a record boundary ends a segment's scan
//! without error. Truncation mid-record or a checksum failure aborts
//! the open: the store refuses to serve from a directory it cannot
//! fully account for.

use crate::dir::StoreDir;
use crate::error::CoreResult;
use crate::keydir::{Position, State};
use crate::segment::SegmentScanner;
use tracing::debug;

/// Rebuilds the segment list and index from `dir`.
///
/// Every recovered segment is sealed; the caller creates a fresh
/// active segment afterwards.
pub(crate) fn recover(dir: &StoreDir) -> CoreResult<State> {
    let mut files = dir.list_segments()?;
    files.sort_by_key(|(_, modified)| *modified);

    let mut state = State::default();
    for (id, (path, _)) in files.into_iter().enumerate() {
        let mut records = 0usize;
        for item in SegmentScanner::open(&path)? {
            let (offset, record) = item?;
            state.index.insert(record.key, Position { segment: id, offset });
            records += 1;
        }
        debug!(segment = %path.display(), records, "recovered segment");
        state.segments.push(path);
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::record::Record;
    use std::fs;
    use tempfile::tempdir;

    fn write_segment(dir: &StoreDir, pairs: &[(&[u8], &[u8])]) -> std::path::PathBuf {
        let path = dir.fresh_segment_path();
        let mut bytes = Vec::new();
        for (key, value) in pairs {
            bytes.extend(Record::new(key.to_vec(), value.to_vec()).encode().unwrap());
        }
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn empty_directory_recovers_empty_state() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();

        let state = recover(&dir).unwrap();
        assert!(state.segments.is_empty());
        assert!(state.index.is_empty());
    }

    #[test]
    fn rebuilds_index_with_offsets() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();
        write_segment(&dir, &[(b"key1", b"value1"), (b"key2", b"value2")]);

        let state = recover(&dir).unwrap();
        assert_eq!(state.segments.len(), 1);
        assert_eq!(state.index.len(), 2);

        let first = Record::new(b"key1".to_vec(), b"value1".to_vec());
        let (position, _) = state.lookup(b"key2").unwrap();
        assert_eq!(position.segment, 0);
        assert_eq!(position.offset, first.serialized_size());
    }

    #[test]
    fn duplicate_keys_within_a_segment_take_the_last() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();
        write_segment(&dir, &[(b"key", b"old"), (b"other", b"x"), (b"key", b"new")]);

        let state = recover(&dir).unwrap();
        let (position, path) = state.lookup(b"key").unwrap();
        let file = fs::File::open(path).unwrap();
        let record = crate::segment::read_record_at(file, position.offset).unwrap();
        assert_eq!(record.value, b"new");
    }

    #[test]
    fn later_segments_shadow_earlier_ones() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();

        write_segment(&dir, &[(b"key", b"stale")]);
        // Ensure a strictly later modification time on the shadowing
        // segment even on coarse-timestamp filesystems.
        std::thread::sleep(std::time::Duration::from_millis(20));
        write_segment(&dir, &[(b"key", b"fresh")]);

        let state = recover(&dir).unwrap();
        assert_eq!(state.segments.len(), 2);

        let (position, path) = state.lookup(b"key").unwrap();
        assert_eq!(position.segment, 1);
        let record =
            crate::segment::read_record_at(fs::File::open(path).unwrap(), position.offset).unwrap();
        assert_eq!(record.value, b"fresh");
    }

    #[test]
    fn truncated_segment_aborts_recovery() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();
        let path = write_segment(&dir, &[(b"key", b"value")]);

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 7]).unwrap();

        let result = recover(&dir);
        assert!(matches!(result, Err(CoreError::TruncatedRecord { .. })));
    }

    #[test]
    fn corrupted_segment_aborts_recovery() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();
        let path = write_segment(&dir, &[(b"key", b"value")]);

        let mut bytes = fs::read(&path).unwrap();
        bytes[10] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        let result = recover(&dir);
        assert!(matches!(result, Err(CoreError::ChecksumMismatch)));
    }
}
