//! Segment merge (compaction).
//!
//! Merge collapses every sealed segment into one consolidated segment
//! holding only the youngest value per key, then atomically swaps the
//! new segment in. It runs inline in the writer loop, so the writer is
//! quiescent for its duration while readers proceed against the
//! still-in-place old segments.
//!
//! ## Invariants
//!
//! - Merge MUST NOT change logical state: every key readable before is
//!   readable after with the same value.
//! - The merged segment contains exactly the live-among-sealed records,
//!   so its size is the sum of their serialized sizes.
//! - Keys last written in the active segment keep their offsets; only
//!   their segment id changes (the active segment becomes id 1).
//!
//! ## Failure Semantics
//!
//! Any error before the rename aborts the merge, leaves all inputs
//! intact, and removes the temp file (dropped `NamedTempFile`). A crash
//! after the rename but before the in-memory swap leaves a stray merged
//! segment whose records are correct but unreferenced; the next
//! recovery absorbs it as a sealed segment preceding the active one.

use crate::error::{CoreError, CoreResult};
use crate::keydir::Position;
use crate::record::Record;
use crate::segment::{ActiveSegment, SegmentScanner};
use crate::store::Shared;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Merges all sealed segments into one and swaps it into the segment
/// list. `active` is the writer's current segment; it is never a merge
/// input.
pub(crate) fn merge(shared: &Shared, active: &mut ActiveSegment) -> CoreResult<()> {
    let sealed = {
        let state = shared.state.lock();
        state.segments[..state.segments.len() - 1].to_vec()
    };
    let active_id = sealed.len();
    debug!(inputs = sealed.len(), "merge started");

    // Youngest-among-sealed wins: scan in list order, overwriting.
    let mut values: HashMap<Vec<u8>, Vec<u8>> = HashMap::new();
    for path in &sealed {
        for item in SegmentScanner::open(path)? {
            let (_, record) = item?;
            values.insert(record.key, record.value);
        }
    }

    // Write the consolidated segment to a temp file in the store
    // directory, so the rename below stays on one filesystem. The temp
    // name never matches the segment prefix, so a stray one is ignored
    // by recovery.
    let mut tmp = NamedTempFile::new_in(shared.dir.path())?;
    let mut offsets: HashMap<&[u8], u64> = HashMap::with_capacity(values.len());
    let mut offset = 0u64;
    for (key, value) in &values {
        let encoded = Record::new(key.clone(), value.clone()).encode()?;
        tmp.write_all(&encoded)?;
        offsets.insert(key.as_slice(), offset);
        offset += encoded.len() as u64;
    }
    tmp.as_file().sync_all()?;

    let merged_path = shared.dir.fresh_segment_path();
    tmp.persist(&merged_path).map_err(|err| CoreError::Io(err.error))?;
    shared.dir.sync_dir()?;

    // Atomic swap: list becomes [merged, active]; entries pointing at
    // sealed segments move to the merged segment, entries pointing at
    // the active segment keep their offsets under its new id.
    {
        let mut state = shared.state.lock();

        let mut index = HashMap::with_capacity(state.index.len());
        for (key, position) in &state.index {
            let moved = if position.segment == active_id {
                Position {
                    segment: 1,
                    offset: position.offset,
                }
            } else {
                let offset = offsets.get(key.as_slice()).copied().ok_or_else(|| {
                    CoreError::segment_corruption("indexed key missing from merge inputs")
                })?;
                Position { segment: 0, offset }
            };
            index.insert(key.clone(), moved);
        }

        state.index = index;
        state.segments = vec![merged_path.clone(), active.path().to_path_buf()];
    }
    active.id = 1;

    // Old files become garbage only once no current index entry can
    // reach them; readers that resolved a path before the swap hold
    // open handles, so unlinking is safe.
    let deleted = shared.dir.delete_segments(&sealed);
    info!(
        merged = %merged_path.display(),
        inputs = sealed.len(),
        deleted,
        keys = values.len(),
        "merge complete"
    );

    Ok(())
}
