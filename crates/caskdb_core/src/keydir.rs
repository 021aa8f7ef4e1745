//! In-memory key directory.
//!
//! Maps every live key to the location of its most-recent record. The
//! index and the ordered segment list change together (rollover
//! appends, merge swaps), so both live in one [`State`] guarded by a
//! single mutex held only for O(1) copies — never across file I/O.

use std::collections::HashMap;
use std::path::PathBuf;

/// Location of a key's most-recent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Position {
    /// Index into the store's segment list. Stable under appends;
    /// rewritten only by the atomic swap during merge.
    pub segment: usize,
    /// Byte offset of the record within that segment.
    pub offset: u64,
}

/// Segment list and index, mutated only by the writer loop.
///
/// Invariant: for every entry, decoding the record at
/// `segments[position.segment]` + `position.offset` yields that key
/// and its most-recently-written value.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// Segment file paths, oldest to newest. The last entry is the
    /// active segment; younger segments shadow older ones.
    pub segments: Vec<PathBuf>,
    /// Key to record location.
    pub index: HashMap<Vec<u8>, Position>,
}

impl State {
    /// Looks up a key, returning its position and owning segment path.
    pub fn lookup(&self, key: &[u8]) -> Option<(Position, &PathBuf)> {
        let position = *self.index.get(key)?;
        Some((position, &self.segments[position.segment]))
    }
}
