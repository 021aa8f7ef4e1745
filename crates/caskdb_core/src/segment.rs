//! Segment files.
//!
//! A segment is a plain concatenation of encoded records in append
//! order, with no file header and no footer. Exactly one segment per
//! store is writable (the active segment, owned by the writer loop);
//! every other segment is sealed and immutable until the compactor
//! deletes it.
//!
//! Three access paths exist, matching the three consumers:
//!
//! - [`ActiveSegment::append`] — contiguous, monotonic appends by the
//!   writer;
//! - [`SegmentScanner`] — sequential `(offset, record)` iteration for
//!   recovery and merge;
//! - [`read_record_at`] — one random-access decode for `get`.

use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// The active segment: the one file currently being appended to.
///
/// Owned exclusively by the writer loop; no lock guards the handle or
/// the offset because no other task ever touches them.
#[derive(Debug)]
pub(crate) struct ActiveSegment {
    file: File,
    path: PathBuf,
    /// Index of this segment in the store's segment list.
    pub id: usize,
    /// Offset at which the next append will land.
    pub offset: u64,
}

impl ActiveSegment {
    /// Creates a fresh, empty active segment at `path`.
    pub fn create(path: PathBuf, id: usize) -> CoreResult<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)?;

        Ok(Self {
            file,
            path,
            id,
            offset: 0,
        })
    }

    /// Appends encoded bytes, returning the offset they were written
    /// at. Each successful append has been handed to the kernel.
    pub fn append(&mut self, bytes: &[u8]) -> CoreResult<u64> {
        self.file.write_all(bytes)?;
        let at = self.offset;
        self.offset += bytes.len() as u64;
        Ok(at)
    }

    /// Returns the path of the active segment file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sequential reader over a segment's records.
///
/// Yields `(offset, record)` pairs until a clean end-of-file at a
/// record boundary. Truncation or a checksum failure is yielded as an
/// error, after which iteration stops.
pub(crate) struct SegmentScanner {
    reader: BufReader<File>,
    offset: u64,
    finished: bool,
}

impl SegmentScanner {
    /// Opens a segment for scanning from the start.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
            finished: false,
        })
    }
}

impl Iterator for SegmentScanner {
    type Item = CoreResult<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match Record::read_from(&mut self.reader) {
            Ok(Some(record)) => {
                let at = self.offset;
                self.offset += record.serialized_size();
                Some(Ok((at, record)))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Decodes exactly one record at `offset` in an already-open segment
/// file.
pub(crate) fn read_record_at(file: File, offset: u64) -> CoreResult<Record> {
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(offset))?;

    Record::read_from(&mut reader)?.ok_or_else(|| {
        CoreError::truncated_record(format!("no record at offset {offset}: segment ends there"))
    })
}
