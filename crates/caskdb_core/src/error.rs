//! Error types for CaskDB core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in CaskDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O error from the underlying filesystem, surfaced verbatim.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Key absent from the index. Expected during normal operation.
    #[error("key not found")]
    KeyNotFound,

    /// A record's trailing hash disagrees with the recomputed checksum.
    /// Indicates on-disk corruption.
    #[error("record checksum mismatch")]
    ChecksumMismatch,

    /// A segment ended in the middle of a record.
    #[error("truncated record: {message}")]
    TruncatedRecord {
        /// What was being read when the segment ran out.
        message: String,
    },

    /// A segment's contents contradict the index or record framing.
    #[error("segment corruption: {message}")]
    SegmentCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// Key or value length does not fit the record header's u32 fields.
    #[error("record component too large: {len} bytes exceeds u32 range")]
    RecordTooLarge {
        /// Length of the offending key or value.
        len: u64,
    },

    /// Another process holds the store directory's exclusive lock.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// Operation attempted after close.
    #[error("store is closed")]
    Closed,

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a truncated record error.
    pub fn truncated_record(message: impl Into<String>) -> Self {
        Self::TruncatedRecord {
            message: message.into(),
        }
    }

    /// Creates a segment corruption error.
    pub fn segment_corruption(message: impl Into<String>) -> Self {
        Self::SegmentCorruption {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
