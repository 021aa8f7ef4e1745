//! Record codec.
//!
//! ## Record Format
//!
//! ```text
//! | key_len (4, LE) | value_len (4, LE) | key (K) | value (V) | sha1 (20) |
//! ```
//!
//! The trailing SHA-1 covers every preceding byte, so encoding is a
//! single pass and decoding verifies only once all bytes are in hand.
//! Length-prefixing the key and the value permits streaming
//! consumption without lookahead.
//!
//! ## Decode Policy
//!
//! [`Record::read_from`] distinguishes three terminal conditions:
//!
//! - `Ok(None)` — the reader was exhausted cleanly at a record
//!   boundary (zero bytes available);
//! - `Err(TruncatedRecord)` — the reader ended mid-record; fatal for
//!   the segment being read;
//! - `Err(ChecksumMismatch)` — all bytes were read but the trailing
//!   hash disagrees with the recomputed digest.

use crate::error::{CoreError, CoreResult};
use sha1::{Digest, Sha1};
use std::io::{self, Read};

/// Length of the two u32 length fields.
const HEADER_LEN: usize = 8;

/// Length of the trailing SHA-1 digest.
const HASH_LEN: usize = 20;

/// Fixed per-record overhead: header plus trailing hash.
pub const RECORD_OVERHEAD: u64 = (HEADER_LEN + HASH_LEN) as u64;

/// One key/value pair as stored in a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Key bytes.
    pub key: Vec<u8>,
    /// Value bytes.
    pub value: Vec<u8>,
}

impl Record {
    /// Creates a record from key and value bytes.
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encodes the record, appending the SHA-1 of all preceding bytes.
    ///
    /// # Errors
    ///
    /// Fails only if the key or value length overflows the header's
    /// u32 fields.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let key_len = u32::try_from(self.key.len()).map_err(|_| CoreError::RecordTooLarge {
            len: self.key.len() as u64,
        })?;
        let value_len = u32::try_from(self.value.len()).map_err(|_| CoreError::RecordTooLarge {
            len: self.value.len() as u64,
        })?;

        let mut buf = Vec::with_capacity(HEADER_LEN + self.key.len() + self.value.len() + HASH_LEN);
        buf.extend_from_slice(&key_len.to_le_bytes());
        buf.extend_from_slice(&value_len.to_le_bytes());
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);

        let digest = Sha1::digest(&buf);
        buf.extend_from_slice(digest.as_slice());

        Ok(buf)
    }

    /// Returns the encoded size of this record in bytes.
    #[must_use]
    pub fn serialized_size(&self) -> u64 {
        RECORD_OVERHEAD + self.key.len() as u64 + self.value.len() as u64
    }

    /// Reads and verifies one record from `reader`.
    ///
    /// Returns `Ok(None)` on a clean end-of-stream at a record
    /// boundary. See the module docs for the full decode policy.
    pub fn read_from<R: Read>(reader: &mut R) -> CoreResult<Option<Self>> {
        let mut header = [0u8; HEADER_LEN];
        match read_available(reader, &mut header)? {
            0 => return Ok(None),
            n if n < HEADER_LEN => {
                return Err(CoreError::truncated_record(format!(
                    "record header: {n} of {HEADER_LEN} bytes"
                )));
            }
            _ => {}
        }

        let key_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let value_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

        let mut key = vec![0u8; key_len];
        read_exact_or_truncated(reader, &mut key, "key")?;

        let mut value = vec![0u8; value_len];
        read_exact_or_truncated(reader, &mut value, "value")?;

        let mut stored = [0u8; HASH_LEN];
        read_exact_or_truncated(reader, &mut stored, "checksum")?;

        let mut hasher = Sha1::new();
        hasher.update(header);
        hasher.update(&key);
        hasher.update(&value);
        if hasher.finalize().as_slice() != stored.as_slice() {
            return Err(CoreError::ChecksumMismatch);
        }

        Ok(Some(Self { key, value }))
    }
}

/// Reads up to `buf.len()` bytes, returning how many were available
/// before end-of-stream.
fn read_available<R: Read>(reader: &mut R, buf: &mut [u8]) -> CoreResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(filled)
}

/// Reads exactly `buf.len()` bytes, mapping a short read to
/// `TruncatedRecord`.
fn read_exact_or_truncated<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    what: &str,
) -> CoreResult<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            CoreError::truncated_record(format!("segment ended while reading record {what}"))
        } else {
            err.into()
        }
    })
}
