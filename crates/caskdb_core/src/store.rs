//! Store facade and lifecycle.
//!
//! [`Store`] ties the pieces together: `open` recovers the index from
//! disk and allocates a fresh active segment, `start` spawns the
//! writer thread, `put`/`get` serve traffic, and `close` shuts the
//! writer down exactly once.

use crate::config::Config;
use crate::dir::StoreDir;
use crate::error::{CoreError, CoreResult};
use crate::keydir::State;
use crate::recovery;
use crate::segment::{self, ActiveSegment};
use crate::writer::{WriteRequest, WriterLoop};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// State shared between the store handle, the writer thread, and
/// readers.
pub(crate) struct Shared {
    /// Store directory (holds the advisory lock).
    pub dir: StoreDir,
    /// Segment list and index. Held only for O(1) copies and for the
    /// open-under-lock step of `get`; never across reads or appends.
    pub state: Mutex<State>,
    /// Rollover threshold in bytes. Read by the writer per request.
    pub segment_size: AtomicU64,
    /// Producer side of the writer queue. `None` before `start` and
    /// after `close`.
    pub requests: Mutex<Option<Sender<WriteRequest>>>,
    /// Set once by `close`.
    pub closed: AtomicBool,
}

/// An embeddable append-only key-value store.
///
/// One writable segment receives all appends; sealed segments are
/// immutable and periodically merged into a single consolidated
/// segment. A full in-memory index maps every live key to the byte
/// offset of its most-recent record.
///
/// # Example
///
/// ```rust,ignore
/// use caskdb_core::Store;
/// use std::path::Path;
///
/// let store = Store::open(Path::new("my_store"))?;
/// store.start()?;
///
/// store.put("greeting", "hello")?;
/// assert_eq!(store.get("greeting")?, b"hello");
///
/// store.close()?;
/// ```
///
/// # Concurrency
///
/// `Store` is `Send + Sync`; share it behind an `Arc`. Mutations are
/// serialized through the writer queue — `put` suspends its caller
/// until the writer has processed the request. Reads run on the
/// calling thread, each opening its own short-lived file handle.
pub struct Store {
    shared: Arc<Shared>,
    /// Active segment between `open` and `start`, after which the
    /// writer thread owns it.
    pending: Mutex<Option<ActiveSegment>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Store {
    /// Opens a store at `path` with default configuration.
    ///
    /// Recovery scans every existing segment file (modification time
    /// ascending) to rebuild the index, then allocates a fresh active
    /// segment, so the files found on disk are all treated as sealed.
    ///
    /// # Errors
    ///
    /// Returns an error if another process holds the store lock, if
    /// any segment is truncated mid-record or fails its checksum, or
    /// on I/O failure.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a store at `path` with the given configuration.
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let dir = StoreDir::open(path.as_ref(), config.create_if_missing)?;
        let mut state = recovery::recover(&dir)?;

        let active_path = dir.fresh_segment_path();
        let active = ActiveSegment::create(active_path.clone(), state.segments.len())?;
        state.segments.push(active_path);
        dir.sync_dir()?;

        info!(
            path = %dir.path().display(),
            segments = state.segments.len(),
            keys = state.index.len(),
            "store opened"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                dir,
                state: Mutex::new(state),
                segment_size: AtomicU64::new(config.max_segment_size),
                requests: Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
            pending: Mutex::new(Some(active)),
            writer: Mutex::new(None),
        })
    }

    /// Sets the segment size threshold. Chainable; takes effect from
    /// the next append.
    pub fn set_segment_size(&self, bytes: u64) -> &Self {
        self.shared.segment_size.store(bytes, Ordering::Relaxed);
        self
    }

    /// Starts the writer thread. Must be called once before `put`.
    ///
    /// # Errors
    ///
    /// Returns `Closed` after `close`, `InvalidOperation` if the
    /// writer is already running, or an I/O error if the thread cannot
    /// be spawned.
    pub fn start(&self) -> CoreResult<()> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(CoreError::Closed);
        }

        let active = self
            .pending
            .lock()
            .take()
            .ok_or_else(|| CoreError::invalid_operation("writer already started"))?;

        // Rendezvous queue: enqueue blocks until the writer picks the
        // request up, which is the store's flow control.
        let (tx, rx) = bounded(0);
        let writer_loop = WriterLoop::new(Arc::clone(&self.shared), active);
        let handle = thread::Builder::new()
            .name("caskdb-writer".into())
            .spawn(move || writer_loop.run(rx))?;

        *self.shared.requests.lock() = Some(tx);
        *self.writer.lock() = Some(handle);
        debug!("writer started");
        Ok(())
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Suspends the caller until the writer has appended the record
    /// and updated the index. Once enqueued a put cannot be rescinded.
    ///
    /// # Errors
    ///
    /// Returns `Closed` after `close`, `InvalidOperation` before
    /// `start`, or the first error the writer hit while applying the
    /// request.
    pub fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> CoreResult<()> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(CoreError::Closed);
        }

        let tx = self
            .shared
            .requests
            .lock()
            .clone()
            .ok_or_else(|| CoreError::invalid_operation("store not started"))?;

        let (reply_tx, reply_rx) = bounded(1);
        let request = WriteRequest {
            key: key.as_ref().to_vec(),
            value: value.as_ref().to_vec(),
            reply: reply_tx,
        };

        tx.send(request).map_err(|_| CoreError::Closed)?;
        reply_rx.recv().map_err(|_| CoreError::Closed)?
    }

    /// Returns the most-recently-written value for `key`.
    ///
    /// The key's position is copied and the owning segment opened
    /// under the state mutex, so a concurrent merge cannot unlink a
    /// file before the reader holds a handle to it. The mutex is
    /// released before any I/O.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` for absent keys, `ChecksumMismatch` if
    /// the record on disk fails verification, or an I/O error.
    pub fn get(&self, key: impl AsRef<[u8]>) -> CoreResult<Vec<u8>> {
        let key = key.as_ref();

        let (file, offset) = {
            let state = self.shared.state.lock();
            let (position, path) = state.lookup(key).ok_or(CoreError::KeyNotFound)?;
            (File::open(path)?, position.offset)
        };

        let record = segment::read_record_at(file, offset)?;
        if record.key != key {
            return Err(CoreError::segment_corruption(
                "index entry resolves to a record for a different key",
            ));
        }
        Ok(record.value)
    }

    /// Closes the store: the writer queue is closed exactly once, the
    /// writer loop drains and exits, and its thread is joined.
    /// Idempotent; pending puts that already reached the queue are
    /// still executed.
    pub fn close(&self) -> CoreResult<()> {
        if self
            .shared
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        // Dropping the producer lets the writer loop drain and exit.
        self.shared.requests.lock().take();

        if let Some(handle) = self.writer.lock().take() {
            if handle.join().is_err() {
                warn!("writer thread panicked before close");
            }
        }

        // Never started: release the active segment handle here.
        self.pending.lock().take();

        debug!(path = %self.shared.dir.path().display(), "store closed");
        Ok(())
    }

    /// Returns the store directory path.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.shared.dir.path().to_path_buf()
    }

    /// Returns the number of segments in the current list, the active
    /// one included.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.shared.state.lock().segments.len()
    }

    /// Returns the number of live keys in the index.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.shared.state.lock().index.len()
    }

    /// Returns a snapshot of the segment file paths, oldest to newest.
    /// The last entry is the active segment.
    #[must_use]
    pub fn segment_paths(&self) -> Vec<PathBuf> {
        self.shared.state.lock().segments.clone()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.shared.dir.path())
            .field("segments", &self.segment_count())
            .field("keys", &self.key_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_allocates_one_active_segment() {
        let temp = tempdir().unwrap();
        let store = Store::open(temp.path()).unwrap();

        assert_eq!(store.segment_count(), 1);
        assert_eq!(store.key_count(), 0);
    }

    #[test]
    fn put_requires_start() {
        let temp = tempdir().unwrap();
        let store = Store::open(temp.path()).unwrap();

        let result = store.put("key", "value");
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
    }

    #[test]
    fn double_start_rejected() {
        let temp = tempdir().unwrap();
        let store = Store::open(temp.path()).unwrap();

        store.start().unwrap();
        assert!(matches!(
            store.start(),
            Err(CoreError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn get_missing_key() {
        let temp = tempdir().unwrap();
        let store = Store::open(temp.path()).unwrap();
        store.start().unwrap();

        assert!(matches!(store.get("absent"), Err(CoreError::KeyNotFound)));
    }

    #[test]
    fn put_then_get() {
        let temp = tempdir().unwrap();
        let store = Store::open(temp.path()).unwrap();
        store.start().unwrap();

        store.put("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap(), b"value");
    }

    #[test]
    fn close_is_idempotent() {
        let temp = tempdir().unwrap();
        let store = Store::open(temp.path()).unwrap();
        store.start().unwrap();

        store.close().unwrap();
        store.close().unwrap();

        assert!(matches!(store.put("key", "value"), Err(CoreError::Closed)));
        assert!(matches!(store.start(), Err(CoreError::Closed)));
    }

    #[test]
    fn get_still_served_after_close() {
        let temp = tempdir().unwrap();
        let store = Store::open(temp.path()).unwrap();
        store.start().unwrap();

        store.put("key", "value").unwrap();
        store.close().unwrap();

        assert_eq!(store.get("key").unwrap(), b"value");
    }

    #[test]
    fn set_segment_size_is_chainable() {
        let temp = tempdir().unwrap();
        let store = Store::open(temp.path()).unwrap();

        store.set_segment_size(16).start().unwrap();
        store.put("aa", "aa").unwrap();
        assert_eq!(store.segment_count(), 2);
    }
}
