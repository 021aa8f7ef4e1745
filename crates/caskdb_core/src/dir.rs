//! Store directory management.
//!
//! A store is one directory holding nothing but segment files:
//!
//! ```text
//! <store_path>/
//! ├─ segment-x7Kp2mQv9a
//! ├─ segment-Rt4bN8wLc1
//! └─ segment-jH6sD3fYe5      # active
//! ```
//!
//! Segment names are `segment-` followed by ten random alphanumerics.
//! Exclusive access is enforced with an advisory lock taken on the
//! directory handle itself (Unix), so no lock file appears in the
//! layout.

use crate::error::{CoreError, CoreResult};
use rand::{distributions::Alphanumeric, Rng};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

/// Prefix shared by every segment file name.
pub const SEGMENT_PREFIX: &str = "segment-";

/// Number of random alphanumeric characters in a segment name.
const SEGMENT_NAME_RANDOM_LEN: usize = 10;

/// Manages the store directory: segment naming, listing, deletion,
/// and the exclusive directory lock.
///
/// # Thread Safety
///
/// `StoreDir` holds an exclusive advisory lock for the lifetime of the
/// value. Only one `StoreDir` can exist per directory at a time within
/// or across processes (Unix).
#[derive(Debug)]
pub(crate) struct StoreDir {
    /// Root directory path.
    path: PathBuf,
    /// Directory handle holding the advisory lock.
    #[cfg(unix)]
    _lock: File,
}

impl StoreDir {
    /// Opens or creates a store directory and acquires its lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns `StoreLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_operation(format!(
                    "store directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_operation(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        #[cfg(unix)]
        {
            use fs2::FileExt;
            let lock = File::open(path)?;
            if lock.try_lock_exclusive().is_err() {
                return Err(CoreError::StoreLocked);
            }
            Ok(Self {
                path: path.to_path_buf(),
                _lock: lock,
            })
        }

        #[cfg(not(unix))]
        {
            // Directory handles cannot be locked on non-Unix platforms.
            Ok(Self {
                path: path.to_path_buf(),
            })
        }
    }

    /// Returns the path to the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Generates a path for a new segment file.
    ///
    /// Names are `segment-` plus ten random alphanumerics drawn from a
    /// per-thread CSPRNG. Generation retries until the name does not
    /// collide with an existing file.
    pub fn fresh_segment_path(&self) -> PathBuf {
        loop {
            let suffix: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(SEGMENT_NAME_RANDOM_LEN)
                .map(char::from)
                .collect();
            let candidate = self.path.join(format!("{SEGMENT_PREFIX}{suffix}"));
            if !candidate.exists() {
                return candidate;
            }
        }
    }

    /// Lists segment files with their modification times.
    ///
    /// Only files matching the `segment-` name prefix are returned;
    /// anything else in the directory (e.g. a stray merge temp file
    /// left by a crash) is ignored. Order is unspecified.
    pub fn list_segments(&self) -> CoreResult<Vec<(PathBuf, SystemTime)>> {
        let mut segments = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(SEGMENT_PREFIX) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            segments.push((entry.path(), metadata.modified()?));
        }

        Ok(segments)
    }

    /// Deletes segment files, returning how many were removed.
    ///
    /// Removal is best-effort: a file that cannot be unlinked is
    /// logged and left behind for the next recovery to absorb as a
    /// sealed segment.
    pub fn delete_segments(&self, paths: &[PathBuf]) -> usize {
        let mut deleted = 0;

        for path in paths {
            match fs::remove_file(path) {
                Ok(()) => deleted += 1,
                Err(err) => {
                    warn!(path = %path.display(), %err, "failed to delete merged segment");
                }
            }
        }

        if deleted > 0 {
            if let Err(err) = self.sync_dir() {
                warn!(%err, "failed to sync store directory after segment deletion");
            }
        }

        deleted
    }

    /// Syncs the store directory so entry creation, rename, and
    /// deletion are durable.
    #[cfg(unix)]
    pub fn sync_dir(&self) -> CoreResult<()> {
        let dir = File::open(&self.path)?;
        dir.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn sync_dir(&self) -> CoreResult<()> {
        // Windows NTFS journals metadata operations; directory fsync
        // is not supported there.
        Ok(())
    }
}
