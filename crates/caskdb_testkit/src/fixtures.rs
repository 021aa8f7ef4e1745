//! Store fixtures.
//!
//! Convenience wrappers for setting up stores on temporary
//! directories and for reopening them to exercise recovery.

use caskdb_core::{Config, Store};
use std::path::Path;
use tempfile::TempDir;

/// A started test store on a temporary directory, with automatic
/// cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestStore {
    /// Creates and starts a store on a fresh temporary directory.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates and starts a store with the given configuration.
    pub fn with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let store =
            Store::open_with_config(temp_dir.path(), config).expect("failed to open store");
        store.start().expect("failed to start writer");
        Self { store, temp_dir }
    }

    /// Returns the store directory path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Closes the store and reopens it from the same directory,
    /// exercising recovery. The writer is started on the reopened
    /// store.
    pub fn reopen(self) -> Self {
        let temp_dir = self.into_dir();
        let store = Store::open(temp_dir.path()).expect("failed to reopen store");
        store.start().expect("failed to start writer");
        Self { store, temp_dir }
    }

    /// Closes the store and hands back the temporary directory, so a
    /// test can manipulate the files on disk before reopening.
    pub fn into_dir(self) -> TempDir {
        let Self { store, temp_dir } = self;
        store.close().expect("failed to close store");
        drop(store);
        temp_dir
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test against a started store on a temporary directory.
///
/// # Example
///
/// ```rust,ignore
/// use caskdb_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|store| {
///         store.put("key", "value").unwrap();
///         assert_eq!(store.get("key").unwrap(), b"value");
///     });
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let fixture = TestStore::new();
    f(&fixture.store)
}

/// Writes `count` distinct `key{i}`/`value{i}` pairs.
pub fn fill_sequential(store: &Store, count: usize) {
    for i in 0..count {
        store
            .put(format!("key{i}"), format!("value{i}"))
            .expect("failed to put");
    }
}
