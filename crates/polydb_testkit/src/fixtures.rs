//! Test fixtures and store helpers.
//!
//! Provides convenience functions for opening stores on every registered
//! backend inside temporary directories.

use polydb_core::{KvEngine, Store, StoreFactory};
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The backend the store was requested with.
    pub backend: String,
    /// The store name.
    pub name: String,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestStore {
    /// Opens a store on `backend` in a fresh temporary directory.
    pub fn open(backend: &str) -> Self {
        Self::open_with(&StoreFactory::with_defaults(), backend)
    }

    /// Opens a store on `backend` through `factory`.
    pub fn open_with(factory: &StoreFactory, backend: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let name = unique_name("test");
        let store = factory
            .open(&name, backend, temp_dir.path())
            .unwrap_or_else(|e| panic!("Failed to open {backend} store: {e}"));

        Self {
            store,
            backend: backend.to_string(),
            name,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the directory the store lives in.
    pub fn dir(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Closes the store and opens it again at the same location.
    pub fn reopen(self) -> Self {
        let Self {
            store,
            backend,
            name,
            _temp_dir,
        } = self;
        store.close().expect("Failed to close store");

        let store = StoreFactory::with_defaults()
            .open(&name, &backend, _temp_dir.path())
            .unwrap_or_else(|e| panic!("Failed to reopen {backend} store: {e}"));

        Self {
            store,
            backend,
            name,
            _temp_dir,
        }
    }

    /// Closes the store, keeping the directory until the fixture drops.
    pub fn close(self) -> TempDir {
        self.store.close().expect("Failed to close store");
        self._temp_dir
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Returns every backend registered by default in this build.
pub fn available_backends() -> Vec<String> {
    StoreFactory::with_defaults().registry().backends()
}

/// Returns the registered backends that persist to disk.
pub fn persistent_backends() -> Vec<String> {
    available_backends()
        .into_iter()
        .filter(|backend| backend != polydb_core::MEMDB_BACKEND)
        .collect()
}

/// Runs `f` against a fresh store for every registered backend.
///
/// # Example
///
/// ```rust
/// use polydb_core::KvEngine;
/// use polydb_testkit::with_each_backend;
///
/// with_each_backend(|_backend, store| {
///     assert_eq!(store.get(b"missing").unwrap(), None);
/// });
/// ```
pub fn with_each_backend<F>(mut f: F)
where
    F: FnMut(&str, &Store),
{
    for backend in available_backends() {
        let test_store = TestStore::open(&backend);
        f(&backend, &test_store.store);
        test_store.close();
    }
}

/// Returns a store name that is unique within the process.
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{:012x}", rand::random::<u64>() & 0xffff_ffff_ffff)
}

/// Installs a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
