//! Store factory.
//!
//! The single entry point for opening stores by backend name:
//!
//! 1. Look up the backend in the registry.
//! 2. If it is registered, invoke its constructor with `(name, directory)`.
//! 3. If it is not registered but a fallback is declared, log a warning and
//!    construct the fallback instead.
//! 4. Otherwise fail with [`CoreError::UnknownBackend`].
//!
//! Constructor failures are reported as
//! [`CoreError::BackendConstructionFailed`]; the factory never panics and
//! never returns a partially opened store.

use crate::error::{CoreError, CoreResult};
use crate::registry::{BackendRegistry, Constructor};
use crate::store::Store;
use polydb_storage::{Config, KvEngine, MEMDB_BACKEND};
use std::fs;
use std::path::Path;

/// Opens stores through a [`BackendRegistry`].
///
/// # Example
///
/// ```rust
/// use polydb_core::{KvEngine, StoreFactory};
/// use std::path::Path;
///
/// let factory = StoreFactory::with_defaults();
/// let store = factory.open("t1", "memdb", Path::new("")).unwrap();
/// assert_eq!(store.get(b"abc").unwrap(), None);
/// store.close().unwrap();
/// ```
#[derive(Debug)]
pub struct StoreFactory {
    registry: BackendRegistry,
    config: Config,
}

impl StoreFactory {
    /// Creates a factory over `registry`.
    #[must_use]
    pub fn new(registry: BackendRegistry, config: Config) -> Self {
        Self { registry, config }
    }

    /// Creates a factory over the built-in backends with default config.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a factory over the built-in backends with `config`.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self::new(BackendRegistry::with_defaults(&config), config)
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Returns the config.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens the store `name` in `dir` using `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Neither `backend` nor a fallback for it is registered
    ///   (`UnknownBackend`)
    /// - The directory cannot be created or the engine fails to open the
    ///   store (`BackendConstructionFailed`)
    pub fn open(&self, name: &str, backend: &str, dir: &Path) -> CoreResult<Store> {
        open_with(&self.registry, &self.config, name, backend, dir)
    }
}

impl Default for StoreFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Opens the store `name` in `dir` with `backend` from `registry`.
///
/// Uses the default [`Config`] for directory creation; constructors use
/// whatever config they captured at registration.
///
/// # Errors
///
/// See [`StoreFactory::open`].
pub fn open_store(
    registry: &BackendRegistry,
    name: &str,
    backend: &str,
    dir: &Path,
) -> CoreResult<Store> {
    open_with(registry, &Config::default(), name, backend, dir)
}

fn open_with(
    registry: &BackendRegistry,
    config: &Config,
    name: &str,
    backend: &str,
    dir: &Path,
) -> CoreResult<Store> {
    let (resolved, constructor) = resolve(registry, backend)?;

    if config.create_if_missing
        && resolved != MEMDB_BACKEND
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        fs::create_dir_all(dir).map_err(|e| CoreError::construction_failed(&resolved, e.into()))?;
    }

    let store = constructor(name, dir).map_err(|e| {
        tracing::debug!(backend = %resolved, name, error = %e, "store construction failed");
        CoreError::construction_failed(&resolved, e)
    })?;

    tracing::debug!(backend = store.backend(), name, dir = %dir.display(), "opened store");
    Ok(store)
}

fn resolve(registry: &BackendRegistry, backend: &str) -> CoreResult<(String, Constructor)> {
    if let Some(constructor) = registry.lookup(backend) {
        return Ok((backend.to_string(), constructor));
    }

    if let Some(fallback) = registry.fallback_for(backend) {
        if let Some(constructor) = registry.lookup(&fallback) {
            tracing::warn!(
                requested = backend,
                fallback = %fallback,
                "backend not available in this build, using fallback"
            );
            return Ok((fallback, constructor));
        }
    }

    Err(CoreError::UnknownBackend {
        name: backend.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polydb_storage::{MemDb, StorageError};
    use tempfile::tempdir;

    #[test]
    fn open_memdb() {
        let factory = StoreFactory::with_defaults();
        let store = factory.open("t1", "memdb", Path::new("")).unwrap();
        assert_eq!(store.backend(), "memdb");
    }

    #[test]
    fn unknown_backend_fails() {
        let factory = StoreFactory::with_defaults();
        let result = factory.open("t1", "bogus-engine", Path::new(""));
        assert!(matches!(result, Err(CoreError::UnknownBackend { ref name }) if name == "bogus-engine"));
    }

    #[test]
    fn construction_failure_is_reported() {
        let registry = BackendRegistry::new();
        registry
            .register("broken", |_: &str, _: &Path| {
                Err(StorageError::Corrupted("bad header".into()))
            })
            .unwrap();

        let result = open_store(&registry, "t1", "broken", Path::new(""));
        match result {
            Err(CoreError::BackendConstructionFailed { backend, source }) => {
                assert_eq!(backend, "broken");
                assert!(matches!(source, StorageError::Corrupted(_)));
            }
            other => panic!("expected construction failure, got {other:?}"),
        }
    }

    #[test]
    fn fallback_is_used_when_backend_missing() {
        let registry = BackendRegistry::new();
        registry
            .register("memdb", |_: &str, _: &Path| Ok(MemDb::new().into()))
            .unwrap();
        registry.register_fallback("native", "memdb");

        let store = open_store(&registry, "t1", "native", Path::new("")).unwrap();
        assert_eq!(store.backend(), "memdb");
    }

    #[test]
    fn fallback_to_unregistered_backend_is_unknown() {
        let registry = BackendRegistry::new();
        registry.register_fallback("native", "missing");

        let result = open_store(&registry, "t1", "native", Path::new(""));
        assert!(matches!(result, Err(CoreError::UnknownBackend { .. })));
    }

    #[test]
    fn registered_backend_wins_over_fallback() {
        let registry = BackendRegistry::new();
        registry
            .register("native", |_: &str, _: &Path| Ok(MemDb::new().into()))
            .unwrap();
        registry.register_fallback("native", "missing");

        assert!(open_store(&registry, "t1", "native", Path::new("")).is_ok());
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn rocksdb_falls_back_to_sled() {
        let dir = tempdir().unwrap();
        let factory = StoreFactory::with_defaults();

        let store = factory.open("fallback", "rocksdb", dir.path()).unwrap();
        assert_eq!(store.backend(), "sled");
        assert!(store.as_sled().is_some());
        assert!(dir.path().join("fallback.db").exists());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested").join("data");
        let factory = StoreFactory::with_defaults();

        let store = factory.open("t1", "fsdb", &nested).unwrap();
        assert!(nested.join("t1.db").is_dir());
        store.close().unwrap();
    }

    #[test]
    fn missing_store_without_create_fails() {
        let dir = tempdir().unwrap();
        let factory = StoreFactory::with_config(Config::new().create_if_missing(false));

        let result = factory.open("absent", "sled", dir.path());
        assert!(matches!(
            result,
            Err(CoreError::BackendConstructionFailed {
                source: StorageError::Missing { .. },
                ..
            })
        ));
    }

    #[test]
    fn second_open_of_locked_store_fails() {
        let dir = tempdir().unwrap();
        let factory = StoreFactory::with_defaults();

        let first = factory.open("shared", "fsdb", dir.path()).unwrap();
        let second = factory.open("shared", "fsdb", dir.path());
        assert!(matches!(
            second,
            Err(CoreError::BackendConstructionFailed { .. })
        ));
        first.close().unwrap();
    }
}
