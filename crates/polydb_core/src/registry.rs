//! Backend registry.
//!
//! Maps backend names to constructors. A registry is an ordinary value:
//! callers build one (usually with [`BackendRegistry::with_defaults`]) and
//! hand it to the [`crate::StoreFactory`], so tests can use isolated
//! registries.
//!
//! # Policies
//!
//! - Names are write-once. Registering a name twice fails with
//!   [`CoreError::DuplicateBackend`] and the first constructor stays in
//!   effect.
//! - A fallback declares which backend serves a name that is not registered
//!   itself. Without the `rocksdb` feature, `rocksdb` falls back to `sled`.

use crate::error::{CoreError, CoreResult};
use crate::store::Store;
use parking_lot::RwLock;
use polydb_storage::{
    Config, FsDb, MemDb, SledDb, StorageResult, FSDB_BACKEND, MEMDB_BACKEND, ROCKSDB_BACKEND,
    SLED_BACKEND,
};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Opens a store given its name and directory.
pub type Constructor = Arc<dyn Fn(&str, &Path) -> StorageResult<Store> + Send + Sync>;

/// A registry of backend constructors.
///
/// # Thread Safety
///
/// Registration takes a write lock and lookups a read lock, so a registry
/// can be shared, but registration is expected to finish before stores are
/// opened.
#[derive(Default)]
pub struct BackendRegistry {
    constructors: RwLock<HashMap<String, Constructor>>,
    fallbacks: RwLock<HashMap<String, String>>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.backends())
            .field("fallbacks", &*self.fallbacks.read())
            .finish()
    }
}

impl BackendRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every backend compiled into this build.
    ///
    /// Registers `memdb`, `fsdb`, `sled`, and `rocksdb` with the `rocksdb`
    /// feature. Without it, `rocksdb` is declared as falling back to `sled`.
    /// On-disk constructors capture `config`.
    #[must_use]
    pub fn with_defaults(config: &Config) -> Self {
        let registry = Self::new();

        registry.insert(MEMDB_BACKEND, |_: &str, _: &Path| Ok(MemDb::new().into()));

        let fs_config = config.clone();
        registry.insert(FSDB_BACKEND, move |name: &str, dir: &Path| {
            Ok(FsDb::open(name, dir, &fs_config)?.into())
        });

        let sled_config = config.clone();
        registry.insert(SLED_BACKEND, move |name: &str, dir: &Path| {
            Ok(SledDb::open(name, dir, &sled_config)?.into())
        });

        #[cfg(feature = "rocksdb")]
        {
            let rocks_config = config.clone();
            registry.insert(ROCKSDB_BACKEND, move |name: &str, dir: &Path| {
                Ok(polydb_storage::RocksDb::open(name, dir, &rocks_config)?.into())
            });
        }
        #[cfg(not(feature = "rocksdb"))]
        registry.register_fallback(ROCKSDB_BACKEND, SLED_BACKEND);

        registry
    }

    /// Registers `constructor` under `name`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateBackend` if `name` is already registered.
    pub fn register<F>(&self, name: &str, constructor: F) -> CoreResult<()>
    where
        F: Fn(&str, &Path) -> StorageResult<Store> + Send + Sync + 'static,
    {
        let mut constructors = self.constructors.write();
        if constructors.contains_key(name) {
            return Err(CoreError::DuplicateBackend {
                name: name.to_string(),
            });
        }
        constructors.insert(name.to_string(), Arc::new(constructor));
        tracing::debug!(backend = name, "registered backend");
        Ok(())
    }

    /// Declares that `fallback` serves requests for `name` while `name`
    /// itself is not registered. A later declaration replaces an earlier one.
    pub fn register_fallback(&self, name: &str, fallback: &str) {
        self.fallbacks
            .write()
            .insert(name.to_string(), fallback.to_string());
        tracing::debug!(backend = name, fallback, "registered fallback");
    }

    /// Returns the constructor registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Constructor> {
        self.constructors.read().get(name).cloned()
    }

    /// Returns whether a constructor is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.read().contains_key(name)
    }

    /// Returns the declared fallback for `name`.
    #[must_use]
    pub fn fallback_for(&self, name: &str) -> Option<String> {
        self.fallbacks.read().get(name).cloned()
    }

    /// Returns the registered backend names, sorted.
    #[must_use]
    pub fn backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn insert<F>(&self, name: &str, constructor: F)
    where
        F: Fn(&str, &Path) -> StorageResult<Store> + Send + Sync + 'static,
    {
        self.constructors
            .write()
            .insert(name.to_string(), Arc::new(constructor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polydb_storage::KvEngine;

    fn mem(_: &str, _: &Path) -> StorageResult<Store> {
        Ok(MemDb::new().into())
    }

    #[test]
    fn empty_registry() {
        let registry = BackendRegistry::new();
        assert!(registry.backends().is_empty());
        assert!(registry.lookup("memdb").is_none());
    }

    #[test]
    fn register_and_lookup() {
        let registry = BackendRegistry::new();
        registry.register("custom", mem).unwrap();

        assert!(registry.contains("custom"));
        let constructor = registry.lookup("custom").unwrap();
        let store = constructor("t1", Path::new("")).unwrap();
        assert_eq!(store.backend(), "memdb");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = BackendRegistry::new();
        registry.register("custom", mem).unwrap();

        let result = registry.register("custom", |_: &str, _: &Path| {
            Err(polydb_storage::StorageError::Corrupted("second".into()))
        });
        assert!(matches!(result, Err(CoreError::DuplicateBackend { ref name }) if name == "custom"));

        // First registration still in effect
        let constructor = registry.lookup("custom").unwrap();
        assert!(constructor("t1", Path::new("")).is_ok());
    }

    #[test]
    fn registration_order_does_not_matter() {
        let forward = BackendRegistry::new();
        forward.register("a", mem).unwrap();
        forward.register("b", mem).unwrap();

        let backward = BackendRegistry::new();
        backward.register("b", mem).unwrap();
        backward.register("a", mem).unwrap();

        assert_eq!(forward.backends(), backward.backends());
        assert_eq!(forward.backends(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn defaults_register_builtin_backends() {
        let registry = BackendRegistry::with_defaults(&Config::default());
        assert!(registry.contains("memdb"));
        assert!(registry.contains("fsdb"));
        assert!(registry.contains("sled"));
        assert!(registry.register("memdb", mem).is_err());
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn defaults_declare_rocksdb_fallback() {
        let registry = BackendRegistry::with_defaults(&Config::default());
        assert!(!registry.contains("rocksdb"));
        assert_eq!(registry.fallback_for("rocksdb").as_deref(), Some("sled"));
    }

    #[cfg(feature = "rocksdb")]
    #[test]
    fn defaults_register_rocksdb() {
        let registry = BackendRegistry::with_defaults(&Config::default());
        assert!(registry.contains("rocksdb"));
    }
}
