//! # PolyDB Core
//!
//! Backend registry and store factory for PolyDB.
//!
//! This crate provides:
//! - [`Store`], the closed set of backends behind one handle
//! - [`BackendRegistry`], an explicit name → constructor mapping
//! - [`StoreFactory`] and [`open_store`], which resolve a backend name and
//!   open a store
//!
//! ## Example
//!
//! ```rust
//! use polydb_core::{KvEngine, StoreFactory, NIL};
//! use std::path::Path;
//!
//! let factory = StoreFactory::with_defaults();
//! let store = factory.open("t1", "memdb", Path::new("")).unwrap();
//!
//! store.set(b"abc", &NIL).unwrap();
//! assert_eq!(store.get(b"abc").unwrap(), Some(Vec::new()));
//!
//! store.delete(b"abc").unwrap();
//! assert_eq!(store.get(b"abc").unwrap(), None);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod factory;
mod registry;
mod store;

pub use error::{CoreError, CoreResult};
pub use factory::{open_store, StoreFactory};
pub use registry::{BackendRegistry, Constructor};
pub use store::Store;

// Re-export the engine contract so callers need only this crate
pub use polydb_storage::{
    store_path, Batch, BatchOp, ByteArg, Config, Direction, FsDb, KvEngine, KvIter, KvPair,
    MemDb, SledDb, StorageError, StorageResult, FSDB_BACKEND, FSDB_MAX_KEY_LEN, MEMDB_BACKEND,
    NIL, ROCKSDB_BACKEND, SLED_BACKEND,
};
#[cfg(feature = "rocksdb")]
pub use polydb_storage::RocksDb;
