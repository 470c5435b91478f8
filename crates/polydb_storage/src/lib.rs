//! # PolyDB Storage
//!
//! Engine contract and backend adapters for PolyDB.
//!
//! Every backend implements [`KvEngine`] and must be observably identical
//! through it: absent keys read as `None`, empty values read as
//! `Some(vec![])`, and a nil key panics in every per-key operation.
//!
//! ## Design Principles
//!
//! - Adapters validate keys before touching their engine (see [`validate`])
//! - Engine-specific "not found" signals are normalized to `None`
//! - Nil and empty values are stored as the same zero-length value
//! - Buffered writes and `_sync` writes are distinct where the engine
//!   offers durability
//!
//! ## Available Backends
//!
//! - [`MemDb`] - Volatile, for tests and caches
//! - [`FsDb`] - One file per key, for inspection-friendly persistence
//! - [`SledDb`] - Embedded pure-Rust engine
//! - `RocksDb` - Native RocksDB engine (feature `rocksdb`)
//!
//! ## Example
//!
//! ```rust
//! use polydb_storage::{KvEngine, MemDb, NIL};
//!
//! let db = MemDb::new();
//! assert_eq!(db.get(b"abc").unwrap(), None);
//!
//! db.set(b"abc", &NIL).unwrap();
//! assert_eq!(db.get(b"abc").unwrap(), Some(Vec::new()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod arg;
mod batch;
mod config;
mod engine;
mod error;
mod fsdb;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocksdb_engine;
mod sled_engine;
pub mod validate;

pub use arg::{ByteArg, NIL};
pub use batch::{Batch, BatchOp};
pub use config::{store_path, Config, STORE_EXTENSION};
pub use engine::{Direction, KvEngine, KvIter, KvPair};
pub use error::{StorageError, StorageResult};
pub use fsdb::{FsDb, FSDB_BACKEND, FSDB_MAX_KEY_LEN};
pub use memory::{MemDb, MEMDB_BACKEND};
#[cfg(feature = "rocksdb")]
pub use rocksdb_engine::RocksDb;
pub use sled_engine::{SledDb, SLED_BACKEND};

/// Backend identifier of `RocksDb`.
///
/// Defined without the `rocksdb` feature so that registries can declare a
/// fallback for it.
pub const ROCKSDB_BACKEND: &str = "rocksdb";
