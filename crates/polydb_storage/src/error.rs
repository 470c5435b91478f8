//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by a backend adapter.
///
/// A nil key is never reported here. It is a caller bug and panics instead
/// (see [`crate::validate`]).
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The sled engine reported an error.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// The RocksDB engine reported an error.
    #[cfg(feature = "rocksdb")]
    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Another handle holds the store's exclusive lock.
    #[error("store locked: {} is already open", path.display())]
    Locked {
        /// Path of the locked store.
        path: PathBuf,
    },

    /// The store does not exist and creation was disabled.
    #[error("store does not exist: {}", path.display())]
    Missing {
        /// Path that was expected to hold the store.
        path: PathBuf,
    },

    /// The key exceeds what the engine can represent.
    #[error("key too long: {len} bytes exceeds the {max} byte limit")]
    KeyTooLong {
        /// Length of the rejected key.
        len: usize,
        /// Maximum supported key length.
        max: usize,
    },

    /// The store contents are corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}
