//! Error types for PolyDB core.

use polydb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when registering backends or opening stores.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No backend, and no fallback, is registered under the name.
    #[error("unknown backend: {name}")]
    UnknownBackend {
        /// The requested backend name.
        name: String,
    },

    /// A backend is already registered under the name.
    #[error("backend already registered: {name}")]
    DuplicateBackend {
        /// The conflicting backend name.
        name: String,
    },

    /// The backend failed to open the store.
    #[error("backend {backend} failed to open store: {source}")]
    BackendConstructionFailed {
        /// The backend that was invoked.
        backend: String,
        /// The engine error.
        #[source]
        source: StorageError,
    },

    /// Runtime storage error from an open store.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CoreError {
    /// Creates a construction failure for `backend`.
    pub fn construction_failed(backend: impl Into<String>, source: StorageError) -> Self {
        Self::BackendConstructionFailed {
            backend: backend.into(),
            source,
        }
    }
}
