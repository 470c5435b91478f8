//! Store configuration.

use std::path::{Path, PathBuf};

/// Extension appended to the store name to form its on-disk location.
pub const STORE_EXTENSION: &str = "db";

/// Returns the on-disk location of the store `name` under `dir`.
///
/// Every on-disk backend roots its state at `<dir>/<name>.db`. Callers rely
/// on this layout to locate and clean up store state.
#[must_use]
pub fn store_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{STORE_EXTENSION}"))
}

/// Configuration shared by the on-disk backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,

    /// Size of the sled page cache in bytes.
    pub cache_capacity: u64,

    /// Interval of sled's background flush, `None` to disable it.
    pub flush_every_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            cache_capacity: 64 * 1024 * 1024, // 64 MB
            flush_every_ms: Some(500),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the sled page cache size.
    #[must_use]
    pub const fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Sets the sled background flush interval.
    #[must_use]
    pub const fn flush_every_ms(mut self, interval: Option<u64>) -> Self {
        self.flush_every_ms = interval;
        self
    }
}
