//! Embedded sled backend.

use crate::arg::ByteArg;
use crate::batch::{Batch, BatchOp};
use crate::config::{store_path, Config};
use crate::engine::{key_range, Direction, KvEngine, KvIter};
use crate::error::{StorageError, StorageResult};
use crate::validate::{check_key, normalize_value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Backend identifier of [`SledDb`].
pub const SLED_BACKEND: &str = "sled";

/// Wrapper around a `sled::Db`.
///
/// sled buffers writes and flushes them in the background every
/// `Config::flush_every_ms`. The `_sync` operations call `Db::flush`, which
/// fsyncs before returning.
///
/// sled holds an exclusive lock on its directory, so a second open of the
/// same store fails until the first handle is closed.
pub struct SledDb {
    path: PathBuf,
    db: sled::Db,
}

impl std::fmt::Debug for SledDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledDb")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SledDb {
    /// Opens or creates the store `name` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store doesn't exist and `create_if_missing`
    /// is false, or if sled fails to open it (lock held, corruption, I/O).
    pub fn open(name: &str, dir: &Path, config: &Config) -> StorageResult<Self> {
        let path = store_path(dir, name);
        if !config.create_if_missing && !path.exists() {
            return Err(StorageError::Missing { path });
        }

        let db = sled::Config::new()
            .path(&path)
            .cache_capacity(config.cache_capacity)
            .flush_every_ms(config.flush_every_ms)
            .open()?;

        tracing::debug!(
            path = %path.display(),
            recovered = db.was_recovered(),
            "opened sled"
        );
        Ok(Self { path, db })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvEngine for SledDb {
    fn backend(&self) -> &'static str {
        SLED_BACKEND
    }

    fn get<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<Option<Vec<u8>>> {
        let key = check_key(key.byte_arg(), "get");
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    fn has<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<bool> {
        let key = check_key(key.byte_arg(), "has");
        Ok(self.db.contains_key(key)?)
    }

    fn set<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        let key = check_key(key.byte_arg(), "set");
        let value = normalize_value(value.byte_arg());
        self.db.insert(key, value)?;
        Ok(())
    }

    fn set_sync<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        let key = check_key(key.byte_arg(), "set_sync");
        let value = normalize_value(value.byte_arg());
        self.db.insert(key, value)?;
        self.db.flush()?;
        Ok(())
    }

    fn delete<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        let key = check_key(key.byte_arg(), "delete");
        self.db.remove(key)?;
        Ok(())
    }

    fn delete_sync<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        let key = check_key(key.byte_arg(), "delete_sync");
        self.db.remove(key)?;
        self.db.flush()?;
        Ok(())
    }

    fn iter(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        direction: Direction,
    ) -> StorageResult<KvIter<'_>> {
        let Some(range) = key_range(start, end) else {
            return Ok(Box::new(std::iter::empty()));
        };

        let iter = self.db.range(range).map(|item| {
            item.map(|(k, v)| (k.to_vec(), v.to_vec()))
                .map_err(StorageError::from)
        });
        match direction {
            Direction::Forward => Ok(Box::new(iter)),
            Direction::Reverse => Ok(Box::new(iter.rev())),
        }
    }

    fn write(&self, batch: Batch) -> StorageResult<()> {
        let mut sled_batch = sled::Batch::default();
        for op in batch {
            match op {
                BatchOp::Set { key, value } => sled_batch.insert(key, value),
                BatchOp::Delete { key } => sled_batch.remove(key),
            }
        }
        self.db.apply_batch(sled_batch)?;
        Ok(())
    }

    fn write_sync(&self, batch: Batch) -> StorageResult<()> {
        self.write(batch)?;
        self.db.flush()?;
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn stats(&self) -> BTreeMap<String, String> {
        let mut stats = BTreeMap::new();
        stats.insert("database.type".to_string(), SLED_BACKEND.to_string());
        stats.insert("database.path".to_string(), self.path.display().to_string());
        if let Ok(size) = self.db.size_on_disk() {
            stats.insert("sled.size_on_disk".to_string(), size.to_string());
        }
        stats
    }

    fn close(self) -> StorageResult<()> {
        self.db.flush()?;
        tracing::debug!(path = %self.path.display(), "closing sled");
        Ok(())
    }
}
