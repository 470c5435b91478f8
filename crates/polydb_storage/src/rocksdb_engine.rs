//! Native RocksDB backend.
//!
//! Only compiled with the `rocksdb` feature, since it links the C++ library.

use crate::arg::ByteArg;
use crate::batch::{Batch, BatchOp};
use crate::config::{store_path, Config};
use crate::engine::{Direction, KvEngine, KvIter};
use crate::error::{StorageError, StorageResult};
use crate::validate::{check_key, normalize_value};
use crate::ROCKSDB_BACKEND;
use rocksdb::{IteratorMode, Options, ReadOptions, WriteBatch, WriteOptions, DB};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Wrapper around a RocksDB database.
///
/// Buffered writes go through the WAL without syncing it; the `_sync`
/// operations set `WriteOptions::set_sync(true)`.
pub struct RocksDb {
    path: PathBuf,
    db: DB,
}

impl std::fmt::Debug for RocksDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDb")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn write_options(sync: bool) -> WriteOptions {
    let mut options = WriteOptions::default();
    options.set_sync(sync);
    options
}

impl RocksDb {
    /// Opens or creates the store `name` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store doesn't exist and `create_if_missing`
    /// is false, or if RocksDB fails to open it (lock held, corruption, I/O).
    pub fn open(name: &str, dir: &Path, config: &Config) -> StorageResult<Self> {
        let path = store_path(dir, name);
        if !config.create_if_missing && !path.exists() {
            return Err(StorageError::Missing { path });
        }

        let mut options = Options::default();
        options.create_if_missing(config.create_if_missing);
        let db = DB::open(&options, &path)?;

        tracing::debug!(path = %path.display(), "opened rocksdb");
        Ok(Self { path, db })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn put(&self, key: &[u8], value: &[u8], sync: bool) -> StorageResult<()> {
        self.db.put_opt(key, value, &write_options(sync))?;
        Ok(())
    }

    fn remove(&self, key: &[u8], sync: bool) -> StorageResult<()> {
        self.db.delete_opt(key, &write_options(sync))?;
        Ok(())
    }

    fn apply(&self, batch: Batch, sync: bool) -> StorageResult<()> {
        let mut rocks_batch = WriteBatch::default();
        for op in batch {
            match op {
                BatchOp::Set { key, value } => rocks_batch.put(key, value),
                BatchOp::Delete { key } => rocks_batch.delete(key),
            }
        }
        self.db.write_opt(rocks_batch, &write_options(sync))?;
        Ok(())
    }
}

impl KvEngine for RocksDb {
    fn backend(&self) -> &'static str {
        ROCKSDB_BACKEND
    }

    fn get<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<Option<Vec<u8>>> {
        let key = check_key(key.byte_arg(), "get");
        Ok(self.db.get(key)?)
    }

    fn set<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        let key = check_key(key.byte_arg(), "set");
        self.put(key, normalize_value(value.byte_arg()), false)
    }

    fn set_sync<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        let key = check_key(key.byte_arg(), "set_sync");
        self.put(key, normalize_value(value.byte_arg()), true)
    }

    fn delete<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        let key = check_key(key.byte_arg(), "delete");
        self.remove(key, false)
    }

    fn delete_sync<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        let key = check_key(key.byte_arg(), "delete_sync");
        self.remove(key, true)
    }

    fn iter(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        direction: Direction,
    ) -> StorageResult<KvIter<'_>> {
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Ok(Box::new(std::iter::empty()));
            }
        }

        let mut read_options = ReadOptions::default();
        if let Some(start) = start {
            read_options.set_iterate_lower_bound(start.to_vec());
        }
        if let Some(end) = end {
            read_options.set_iterate_upper_bound(end.to_vec());
        }
        let mode = match direction {
            Direction::Forward => IteratorMode::Start,
            Direction::Reverse => IteratorMode::End,
        };

        let iter = self.db.iterator_opt(mode, read_options).map(|item| {
            item.map(|(k, v)| (k.into_vec(), v.into_vec()))
                .map_err(StorageError::from)
        });
        Ok(Box::new(iter))
    }

    fn write(&self, batch: Batch) -> StorageResult<()> {
        self.apply(batch, false)
    }

    fn write_sync(&self, batch: Batch) -> StorageResult<()> {
        self.apply(batch, true)
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush_wal(true)?;
        Ok(())
    }

    fn stats(&self) -> BTreeMap<String, String> {
        let mut stats = BTreeMap::new();
        stats.insert("database.type".to_string(), ROCKSDB_BACKEND.to_string());
        stats.insert("database.path".to_string(), self.path.display().to_string());
        if let Ok(Some(value)) = self.db.property_value("rocksdb.stats") {
            stats.insert("rocksdb.stats".to_string(), value);
        }
        stats
    }

    fn close(self) -> StorageResult<()> {
        self.db.flush_wal(true)?;
        tracing::debug!(path = %self.path.display(), "closing rocksdb");
        Ok(())
    }
}
