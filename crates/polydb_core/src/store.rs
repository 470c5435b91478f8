//! The store handle returned by the factory.

use polydb_storage::{
    Batch, ByteArg, Direction, FsDb, KvEngine, KvIter, MemDb, SledDb, StorageResult,
};
#[cfg(feature = "rocksdb")]
use polydb_storage::RocksDb;
use std::collections::BTreeMap;

/// An open store.
///
/// The set of backends is closed: the variant is chosen once by the factory
/// and fixed for the lifetime of the handle. Every call dispatches to the
/// adapter, which enforces the key policy itself.
#[derive(Debug)]
pub enum Store {
    /// Volatile in-memory store.
    Mem(MemDb),
    /// File-per-key store.
    Fs(FsDb),
    /// Embedded sled store.
    Sled(SledDb),
    /// Native RocksDB store.
    #[cfg(feature = "rocksdb")]
    Rocks(RocksDb),
}

macro_rules! dispatch {
    ($self:expr, $db:ident => $body:expr) => {
        match $self {
            Store::Mem($db) => $body,
            Store::Fs($db) => $body,
            Store::Sled($db) => $body,
            #[cfg(feature = "rocksdb")]
            Store::Rocks($db) => $body,
        }
    };
}

impl Store {
    /// Returns the adapter as a memdb, if it is one.
    #[must_use]
    pub fn as_mem(&self) -> Option<&MemDb> {
        match self {
            Self::Mem(db) => Some(db),
            _ => None,
        }
    }

    /// Returns the adapter as a sled store, if it is one.
    #[must_use]
    pub fn as_sled(&self) -> Option<&SledDb> {
        match self {
            Self::Sled(db) => Some(db),
            _ => None,
        }
    }
}

impl KvEngine for Store {
    fn backend(&self) -> &'static str {
        dispatch!(self, db => db.backend())
    }

    fn get<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<Option<Vec<u8>>> {
        dispatch!(self, db => db.get(key))
    }

    fn has<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<bool> {
        dispatch!(self, db => db.has(key))
    }

    fn set<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        dispatch!(self, db => db.set(key, value))
    }

    fn set_sync<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        dispatch!(self, db => db.set_sync(key, value))
    }

    fn delete<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        dispatch!(self, db => db.delete(key))
    }

    fn delete_sync<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        dispatch!(self, db => db.delete_sync(key))
    }

    fn iter(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        direction: Direction,
    ) -> StorageResult<KvIter<'_>> {
        dispatch!(self, db => db.iter(start, end, direction))
    }

    fn write(&self, batch: Batch) -> StorageResult<()> {
        dispatch!(self, db => db.write(batch))
    }

    fn write_sync(&self, batch: Batch) -> StorageResult<()> {
        dispatch!(self, db => db.write_sync(batch))
    }

    fn flush(&self) -> StorageResult<()> {
        dispatch!(self, db => db.flush())
    }

    fn stats(&self) -> BTreeMap<String, String> {
        dispatch!(self, db => db.stats())
    }

    fn close(self) -> StorageResult<()> {
        dispatch!(self, db => db.close())
    }
}

impl From<MemDb> for Store {
    fn from(db: MemDb) -> Self {
        Self::Mem(db)
    }
}

impl From<FsDb> for Store {
    fn from(db: FsDb) -> Self {
        Self::Fs(db)
    }
}

impl From<SledDb> for Store {
    fn from(db: SledDb) -> Self {
        Self::Sled(db)
    }
}

#[cfg(feature = "rocksdb")]
impl From<RocksDb> for Store {
    fn from(db: RocksDb) -> Self {
        Self::Rocks(db)
    }
}
