//! Engine contract definition.

use crate::arg::ByteArg;
use crate::batch::Batch;
use crate::error::StorageResult;
use crate::validate::check_key;
use std::collections::BTreeMap;
use std::ops::Bound;

/// A key-value record.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Iterator over records produced by [`KvEngine::iter`].
pub type KvIter<'a> = Box<dyn Iterator<Item = StorageResult<KvPair>> + 'a>;

/// Iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending key order.
    #[default]
    Forward,
    /// Descending key order.
    Reverse,
}

/// The operation set every backend exposes.
///
/// Backends differ internally but must be observably identical through this
/// trait.
///
/// # Invariants
///
/// - After `set(k, v)` succeeds, `get(k)` returns `Some(v)` until `k` is
///   mutated again. Nil and zero-length values both read back as
///   `Some(vec![])`.
/// - After `delete(k)` succeeds, `get(k)` returns `None`.
/// - `has(k)` is true iff `get(k)` is `Some`.
/// - Every per-key operation panics on the nil key.
///
/// # Durability
///
/// `set`, `delete` and `write` are buffered: they are durable only after a
/// later sync operation, [`KvEngine::flush`], or [`KvEngine::close`]. The
/// `_sync` variants are durable before they return. Backends without
/// durability collapse both forms into one.
///
/// # Implementors
///
/// - [`crate::MemDb`] - volatile, for tests and caches
/// - [`crate::FsDb`] - one file per key
/// - [`crate::SledDb`] - embedded sled engine
/// - `RocksDb` - native RocksDB engine (feature `rocksdb`)
pub trait KvEngine: Send + Sync {
    /// Returns the backend identifier of this engine.
    fn backend(&self) -> &'static str;

    /// Returns the value stored under `key`, or `None` if absent.
    ///
    /// # Panics
    ///
    /// Panics if `key` is nil.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to read.
    fn get<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<Option<Vec<u8>>>;

    /// Returns whether a value is stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is nil.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to read.
    fn has<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<bool> {
        check_key(key.byte_arg(), "has");
        Ok(self.get(key)?.is_some())
    }

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// # Panics
    ///
    /// Panics if `key` is nil.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to write.
    fn set<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized;

    /// Like [`KvEngine::set`], but durable before returning.
    ///
    /// # Panics
    ///
    /// Panics if `key` is nil.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to write or sync.
    fn set_sync<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Panics
    ///
    /// Panics if `key` is nil.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to write.
    fn delete<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()>;

    /// Like [`KvEngine::delete`], but durable before returning.
    ///
    /// # Panics
    ///
    /// Panics if `key` is nil.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to write or sync.
    fn delete_sync<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()>;

    /// Iterates over records with keys in `[start, end)`.
    ///
    /// Either bound may be omitted. An empty range yields nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the iterator cannot be created. Errors met while
    /// iterating are yielded as items.
    fn iter(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        direction: Direction,
    ) -> StorageResult<KvIter<'_>>;

    /// Applies every operation in `batch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to write.
    fn write(&self, batch: Batch) -> StorageResult<()>;

    /// Like [`KvEngine::write`], but durable before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to write or sync.
    fn write_sync(&self, batch: Batch) -> StorageResult<()>;

    /// Makes every buffered write durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn flush(&self) -> StorageResult<()>;

    /// Returns engine statistics. Always contains `database.type`.
    fn stats(&self) -> BTreeMap<String, String>;

    /// Flushes and releases every resource held by the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails. Resources are released
    /// either way.
    fn close(self) -> StorageResult<()>
    where
        Self: Sized;
}

/// Converts optional `[start, end)` bounds into a range, or `None` if the
/// range is empty.
pub(crate) fn key_range(
    start: Option<&[u8]>,
    end: Option<&[u8]>,
) -> Option<(Bound<Vec<u8>>, Bound<Vec<u8>>)> {
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return None;
        }
    }
    let lower = start.map_or(Bound::Unbounded, |s| Bound::Included(s.to_vec()));
    let upper = end.map_or(Bound::Unbounded, |e| Bound::Excluded(e.to_vec()));
    Some((lower, upper))
}

/// Returns whether `key` lies in `[start, end)`.
pub(crate) fn in_range(key: &[u8], start: Option<&[u8]>, end: Option<&[u8]>) -> bool {
    start.map_or(true, |s| key >= s) && end.map_or(true, |e| key < e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_range_unbounded() {
        let (lower, upper) = key_range(None, None).unwrap();
        assert_eq!(lower, Bound::Unbounded);
        assert_eq!(upper, Bound::Unbounded);
    }

    #[test]
    fn key_range_half_open() {
        let (lower, upper) = key_range(Some(b"a"), Some(b"c")).unwrap();
        assert_eq!(lower, Bound::Included(b"a".to_vec()));
        assert_eq!(upper, Bound::Excluded(b"c".to_vec()));
    }

    #[test]
    fn key_range_empty() {
        assert!(key_range(Some(b"c"), Some(b"a")).is_none());
        assert!(key_range(Some(b"a"), Some(b"a")).is_none());
    }

    #[test]
    fn in_range_bounds() {
        assert!(in_range(b"a", Some(b"a"), Some(b"b")));
        assert!(!in_range(b"b", Some(b"a"), Some(b"b")));
        assert!(in_range(b"", None, Some(b"a")));
        assert!(!in_range(b"", Some(b"a"), None));
    }
}
