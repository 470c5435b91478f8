//! Volatile in-memory backend.

use crate::arg::ByteArg;
use crate::batch::{Batch, BatchOp};
use crate::engine::{key_range, Direction, KvEngine, KvIter, KvPair};
use crate::error::StorageResult;
use crate::validate::{check_key, normalize_value};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Backend identifier of [`MemDb`].
pub const MEMDB_BACKEND: &str = "memdb";

/// An in-memory backend.
///
/// Nothing survives the process, so the `_sync` operations behave exactly
/// like their buffered counterparts.
///
/// # Thread Safety
///
/// Writers are serialized by an internal lock; readers run concurrently.
///
/// # Example
///
/// ```rust
/// use polydb_storage::{KvEngine, MemDb};
///
/// let db = MemDb::new();
/// db.set(b"key", b"").unwrap();
/// assert_eq!(db.get(b"key").unwrap(), Some(Vec::new()));
/// ```
#[derive(Debug, Default)]
pub struct MemDb {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemDb {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn apply(data: &mut BTreeMap<Vec<u8>, Vec<u8>>, op: BatchOp) {
        match op {
            BatchOp::Set { key, value } => {
                data.insert(key, value);
            }
            BatchOp::Delete { key } => {
                data.remove(&key);
            }
        }
    }
}

impl KvEngine for MemDb {
    fn backend(&self) -> &'static str {
        MEMDB_BACKEND
    }

    fn get<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<Option<Vec<u8>>> {
        let key = check_key(key.byte_arg(), "get");
        Ok(self.data.read().get(key).cloned())
    }

    fn has<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<bool> {
        let key = check_key(key.byte_arg(), "has");
        Ok(self.data.read().contains_key(key))
    }

    fn set<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        let key = check_key(key.byte_arg(), "set");
        let value = normalize_value(value.byte_arg());
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn set_sync<K, V>(&self, key: &K, value: &V) -> StorageResult<()>
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        check_key(key.byte_arg(), "set_sync");
        self.set(key, value)
    }

    fn delete<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        let key = check_key(key.byte_arg(), "delete");
        self.data.write().remove(key);
        Ok(())
    }

    fn delete_sync<K: ByteArg + ?Sized>(&self, key: &K) -> StorageResult<()> {
        check_key(key.byte_arg(), "delete_sync");
        self.delete(key)
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

        // Snapshot so the iterator does not hold the lock.
        let data = self.data.read();
        let mut pairs: Vec<KvPair> = data
            .range(range)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if direction == Direction::Reverse {
            pairs.reverse();
        }
        Ok(Box::new(pairs.into_iter().map(Ok)))
    }

    fn write(&self, batch: Batch) -> StorageResult<()> {
        let mut data = self.data.write();
        for op in batch {
            Self::apply(&mut data, op);
        }
        Ok(())
    }

    fn write_sync(&self, batch: Batch) -> StorageResult<()> {
        self.write(batch)
    }

    fn flush(&self) -> StorageResult<()> {
        // Nothing is ever buffered
        Ok(())
    }

    fn stats(&self) -> BTreeMap<String, String> {
        let mut stats = BTreeMap::new();
        stats.insert("database.type".to_string(), MEMDB_BACKEND.to_string());
        stats.insert("database.keys".to_string(), self.len().to_string());
        stats
    }

    fn close(self) -> StorageResult<()> {
        tracing::debug!(keys = self.len(), "closing memdb");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::NIL;
    use crate::engine::in_range;
    use proptest::prelude::*;

    fn collect(iter: KvIter<'_>) -> Vec<KvPair> {
        iter.map(|item| item.unwrap()).collect()
    }

    #[test]
    fn memdb_new_is_empty() {
        let db = MemDb::new();
        assert!(db.is_empty());
        assert_eq!(db.get(b"abc").unwrap(), None);
        assert!(!db.has(b"abc").unwrap());
    }

    #[test]
    fn memdb_empty_value_is_present() {
        let db = MemDb::new();

        db.set(b"abc", b"").unwrap();
        assert_eq!(db.get(b"abc").unwrap(), Some(Vec::new()));
        assert!(db.has(b"abc").unwrap());

        db.set(b"abc", &NIL).unwrap();
        assert_eq!(db.get(b"abc").unwrap(), Some(Vec::new()));

        db.delete(b"abc").unwrap();
        assert_eq!(db.get(b"abc").unwrap(), None);
    }

    #[test]
    fn memdb_overwrite() {
        let db = MemDb::new();
        db.set(b"k", b"one").unwrap();
        db.set_sync(b"k", b"two").unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"two".to_vec()));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn memdb_delete_absent_is_noop() {
        let db = MemDb::new();
        db.delete(b"missing").unwrap();
        db.delete_sync(b"missing").unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn memdb_empty_key() {
        let db = MemDb::new();
        db.set(b"", b"root").unwrap();
        assert_eq!(db.get(b"").unwrap(), Some(b"root".to_vec()));
    }

    #[test]
    fn memdb_iter_forward_and_reverse() {
        let db = MemDb::new();
        for key in [b"a", b"b", b"c", b"d"] {
            db.set(key, key).unwrap();
        }

        let forward = collect(db.iter(Some(b"b"), Some(b"d"), Direction::Forward).unwrap());
        assert_eq!(
            forward,
            vec![(b"b".to_vec(), b"b".to_vec()), (b"c".to_vec(), b"c".to_vec())]
        );

        let reverse = collect(db.iter(None, None, Direction::Reverse).unwrap());
        let keys: Vec<_> = reverse.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"d".to_vec(), b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn memdb_iter_empty_range() {
        let db = MemDb::new();
        db.set(b"a", b"1").unwrap();
        let pairs = collect(db.iter(Some(b"z"), Some(b"a"), Direction::Forward).unwrap());
        assert!(pairs.is_empty());
    }

    #[test]
    fn memdb_write_batch() {
        let db = MemDb::new();
        db.set(b"gone", b"x").unwrap();

        let mut batch = Batch::new();
        batch.set(b"a", b"1").set(b"b", &NIL).delete(b"gone");
        db.write_sync(batch).unwrap();

        assert_eq!(db.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(db.get(b"b").unwrap(), Some(Vec::new()));
        assert_eq!(db.get(b"gone").unwrap(), None);
    }

    #[test]
    fn memdb_stats() {
        let db = MemDb::new();
        db.set(b"a", b"1").unwrap();
        let stats = db.stats();
        assert_eq!(stats["database.type"], "memdb");
        assert_eq!(stats["database.keys"], "1");
    }

    #[test]
    #[should_panic(expected = "nil key passed to get")]
    fn memdb_get_nil_key_panics() {
        let _ = MemDb::new().get(&NIL);
    }

    #[test]
    #[should_panic(expected = "nil key passed to set_sync")]
    fn memdb_set_sync_nil_key_panics() {
        let _ = MemDb::new().set_sync(&NIL, b"v");
    }

    fn short_bytes(max: usize) -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(any::<u8>(), 0..max)
    }

    fn bound_strategy() -> impl Strategy<Value = Option<Vec<u8>>> {
        proptest::option::of(short_bytes(3))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn memdb_iter_matches_btree_model(
            pairs in proptest::collection::vec((short_bytes(3), short_bytes(4)), 0..40),
            start in bound_strategy(),
            end in bound_strategy(),
            reverse in any::<bool>(),
        ) {
            let db = MemDb::new();
            let mut model = BTreeMap::new();
            for (key, value) in &pairs {
                db.set(key, value).unwrap();
                model.insert(key.clone(), value.clone());
            }

            let direction = if reverse { Direction::Reverse } else { Direction::Forward };
            let got = collect(db.iter(start.as_deref(), end.as_deref(), direction).unwrap());

            let mut expected: Vec<KvPair> = model
                .into_iter()
                .filter(|(key, _)| in_range(key, start.as_deref(), end.as_deref()))
                .collect();
            if reverse {
                expected.reverse();
            }
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn key_range_is_empty_only_for_inverted_bounds(
            start in bound_strategy(),
            end in bound_strategy(),
        ) {
            let inverted = matches!((&start, &end), (Some(s), Some(e)) if s >= e);
            prop_assert_eq!(key_range(start.as_deref(), end.as_deref()).is_none(), inverted);
        }
    }
}
