//! Atomic multi-key write batches.

use crate::arg::ByteArg;
use crate::validate::{check_key, normalize_value};

/// A single operation recorded in a [`Batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Store a value under a key.
    Set {
        /// The key.
        key: Vec<u8>,
        /// The value, already normalized (nil stored as empty).
        value: Vec<u8>,
    },
    /// Remove a key.
    Delete {
        /// The key.
        key: Vec<u8>,
    },
}

impl BatchOp {
    /// Returns the key this operation touches.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Set { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// An ordered set of writes applied together by [`crate::KvEngine::write`].
///
/// Keys are validated when they are added, with the same nil-key panic as
/// the per-key operations. Later operations on the same key win.
///
/// # Example
///
/// ```rust
/// use polydb_storage::{Batch, KvEngine, MemDb};
///
/// let db = MemDb::new();
/// let mut batch = Batch::new();
/// batch.set(b"a", b"1").set(b"b", b"2").delete(b"a");
/// db.write(batch).unwrap();
///
/// assert_eq!(db.get(b"a").unwrap(), None);
/// assert_eq!(db.get(b"b").unwrap(), Some(b"2".to_vec()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a set of `value` under `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is nil.
    #[track_caller]
    pub fn set<K, V>(&mut self, key: &K, value: &V) -> &mut Self
    where
        K: ByteArg + ?Sized,
        V: ByteArg + ?Sized,
    {
        let key = check_key(key.byte_arg(), "batch set");
        let value = normalize_value(value.byte_arg());
        self.ops.push(BatchOp::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        self
    }

    /// Records a delete of `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is nil.
    #[track_caller]
    pub fn delete<K: ByteArg + ?Sized>(&mut self, key: &K) -> &mut Self {
        let key = check_key(key.byte_arg(), "batch delete");
        self.ops.push(BatchOp::Delete { key: key.to_vec() });
        self
    }

    /// Returns the number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the recorded operations in order.
    #[must_use]
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}

impl IntoIterator for Batch {
    type Item = BatchOp;
    type IntoIter = std::vec::IntoIter<BatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
