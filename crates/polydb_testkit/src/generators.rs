//! Property-based test generators using proptest.
//!
//! Provides strategies for keys, values and operation sequences, plus a
//! plain `rand` generator for bulk data.

use proptest::prelude::*;
use rand::Rng;
use std::collections::BTreeMap;

/// Strategy for generating keys, including the empty key.
///
/// Lengths reach past 255 bytes so that file-backed stores see keys whose
/// encoded name exceeds a single path component.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..300)
}

/// Strategy for generating values, including the empty value.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for generating values that may be nil.
pub fn optional_value_strategy() -> impl Strategy<Value = Option<Vec<u8>>> {
    prop::option::of(value_strategy())
}

/// Strategy for generating records with unique keys.
pub fn unique_pairs_strategy(
    min: usize,
    max: usize,
) -> impl Strategy<Value = BTreeMap<Vec<u8>, Vec<u8>>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), min..max)
}

/// A store operation for model-based tests.
#[derive(Debug, Clone)]
pub enum KvOperation {
    /// Buffered set.
    Set {
        /// Key
        key: Vec<u8>,
        /// Value, `None` for nil
        value: Option<Vec<u8>>,
    },
    /// Durable set.
    SetSync {
        /// Key
        key: Vec<u8>,
        /// Value, `None` for nil
        value: Option<Vec<u8>>,
    },
    /// Buffered delete.
    Delete {
        /// Key
        key: Vec<u8>,
    },
    /// Durable delete.
    DeleteSync {
        /// Key
        key: Vec<u8>,
    },
    /// Read.
    Get {
        /// Key
        key: Vec<u8>,
    },
}

/// Strategy for keys drawn from a small space, so operations collide.
pub fn colliding_key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 0..3)
}

/// Strategy for generating store operations.
pub fn operation_strategy() -> impl Strategy<Value = KvOperation> {
    prop_oneof![
        3 => (colliding_key_strategy(), optional_value_strategy())
            .prop_map(|(key, value)| KvOperation::Set { key, value }),
        1 => (colliding_key_strategy(), optional_value_strategy())
            .prop_map(|(key, value)| KvOperation::SetSync { key, value }),
        2 => colliding_key_strategy().prop_map(|key| KvOperation::Delete { key }),
        1 => colliding_key_strategy().prop_map(|key| KvOperation::DeleteSync { key }),
        3 => colliding_key_strategy().prop_map(|key| KvOperation::Get { key }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<KvOperation>> {
    prop::collection::vec(operation_strategy(), min_ops..max_ops)
}

/// Generates `count` random records with unique keys.
///
/// Keys are 1 to 256 bytes and values 0 to 256 bytes.
pub fn random_pairs(count: usize) -> BTreeMap<Vec<u8>, Vec<u8>> {
    let mut rng = rand::thread_rng();
    let mut pairs = BTreeMap::new();
    while pairs.len() < count {
        let key_len = rng.gen_range(1..=256);
        let value_len = rng.gen_range(0..=256);
        let key: Vec<u8> = (0..key_len).map(|_| rng.gen()).collect();
        let value: Vec<u8> = (0..value_len).map(|_| rng.gen()).collect();
        pairs.insert(key, value);
    }
    pairs
}
