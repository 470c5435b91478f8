//! Engine conformance checks.
//!
//! Every backend must pass these. Each check takes a freshly opened,
//! empty engine and panics with a descriptive message on the first
//! deviation.

use crate::generators::KvOperation;
use polydb_core::{Batch, Direction, KvEngine, KvPair, NIL};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Checks that unknown keys read as absent.
pub fn assert_absent_before_set<E: KvEngine>(db: &E) {
    assert_eq!(db.get(b"abc").unwrap(), None, "{}: unset key", db.backend());
    assert!(!db.has(b"abc").unwrap(), "{}: has on unset key", db.backend());
    assert_eq!(db.get(b"").unwrap(), None, "{}: unset empty key", db.backend());
}

/// Checks the basic set, overwrite and delete cycle, with both the buffered
/// and the durable variants.
pub fn assert_get_set_delete<E: KvEngine>(db: &E) {
    let backend = db.backend();

    assert_eq!(db.get(b"abc").unwrap(), None, "{backend}: before set");

    db.set(b"abc", b"def").unwrap();
    assert_eq!(db.get(b"abc").unwrap(), Some(b"def".to_vec()), "{backend}: after set");
    assert!(db.has(b"abc").unwrap(), "{backend}: has after set");

    db.set_sync(b"abc", b"ghi").unwrap();
    assert_eq!(db.get(b"abc").unwrap(), Some(b"ghi".to_vec()), "{backend}: after overwrite");

    db.delete(b"abc").unwrap();
    assert_eq!(db.get(b"abc").unwrap(), None, "{backend}: after delete");
    assert!(!db.has(b"abc").unwrap(), "{backend}: has after delete");

    db.set(b"abc", b"jkl").unwrap();
    db.delete_sync(b"abc").unwrap();
    assert_eq!(db.get(b"abc").unwrap(), None, "{backend}: after delete_sync");

    // Deleting an absent key succeeds
    db.delete(b"abc").unwrap();
    db.delete_sync(b"never-set").unwrap();
}

/// Checks that nil and zero-length values both read back as empty, and
/// that the empty key is an ordinary key.
pub fn assert_empty_values<E: KvEngine>(db: &E) {
    let backend = db.backend();

    db.set(b"nil", &NIL).unwrap();
    assert_eq!(db.get(b"nil").unwrap(), Some(Vec::new()), "{backend}: nil value");
    assert!(db.has(b"nil").unwrap(), "{backend}: has nil value");

    db.set_sync(b"empty", b"").unwrap();
    assert_eq!(db.get(b"empty").unwrap(), Some(Vec::new()), "{backend}: empty value");

    db.set(b"", b"root").unwrap();
    assert_eq!(db.get(b"").unwrap(), Some(b"root".to_vec()), "{backend}: empty key");
    db.delete(b"").unwrap();
    assert_eq!(db.get(b"").unwrap(), None, "{backend}: empty key after delete");
}

/// Checks that every per-key operation panics on the nil key, and that the
/// engine is unchanged afterwards.
pub fn assert_nil_keys_panic<E: KvEngine>(db: &E) {
    let backend = db.backend();
    db.set(b"keep", b"value").unwrap();

    let checks: [(&str, Box<dyn Fn() + '_>); 6] = [
        ("get", Box::new(|| drop(db.get(&NIL)))),
        ("has", Box::new(|| drop(db.has(&NIL)))),
        ("set", Box::new(|| drop(db.set(&NIL, b"v")))),
        ("set_sync", Box::new(|| drop(db.set_sync(&NIL, b"v")))),
        ("delete", Box::new(|| drop(db.delete(&NIL)))),
        ("delete_sync", Box::new(|| drop(db.delete_sync(&NIL)))),
    ];

    for (op, check) in &checks {
        let result = catch_unwind(AssertUnwindSafe(|| check()));
        assert!(result.is_err(), "{backend}: {op} accepted a nil key");
    }

    assert_eq!(
        db.get(b"keep").unwrap(),
        Some(b"value".to_vec()),
        "{backend}: store changed by rejected calls"
    );
}

/// Checks that long keys behave like short ones, including in iteration.
pub fn assert_long_keys<E: KvEngine>(db: &E) {
    let backend = db.backend();

    for len in [200, 1024] {
        let key: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();

        assert_eq!(db.get(&key).unwrap(), None, "{backend}: {len}-byte key before set");
        assert!(!db.has(&key).unwrap(), "{backend}: has {len}-byte key before set");
        db.delete(&key).unwrap();

        db.set(&key, b"long").unwrap();
        assert_eq!(db.get(&key).unwrap(), Some(b"long".to_vec()), "{backend}: {len}-byte key");
        assert!(db.has(&key).unwrap(), "{backend}: has {len}-byte key");

        let listed = keys_in(db, None, None, Direction::Forward);
        assert_eq!(listed, vec![key.clone()], "{backend}: {len}-byte key in iteration");

        db.delete(&key).unwrap();
        assert_eq!(db.get(&key).unwrap(), None, "{backend}: {len}-byte key after delete");
    }
}

/// Writes every record of `pairs`, then checks each reads back and that
/// iteration returns exactly `pairs` in order.
pub fn assert_round_trip<E: KvEngine>(db: &E, pairs: &BTreeMap<Vec<u8>, Vec<u8>>) {
    let backend = db.backend();

    for (key, value) in pairs {
        db.set(key, value).unwrap();
    }

    for (key, value) in pairs {
        assert_eq!(
            db.get(key).unwrap().as_ref(),
            Some(value),
            "{backend}: value for key {key:02x?}"
        );
    }

    let stored = collect(db, None, None, Direction::Forward);
    let expected: Vec<KvPair> = pairs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    assert_eq!(stored, expected, "{backend}: full iteration");
}

/// Checks range bounds and both iteration directions.
pub fn assert_ordered_iteration<E: KvEngine>(db: &E) {
    let backend = db.backend();
    for key in [&b"d"[..], b"a", b"c", b"b", b"e"] {
        db.set(key, key).unwrap();
    }

    assert_eq!(
        keys_in(db, None, None, Direction::Forward),
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec(), b"e".to_vec()],
        "{backend}: forward"
    );
    assert_eq!(
        keys_in(db, None, None, Direction::Reverse),
        vec![b"e".to_vec(), b"d".to_vec(), b"c".to_vec(), b"b".to_vec(), b"a".to_vec()],
        "{backend}: reverse"
    );
    assert_eq!(
        keys_in(db, Some(b"b"), Some(b"d"), Direction::Forward),
        vec![b"b".to_vec(), b"c".to_vec()],
        "{backend}: half-open range"
    );
    assert_eq!(
        keys_in(db, Some(b"b"), Some(b"d"), Direction::Reverse),
        vec![b"c".to_vec(), b"b".to_vec()],
        "{backend}: reverse range"
    );
    assert_eq!(
        keys_in(db, Some(b"c"), None, Direction::Forward),
        vec![b"c".to_vec(), b"d".to_vec(), b"e".to_vec()],
        "{backend}: lower bound only"
    );
    assert!(
        keys_in(db, Some(b"d"), Some(b"b"), Direction::Forward).is_empty(),
        "{backend}: inverted range"
    );
    assert!(
        keys_in(db, Some(b"c"), Some(b"c"), Direction::Forward).is_empty(),
        "{backend}: empty range"
    );
}

fn keys_in<E: KvEngine>(
    db: &E,
    start: Option<&[u8]>,
    end: Option<&[u8]>,
    direction: Direction,
) -> Vec<Vec<u8>> {
    collect(db, start, end, direction)
        .into_iter()
        .map(|(k, _)| k)
        .collect()
}

/// Checks that a batch applies its operations in order.
pub fn assert_batch_semantics<E: KvEngine>(db: &E) {
    let backend = db.backend();
    db.set(b"old", b"1").unwrap();

    let mut batch = Batch::new();
    batch
        .set(b"a", b"1")
        .set(b"b", b"2")
        .set(b"a", b"3")
        .delete(b"old")
        .set(b"c", &NIL)
        .delete(b"b");
    db.write(batch).unwrap();

    assert_eq!(db.get(b"a").unwrap(), Some(b"3".to_vec()), "{backend}: last set wins");
    assert_eq!(db.get(b"b").unwrap(), None, "{backend}: set then delete");
    assert_eq!(db.get(b"c").unwrap(), Some(Vec::new()), "{backend}: nil value in batch");
    assert_eq!(db.get(b"old").unwrap(), None, "{backend}: delete in batch");

    let mut batch = Batch::new();
    batch.set(b"d", b"4");
    db.write_sync(batch).unwrap();
    assert_eq!(db.get(b"d").unwrap(), Some(b"4".to_vec()), "{backend}: write_sync");

    db.write(Batch::new()).unwrap();
}

/// Checks that stats name the backend.
pub fn assert_stats<E: KvEngine>(db: &E) {
    let stats = db.stats();
    assert!(
        stats.contains_key("database.type"),
        "{}: stats without database.type",
        db.backend()
    );
}

/// Applies `ops` to `db` and to an in-memory model, checking every read
/// and the final contents against the model.
pub fn assert_matches_model<E: KvEngine>(db: &E, ops: &[KvOperation]) {
    let backend = db.backend();
    let mut model = ModelStore::default();

    for (step, op) in ops.iter().enumerate() {
        match op {
            KvOperation::Set { key, value } => {
                db.set(key, value).unwrap();
                model.set(key, value.as_deref());
            }
            KvOperation::SetSync { key, value } => {
                db.set_sync(key, value).unwrap();
                model.set(key, value.as_deref());
            }
            KvOperation::Delete { key } => {
                db.delete(key).unwrap();
                model.delete(key);
            }
            KvOperation::DeleteSync { key } => {
                db.delete_sync(key).unwrap();
                model.delete(key);
            }
            KvOperation::Get { key } => {
                assert_eq!(
                    db.get(key).unwrap(),
                    model.get(key),
                    "{backend}: step {step} {op:?}"
                );
                assert_eq!(db.has(key).unwrap(), model.get(key).is_some());
            }
        }
    }

    assert_eq!(
        collect(db, None, None, Direction::Forward),
        model.pairs(),
        "{backend}: final contents"
    );
}

/// Runs every conformance check against fresh engines from `open`.
pub fn run_contract_suite<E, F>(mut open: F)
where
    E: KvEngine,
    F: FnMut() -> E,
{
    let checks: [fn(&E); 8] = [
        assert_absent_before_set::<E>,
        assert_get_set_delete::<E>,
        assert_empty_values::<E>,
        assert_long_keys::<E>,
        assert_nil_keys_panic::<E>,
        assert_ordered_iteration::<E>,
        assert_batch_semantics::<E>,
        assert_stats::<E>,
    ];

    for check in checks {
        let db = open();
        check(&db);
        db.close().expect("Failed to close engine");
    }
}

/// Reference model of the engine contract.
#[derive(Debug, Default, Clone)]
pub struct ModelStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl ModelStore {
    /// Stores `value`, treating nil as empty.
    pub fn set(&mut self, key: &[u8], value: Option<&[u8]>) {
        self.data
            .insert(key.to_vec(), value.unwrap_or_default().to_vec());
    }

    /// Removes `key`.
    pub fn delete(&mut self, key: &[u8]) {
        self.data.remove(key);
    }

    /// Returns the value under `key`.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    /// Returns every record in key order.
    #[must_use]
    pub fn pairs(&self) -> Vec<KvPair> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Collects an iteration, panicking on any error.
pub fn collect<E: KvEngine>(
    db: &E,
    start: Option<&[u8]>,
    end: Option<&[u8]>,
    direction: Direction,
) -> Vec<KvPair> {
    db.iter(start, end, direction)
        .expect("Failed to create iterator")
        .collect::<Result<_, _>>()
        .expect("Iteration failed")
}
