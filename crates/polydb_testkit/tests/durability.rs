//! Durability tests for the on-disk backends.

use polydb_core::{Batch, Direction, KvEngine};
use polydb_testkit::prelude::*;

#[test]
fn sync_writes_survive_reopen() {
    for backend in persistent_backends() {
        let store = TestStore::open(&backend);
        store.set_sync(b"durable", b"yes").unwrap();
        store.set_sync(b"gone", b"soon").unwrap();
        store.delete_sync(b"gone").unwrap();

        let store = store.reopen();
        assert_eq!(
            store.get(b"durable").unwrap(),
            Some(b"yes".to_vec()),
            "{backend}"
        );
        assert_eq!(store.get(b"gone").unwrap(), None, "{backend}");
    }
}

#[test]
fn close_flushes_buffered_writes() {
    for backend in persistent_backends() {
        let store = TestStore::open(&backend);
        for i in 0..100u32 {
            store.set(&i.to_be_bytes(), &[i as u8; 32]).unwrap();
        }
        store.delete(&7u32.to_be_bytes()).unwrap();

        let store = store.reopen();
        let keys: Vec<Vec<u8>> = collect(&*store, None, None, Direction::Forward)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys.len(), 99, "{backend}");
        assert!(!keys.contains(&7u32.to_be_bytes().to_vec()), "{backend}");
        assert_eq!(
            store.get(&42u32.to_be_bytes()).unwrap(),
            Some(vec![42u8; 32]),
            "{backend}"
        );
    }
}

#[test]
fn flush_makes_buffered_writes_durable() {
    for backend in persistent_backends() {
        let store = TestStore::open(&backend);
        store.set(b"buffered", b"value").unwrap();
        store.flush().unwrap();

        let store = store.reopen();
        assert_eq!(
            store.get(b"buffered").unwrap(),
            Some(b"value".to_vec()),
            "{backend}"
        );
    }
}

#[test]
fn synced_batch_survives_reopen() {
    for backend in persistent_backends() {
        let store = TestStore::open(&backend);
        store.set_sync(b"stale", b"1").unwrap();

        let mut batch = Batch::new();
        batch.set(b"a", b"1").set(b"b", b"2").delete(b"stale");
        store.write_sync(batch).unwrap();

        let store = store.reopen();
        let records = collect(&*store, None, None, Direction::Forward);
        assert_eq!(
            records,
            vec![
                (b"a".to_vec(), b"1".to_vec()),
                (b"b".to_vec(), b"2".to_vec()),
            ],
            "{backend}"
        );
    }
}

#[test]
fn memdb_is_volatile() {
    let store = TestStore::open("memdb");
    store.set_sync(b"k", b"v").unwrap();

    let store = store.reopen();
    assert_eq!(store.get(b"k").unwrap(), None);
}

#[test]
fn long_keys_survive_reopen() {
    let keys: Vec<Vec<u8>> = [200usize, 600, 1024]
        .iter()
        .map(|&len| (0..len).map(|i| (i % 7) as u8).collect())
        .collect();

    for backend in persistent_backends() {
        let store = TestStore::open(&backend);
        for (i, key) in keys.iter().enumerate() {
            store.set_sync(key, &[i as u8]).unwrap();
        }

        let store = store.reopen();
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(store.get(key).unwrap(), Some(vec![i as u8]), "{backend}");
        }
        let listed = collect(&*store, None, None, Direction::Forward);
        assert_eq!(listed.len(), keys.len(), "{backend}");
    }
}
