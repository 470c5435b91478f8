//! Conformance tests run against every registered backend.

use polydb_core::{Direction, KvEngine, MemDb, Store, StoreFactory, NIL};
use polydb_testkit::prelude::*;
use std::path::Path;

#[test]
fn every_backend_passes_contract_suite() {
    init_test_tracing();
    let factory = StoreFactory::with_defaults();
    for backend in available_backends() {
        let mut dirs = Vec::new();
        run_contract_suite(|| {
            let dir = tempfile::tempdir().unwrap();
            let store = factory
                .open(&unique_name("contract"), &backend, dir.path())
                .unwrap();
            dirs.push(dir);
            store
        });
    }
}

#[test]
fn get_set_delete_on_each_backend() {
    with_each_backend(|_backend, store| {
        assert_get_set_delete(store);
    });
}

#[test]
fn nil_keys_panic_on_each_backend() {
    with_each_backend(|_backend, store| {
        assert_nil_keys_panic(store);
    });
}

#[test]
#[should_panic(expected = "nil key passed to get")]
fn nil_get_panics() {
    let store = TestStore::open("memdb");
    let _ = store.get(&NIL);
}

#[test]
#[should_panic(expected = "nil key passed to set_sync")]
fn nil_set_sync_panics_on_sled() {
    let store = TestStore::open("sled");
    let _ = store.set_sync(&NIL, b"value");
}

#[test]
#[should_panic(expected = "nil key passed to delete")]
fn nil_delete_panics_on_fsdb() {
    let store = TestStore::open("fsdb");
    let _ = store.delete(&NIL);
}

#[test]
fn memdb_basic_scenario() {
    let factory = StoreFactory::with_defaults();
    let store = factory.open("t1", "memdb", Path::new("")).unwrap();

    assert_eq!(store.get(b"abc").unwrap(), None);
    store.set(b"abc", b"").unwrap();
    assert_eq!(store.get(b"abc").unwrap(), Some(Vec::new()));
    store.set(b"abc", &NIL).unwrap();
    assert_eq!(store.get(b"abc").unwrap(), Some(Vec::new()));
    assert!(store.has(b"abc").unwrap());

    store.set(b"abc", b"def").unwrap();
    assert_eq!(store.get(b"abc").unwrap(), Some(b"def".to_vec()));

    store.delete(b"abc").unwrap();
    assert_eq!(store.get(b"abc").unwrap(), None);
    assert!(!store.has(b"abc").unwrap());

    store.close().unwrap();
}

#[test]
fn random_pairs_round_trip_on_each_backend() {
    let pairs = random_pairs(1_000);
    with_each_backend(|_backend, store| {
        assert_round_trip(store, &pairs);
    });
}

#[test]
fn iteration_matches_across_backends() {
    let pairs = random_pairs(200);
    let mut listings = Vec::new();

    with_each_backend(|backend, store| {
        for (key, value) in &pairs {
            store.set(key, value).unwrap();
        }
        let reversed = collect(store, None, None, Direction::Reverse);
        listings.push((backend.to_string(), reversed));
    });

    let (_, first) = &listings[0];
    for (backend, listing) in &listings[1..] {
        assert_eq!(listing, first, "{backend} iterates differently");
    }
}

#[test]
fn stats_name_backend() {
    with_each_backend(|backend, store| {
        let stats = store.stats();
        assert!(stats.contains_key("database.type"), "{backend}");
    });
}

#[test]
fn direct_memdb_passes_contract_suite() {
    run_contract_suite(|| Store::from(MemDb::new()));
}
