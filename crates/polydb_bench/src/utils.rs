//! Benchmark utilities.

use polydb_core::{KvEngine, Store, StoreFactory};
use rand::Rng;
use tempfile::TempDir;

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` sequential keys.
pub fn generate_keys(count: usize) -> Vec<Vec<u8>> {
    (0..count as u64).map(|i| i.to_be_bytes().to_vec()).collect()
}

/// Generate records with the specified value size.
pub fn generate_pairs(count: usize, value_size: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    generate_keys(count)
        .into_iter()
        .map(|key| (key, random_data(value_size)))
        .collect()
}

/// Opens a store on `backend` in a fresh temporary directory.
///
/// Bind the result as `(_dir, store)` so the store drops first.
pub fn open_bench_store(backend: &str) -> (TempDir, Store) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let store = StoreFactory::with_defaults()
        .open("bench", backend, dir.path())
        .unwrap_or_else(|e| panic!("Failed to open {backend} store: {e}"));
    (dir, store)
}

/// Writes every record of `pairs` to `store`.
pub fn populate(store: &Store, pairs: &[(Vec<u8>, Vec<u8>)]) {
    for (key, value) in pairs {
        store.set(key, value).expect("Failed to populate store");
    }
}
