//! Stress tests for PolyDB engines.
//!
//! These helpers drive an engine under heavy load and concurrent access
//! and report throughput.

use polydb_core::{Batch, KvEngine};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
///
/// `threads` and `key_count` must be non-zero; every stress run panics
/// otherwise.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Size of each value in bytes.
    pub value_size: usize,
    /// Number of distinct keys.
    pub key_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            value_size: 256,
            key_count: 1_000,
        }
    }
}

impl StressConfig {
    fn assert_valid(&self) {
        assert!(self.threads > 0, "StressConfig::threads must be non-zero");
        assert!(self.key_count > 0, "StressConfig::key_count must be non-zero");
    }
}

/// Returns the key for slot `i`.
pub fn stress_key(i: usize) -> Vec<u8> {
    format!("key-{i:08}").into_bytes()
}

fn tally<T, E>(result: Result<T, E>, successful: &mut usize, failed: &mut usize) {
    match result {
        Ok(_) => *successful += 1,
        Err(_) => *failed += 1,
    }
}

fn populate<E: KvEngine>(db: &E, config: &StressConfig) {
    let data = vec![0xABu8; config.value_size];
    let mut batch = Batch::new();
    for i in 0..config.key_count {
        batch.set(&stress_key(i), &data);
    }
    db.write(batch).expect("Failed to populate store");
}

/// Run a sequential write stress test.
pub fn stress_sequential_writes<E: KvEngine>(db: &E, config: &StressConfig) -> StressTestResult {
    config.assert_valid();
    let data = vec![0xABu8; config.value_size];

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = stress_key(i % config.key_count);
        tally(db.set(&key, &data), &mut successful, &mut failed);
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a sequential read stress test.
pub fn stress_sequential_reads<E: KvEngine>(db: &E, config: &StressConfig) -> StressTestResult {
    config.assert_valid();
    populate(db, config);

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = stress_key(i % config.key_count);
        // A miss is still a successful read
        tally(db.get(&key), &mut successful, &mut failed);
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a mixed read/write/delete stress test.
pub fn stress_mixed_operations<E: KvEngine>(db: &E, config: &StressConfig) -> StressTestResult {
    config.assert_valid();
    let data = vec![0xABu8; config.value_size];

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = stress_key(i % config.key_count);

        let result = match i % 3 {
            0 => db.set(&key, &data),
            1 => db.get(&key).map(|_| ()),
            _ => db.delete(&key),
        };
        tally(result, &mut successful, &mut failed);
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a durable write stress test.
pub fn stress_sync_writes<E: KvEngine>(db: &E, config: &StressConfig) -> StressTestResult {
    config.assert_valid();
    let data = vec![0xABu8; config.value_size];

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = stress_key(i % config.key_count);
        tally(db.set_sync(&key, &data), &mut successful, &mut failed);
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a concurrent read stress test.
pub fn stress_concurrent_reads<E: KvEngine>(db: &E, config: &StressConfig) -> StressTestResult {
    config.assert_valid();
    populate(db, config);

    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    thread::scope(|s| {
        for t in 0..config.threads {
            let (successful, failed) = (&successful, &failed);
            s.spawn(move || {
                for i in 0..ops_per_thread {
                    let key = stress_key((t * ops_per_thread + i) % config.key_count);
                    match db.get(&key) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
        }
    });

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run a concurrent write stress test.
///
/// Each thread owns a disjoint slice of the key space, so every key ends up
/// holding the value its writer last stored.
pub fn stress_concurrent_writes<E: KvEngine>(db: &E, config: &StressConfig) -> StressTestResult {
    config.assert_valid();
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    thread::scope(|s| {
        for t in 0..config.threads {
            let (successful, failed) = (&successful, &failed);
            s.spawn(move || {
                let value = vec![t as u8; config.value_size];
                for i in 0..ops_per_thread {
                    let key = stress_key(t * ops_per_thread + i);
                    match db.set(&key, &value) {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
        }
    });

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run a batched write stress test.
pub fn stress_batch_writes<E: KvEngine>(db: &E, config: &StressConfig) -> StressTestResult {
    config.assert_valid();
    let data = vec![0xABu8; config.value_size];
    let batch_size = 100;

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for round in 0..(config.operations / batch_size) {
        let mut batch = Batch::new();
        for i in 0..batch_size {
            batch.set(&stress_key((round * batch_size + i) % config.key_count), &data);
        }

        match db.write(batch) {
            Ok(()) => successful += batch_size,
            Err(_) => failed += batch_size,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}
