//! Backend benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polydb_bench::utils::{generate_pairs, open_bench_store, populate, random_data};
use polydb_core::{Batch, Direction, KvEngine, StoreFactory};

fn backends() -> Vec<String> {
    StoreFactory::with_defaults().registry().backends()
}

/// Benchmark buffered set operations.
fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("set");

    for backend in backends() {
        for size in [64, 1024].iter() {
            group.throughput(Throughput::Bytes(*size as u64));
            group.bench_with_input(
                BenchmarkId::new(backend.as_str(), size),
                size,
                |b, &size| {
                    let (_dir, store) = open_bench_store(&backend);
                    let value = random_data(size);
                    let mut i = 0u64;

                    b.iter(|| {
                        i += 1;
                        store.set(black_box(&i.to_be_bytes()), black_box(&value)).unwrap();
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark durable set operations.
fn bench_set_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_sync");

    // Sync is slow
    group.sample_size(20);

    for backend in backends() {
        group.throughput(Throughput::Elements(1));
        group.bench_function(backend.as_str(), |b| {
            let (_dir, store) = open_bench_store(&backend);
            let value = random_data(256);
            let mut i = 0u64;

            b.iter(|| {
                i += 1;
                store.set_sync(black_box(&i.to_be_bytes()), black_box(&value)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark point reads.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for backend in backends() {
        group.throughput(Throughput::Elements(1));
        group.bench_function(backend.as_str(), |b| {
            let (_dir, store) = open_bench_store(&backend);
            let pairs = generate_pairs(1_000, 256);
            populate(&store, &pairs);
            let mut i = 0usize;

            b.iter(|| {
                i = (i + 1) % pairs.len();
                let value = store.get(black_box(&pairs[i].0)).unwrap();
                black_box(value);
            });
        });
    }

    group.finish();
}

/// Benchmark full forward scans.
fn bench_iter(c: &mut Criterion) {
    let mut group = c.benchmark_group("iter");
    group.sample_size(30);

    for backend in backends() {
        for count in [100, 1_000].iter() {
            group.throughput(Throughput::Elements(*count as u64));
            group.bench_with_input(
                BenchmarkId::new(backend.as_str(), count),
                count,
                |b, &count| {
                    let (_dir, store) = open_bench_store(&backend);
                    populate(&store, &generate_pairs(count, 64));

                    b.iter(|| {
                        let scanned = store
                            .iter(None, None, Direction::Forward)
                            .unwrap()
                            .count();
                        black_box(scanned);
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark batched writes.
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.sample_size(30);

    for backend in backends() {
        group.throughput(Throughput::Elements(100));
        group.bench_function(backend.as_str(), |b| {
            let (_dir, store) = open_bench_store(&backend);
            let pairs = generate_pairs(100, 128);

            b.iter(|| {
                let mut batch = Batch::new();
                for (key, value) in &pairs {
                    batch.set(key, value);
                }
                store.write(black_box(batch)).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_set_sync,
    bench_get,
    bench_iter,
    bench_batch,
);

criterion_main!(benches);
