//! Throughput Benchmark for KVStor
//!
//! Measures the storage engine and the line protocol path under a few
//! workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use kvstor::commands::CommandHandler;
use kvstor::protocol::ResponseStyle;
use kvstor::storage::StorageEngine;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(3600);

/// Benchmark set operations
fn bench_set(c: &mut Criterion) {
    let engine = StorageEngine::new();

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            engine.set(format!("key:{}", i), Bytes::from("small_value"), TTL);
            i += 1;
        });
    });

    group.bench_function("set_overwrite", |b| {
        let value = Bytes::from("x".repeat(1024));
        b.iter(|| {
            engine.set("hot", value.clone(), TTL);
        });
    });

    group.finish();
}

/// Benchmark get operations
fn bench_get(c: &mut Criterion) {
    let engine = StorageEngine::new();

    for i in 0..100_000 {
        engine.set(format!("key:{}", i), Bytes::from(format!("value:{}", i)), TTL);
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(engine.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(engine.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark one full sweep pass over a populated store
fn bench_sweep(c: &mut Criterion) {
    let engine = StorageEngine::new();
    for i in 0..100_000 {
        engine.set(format!("key:{}", i), Bytes::from("v"), TTL);
    }

    c.bench_function("cleanup_expired_100k_live", |b| {
        b.iter(|| black_box(engine.cleanup_expired()));
    });
}

/// Benchmark parse + execute + render for single lines
fn bench_protocol(c: &mut Criterion) {
    let handler = CommandHandler::new(Arc::new(StorageEngine::new()));
    handler.execute_line(b"set greeting hello 3600");

    let mut group = c.benchmark_group("protocol");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_line", |b| {
        b.iter(|| {
            let response = handler.execute_line(black_box(b"set greeting hello 3600"));
            black_box(response.serialize(ResponseStyle::Plain));
        });
    });

    group.bench_function("get_line", |b| {
        b.iter(|| {
            let response = handler.execute_line(black_box(b"get greeting"));
            black_box(response.serialize(ResponseStyle::Plain));
        });
    });

    group.finish();
}

/// Benchmark mixed workload from several threads against the single lock
fn bench_concurrent(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    for i in 0..10_000 {
        engine.set(format!("key:{}", i), Bytes::from("value"), TTL);
    }

    c.bench_function("concurrent_mixed_4_threads", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..1000 {
                            let key = format!("key:{}", (t * 1000 + i) % 10_000);
                            if i % 4 == 0 {
                                engine.set(key, Bytes::from("updated"), TTL);
                            } else {
                                black_box(engine.get(&key));
                            }
                        }
                    })
                })
                .collect();

            for h in handles {
                let _ = h.join();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_sweep,
    bench_protocol,
    bench_concurrent
);
criterion_main!(benches);
