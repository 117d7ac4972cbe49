//! Manifest and lock hot paths: dependency spec parsing, lock
//! serialization and reachability pruning.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ctipkg::manifest::{IndexLock, PackageLock, SourceInfo};
use ctipkg::parse_dependency;

/// A lock with `n` packages chained `pkg{i}` → `pkg{i+1}`.
fn synthetic_lock(n: usize) -> IndexLock {
    let mut lock = IndexLock::default();
    for i in 0..n {
        let depends = if i + 1 < n {
            vec![format!("pkg{}@^1.{}", i + 1, i)]
        } else {
            Vec::new()
        };
        lock.record(
            &format!("pkg{}", i),
            PackageLock {
                app_code: format!("vendor.pkg{}", i),
                depends,
            },
            SourceInfo {
                source: format!("registry/pkg{}/1.{}.0", i, i),
                version: format!("1.{}.0", i),
                integrity: String::new(),
            },
        )
        .expect("synthetic app codes are unique");
    }
    lock
}

fn bench_parse_dependency(c: &mut Criterion) {
    let specs: Vec<String> = (0..100)
        .map(|i| {
            if i % 3 == 0 {
                format!("vendor.pkg{}", i)
            } else {
                format!("vendor.pkg{}@^1.{}.0", i, i)
            }
        })
        .collect();

    c.bench_function("parse_dependency_100", |b| {
        b.iter(|| {
            for spec in &specs {
                black_box(parse_dependency(black_box(spec)));
            }
        })
    });
}

fn bench_lock_serialization(c: &mut Criterion) {
    let lock = synthetic_lock(200);
    let bytes = lock.to_bytes().expect("serialize lock");

    let mut group = c.benchmark_group("lock_json");
    group.bench_function("serialize_200", |b| {
        b.iter(|| black_box(lock.to_bytes().expect("serialize lock")))
    });
    group.bench_function("deserialize_200", |b| {
        b.iter(|| {
            let lock: IndexLock = serde_json::from_slice(black_box(&bytes)).expect("parse lock");
            black_box(lock)
        })
    });
    group.finish();
}

fn bench_prune(c: &mut Criterion) {
    let lock = synthetic_lock(200);
    let roots = vec!["pkg100".to_string()];
    c.bench_function("prune_chain_200", |b| {
        b.iter(|| {
            let mut lock = lock.clone();
            black_box(lock.prune(black_box(&roots)));
        })
    });
}

criterion_group!(
    benches,
    bench_parse_dependency,
    bench_lock_serialization,
    bench_prune
);
criterion_main!(benches);
