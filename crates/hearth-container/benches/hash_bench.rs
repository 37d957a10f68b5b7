//! Extendible hash table benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hearth_container::ExtendibleHashTable;

fn insert_benchmark(c: &mut Criterion) {
    c.bench_function("extendible_insert_1000", |b| {
        b.iter(|| {
            let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::new(4);
            for i in 0..1000 {
                table.insert(i, i * 2);
            }
            black_box(table.len())
        })
    });
}

fn find_benchmark(c: &mut Criterion) {
    let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::new(4);
    for i in 0..1000 {
        table.insert(i, i * 2);
    }

    c.bench_function("extendible_find_1000", |b| {
        b.iter(|| {
            for i in 0..1000 {
                black_box(table.find(&i));
            }
        })
    });
}

fn churn_benchmark(c: &mut Criterion) {
    c.bench_function("extendible_insert_remove_1000", |b| {
        b.iter(|| {
            let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::new(4);
            for i in 0..1000 {
                table.insert(i, i);
            }
            for i in 0..1000 {
                table.remove(&i);
            }
            black_box(table.len())
        })
    });
}

criterion_group!(benches, insert_benchmark, find_benchmark, churn_benchmark);
criterion_main!(benches);
