//! DAGGER hash table insert/lookup/remove throughput.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use zorya_core::dagger::DaggerTable;

fn bench_insert(c: &mut Criterion) {
    let counts: &[usize] = &[100, 1_000, 10_000];
    let mut group = c.benchmark_group("dagger_insert");

    for &n in counts {
        let keys: Vec<String> = (0..n).map(|i| format!("item-{i}")).collect();
        group.bench_with_input(BenchmarkId::new("fresh_table", n), &n, |b, _| {
            b.iter(|| {
                let mut table = DaggerTable::new(0);
                for k in &keys {
                    table.set(k.as_bytes(), black_box(1u32), true).unwrap();
                }
                black_box(table.len());
            });
        });
    }
    group.finish();
}

fn bench_get_hit(c: &mut Criterion) {
    let n = 10_000;
    let keys: Vec<String> = (0..n).map(|i| format!("item-{i}")).collect();
    let mut table = DaggerTable::new(0);
    for (i, k) in keys.iter().enumerate() {
        table.set(k.as_bytes(), i as u32, true).unwrap();
    }

    c.bench_function("dagger_get_hit", |b| {
        b.iter(|| {
            for k in &keys {
                black_box(table.get(black_box(k.as_bytes())));
            }
        });
    });
}

fn bench_remove_and_reinsert(c: &mut Criterion) {
    let n = 5_000;
    let keys: Vec<String> = (0..n).map(|i| format!("item-{i}")).collect();

    c.bench_function("dagger_remove_reinsert", |b| {
        b.iter(|| {
            let mut table = DaggerTable::new(0);
            for (i, k) in keys.iter().enumerate() {
                table.set(k.as_bytes(), i as u32, true).unwrap();
            }
            for k in keys.iter().step_by(2) {
                black_box(table.remove(k.as_bytes()));
            }
            for (i, k) in keys.iter().enumerate() {
                if i % 2 == 0 {
                    table.set(k.as_bytes(), i as u32, true).unwrap();
                }
            }
            black_box(table.len());
        });
    });
}

criterion_group!(benches, bench_insert, bench_get_hit, bench_remove_and_reinsert);
criterion_main!(benches);
