//! WEAVE string, intern table, and rope benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use zorya_core::weave::{Cord, Tablet, Weave};

fn bench_weave_append(c: &mut Criterion) {
    let sizes: &[usize] = &[16, 256, 4096];
    let mut group = c.benchmark_group("weave_append");

    for &size in sizes {
        let chunk = vec![b'x'; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("grow_by_chunk", size), &size, |b, _| {
            b.iter(|| {
                let mut w = Weave::new();
                for _ in 0..32 {
                    w.append_bytes(black_box(&chunk)).unwrap();
                }
                black_box(w.len());
            });
        });
    }
    group.finish();
}

fn bench_tablet_intern(c: &mut Criterion) {
    let words: Vec<String> = (0..2000).map(|i| format!("token-{}", i % 200)).collect();

    c.bench_function("tablet_intern_with_duplicates", |b| {
        b.iter(|| {
            let mut tablet = Tablet::new();
            for w in &words {
                black_box(tablet.intern_str(w));
            }
        });
    });
}

fn bench_cord_concat_and_render(c: &mut Criterion) {
    let pieces: Vec<String> = (0..500).map(|i| format!("segment-{i}-")).collect();

    c.bench_function("cord_append_and_materialize", |b| {
        b.iter(|| {
            let mut cord = Cord::new();
            for p in &pieces {
                cord.append_str(p);
            }
            black_box(cord.to_weave());
        });
    });
}

criterion_group!(benches, bench_weave_append, bench_tablet_intern, bench_cord_concat_and_render);
criterion_main!(benches);
