use criterion::{black_box, criterion_group, criterion_main, Criterion};

use txcell_sets::{CoarseHashSet, ConcurrentSet, FineHashSet, TxHashSet};

const ITEMS: u32 = 512;

fn fill<S: ConcurrentSet<u32>>(set: &S) {
    for item in 0..ITEMS {
        set.add(item);
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut adds = c.benchmark_group("set-add");
    adds.bench_function("coarse", |b| {
        b.iter(|| {
            let set = CoarseHashSet::new();
            fill(&set);
            black_box(set)
        })
    });
    adds.bench_function("fine", |b| {
        b.iter(|| {
            let set = FineHashSet::new();
            fill(&set);
            black_box(set)
        })
    });
    adds.bench_function("transactional", |b| {
        b.iter(|| {
            let set = TxHashSet::new();
            fill(&set);
            black_box(set)
        })
    });
    adds.finish();

    let coarse = CoarseHashSet::new();
    let fine = FineHashSet::new();
    let transactional = TxHashSet::new();
    fill(&coarse);
    fill(&fine);
    fill(&transactional);

    let mut lookups = c.benchmark_group("set-contains");
    lookups.bench_function("coarse", |b| {
        b.iter(|| black_box(coarse.contains(&black_box(256))))
    });
    lookups.bench_function("fine", |b| {
        b.iter(|| black_box(fine.contains(&black_box(256))))
    });
    lookups.bench_function("transactional", |b| {
        b.iter(|| black_box(transactional.contains(&black_box(256))))
    });
    lookups.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
