use criterion::{black_box, criterion_group, criterion_main, Criterion};
use parking_lot::RwLock;

use txcell::{atomically, TCell};

#[allow(unused)]
#[derive(Debug, Clone, Copy)]
struct Vertex(pub f64, pub f64, pub f64);

pub fn criterion_benchmark(c: &mut Criterion) {
    // Plain RwLock, the non-transactional baseline.
    let rw_u32 = black_box(RwLock::new(21123_u32));
    let rw_struct = black_box(RwLock::new(Vertex(1.0, 2.5, 4.9)));

    let mut ref1 = c.benchmark_group("rwlock");
    ref1.bench_function("init", |b| b.iter(|| black_box(RwLock::new(23123_u32))));
    ref1.bench_function("read", |b| b.iter(|| black_box(*rw_u32.read())));
    ref1.bench_function("write", |b| {
        b.iter(|| {
            *rw_u32.write() = black_box(21424);
            black_box(&rw_u32)
        })
    });
    ref1.bench_function("read-struct", |b| b.iter(|| black_box(*rw_struct.read())));
    ref1.finish();

    // The same shapes through transactional cells.
    let tc_u32 = black_box(TCell::new(21123_u32));
    let tc_struct = black_box(TCell::new(Vertex(1.0, 2.5, 4.9)));

    let mut g1 = c.benchmark_group("tcell");
    g1.bench_function("init", |b| b.iter(|| black_box(TCell::new(23123_u32))));
    g1.bench_function("read-atomic", |b| b.iter(|| black_box(tc_u32.read_atomic())));
    g1.bench_function("read-tx", |b| {
        b.iter(|| black_box(atomically(|tx| tc_u32.read(tx)).unwrap()))
    });
    g1.bench_function("write-tx", |b| {
        b.iter(|| {
            atomically(|tx| tc_u32.write(tx, black_box(21424))).unwrap();
            black_box(&tc_u32)
        })
    });
    g1.bench_function("increment-tx", |b| {
        b.iter(|| {
            atomically(|tx| tc_u32.modify(tx, |x| x.wrapping_add(1))).unwrap();
            black_box(&tc_u32)
        })
    });
    g1.bench_function("read-struct", |b| b.iter(|| black_box(tc_struct.read_atomic())));
    g1.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
