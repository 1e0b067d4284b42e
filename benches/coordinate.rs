//! Benchmarks for lazy revalidation of coordinate chains.
//!
//! Run with: cargo bench --bench coordinate

use axiplot::{BackendHandle, Coordinate, CoordName, Matrix, Path, RecordingBackend, Viewport};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::cell::RefCell;
use std::hint::black_box;
use std::rc::Rc;

/// Root plus `depth` translated descendants; returns (root, leaf).
fn chain(depth: usize) -> (Coordinate, Coordinate) {
    let root = Coordinate::make_root(Matrix::make_scale(2.0, 2.0));
    let mut leaf = root.clone();
    for i in 0..depth {
        leaf = Coordinate::make_translate(&leaf, i as f64, 1.0);
    }
    (root, leaf)
}

fn bench_cached_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinate/cached");
    for depth in [4, 16, 64, 256] {
        let (_root, leaf) = chain(depth);
        leaf.to_device(0.0, 0.0);
        group.bench_with_input(BenchmarkId::new("to_device", depth), &(), |b, _| {
            b.iter(|| black_box(leaf.to_device(black_box(1.0), black_box(2.0))))
        });
    }
    group.finish();
}

fn bench_invalidated_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinate/invalidated");
    for depth in [4, 16, 64, 256] {
        let (root, leaf) = chain(depth);
        group.bench_with_input(BenchmarkId::new("to_device", depth), &(), |b, _| {
            b.iter(|| {
                root.translate(0.5, 0.0);
                black_box(leaf.to_device(1.0, 2.0))
            })
        });
    }
    group.finish();
}

fn bench_monitor(c: &mut Criterion) {
    let (root, leaf) = chain(64);
    let mut monitor = leaf.monitor();
    c.bench_function("coordinate/monitor_take_change", |b| {
        b.iter(|| {
            root.scale(1.0, 1.0);
            black_box(monitor.take_change())
        })
    });
}

fn bench_drain(c: &mut Criterion) {
    let points: Vec<(f64, f64)> = (0..1000).map(|i| (i as f64, (i as f64 * 0.01).sin())).collect();
    let path = Path::polyline(&points);
    c.bench_function("viewport/record_and_drain_1000", |b| {
        b.iter(|| {
            let backend: BackendHandle = Rc::new(RefCell::new(RecordingBackend::new(640.0, 480.0)));
            let vp = Viewport::new(backend);
            vp.stroke(CoordName::Data, &path, true).ok();
            black_box(vp.do_instructions())
        })
    });
}

criterion_group!(
    benches,
    bench_cached_query,
    bench_invalidated_query,
    bench_monitor,
    bench_drain
);
criterion_main!(benches);
