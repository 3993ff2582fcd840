use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use echidna_collections::dense::{self, VecTangent};
use echidna_collections::sequence::{vjp_map, vjp_reduce, vjp_zip_map, DifferentiableSequence};
use echidna_collections::{Accessor, AccessorTangent, LazyArray};

#[path = "common/mod.rs"]
mod common;
use common::*;

const SIZES: [usize; 3] = [10, 100, 1000];

/// Gradient of the mean squared error through zip-map and reduce.
fn mse_gradient<S>(x: &S, y: &S) -> (f64, S::Tangent)
where
    S: DifferentiableSequence<Element = f64>,
{
    let (diffs, diff_pullback): (Vec<f64>, _) =
        vjp_zip_map(x, y, |&a: &f64, &b: &f64| (a - b, |t: f64| (t, -t)));
    let (sum, sum_pullback) = vjp_reduce(&diffs, 0.0_f64, |acc: &f64, &d: &f64| {
        (acc + d * d, move |t: f64| (t, 2.0 * d * t))
    });
    let n = x.len() as f64;
    let (_, d_diffs) = sum_pullback(1.0 / n);
    let (d_x, _) = diff_pullback(d_diffs);
    (sum / n, d_x)
}

fn bench_mse(c: &mut Criterion) {
    let mut group = c.benchmark_group("mse");
    for n in SIZES {
        let x = make_input(n);
        let y = make_target(n);
        let direction = make_direction(n);
        let x_accessor = Accessor::new(x.clone());
        let y_accessor = Accessor::new(y.clone());

        group.bench_with_input(BenchmarkId::new("f64_eval", n), &n, |b, _| {
            b.iter(|| black_box(mse_f64(black_box(&x), black_box(&y))))
        });

        group.bench_with_input(BenchmarkId::new("forward_dual", n), &n, |b, _| {
            b.iter(|| black_box(mse_dual(black_box(&x), &y, &direction)))
        });

        group.bench_with_input(BenchmarkId::new("reverse_dense", n), &n, |b, _| {
            b.iter(|| black_box(mse_gradient(black_box(&x), &y)))
        });

        group.bench_with_input(BenchmarkId::new("reverse_accessor", n), &n, |b, _| {
            b.iter(|| black_box(mse_gradient(black_box(&x_accessor), &y_accessor)))
        });
    }
    group.finish();
}

/// Σ xᵢ² read one subscript at a time. The dense pullback allocates a full
/// tangent per read; the lazy and sparse ones accumulate in place.
fn bench_subscript_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscript_reads");
    for n in SIZES {
        let x = make_input(n);

        group.bench_with_input(BenchmarkId::new("dense", n), &x, |b, x| {
            b.iter(|| {
                let mut pullbacks = Vec::with_capacity(x.len());
                for i in 0..x.len() {
                    pullbacks.push(dense::vjp_read(x, i));
                }
                let mut tangent = VecTangent::new(Vec::new());
                for (value, read) in pullbacks.iter().rev() {
                    tangent += read(2.0 * value);
                }
                black_box(tangent)
            })
        });

        let lazy = LazyArray::new(x.clone());
        group.bench_with_input(BenchmarkId::new("lazy", n), &lazy, |b, lazy| {
            b.iter(|| {
                let mut pullbacks = Vec::with_capacity(lazy.len());
                for i in 0..lazy.len() {
                    pullbacks.push(lazy.vjp_get(i));
                }
                let mut tangent = VecTangent::new(Vec::new());
                for (value, read) in pullbacks.iter().rev() {
                    read(2.0 * value, &mut tangent);
                }
                black_box(tangent)
            })
        });

        let accessor = Accessor::new(x.clone());
        group.bench_with_input(BenchmarkId::new("accessor", n), &accessor, |b, accessor| {
            b.iter(|| {
                let mut accessor = accessor.clone();
                let mut steps = Vec::with_capacity(accessor.len());
                for i in 0..accessor.len() {
                    let stage = accessor.vjp_stage(i);
                    steps.push((*accessor.staged(), stage));
                }
                let mut tangent = AccessorTangent::from_values(Vec::new());
                for (value, stage) in steps.iter().rev() {
                    tangent.accumulate_staged(2.0 * value);
                    stage(&mut tangent);
                }
                black_box(tangent)
            })
        });
    }
    group.finish();
}

/// `sin` applied in place to the first quarter of the buffer.
fn bench_mut_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("mut_range_sin");
    for n in SIZES {
        let x = make_input(n);
        let end = n / 4;

        group.bench_with_input(BenchmarkId::new("f64_eval", n), &x, |b, x| {
            b.iter(|| {
                let mut x = x.clone();
                sin_prefix_f64(&mut x, end);
                black_box(x)
            })
        });

        group.bench_with_input(BenchmarkId::new("dense", n), &x, |b, x| {
            b.iter(|| {
                let mut values = x.clone();
                let mut steps = Vec::with_capacity(end);
                for i in 0..end {
                    let (value, read) = dense::vjp_read(&values, i);
                    let write = dense::vjp_update(&mut values, i, value.sin());
                    steps.push((value.cos(), read, write));
                }
                let mut tangent = VecTangent::new(vec![1.0; n]);
                for (slope, read, write) in steps.iter().rev() {
                    let d_new = write(&mut tangent);
                    tangent += read(slope * d_new);
                }
                black_box(tangent)
            })
        });

        let accessor = Accessor::new(x.clone());
        group.bench_with_input(BenchmarkId::new("accessor", n), &accessor, |b, accessor| {
            b.iter(|| {
                let mut values = accessor.clone();
                let mut steps = Vec::with_capacity(end);
                for i in 0..end {
                    let stage = values.vjp_stage(i);
                    let value = *values.staged();
                    let commit = values.vjp_commit(i, value.sin());
                    steps.push((value.cos(), stage, commit));
                }
                let mut tangent = AccessorTangent::from_values(vec![1.0; n]);
                for (slope, stage, commit) in steps.iter().rev() {
                    let d_new = commit(&mut tangent);
                    tangent.accumulate_staged(slope * d_new);
                    stage(&mut tangent);
                }
                black_box(tangent)
            })
        });
    }
    group.finish();
}

fn bench_zip_map_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("zip_map_add");
    for n in SIZES {
        let x = make_input(n);
        let y = make_target(n);

        group.bench_with_input(BenchmarkId::new("dense", n), &n, |b, _| {
            b.iter(|| {
                let (sum, pullback): (Vec<f64>, _) =
                    vjp_zip_map(&x, &y, |&a: &f64, &b: &f64| (a + b, |t: f64| (t, t)));
                black_box((sum, pullback(VecTangent::new(vec![1.0; n]))))
            })
        });

        let x_accessor = Accessor::new(x.clone());
        let y_accessor = Accessor::new(y.clone());
        group.bench_with_input(BenchmarkId::new("accessor", n), &n, |b, _| {
            b.iter(|| {
                let (sum, pullback): (Accessor<f64>, _) = vjp_zip_map(
                    &x_accessor,
                    &y_accessor,
                    |&a: &f64, &b: &f64| (a + b, |t: f64| (t, t)),
                );
                black_box((sum, pullback(AccessorTangent::from_values(vec![1.0; n]))))
            })
        });
    }
    group.finish();
}

/// Σ sin(xᵢ) through map then reduce.
fn bench_map_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_reduce");
    for n in SIZES {
        let x = make_input(n);

        group.bench_with_input(BenchmarkId::new("f64_eval", n), &x, |b, x| {
            b.iter(|| black_box(x.iter().map(|v| v.sin()).sum::<f64>()))
        });

        group.bench_with_input(BenchmarkId::new("dense", n), &x, |b, x| {
            b.iter(|| {
                let (sines, map_pullback): (Vec<f64>, _) =
                    vjp_map(x, |&v: &f64| (v.sin(), move |t: f64| v.cos() * t));
                let (total, reduce_pullback) =
                    vjp_reduce(&sines, 0.0_f64, |acc: &f64, &s: &f64| (acc + s, |t: f64| (t, t)));
                black_box((total, map_pullback(reduce_pullback(1.0).1)))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_mse,
    bench_subscript_reads,
    bench_mut_range,
    bench_zip_map_add,
    bench_map_reduce
);
criterion_main!(benches);
