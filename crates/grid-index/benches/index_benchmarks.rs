//! Benchmarks for index matrix construction, serialization and resampling.
//!
//! Run with: cargo bench --package grid-index
//! Or: cargo bench --package grid-index --bench index_benchmarks -- build

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grid_index::{resample, GridGeometry, GridSpec, IndexMatrix, SourceGeometry};
use radar_common::meters_to_degrees;
use rand::Rng;
use test_utils::{fixtures, polar_offsets_m};

/// Polar sweep centred on the origin.
fn sweep_geometry(nrays: usize, nbins: usize, bin_m: f64) -> SourceGeometry {
    let (east, north) = polar_offsets_m(nrays, nbins, bin_m);
    let lon = east.into_iter().map(meters_to_degrees).collect();
    let lat = north.into_iter().map(meters_to_degrees).collect();
    SourceGeometry::new(lon, lat, nrays, nbins).unwrap()
}

/// Random reflectivity values with a share of NaN bins.
fn random_values(len: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            if rng.gen_bool(0.05) {
                f32::NAN
            } else {
                rng.gen_range(-10.0..60.0)
            }
        })
        .collect()
}

fn grid(resolution_m: f64, cells: usize) -> GridGeometry {
    GridGeometry::new(GridSpec::new(0.0, 0.0, resolution_m, cells, cells)).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for &(name, (nrays, nbins, bin_m)) in &[
        ("tiny", fixtures::sweep::TINY),
        ("pattern", fixtures::sweep::PATTERN_LIKE),
        ("dwd", fixtures::sweep::DWD_LIKE),
    ] {
        let source = sweep_geometry(nrays, nbins, bin_m);
        let geometry = grid(250.0, 1200);
        group.throughput(Throughput::Elements(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, source| {
            b.iter(|| IndexMatrix::build(black_box(&geometry), black_box(source)))
        });
    }

    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let (nrays, nbins, bin_m) = fixtures::sweep::DWD_LIKE;
    let source = sweep_geometry(nrays, nbins, bin_m);
    let values = random_values(source.len());

    for &cells in &[300usize, 600, 1200] {
        let resolution_m = 300_000.0 / cells as f64;
        let matrix = IndexMatrix::build(&grid(resolution_m, cells), &source);
        group.throughput(Throughput::Elements(matrix.assigned_count() as u64));
        group.bench_with_input(BenchmarkId::new("cells", cells), &matrix, |b, matrix| {
            b.iter(|| resample::apply(black_box(matrix), black_box(&values)))
        });
    }

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let (nrays, nbins, bin_m) = fixtures::sweep::DWD_LIKE;
    let matrix = IndexMatrix::build(&grid(250.0, 1200), &sweep_geometry(nrays, nbins, bin_m));
    let bytes = matrix.to_bytes();

    let mut group = c.benchmark_group("serialization");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("to_bytes", |b| b.iter(|| black_box(&matrix).to_bytes()));
    group.bench_function("from_bytes", |b| {
        b.iter(|| IndexMatrix::from_bytes(black_box(&bytes)))
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_resample, bench_serialization);
criterion_main!(benches);
