use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use s2_indices::band::{Band, GeoInfo};
use s2_indices::processing::colorize::{colorize, ColorRamp};
use s2_indices::processing::indices::normalized_difference;

/// Synthetic NIR and RED layers
fn synthetic_layers(size: (usize, usize)) -> (Array2<f64>, Array2<f64>) {
    let nir = Array2::from_shape_fn(size, |(r, c)| 5000.0 + ((r * size.1 + c) % 100) as f64);
    let red = Array2::from_shape_fn(size, |(r, c)| 2500.0 + ((r * size.1 + c) % 50) as f64);
    (nir, red)
}

/// Benchmark the core normalized difference kernel in isolation
fn benchmark_ndi_calculation(c: &mut Criterion) {
    let (nir, red) = synthetic_layers((1024, 1024));

    c.bench_function("ndi_core_calculation", |b| {
        b.iter(|| normalized_difference(black_box(nir.view()), black_box(red.view())))
    });
}

/// Benchmark the percentile stretch and colour ramp
fn benchmark_colorize(c: &mut Criterion) {
    let (nir, red) = synthetic_layers((512, 512));
    let (ratio, _) = normalized_difference(nir.view(), red.view()).unwrap();
    let geo = GeoInfo::new("GEOGCS[\"WGS 84\"]", [15.0, 0.0001, 0.0, 45.0, 0.0, -0.0001]);
    let band = Band::from_layer("ndvi", ratio, geo).unwrap();

    c.bench_function("colorize_rdylgn", |b| {
        b.iter(|| colorize(black_box(&band), ColorRamp::RdYlGn))
    });
}

criterion_group!(benches, benchmark_ndi_calculation, benchmark_colorize);
criterion_main!(benches);
