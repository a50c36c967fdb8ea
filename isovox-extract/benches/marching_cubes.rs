//! Benchmarks comparing serial and parallel extraction and slicing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use isovox_core::{Point3f, Volume};
use isovox_extract::{
    render_slice, MarchingCubes, MarchingCubesConfig, SliceAxis, SliceConfig,
};

fn generate_gyroid_volume(size: usize) -> Volume {
    let scale = 4.0 * std::f32::consts::PI / (size - 1) as f32;
    Volume::from_fn([size; 3], [1.0; 3], Point3f::origin(), "gyroid", |i, j, k| {
        let (x, y, z) = (i as f32 * scale, j as f32 * scale, k as f32 * scale);
        x.sin() * y.cos() + y.sin() * z.cos() + z.sin() * x.cos()
    })
    .unwrap()
}

fn bench_marching_cubes(c: &mut Criterion) {
    let sizes = [32, 64, 96];

    let mut group = c.benchmark_group("marching_cubes");
    group.sample_size(20);

    for &size in &sizes {
        let volume = generate_gyroid_volume(size);
        let field = volume.field("gyroid").unwrap();

        for (label, parallel) in [("serial", false), ("parallel", true)] {
            let mc = MarchingCubes::new(MarchingCubesConfig::default().with_parallel(parallel));
            group.bench_with_input(
                BenchmarkId::new(label, format!("{}^3", size)),
                &field,
                |b, field| {
                    b.iter(|| {
                        let mesh = mc.extract(black_box(field), black_box(0.0));
                        black_box(mesh);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_slices(c: &mut Criterion) {
    let volume = generate_gyroid_volume(128);
    let field = volume.field("gyroid").unwrap();

    let mut group = c.benchmark_group("render_slice");

    for (label, parallel) in [("serial", false), ("parallel", true)] {
        let config = SliceConfig::default().with_parallel(parallel);
        group.bench_function(label, |b| {
            b.iter(|| {
                let image = render_slice(black_box(&field), SliceAxis::Z, 0.5, &config);
                black_box(image);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_marching_cubes, bench_slices);
criterion_main!(benches);
