//! Benchmarks for grid construction and traversal.
//!
//! Run with: cargo bench -p gridtrace-grid

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridtrace_grid::{GridConfig, RegularGrid, TraversalContext, VoxelTraverser};
use gridtrace_math::{Point3, Vec3};
use gridtrace_scene::{Ray, Scene, Sphere};

/// Deterministic cloud of `n` spheres in a 20-unit cube.
fn sphere_cloud(n: usize) -> Scene {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    let mut scene = Scene::new();
    for _ in 0..n {
        let c = Point3::new(next() * 20.0 - 10.0, next() * 20.0 - 10.0, next() * 20.0 - 10.0);
        scene.add(Sphere::new(c, 0.2 + next() * 0.6));
    }
    scene
}

fn ray_fan(side: usize) -> Vec<Ray> {
    let mut rays = Vec::with_capacity(side * side);
    for i in 0..side {
        for j in 0..side {
            let u = i as f64 / side as f64 * 20.0 - 10.0;
            let v = j as f64 / side as f64 * 20.0 - 10.0;
            rays.push(Ray::new(Point3::new(u, v, -30.0), Vec3::new(0.01, -0.02, 1.0)));
        }
    }
    rays
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for n in [100, 1_000, 10_000] {
        let scene = sphere_cloud(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("dense", n), &scene, |b, scene| {
            b.iter(|| RegularGrid::new(black_box(scene), GridConfig::default()).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("sparse", n), &scene, |b, scene| {
            b.iter(|| RegularGrid::new(black_box(scene), GridConfig::memory_efficient()).unwrap())
        });
    }
    group.finish();
}

fn bench_traverse(c: &mut Criterion) {
    let scene = sphere_cloud(2_000);
    let rays = ray_fan(64);
    let mut group = c.benchmark_group("traverse");
    group.throughput(Throughput::Elements(rays.len() as u64));

    for (name, config) in [
        ("default", GridConfig::default_preset()),
        ("high-performance", GridConfig::high_performance()),
        ("memory-efficient", GridConfig::memory_efficient()),
    ] {
        let grid = RegularGrid::new(&scene, config).unwrap();
        let traverser = VoxelTraverser::new(&grid);
        let mut ctx = TraversalContext::new();

        group.bench_function(BenchmarkId::new("closest", name), |b| {
            b.iter(|| {
                rays.iter()
                    .filter(|ray| traverser.find_closest_intersection_with(ray, &mut ctx).is_some())
                    .count()
            })
        });
        group.bench_function(BenchmarkId::new("all", name), |b| {
            b.iter(|| {
                rays.iter()
                    .filter_map(|ray| traverser.find_intersections_with(ray, &mut ctx))
                    .map(|hits| hits.len())
                    .sum::<usize>()
            })
        });
    }

    group.bench_function("brute_force", |b| {
        b.iter(|| {
            rays.iter()
                .filter(|ray| scene.intersect_closest(ray).is_some())
                .count()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_traverse);
criterion_main!(benches);
