// Benchmarks for chain geometry regeneration.
//
// Every render frame rewrites each follower's mesh from scratch, so the
// emitters sit on the hot path. These cover each shape at the default size
// and a longer tube, plus one full render tick of the default performance.
//
// Run: cargo bench -p orbweave_sim

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use orbweave_sim::mesh::{self, MeshData};
use orbweave_sim::sim::Performance;
use orbweave_sim::vec3::Vec3;

fn spiral(count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let t = i as f32 * 0.3;
            Vec3::new(t.cos(), t.sin(), i as f32 * 0.1)
        })
        .collect()
}

fn bench_emitters(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_geometry");

    for &count in &[10usize, 64] {
        let segments = spiral(count);
        let mut mesh = MeshData::new();
        group.bench_with_input(BenchmarkId::new("tube", count), &segments, |b, segments| {
            b.iter(|| {
                mesh::write_tube(&mut mesh, black_box(segments), 0.2, 8, 0.37);
                black_box(mesh.triangle_count());
            });
        });
    }

    let segments = spiral(10);
    let mut mesh = MeshData::new();
    group.bench_function("ribbon", |b| {
        b.iter(|| {
            mesh::write_ribbon(&mut mesh, black_box(&segments), 0.1);
            black_box(mesh.triangle_count());
        });
    });

    let beads = spiral(5);
    group.bench_function("beads", |b| {
        b.iter(|| {
            mesh::write_beads(&mut mesh, black_box(&beads), 0.05, 6, 8);
            black_box(mesh.triangle_count());
        });
    });

    group.finish();
}

fn bench_render_tick(c: &mut Criterion) {
    let mut perf = Performance::new(42);
    c.bench_function("render_tick", |b| {
        b.iter(|| {
            perf.render_tick();
            black_box(perf.frames());
        });
    });
}

criterion_group!(benches, bench_emitters, bench_render_tick);
criterion_main!(benches);
