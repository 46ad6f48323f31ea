//! Benchmarks for mesh construction, adjacency and decimation.

use criterion::{criterion_group, criterion_main, Criterion};
use inkline::prelude::*;
use nalgebra::Point3;

fn grid(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64, j as f64);
            vertices.push(Point3::new(x, y, 0.1 * (x * 0.3).sin() * (y * 0.2).cos()));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    (vertices, faces)
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (vertices, faces) = grid(50);

    c.bench_function("build_grid_50x50", |b| {
        b.iter(|| {
            let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
            mesh
        });
    });
}

fn bench_adjacency(c: &mut Criterion) {
    let (vertices, faces) = grid(100);
    let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

    c.bench_function("adjacency_grid_100x100", |b| {
        b.iter(|| build_adjacency(&mesh).unwrap());
    });
}

fn bench_decimation(c: &mut Criterion) {
    let (vertices, faces) = grid(40);
    let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
    let options = DecimateOptions::with_target_vertices(200);

    c.bench_function("decimate_grid_40x40_to_200", |b| {
        b.iter(|| {
            let mut m = mesh.clone();
            qem_decimate(&mut m, &options).unwrap()
        });
    });
}

criterion_group!(benches, bench_mesh_construction, bench_adjacency, bench_decimation);
criterion_main!(benches);
