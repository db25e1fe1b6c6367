use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{DMatrix, Point3, Vector3};
use scene_cam::*;

fn criterion_benchmark(c: &mut Criterion) {
    let mut projector = CameraProjector::new(InMemoryScene::<f64>::new());
    let spec = CameraSpec::default()
        .position(Point3::new(1.2, 3.4, 5.6))
        .rotation(Vector3::new(0.3, 0.2, 0.1));
    let cam = projector.create_camera(&spec).unwrap();

    c.bench_function("compute_camera_matrix", |b| {
        b.iter(|| {
            projector
                .compute_camera_matrix(black_box(cam), 640, 480)
                .unwrap()
        });
    });

    c.bench_function("point_camera_at", |b| {
        b.iter(|| {
            projector
                .point_camera_at(cam, black_box(&Point3::new(0.0, 0.0, 0.0)))
                .unwrap()
        });
    });

    let view = PerspectiveView::new(35.0, 640, 480).with_view(
        Point3::new(1.2, 3.4, 5.6),  // location
        Point3::new(2.2, 3.4, 5.6),  // lookat
        Vector3::new(0.0, 0.0, 1.0), // up
    );
    let depth = DMatrix::from_element(480, 640, 3.0);
    let world_coords = view
        .backproject_to_world(&depth, None, DepthKind::Plane)
        .unwrap();
    println!("{} points", world_coords.data.nrows());

    let matrices = view.camera_matrices().unwrap();
    c.bench_function("perspective world_to_pixel", |b| {
        b.iter(|| matrices.world_to_pixel(black_box(&world_coords)));
    });

    c.bench_function("backproject_to_world", |b| {
        b.iter(|| view.backproject_to_world(black_box(&depth), None, DepthKind::Ray));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
