use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{DVec3, IVec3};
use voxel_occlusion::occlusion::{RANGE_EXTREME, RANGE_NEAR};
use voxel_occlusion::{BoxOccluder, Camera, PackedBox, SceneView, RASTER_HEIGHT, RASTER_WIDTH};

fn make_scene() -> (SceneView, BoxOccluder) {
    let aspect = RASTER_WIDTH as f32 / RASTER_HEIGHT as f32;
    let camera = Camera::new(DVec3::new(8.0, 8.0, 40.0), aspect);
    let mut view = SceneView::new();
    view.update(&camera);

    let mut occluder = BoxOccluder::new();
    occluder.prepare_scene(&view, 0);
    (view, occluder)
}

/// Benchmark the visibility test against an empty coverage buffer (the
/// worst case: every span is walked without an early exit).
fn bench_box_test_empty_buffer(c: &mut Criterion) {
    let (_, mut occluder) = make_scene();
    occluder.prepare_region(IVec3::ZERO, RANGE_EXTREME);

    c.bench_function("box_test_empty_buffer", |b| {
        b.iter(|| black_box(occluder.is_box_visible(black_box(PackedBox::FULL))))
    });
}

/// Benchmark the visibility test when the box is fully occluded and every
/// span must be scanned to prove it.
fn bench_box_test_occluded(c: &mut Criterion) {
    let (_, mut occluder) = make_scene();
    occluder.prepare_region(IVec3::ZERO, RANGE_EXTREME);
    occluder.occlude(&[
        PackedBox::FULL,
        PackedBox::pack(0, 0, 0, 16, 16, 16, RANGE_NEAR),
    ]);

    let sub = PackedBox::pack(4, 4, 4, 12, 12, 12, RANGE_NEAR);

    c.bench_function("box_test_occluded", |b| {
        b.iter(|| black_box(occluder.is_box_visible(black_box(sub))))
    });
}

/// Benchmark drawing a region's worth of occluder boxes.
fn bench_occlude_region(c: &mut Criterion) {
    let (_, mut occluder) = make_scene();
    occluder.prepare_region(IVec3::ZERO, RANGE_EXTREME);

    // 4x4 grid of wall slabs, the shape a meshed region typically produces.
    let mut boxes = vec![PackedBox::FULL];
    for x in 0..4 {
        for y in 0..4 {
            boxes.push(PackedBox::pack(x * 4, y * 4, 0, x * 4 + 4, y * 4 + 4, 4, RANGE_NEAR));
        }
    }

    c.bench_function("occlude_region_16_boxes", |b| {
        b.iter(|| occluder.occlude(black_box(&boxes)))
    });
}

/// Benchmark per-frame scene synchronization with a moving camera, which
/// exercises the fixed-point matrix rebuild and a buffer clear every frame.
fn bench_prepare_scene_moving(c: &mut Criterion) {
    let aspect = RASTER_WIDTH as f32 / RASTER_HEIGHT as f32;
    let mut camera = Camera::new(DVec3::new(8.0, 8.0, 40.0), aspect);
    let mut view = SceneView::new();
    let mut occluder = BoxOccluder::new();

    c.bench_function("prepare_scene_moving_camera", |b| {
        b.iter(|| {
            camera.rotate(0.001, 0.0);
            view.update(&camera);
            occluder.prepare_scene(black_box(&view), 0);
        })
    });
}

criterion_group!(
    benches,
    bench_box_test_empty_buffer,
    bench_box_test_occluded,
    bench_occlude_region,
    bench_prepare_scene_moving
);
criterion_main!(benches);
