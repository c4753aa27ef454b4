/// Integration tests for the occluder's redraw/invalidation protocol:
/// which frame events bump the version counter, which only clear the
/// coverage buffer, and which leave everything alone.
use glam::DVec3;
use voxel_occlusion::*;

fn make_scene() -> (Camera, SceneView, BoxOccluder) {
    let aspect = RASTER_WIDTH as f32 / RASTER_HEIGHT as f32;
    let camera = Camera::new(DVec3::new(8.0, 8.0, 40.0), aspect);
    let mut view = SceneView::new();
    view.update(&camera);
    (camera, view, BoxOccluder::new())
}

#[test]
fn first_sync_claims_the_occluder() {
    let (_, view, mut occluder) = make_scene();

    assert!(occluder.is_unsynced());
    occluder.prepare_scene(&view, 0);
    assert!(!occluder.is_unsynced());
    assert!(
        occluder.needs_redraw(),
        "first sync must build the coverage buffer"
    );
}

#[test]
fn stable_frame_needs_no_redraw() {
    let (_, view, mut occluder) = make_scene();
    occluder.prepare_scene(&view, 0);

    let version = occluder.version();
    occluder.prepare_scene(&view, 0);
    occluder.prepare_scene(&view, 0);

    assert!(!occluder.needs_redraw());
    assert_eq!(occluder.version(), version);
}

#[test]
fn view_only_change_clears_without_a_version_bump() {
    let (mut camera, mut view, mut occluder) = make_scene();
    occluder.prepare_scene(&view, 0);
    let version = occluder.version();

    // Rotate in place: the camera stays in its 16-block cell.
    camera.rotate(0.3, 0.1);
    view.update(&camera);
    occluder.prepare_scene(&view, 0);

    assert!(
        occluder.needs_redraw(),
        "screen-space coverage depends on orientation"
    );
    assert_eq!(
        occluder.version(),
        version,
        "prior visibility results stay semantically valid"
    );
}

#[test]
fn cell_crossing_bumps_the_version_exactly_once() {
    let (mut camera, mut view, mut occluder) = make_scene();
    occluder.prepare_scene(&view, 0);
    let version = occluder.version();

    camera.position.x += REGION_SIZE as f64 + 1.0;
    view.update(&camera);
    occluder.prepare_scene(&view, 0);

    assert!(occluder.needs_redraw());
    assert_eq!(occluder.version(), version.wrapping_add(1));
}

#[test]
fn region_data_change_bumps_the_version() {
    let (_, view, mut occluder) = make_scene();
    occluder.prepare_scene(&view, 0);
    let version = occluder.version();

    occluder.prepare_scene(&view, 1);

    assert!(occluder.needs_redraw());
    assert_eq!(occluder.version(), version.wrapping_add(1));
}

#[test]
fn invalidate_forces_one_redraw() {
    let (_, view, mut occluder) = make_scene();
    occluder.prepare_scene(&view, 0);
    occluder.prepare_scene(&view, 0);
    let version = occluder.version();

    occluder.invalidate();
    assert_eq!(occluder.version(), version.wrapping_add(1));

    // The forced redraw consumes the flag without a second bump.
    occluder.prepare_scene(&view, 0);
    assert!(occluder.needs_redraw());
    assert_eq!(occluder.version(), version.wrapping_add(1));

    occluder.prepare_scene(&view, 0);
    assert!(!occluder.needs_redraw());
}

#[test]
fn stale_conditional_invalidate_is_dropped() {
    let (_, view, mut occluder) = make_scene();
    occluder.prepare_scene(&view, 0);
    let version = occluder.version();

    occluder.invalidate_if_current(version.wrapping_sub(1));

    assert_eq!(occluder.version(), version);
    occluder.prepare_scene(&view, 0);
    assert!(
        !occluder.needs_redraw(),
        "a superseded invalidation must not force a redraw"
    );
}

#[test]
fn current_conditional_invalidate_applies() {
    let (_, view, mut occluder) = make_scene();
    occluder.prepare_scene(&view, 0);
    let version = occluder.version();

    occluder.invalidate_if_current(version);

    assert_eq!(occluder.version(), version.wrapping_add(1));
    occluder.prepare_scene(&view, 0);
    assert!(occluder.needs_redraw());
}
