/// Headless demo: builds a synthetic region grid with a solid occluder wall,
/// runs the per-frame occlusion protocol while the camera advances, and
/// reports how many regions the coverage buffer culls each frame.
use glam::{DVec3, IVec3};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
use std::path::Path;
use std::time::Instant;
use voxel_occlusion::occlusion::{RANGE_EXTREME, RANGE_NEAR};
use voxel_occlusion::*;

fn main() {
    env_logger::init();

    println!("=== Voxel Occlusion - Software Occlusion Culler ===");
    println!();

    // Static scene for the whole run.
    let region_version = 0u32;

    println!("Building region grid...");
    let build_start = Instant::now();
    let regions = build_demo_regions();
    println!(
        "Region build: {:.2}ms ({} regions)",
        build_start.elapsed().as_secs_f64() * 1000.0,
        regions.len()
    );
    println!();

    let mut camera = Camera::new(
        DVec3::new(8.0, 8.0, 40.0),
        RASTER_WIDTH as f32 / RASTER_HEIGHT as f32,
    );
    let mut view = SceneView::new();
    let mut occluder = BoxOccluder::new();

    let frame_count = 120;
    let run_start = Instant::now();

    for frame in 0..frame_count {
        // Advance towards the wall; crossing a 16-block cell bumps the
        // position version and forces a coverage rebuild.
        camera.position.z -= 0.25;
        view.update(&camera);
        occluder.prepare_scene(&view, region_version);

        let frustum = view.frustum();
        let cam = view.camera_pos();

        // Near-to-far order so near occluders land in the buffer before the
        // regions they hide get tested.
        let mut ordered: Vec<(&RegionOcclusionData, f64)> = regions
            .iter()
            .map(|r| {
                let center = r.origin().as_dvec3() + DVec3::splat(REGION_SIZE as f64 * 0.5);
                (r, center.distance_squared(cam))
            })
            .collect();
        ordered.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut frustum_culled = 0usize;
        let mut occlusion_culled = 0usize;
        let mut visible = 0usize;

        for (region, _) in &ordered {
            let rel_min = (region.world_min().as_dvec3() - cam).as_vec3();
            let rel_max = (region.world_max().as_dvec3() - cam).as_vec3();
            if !frustum.intersects_aabb(rel_min, rel_max) {
                frustum_culled += 1;
                continue;
            }

            occluder.prepare_region(region.origin(), RANGE_EXTREME);

            if !occluder.is_box_visible(region.aggregate()) {
                occlusion_culled += 1;
                continue;
            }

            visible += 1;
            if occluder.needs_redraw() {
                occluder.occlude(region.boxes());
            }
        }

        if frame % 30 == 0 {
            println!(
                "frame {:3} | version {:3} | visible: {:3} | occluded: {:3} | frustum-culled: {:3}",
                frame,
                occluder.version(),
                visible,
                occlusion_culled,
                frustum_culled
            );
        }
    }

    let elapsed = run_start.elapsed();
    println!();
    println!(
        "{} frames in {:.2}ms ({:.2}ms/frame)",
        frame_count,
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / frame_count as f64
    );

    occluder.dump_raster(Path::new("occlusion_raster.png"));
    println!("Coverage buffer written to occlusion_raster.png");

    #[cfg(feature = "profiling")]
    COUNTERS.snapshot().print_report();
}

/// A flat field of regions with a solid two-region-tall wall across the
/// camera's path. Regions behind the wall should be culled once the camera
/// gets close.
fn build_demo_regions() -> Vec<RegionOcclusionData> {
    let mut regions = Vec::new();

    for gx in -4..=4 {
        for gz in -8..=2 {
            for gy in 0..2 {
                let origin = IVec3::new(gx * 16, gy * 16, gz * 16);

                // The wall sits one region in front of the camera start.
                if gz == 0 {
                    regions.push(RegionOcclusionData::new(
                        origin,
                        PackedBox::FULL,
                        vec![PackedBox::pack(0, 0, 0, 16, 16, 16, RANGE_NEAR)],
                    ));
                } else {
                    regions.push(RegionOcclusionData::empty(origin));
                }
            }
        }
    }

    regions
}
