/// Occlusion orchestrator: decides when the coverage buffer must be rebuilt,
/// classifies which box faces can see the camera, and drives the rasterizer
/// through the test and draw entry points.
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use glam::IVec3;
use image::{GrayImage, Luma};
use log::warn;

use super::fixmath::{FixedMat4, CAMERA_PRECISION_BITS, CAMERA_PRECISION_UNITY};
use super::packed_box::PackedBox;
use super::raster::{
    Rasterizer, RASTER_HEIGHT, RASTER_WIDTH, V000, V001, V010, V011, V100, V101, V110, V111,
};
use super::state::{OcclusionState, UNSYNCED};
use crate::camera::SceneView;
use crate::count_call;
use crate::perf::COUNTERS;

// Face direction flags, one bit per axis-aligned face.
pub const FACE_UP: u32 = 1 << 0;
pub const FACE_DOWN: u32 = 1 << 1;
pub const FACE_EAST: u32 = 1 << 2;
pub const FACE_WEST: u32 = 1 << 3;
pub const FACE_NORTH: u32 = 1 << 4;
pub const FACE_SOUTH: u32 = 1 << 5;

/// Classify which faces of a box face the camera, given the camera-to-origin
/// offset and region-local bounds. Distance from each face plane decides;
/// winding order plays no part.
fn classify_faces(offset_x: i64, offset_y: i64, offset_z: i64, b: &[i32; 6]) -> u32 {
    let mut mask = 0;

    // Camera above the top bound sees UP, below the bottom bound sees DOWN.
    if offset_y < -((b[4] as i64) << CAMERA_PRECISION_BITS) {
        mask |= FACE_UP;
    } else if offset_y > -((b[1] as i64) << CAMERA_PRECISION_BITS) {
        mask |= FACE_DOWN;
    }

    if offset_x < -((b[3] as i64) << CAMERA_PRECISION_BITS) {
        mask |= FACE_EAST;
    } else if offset_x > -((b[0] as i64) << CAMERA_PRECISION_BITS) {
        mask |= FACE_WEST;
    }

    if offset_z < -((b[5] as i64) << CAMERA_PRECISION_BITS) {
        mask |= FACE_SOUTH;
    } else if offset_z > -((b[2] as i64) << CAMERA_PRECISION_BITS) {
        mask |= FACE_NORTH;
    }

    mask
}

/// Quad decomposition for one face-visibility bitmask.
#[derive(Copy, Clone)]
struct QuadList {
    count: usize,
    quads: [[usize; 4]; 2],
}

impl QuadList {
    const EMPTY: QuadList = QuadList {
        count: 0,
        quads: [[0; 4]; 2],
    };

    const fn one(q: [usize; 4]) -> Self {
        Self {
            count: 1,
            quads: [q, [0; 4]],
        }
    }

    const fn two(a: [usize; 4], b: [usize; 4]) -> Self {
        Self {
            count: 2,
            quads: [a, b],
        }
    }
}

/// Silhouette decompositions keyed by face bitmask. Entries for masks that a
/// single viewpoint cannot produce (opposing faces, four or more faces) stay
/// empty and act as no-ops.
///
/// With two or three visible faces the silhouette is split into exactly two
/// comparably-sized quads: the corner nearest the camera is omitted and the
/// hexagonal outline is bridged across it, instead of emitting one quad per
/// face and ending up with a sliver next to a near-full face.
const fn quad_table() -> [QuadList; 64] {
    let mut t = [QuadList::EMPTY; 64];

    t[FACE_UP as usize] = QuadList::one([V110, V010, V011, V111]);
    t[FACE_DOWN as usize] = QuadList::one([V000, V100, V101, V001]);
    t[FACE_EAST as usize] = QuadList::one([V101, V100, V110, V111]);
    t[FACE_WEST as usize] = QuadList::one([V000, V001, V011, V010]);
    t[FACE_NORTH as usize] = QuadList::one([V100, V000, V010, V110]);
    t[FACE_SOUTH as usize] = QuadList::one([V001, V101, V111, V011]);

    t[(FACE_UP | FACE_EAST) as usize] =
        QuadList::two([V010, V011, V111, V101], [V101, V100, V110, V010]);
    t[(FACE_UP | FACE_WEST) as usize] =
        QuadList::two([V111, V110, V010, V000], [V000, V001, V011, V111]);
    t[(FACE_UP | FACE_NORTH) as usize] =
        QuadList::two([V011, V111, V110, V100], [V100, V000, V010, V011]);
    t[(FACE_UP | FACE_SOUTH) as usize] =
        QuadList::two([V110, V010, V011, V001], [V001, V101, V111, V110]);
    t[(FACE_DOWN | FACE_EAST) as usize] =
        QuadList::two([V001, V000, V100, V110], [V110, V111, V101, V001]);
    t[(FACE_DOWN | FACE_WEST) as usize] =
        QuadList::two([V100, V101, V001, V011], [V011, V010, V000, V100]);
    t[(FACE_DOWN | FACE_NORTH) as usize] =
        QuadList::two([V101, V001, V000, V010], [V010, V110, V100, V101]);
    t[(FACE_DOWN | FACE_SOUTH) as usize] =
        QuadList::two([V000, V100, V101, V111], [V111, V011, V001, V000]);
    t[(FACE_NORTH | FACE_EAST) as usize] =
        QuadList::two([V000, V010, V110, V111], [V111, V101, V100, V000]);
    t[(FACE_NORTH | FACE_WEST) as usize] =
        QuadList::two([V110, V100, V000, V001], [V001, V011, V010, V110]);
    t[(FACE_SOUTH | FACE_EAST) as usize] =
        QuadList::two([V011, V001, V101, V100], [V100, V110, V111, V011]);
    t[(FACE_SOUTH | FACE_WEST) as usize] =
        QuadList::two([V101, V111, V011, V010], [V010, V000, V001, V101]);

    t[(FACE_UP | FACE_EAST | FACE_NORTH) as usize] =
        QuadList::two([V011, V111, V101, V100], [V100, V000, V010, V011]);
    t[(FACE_UP | FACE_WEST | FACE_NORTH) as usize] =
        QuadList::two([V111, V110, V100, V000], [V000, V001, V011, V111]);
    t[(FACE_UP | FACE_EAST | FACE_SOUTH) as usize] =
        QuadList::two([V010, V011, V001, V101], [V101, V100, V110, V010]);
    t[(FACE_UP | FACE_WEST | FACE_SOUTH) as usize] =
        QuadList::two([V110, V010, V000, V001], [V001, V101, V111, V110]);
    t[(FACE_DOWN | FACE_EAST | FACE_NORTH) as usize] =
        QuadList::two([V001, V000, V010, V110], [V110, V111, V101, V001]);
    t[(FACE_DOWN | FACE_WEST | FACE_NORTH) as usize] =
        QuadList::two([V101, V001, V011, V010], [V010, V110, V100, V101]);
    t[(FACE_DOWN | FACE_EAST | FACE_SOUTH) as usize] =
        QuadList::two([V000, V100, V110, V111], [V111, V011, V001, V000]);
    t[(FACE_DOWN | FACE_WEST | FACE_SOUTH) as usize] =
        QuadList::two([V100, V101, V111, V011], [V011, V010, V000, V100]);

    t
}

static BOX_QUADS: [QuadList; 64] = quad_table();

/// Software occlusion culler for axis-aligned region geometry.
///
/// Call order within a frame: `prepare_scene`, then per candidate region
/// `prepare_region` followed by `is_box_visible` and optionally `occlude`.
/// All of that happens on one thread; only `version`, `invalidate` and
/// `invalidate_if_current` may be called from elsewhere.
pub struct BoxOccluder {
    state: OcclusionState,
    raster: Rasterizer,
    /// Consumers caching "tested visible at version V" retest when this moves.
    version: AtomicU32,
    next_dump_time: Option<Instant>,
}

impl BoxOccluder {
    pub fn new() -> Self {
        Self {
            state: OcclusionState::new(),
            raster: Rasterizer::new(),
            version: AtomicU32::new(0),
            next_dump_time: None,
        }
    }

    /// Current occluder version. Previously tested regions can reuse their
    /// result while their cached version matches; they must still be redrawn
    /// this frame when `needs_redraw` reports true.
    pub fn version(&self) -> u32 {
        self.version.load(Ordering::Relaxed)
    }

    /// Force a new version and a full redraw.
    pub fn invalidate(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
        self.state.force_redraw.store(true, Ordering::Relaxed);
    }

    /// Same as `invalidate`, but only if `expected` is still the current
    /// version. Stale requests against a superseded version are dropped.
    pub fn invalidate_if_current(&self, expected: u32) {
        if self
            .version
            .compare_exchange(
                expected,
                expected.wrapping_add(1),
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            self.state.force_redraw.store(true, Ordering::Relaxed);
        }
    }

    /// True when the last `prepare_scene` cleared the buffer: occluders that
    /// were already drawn must be drawn again this frame.
    pub fn needs_redraw(&self) -> bool {
        self.state.needs_redraw
    }

    /// Synchronize with the frame's camera/frustum state and decide whether
    /// the coverage buffer must be rebuilt.
    ///
    /// Position or region changes invalidate cached visibility results and
    /// bump the occluder version. A pure view-direction change (and a forced
    /// redraw) still clears the raster, because screen-space coverage depends
    /// on orientation, but keeps the version: prior visibility results remain
    /// semantically valid.
    pub fn prepare_scene(&mut self, view: &SceneView, region_version: u32) {
        let view_version = view.view_version();
        let position_version = view.position_version();

        if self.state.view_version != view_version {
            let mut tmp = FixedMat4::new();
            self.state.base_mvp.load_identity();
            tmp.copy_from_mat4(&view.projection_matrix());
            self.state.base_mvp.multiply(&tmp);
            tmp.copy_from_mat4(&view.model_matrix());
            self.state.base_mvp.multiply(&tmp);

            let pos = view.camera_pos();
            let unity = CAMERA_PRECISION_UNITY as f64;
            self.state.view_x = (pos.x * unity).round() as i64;
            self.state.view_y = (pos.y * unity).round() as i64;
            self.state.view_z = (pos.z * unity).round() as i64;
        }

        if self.state.force_redraw.swap(false, Ordering::Relaxed) {
            self.state.view_version = view_version;
            self.state.position_version = position_version;
            self.state.region_version = region_version;
            self.raster.tiles.clear();
            self.state.needs_redraw = true;
        } else if self.state.position_version != position_version
            || self.state.region_version != region_version
        {
            self.version.fetch_add(1, Ordering::Relaxed);
            self.state.view_version = view_version;
            self.state.position_version = position_version;
            self.state.region_version = region_version;
            self.raster.tiles.clear();
            self.state.needs_redraw = true;
        } else if self.state.view_version != view_version {
            self.state.view_version = view_version;
            self.raster.tiles.clear();
            self.state.needs_redraw = true;
        } else {
            self.state.needs_redraw = false;
        }
    }

    /// Per-region setup: record the occlusion-range cutoff and derive the
    /// working matrix for this region's origin. Must run before any
    /// `is_box_visible`, `occlude` or `backface_visibility_flags` call for
    /// the region.
    pub fn prepare_region(&mut self, origin: IVec3, occlusion_range: i32) {
        self.state.occlusion_range = occlusion_range;

        self.state.offset_x = ((origin.x as i64) << CAMERA_PRECISION_BITS) - self.state.view_x;
        self.state.offset_y = ((origin.y as i64) << CAMERA_PRECISION_BITS) - self.state.view_y;
        self.state.offset_z = ((origin.z as i64) << CAMERA_PRECISION_BITS) - self.state.view_z;

        self.state.working_mvp.copy_from(&self.state.base_mvp);
        self.state.working_mvp.translate(
            self.state.offset_x,
            self.state.offset_y,
            self.state.offset_z,
            CAMERA_PRECISION_BITS,
        );
    }

    /// True if the box could contribute at least one visible tile. Bounds are
    /// padded outward by one block so coverage seams at tile boundaries do
    /// not produce false negatives.
    pub fn is_box_visible(&mut self, packed: PackedBox) -> bool {
        count_call!(COUNTERS.boxes_tested);

        let b = [
            packed.x0() - 1,
            packed.y0() - 1,
            packed.z0() - 1,
            packed.x1() + 1,
            packed.y1() + 1,
            packed.z1() + 1,
        ];
        let mask = classify_faces(
            self.state.offset_x,
            self.state.offset_y,
            self.state.offset_z,
            &b,
        );

        let list = &BOX_QUADS[mask as usize];
        let mut ready = 0u8;

        for quad in list.quads.iter().take(list.count) {
            Self::setup_corners(&mut self.raster, &self.state.working_mvp, &mut ready, quad, &b);
            if self.raster.test_quad(*quad) {
                return true;
            }
        }

        false
    }

    /// Draw a region's interior boxes into the coverage buffer.
    ///
    /// `boxes` must be sorted ascending by range band with the region's
    /// aggregate volume at index 0 (which is never drawn). The scan stops at
    /// the first box whose range exceeds the configured occlusion range.
    pub fn occlude(&mut self, boxes: &[PackedBox]) {
        let occlusion_range = self.state.occlusion_range;

        for packed in boxes.iter().skip(1) {
            if packed.range() > occlusion_range {
                break;
            }

            count_call!(COUNTERS.boxes_drawn);
            let b = packed.bounds();
            let mask = classify_faces(
                self.state.offset_x,
                self.state.offset_y,
                self.state.offset_z,
                &b,
            );

            let list = &BOX_QUADS[mask as usize];
            let mut ready = 0u8;

            for quad in list.quads.iter().take(list.count) {
                Self::setup_corners(
                    &mut self.raster,
                    &self.state.working_mvp,
                    &mut ready,
                    quad,
                    &b,
                );
                self.raster.draw_quad(*quad);
            }
        }
    }

    /// Face flags for region faces far enough away that a renderer may skip
    /// fine backface detail. A rendering hint, not an occlusion result.
    ///
    /// The 48 / -72 block thresholds are asymmetric because the fixed-point
    /// offset shift rounds toward negative infinity; both cutoffs sit 64
    /// blocks from the respective face of a 16-block region.
    pub fn backface_visibility_flags(&self) -> u32 {
        let mut mask = 0;

        if self.state.offset_y < 48 << CAMERA_PRECISION_BITS {
            mask |= FACE_UP;
        } else if self.state.offset_y > -(72 << CAMERA_PRECISION_BITS) {
            mask |= FACE_DOWN;
        }

        if self.state.offset_x < 48 << CAMERA_PRECISION_BITS {
            mask |= FACE_EAST;
        } else if self.state.offset_x > -(72 << CAMERA_PRECISION_BITS) {
            mask |= FACE_WEST;
        }

        if self.state.offset_z < 48 << CAMERA_PRECISION_BITS {
            mask |= FACE_SOUTH;
        } else if self.state.offset_z > -(72 << CAMERA_PRECISION_BITS) {
            mask |= FACE_NORTH;
        }

        mask
    }

    /// Whether the tile at raster coordinates (x, y) is currently occluded.
    /// Diagnostic accessor used by the raster dump and tests.
    pub fn is_tile_occluded(&self, x: usize, y: usize) -> bool {
        self.raster.tiles.is_occluded(x, y)
    }

    /// Write the coverage buffer as a black/white PNG for debugging, at most
    /// once per second. I/O failures are logged and swallowed; the occlusion
    /// pipeline is unaffected.
    pub fn dump_raster(&mut self, path: &Path) {
        let now = Instant::now();
        if let Some(next) = self.next_dump_time {
            if now < next {
                return;
            }
        }
        self.next_dump_time = Some(now + Duration::from_secs(1));

        let mut img = GrayImage::new(RASTER_WIDTH as u32, RASTER_HEIGHT as u32);
        for y in 0..RASTER_HEIGHT {
            for x in 0..RASTER_WIDTH {
                let lum = if self.raster.tiles.is_occluded(x, y) { 0 } else { 255 };
                img.put_pixel(x as u32, y as u32, Luma([lum]));
            }
        }

        if let Err(err) = img.save(path) {
            warn!("couldn't save occlusion raster to {}: {err}", path.display());
        }
    }

    /// True until the first `prepare_scene` has synchronized this occluder.
    pub fn is_unsynced(&self) -> bool {
        self.state.view_version == UNSYNCED
    }

    fn setup_corners(
        raster: &mut Rasterizer,
        matrix: &FixedMat4,
        ready: &mut u8,
        quad: &[usize; 4],
        b: &[i32; 6],
    ) {
        for &corner in quad {
            if *ready & (1 << corner) == 0 {
                let x = if corner & 0b100 != 0 { b[3] } else { b[0] };
                let y = if corner & 0b010 != 0 { b[4] } else { b[1] };
                let z = if corner & 0b001 != 0 { b[5] } else { b[2] };
                raster.setup_vertex(matrix, corner, x, y, z);
                *ready |= 1 << corner;
            }
        }
    }
}

impl Default for BoxOccluder {
    fn default() -> Self {
        Self::new()
    }
}
