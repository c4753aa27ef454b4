/// Shared per-frame state for the occlusion pass.
///
/// Owned by a single `BoxOccluder` and mutated only on the render thread;
/// never a process-wide global, so independent occluders (split screen,
/// reflection passes) can coexist.
use std::sync::atomic::AtomicBool;

use super::fixmath::FixedMat4;
use super::packed_box::RANGE_EXTREME;

/// Sentinel for "never synchronized"; real version counters start near zero.
pub(super) const UNSYNCED: u32 = u32::MAX;

pub(super) struct OcclusionState {
    /// Camera-relative projection * model, rebuilt when the view changes.
    pub base_mvp: FixedMat4,
    /// Base matrix translated by the current region offset.
    pub working_mvp: FixedMat4,

    /// Version identifiers this state was last synchronized against.
    pub view_version: u32,
    pub position_version: u32,
    pub region_version: u32,

    /// Camera position in camera-precision units, valid for `view_version`.
    pub view_x: i64,
    pub view_y: i64,
    pub view_z: i64,

    /// Camera-to-region-origin vector in camera-precision units, valid for
    /// the last `prepare_region` call.
    pub offset_x: i64,
    pub offset_y: i64,
    pub offset_z: i64,

    /// Range band cutoff for the current region's occluder draw.
    pub occlusion_range: i32,

    /// Set from any thread to request a full clear without a version bump.
    pub force_redraw: AtomicBool,
    /// True when the last `prepare_scene` cleared the tile buffer.
    pub needs_redraw: bool,
}

impl OcclusionState {
    pub fn new() -> Self {
        Self {
            base_mvp: FixedMat4::new(),
            working_mvp: FixedMat4::new(),
            view_version: UNSYNCED,
            position_version: UNSYNCED,
            region_version: UNSYNCED,
            view_x: 0,
            view_y: 0,
            view_z: 0,
            offset_x: 0,
            offset_y: 0,
            offset_z: 0,
            occlusion_range: RANGE_EXTREME,
            force_redraw: AtomicBool::new(false),
            needs_redraw: false,
        }
    }
}
