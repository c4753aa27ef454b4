/// Hand-off unit between the mesh-building pipeline and the occluder.
use glam::IVec3;

use super::packed_box::{PackedBox, REGION_SIZE};

/// A region's occlusion geometry: origin plus the packed-box list the
/// occluder consumes. Index 0 is always the aggregate bounding volume;
/// interior boxes follow sorted ascending by range band, which is what makes
/// the occluder's range cutoff an early-exit scan.
///
/// Immutable once built, so a mesh worker thread can hand it over without
/// touching occluder state.
pub struct RegionOcclusionData {
    origin: IVec3,
    boxes: Vec<PackedBox>,
}

impl RegionOcclusionData {
    pub fn new(origin: IVec3, aggregate: PackedBox, mut interior: Vec<PackedBox>) -> Self {
        interior.sort_by_key(|b| b.range());

        let mut boxes = Vec::with_capacity(interior.len() + 1);
        boxes.push(aggregate);
        boxes.extend(interior);

        Self { origin, boxes }
    }

    /// A region with no interior occluders, aggregate covering the full cell.
    pub fn empty(origin: IVec3) -> Self {
        Self {
            origin,
            boxes: vec![PackedBox::FULL],
        }
    }

    #[inline]
    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    /// Aggregate bounding volume tested for region-level visibility.
    #[inline]
    pub fn aggregate(&self) -> PackedBox {
        self.boxes[0]
    }

    /// Full box list in occluder order (aggregate first).
    #[inline]
    pub fn boxes(&self) -> &[PackedBox] {
        &self.boxes
    }

    /// World-space min corner of the region cell, for frustum pre-culling.
    #[inline]
    pub fn world_min(&self) -> IVec3 {
        self.origin
    }

    #[inline]
    pub fn world_max(&self) -> IVec3 {
        self.origin + IVec3::splat(REGION_SIZE)
    }
}
