/// Compact integer encoding of an axis-aligned occlusion box.
///
/// Six region-local coordinates (5 bits each, 0..=16 used in practice) plus a
/// 2-bit distance-range band. Produced by the mesh-building pipeline and
/// consumed read-only by the occluder; rebuilt whenever a region remeshes.

const COORD_BITS: u32 = 5;
const COORD_MASK: u32 = (1 << COORD_BITS) - 1;
const RANGE_SHIFT: u32 = COORD_BITS * 6;

/// Box is close to its region origin.
pub const RANGE_NEAR: i32 = 0;
pub const RANGE_MID: i32 = 1;
pub const RANGE_FAR: i32 = 2;
/// Reserved for aggregate region volumes; never filtered out by range.
pub const RANGE_EXTREME: i32 = 3;

/// Side length of a region in blocks.
pub const REGION_SIZE: i32 = 16;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PackedBox(u32);

impl PackedBox {
    /// Aggregate volume of a full region.
    pub const FULL: PackedBox =
        PackedBox::pack(0, 0, 0, REGION_SIZE, REGION_SIZE, REGION_SIZE, RANGE_EXTREME);

    /// Pack six ordered bounds and a range band.
    ///
    /// Unordered bounds are a producer bug; they are asserted in debug builds
    /// and not detected in release.
    pub const fn pack(x0: i32, y0: i32, z0: i32, x1: i32, y1: i32, z1: i32, range: i32) -> Self {
        debug_assert!(x0 <= x1 && y0 <= y1 && z0 <= z1);
        debug_assert!(x0 >= 0 && y0 >= 0 && z0 >= 0);
        debug_assert!(x1 <= COORD_MASK as i32 && y1 <= COORD_MASK as i32 && z1 <= COORD_MASK as i32);
        debug_assert!(range >= 0 && range <= RANGE_EXTREME);

        Self(
            (x0 as u32)
                | ((y0 as u32) << COORD_BITS)
                | ((z0 as u32) << (COORD_BITS * 2))
                | ((x1 as u32) << (COORD_BITS * 3))
                | ((y1 as u32) << (COORD_BITS * 4))
                | ((z1 as u32) << (COORD_BITS * 5))
                | ((range as u32) << RANGE_SHIFT),
        )
    }

    #[inline]
    pub const fn x0(self) -> i32 {
        (self.0 & COORD_MASK) as i32
    }

    #[inline]
    pub const fn y0(self) -> i32 {
        ((self.0 >> COORD_BITS) & COORD_MASK) as i32
    }

    #[inline]
    pub const fn z0(self) -> i32 {
        ((self.0 >> (COORD_BITS * 2)) & COORD_MASK) as i32
    }

    #[inline]
    pub const fn x1(self) -> i32 {
        ((self.0 >> (COORD_BITS * 3)) & COORD_MASK) as i32
    }

    #[inline]
    pub const fn y1(self) -> i32 {
        ((self.0 >> (COORD_BITS * 4)) & COORD_MASK) as i32
    }

    #[inline]
    pub const fn z1(self) -> i32 {
        ((self.0 >> (COORD_BITS * 5)) & COORD_MASK) as i32
    }

    /// Distance-range band relative to the region origin.
    #[inline]
    pub const fn range(self) -> i32 {
        (self.0 >> RANGE_SHIFT) as i32
    }

    /// Bounds as `[x0, y0, z0, x1, y1, z1]`.
    #[inline]
    pub const fn bounds(self) -> [i32; 6] {
        [self.x0(), self.y0(), self.z0(), self.x1(), self.y1(), self.z1()]
    }
}
