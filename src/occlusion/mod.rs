/// Software occlusion culling: fixed-point projection, per-box face
/// classification, and a coarse tile-coverage rasterizer.
pub mod fixmath;
pub mod occluder;
pub mod packed_box;
pub mod raster;
pub mod region;

mod state;

pub use fixmath::{FixedMat4, CAMERA_PRECISION_BITS, MATRIX_PRECISION_BITS};
pub use occluder::{
    BoxOccluder, FACE_DOWN, FACE_EAST, FACE_NORTH, FACE_SOUTH, FACE_UP, FACE_WEST,
};
pub use packed_box::{
    PackedBox, RANGE_EXTREME, RANGE_FAR, RANGE_MID, RANGE_NEAR, REGION_SIZE,
};
pub use raster::{Rasterizer, TileBuffer, RASTER_HEIGHT, RASTER_WIDTH};
pub use region::RegionOcclusionData;
