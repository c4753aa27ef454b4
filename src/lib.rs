pub mod camera;
/// Voxel occlusion - software occlusion culling for region-based voxel worlds
/// Built with compartmentalized benchmarkable components
pub mod occlusion;
pub mod perf;

pub use camera::{Camera, Frustum, SceneView};
pub use occlusion::{
    BoxOccluder, PackedBox, Rasterizer, RegionOcclusionData, TileBuffer, RANGE_EXTREME, RANGE_FAR,
    RANGE_MID, RANGE_NEAR, RASTER_HEIGHT, RASTER_WIDTH, REGION_SIZE,
};
pub use perf::{CounterSnapshot, OcclusionCounters, COUNTERS};
