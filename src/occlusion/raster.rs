/// Tile-space quad rasterizer behind the occlusion tests.
///
/// Box corners are projected through the fixed-point working matrix into a
/// coarse tile grid (one bit per tile, packed in u64 words). Testing walks a
/// convex quad's spans looking for any open tile; drawing marks them covered.
use glam::Vec4;

use super::fixmath::{FixedMat4, MATRIX_PRECISION_UNITY};
use crate::count_call;
use crate::perf::COUNTERS;

/// Coverage-buffer resolution in tiles. Coarser than a pixel so a frame's
/// worth of quads stays cheap to walk.
pub const RASTER_WIDTH: usize = 256;
pub const RASTER_HEIGHT: usize = 128;

const WORDS_PER_ROW: usize = RASTER_WIDTH / 64;
const WORD_COUNT: usize = WORDS_PER_ROW * RASTER_HEIGHT;

// Near-plane clipping a convex quad can add at most one vertex per edge.
const MAX_POLY_VERTS: usize = 8;
const NEAR_W_EPS: f32 = 0.001;

// Vertex slot ids for the eight box corners. Encoded as a 3-bit selector:
// bit 2 picks x1 over x0, bit 1 picks y1, bit 0 picks z1.
pub const V000: usize = 0b000;
pub const V001: usize = 0b001;
pub const V010: usize = 0b010;
pub const V011: usize = 0b011;
pub const V100: usize = 0b100;
pub const V101: usize = 0b101;
pub const V110: usize = 0b110;
pub const V111: usize = 0b111;

/// Bit-packed tile coverage buffer. A set bit means the tile is occluded.
pub struct TileBuffer {
    words: Vec<u64>,
}

impl TileBuffer {
    pub fn new() -> Self {
        Self {
            words: vec![0; WORD_COUNT],
        }
    }

    /// Reset every tile to open.
    #[inline]
    pub fn clear(&mut self) {
        count_call!(COUNTERS.raster_clears);
        self.words.fill(0);
    }

    /// True if the tile at (x, y) is marked occluded.
    #[inline]
    pub fn is_occluded(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < RASTER_WIDTH && y < RASTER_HEIGHT);
        let word = self.words[y * WORDS_PER_ROW + x / 64];
        word & (1u64 << (x & 63)) != 0
    }

    /// True if any tile in the inclusive span [x0, x1] of row y is open.
    fn span_has_open(&self, y: usize, x0: usize, x1: usize) -> bool {
        let (first, last) = (x0 / 64, x1 / 64);

        for w in first..=last {
            let mut mask = u64::MAX;
            if w == first {
                mask &= u64::MAX << (x0 & 63);
            }
            if w == last {
                mask &= u64::MAX >> (63 - (x1 & 63));
            }

            if self.words[y * WORDS_PER_ROW + w] & mask != mask {
                return true;
            }
        }

        false
    }

    /// Mark the inclusive span [x0, x1] of row y occluded.
    fn fill_span(&mut self, y: usize, x0: usize, x1: usize) {
        count_call!(COUNTERS.spans_filled);
        let (first, last) = (x0 / 64, x1 / 64);

        for w in first..=last {
            let mut mask = u64::MAX;
            if w == first {
                mask &= u64::MAX << (x0 & 63);
            }
            if w == last {
                mask &= u64::MAX >> (63 - (x1 & 63));
            }

            self.words[y * WORDS_PER_ROW + w] |= mask;
        }
    }
}

impl Default for TileBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Projects box corners and rasterizes their quads against the tile buffer.
///
/// Quad winding does not matter: face selection already happened against the
/// camera position, so both windings of a quad cover the same tiles.
pub struct Rasterizer {
    vertices: [Vec4; 8],
    pub tiles: TileBuffer,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            vertices: [Vec4::ZERO; 8],
            tiles: TileBuffer::new(),
        }
    }

    /// Project a box corner through the working matrix into clip space and
    /// store it in the slot for that corner.
    #[inline]
    pub fn setup_vertex(&mut self, matrix: &FixedMat4, slot: usize, x: i32, y: i32, z: i32) {
        let clip = matrix.transform_point(x, y, z);
        let inv = 1.0 / MATRIX_PRECISION_UNITY as f32;
        self.vertices[slot] = Vec4::new(
            clip[0] as f32 * inv,
            clip[1] as f32 * inv,
            clip[2] as f32 * inv,
            clip[3] as f32 * inv,
        );
    }

    /// True if the quad over the given vertex slots covers at least one open
    /// tile. Read-only with respect to the buffer.
    pub fn test_quad(&mut self, ids: [usize; 4]) -> bool {
        count_call!(COUNTERS.quads_tested);
        self.walk_quad(ids, false)
    }

    /// Mark every tile covered by the quad as occluded.
    pub fn draw_quad(&mut self, ids: [usize; 4]) {
        count_call!(COUNTERS.quads_drawn);
        self.walk_quad(ids, true);
    }

    /// Clip a convex polygon against the near plane (w >= NEAR_W_EPS).
    /// Returns the number of output vertices written to `output`.
    fn clip_polygon_near(input: &[Vec4; 4], output: &mut [Vec4; MAX_POLY_VERTS]) -> usize {
        let mut out_len = 0usize;
        let mut prev = input[3];
        let mut prev_inside = prev.w >= NEAR_W_EPS;

        for &curr in input {
            let curr_inside = curr.w >= NEAR_W_EPS;
            match (prev_inside, curr_inside) {
                (true, true) => {
                    output[out_len] = curr;
                    out_len += 1;
                }
                (true, false) => {
                    output[out_len] = Self::intersect_near(prev, curr);
                    out_len += 1;
                }
                (false, true) => {
                    output[out_len] = Self::intersect_near(prev, curr);
                    out_len += 1;
                    output[out_len] = curr;
                    out_len += 1;
                }
                (false, false) => {}
            }

            prev = curr;
            prev_inside = curr_inside;
        }

        out_len
    }

    /// Intersect edge AB with the near plane w = NEAR_W_EPS in clip space.
    #[inline]
    fn intersect_near(a: Vec4, b: Vec4) -> Vec4 {
        let t = (NEAR_W_EPS - a.w) / (b.w - a.w);
        a + (b - a) * t
    }

    /// Scanline walk over the convex quad at tile resolution using
    /// pixel-center sampling. In test mode returns true on the first open
    /// tile; in draw mode fills every covered span and returns false.
    fn walk_quad(&mut self, ids: [usize; 4], draw: bool) -> bool {
        let quad = [
            self.vertices[ids[0]],
            self.vertices[ids[1]],
            self.vertices[ids[2]],
            self.vertices[ids[3]],
        ];

        let mut clipped = [Vec4::ZERO; MAX_POLY_VERTS];
        let count = Self::clip_polygon_near(&quad, &mut clipped);
        if count < 3 {
            // Entirely behind the camera; harmless no-op.
            return false;
        }

        // Perspective divide and NDC -> tile-space mapping (Y flipped).
        let mut sx = [0f32; MAX_POLY_VERTS];
        let mut sy = [0f32; MAX_POLY_VERTS];
        for i in 0..count {
            let ndc = clipped[i] / clipped[i].w;
            sx[i] = (ndc.x + 1.0) * 0.5 * RASTER_WIDTH as f32;
            sy[i] = (1.0 - ndc.y) * 0.5 * RASTER_HEIGHT as f32;
        }

        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for &y in sy.iter().take(count) {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        // Tile y is covered when its center y + 0.5 lies inside [min_y, max_y].
        let y_start = ((min_y - 0.5).ceil() as i32).max(0);
        let y_end = ((max_y - 0.5).floor() as i32).min(RASTER_HEIGHT as i32 - 1);

        for y in y_start..=y_end {
            let y_center = y as f32 + 0.5;

            // A convex polygon crosses the scanline in at most two edges.
            // Half-open interval test avoids double-counting shared vertices.
            let mut left = f32::INFINITY;
            let mut right = f32::NEG_INFINITY;

            for i in 0..count {
                let y0 = sy[i];
                let y1 = sy[(i + 1) % count];

                if (y0 <= y_center && y_center < y1) || (y1 <= y_center && y_center < y0) {
                    let t = (y_center - y0) / (y1 - y0);
                    let x = sx[i] + (sx[(i + 1) % count] - sx[i]) * t;
                    left = left.min(x);
                    right = right.max(x);
                }
            }

            if right < left {
                continue;
            }

            let x_start = ((left - 0.5).ceil() as i32).max(0);
            let x_end = ((right - 0.5).floor() as i32).min(RASTER_WIDTH as i32 - 1);
            if x_start > x_end {
                continue;
            }

            if draw {
                self.tiles.fill_span(y as usize, x_start as usize, x_end as usize);
            } else if self.tiles.span_has_open(y as usize, x_start as usize, x_end as usize) {
                return true;
            }
        }

        false
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_and_test_span_across_word_boundary() {
        let mut tiles = TileBuffer::new();

        // Span 60..=70 crosses the boundary between words 0 and 1.
        tiles.fill_span(5, 60, 70);

        assert!(!tiles.span_has_open(5, 60, 70), "filled span should be fully occluded");
        assert!(tiles.span_has_open(5, 59, 70), "one open tile on the left");
        assert!(tiles.span_has_open(5, 60, 71), "one open tile on the right");
        assert!(tiles.span_has_open(4, 60, 70), "other rows untouched");

        assert!(tiles.is_occluded(60, 5));
        assert!(tiles.is_occluded(64, 5));
        assert!(tiles.is_occluded(70, 5));
        assert!(!tiles.is_occluded(71, 5));
    }

    #[test]
    fn clear_resets_every_tile() {
        let mut tiles = TileBuffer::new();
        tiles.fill_span(0, 0, RASTER_WIDTH - 1);
        tiles.clear();
        assert!(tiles.span_has_open(0, 0, RASTER_WIDTH - 1));
        assert!(!tiles.is_occluded(0, 0));
    }

    /// Place a screen-aligned quad directly via the identity-ish clip values
    /// by loading slots with prebuilt clip coordinates.
    fn load_ndc_quad(raster: &mut Rasterizer, x0: f32, y0: f32, x1: f32, y1: f32) -> [usize; 4] {
        raster.vertices[V000] = Vec4::new(x0, y0, 0.5, 1.0);
        raster.vertices[V001] = Vec4::new(x1, y0, 0.5, 1.0);
        raster.vertices[V011] = Vec4::new(x1, y1, 0.5, 1.0);
        raster.vertices[V010] = Vec4::new(x0, y1, 0.5, 1.0);
        [V000, V001, V011, V010]
    }

    #[test]
    fn draw_then_test_same_quad_is_occluded() {
        let mut raster = Rasterizer::new();
        let quad = load_ndc_quad(&mut raster, -0.5, -0.5, 0.5, 0.5);

        assert!(raster.test_quad(quad), "fresh buffer is open everywhere");
        raster.draw_quad(quad);
        assert!(!raster.test_quad(quad), "drawn area must read occluded");

        // A larger quad still finds open tiles around the drawn area.
        let bigger = load_ndc_quad(&mut raster, -0.8, -0.8, 0.8, 0.8);
        assert!(raster.test_quad(bigger));
    }

    #[test]
    fn smaller_quad_inside_drawn_area_is_occluded() {
        let mut raster = Rasterizer::new();
        let outer = load_ndc_quad(&mut raster, -0.6, -0.6, 0.6, 0.6);
        raster.draw_quad(outer);

        let inner = load_ndc_quad(&mut raster, -0.3, -0.3, 0.3, 0.3);
        assert!(!raster.test_quad(inner));
    }

    #[test]
    fn quad_behind_camera_is_noop() {
        let mut raster = Rasterizer::new();
        for slot in [V000, V001, V011, V010] {
            raster.vertices[slot] = Vec4::new(0.0, 0.0, 0.0, -1.0);
        }
        let quad = [V000, V001, V011, V010];

        assert!(!raster.test_quad(quad), "behind-camera quad covers nothing");
        raster.draw_quad(quad);
        let probe = load_ndc_quad(&mut raster, -0.9, -0.9, 0.9, 0.9);
        assert!(raster.test_quad(probe), "draw must not have touched the buffer");
    }

    #[test]
    fn degenerate_quad_covers_no_tiles() {
        let mut raster = Rasterizer::new();
        // Zero-area quad collapsed onto a line between tile centers.
        let quad = load_ndc_quad(&mut raster, -0.5, 0.2501, 0.5, 0.2501);
        raster.draw_quad(quad);

        let probe = load_ndc_quad(&mut raster, -0.5, 0.1, 0.5, 0.4);
        assert!(raster.test_quad(probe));
    }

    #[test]
    fn offscreen_quad_is_clamped_not_wrapped() {
        let mut raster = Rasterizer::new();
        let quad = load_ndc_quad(&mut raster, 0.9, 0.9, 3.0, 3.0);
        raster.draw_quad(quad);

        // Opposite corner stays open.
        let probe = load_ndc_quad(&mut raster, -0.99, -0.99, -0.9, -0.9);
        assert!(raster.test_quad(probe));
    }
}
