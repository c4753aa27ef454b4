/// Fixed-point 4x4 matrix used to build camera-relative MVP transforms.
///
/// Camera-space coordinates far from the world origin lose mantissa bits in
/// f32, which shows up as shimmering quad edges in the occlusion raster.
/// Translating in integer fixed point before the (float) perspective divide
/// keeps sub-unit precision uniform regardless of world-space magnitude.
use glam::Mat4;

/// Fractional bits carried by every matrix lane.
pub const MATRIX_PRECISION_BITS: u32 = 16;
pub const MATRIX_PRECISION_UNITY: i64 = 1 << MATRIX_PRECISION_BITS;

/// Fractional bits of camera-space positions and region offsets.
pub const CAMERA_PRECISION_BITS: u32 = 12;
pub const CAMERA_PRECISION_UNITY: i64 = 1 << CAMERA_PRECISION_BITS;

/// Row-major 4x4 matrix of i64 lanes scaled by `MATRIX_PRECISION_UNITY`.
#[derive(Clone)]
pub struct FixedMat4 {
    m: [i64; 16],
}

impl FixedMat4 {
    pub fn new() -> Self {
        let mut mat = Self { m: [0; 16] };
        mat.load_identity();
        mat
    }

    pub fn load_identity(&mut self) {
        self.m = [0; 16];
        self.m[0] = MATRIX_PRECISION_UNITY;
        self.m[5] = MATRIX_PRECISION_UNITY;
        self.m[10] = MATRIX_PRECISION_UNITY;
        self.m[15] = MATRIX_PRECISION_UNITY;
    }

    /// Convert a float matrix into this matrix's fixed-point representation.
    pub fn copy_from_mat4(&mut self, src: &Mat4) {
        let unity = MATRIX_PRECISION_UNITY as f64;
        for col in 0..4 {
            let c = src.col(col);
            for row in 0..4 {
                self.m[row * 4 + col] = (c[row] as f64 * unity).round() as i64;
            }
        }
    }

    pub fn copy_from(&mut self, src: &FixedMat4) {
        self.m = src.m;
    }

    /// Post-multiply in place: `self = self * other`.
    pub fn multiply(&mut self, other: &FixedMat4) {
        let a = self.m;
        let b = &other.m;

        for row in 0..4 {
            for col in 0..4 {
                let mut acc = 0i64;
                for k in 0..4 {
                    acc += a[row * 4 + k] * b[k * 4 + col];
                }
                self.m[row * 4 + col] = acc >> MATRIX_PRECISION_BITS;
            }
        }
    }

    /// Post-multiply by a translation whose components are integers scaled by
    /// `1 << fraction_bits`. One block equals `1 << fraction_bits` input units.
    pub fn translate(&mut self, dx: i64, dy: i64, dz: i64, fraction_bits: u32) {
        for row in 0..4 {
            let base = row * 4;
            let t = self.m[base] * dx + self.m[base + 1] * dy + self.m[base + 2] * dz;
            self.m[base + 3] += t >> fraction_bits;
        }
    }

    /// Transform an integer point (block units) into fixed-point clip
    /// coordinates `[x, y, z, w]`, each scaled by `MATRIX_PRECISION_UNITY`.
    #[inline]
    pub fn transform_point(&self, x: i32, y: i32, z: i32) -> [i64; 4] {
        let (x, y, z) = (x as i64, y as i64, z as i64);
        let mut out = [0i64; 4];

        for row in 0..4 {
            let base = row * 4;
            out[row] = self.m[base] * x
                + self.m[base + 1] * y
                + self.m[base + 2] * z
                + self.m[base + 3];
        }

        out
    }
}

impl Default for FixedMat4 {
    fn default() -> Self {
        Self::new()
    }
}
