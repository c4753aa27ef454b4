/// Camera and frustum state feeding the occlusion pass.
///
/// The camera position is kept in f64: the occluder works camera-relative,
/// and the world position is only ever consumed after conversion to
/// fixed-point units, so no f32 precision is lost far from the origin.
use glam::{DVec3, IVec3, Mat4, Quat, Vec3, Vec4};

use crate::occlusion::REGION_SIZE;

pub struct Camera {
    pub position: DVec3,
    pub yaw: f32,   // Rotation around Y axis (radians)
    pub pitch: f32, // Rotation around X axis (radians)
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,
}

impl Camera {
    pub fn new(position: DVec3, aspect_ratio: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov: 70.0f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            aspect_ratio,
        }
    }

    /// Camera-relative view matrix: rotation only, no translation. The
    /// translation happens in fixed point inside the occluder instead.
    pub fn rotation_view_matrix(&self) -> Mat4 {
        let rotation = self.rotation_quat();
        let forward = rotation * Vec3::NEG_Z;
        let up = rotation * Vec3::Y;

        Mat4::look_to_rh(Vec3::ZERO, forward, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation_quat() * Vec3::NEG_Z
    }

    fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Turn the camera by mouse-style deltas, clamping pitch short of
    /// straight up/down.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }
}

/// Versioned frustum/camera snapshot consumed by the occluder.
///
/// `view_version` moves whenever anything about the view changes (projection,
/// orientation, or position). `position_version` moves only when the camera
/// crosses a region-cell boundary, which is the coarse event that invalidates
/// cached visibility results.
pub struct SceneView {
    projection: Mat4,
    model: Mat4,
    camera_pos: DVec3,
    view_version: u32,
    position_version: u32,
    last_cell: IVec3,
    initialized: bool,
}

impl SceneView {
    pub fn new() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            camera_pos: DVec3::ZERO,
            view_version: 0,
            position_version: 0,
            last_cell: IVec3::ZERO,
            initialized: false,
        }
    }

    /// Resynchronize against the camera, bumping whichever version counters
    /// the change warrants. Call once per frame before `prepare_scene`.
    pub fn update(&mut self, camera: &Camera) {
        let projection = camera.projection_matrix();
        let model = camera.rotation_view_matrix();
        let pos = camera.position;

        if !self.initialized
            || projection != self.projection
            || model != self.model
            || pos != self.camera_pos
        {
            self.projection = projection;
            self.model = model;
            self.camera_pos = pos;
            self.view_version = self.view_version.wrapping_add(1);
        }

        let cell = IVec3::new(
            (pos.x / REGION_SIZE as f64).floor() as i32,
            (pos.y / REGION_SIZE as f64).floor() as i32,
            (pos.z / REGION_SIZE as f64).floor() as i32,
        );
        if !self.initialized || cell != self.last_cell {
            self.last_cell = cell;
            self.position_version = self.position_version.wrapping_add(1);
        }

        self.initialized = true;
    }

    #[inline]
    pub fn view_version(&self) -> u32 {
        self.view_version
    }

    #[inline]
    pub fn position_version(&self) -> u32 {
        self.position_version
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    #[inline]
    pub fn camera_pos(&self) -> DVec3 {
        self.camera_pos
    }

    /// Camera-relative frustum for coarse AABB pre-culling.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&(self.projection * self.model))
    }
}

impl Default for SceneView {
    fn default() -> Self {
        Self::new()
    }
}

/// View frustum as 6 planes in Hessian normal form for AABB culling.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// 6 planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix
    /// (Gribb-Hartmann method).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [Vec4::ZERO; 6];
        planes[0] = Self::normalize_plane(row3 + row0);
        planes[1] = Self::normalize_plane(row3 - row0);
        planes[2] = Self::normalize_plane(row3 + row1);
        planes[3] = Self::normalize_plane(row3 - row1);
        planes[4] = Self::normalize_plane(row3 + row2);
        planes[5] = Self::normalize_plane(row3 - row2);

        Self { planes }
    }

    #[inline]
    fn normalize_plane(plane: Vec4) -> Vec4 {
        let normal_length = plane.truncate().length();
        if normal_length > 0.0001 {
            plane / normal_length
        } else {
            plane
        }
    }

    /// Test if an AABB intersects the frustum. Returns true if the box is at
    /// least partially inside.
    pub fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        for plane in &self.planes {
            // Positive vertex: the corner furthest along the plane normal.
            let p_vertex = Vec3::new(
                if plane.x > 0.0 { max.x } else { min.x },
                if plane.y > 0.0 { max.y } else { min.y },
                if plane.z > 0.0 { max.z } else { min.z },
            );

            if plane.x * p_vertex.x + plane.y * p_vertex.y + plane.z * p_vertex.z + plane.w < 0.0
            {
                return false;
            }
        }

        true
    }
}
