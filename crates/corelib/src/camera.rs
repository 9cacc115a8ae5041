//! Free-look perspective camera producing OpenGL-convention matrices.

use crate::{CoreError, CoreResult, Mat4, Vec3};

const MAX_PITCH: f32 = 89.0 * (std::f32::consts::PI / 180.0);

/// Right-handed camera oriented by yaw/pitch (radians).
/// Yaw 0 looks down -Z; positive yaw turns towards +X.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Vec3,
        yaw: f32,
        pitch: f32,
        fov_y_rad: f32,
        z_near: f32,
        z_far: f32,
        aspect: f32,
    ) -> Self {
        let mut cam = Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y_rad,
            z_near,
            z_far,
            aspect,
        };
        cam.set_orientation(yaw, pitch);
        cam
    }

    /// 45 degree camera at `position` looking down -Z.
    pub fn looking_down_neg_z(position: Vec3, aspect: f32) -> Self {
        Self::new(position, 0.0, 0.0, 45f32.to_radians(), 0.1, 100.0, aspect)
    }

    /// Pitch is clamped just short of straight up/down.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Unit view direction.
    #[inline]
    pub fn front(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(sy * cp, sp, -cy * cp).normalize()
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), self.up)
    }

    /// Clip-space depth in [-1, 1].
    #[inline]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    #[inline]
    pub fn mvp(&self, model: Mat4) -> Mat4 {
        self.view_projection() * model
    }

    #[inline]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !(self.fov_y_rad > 0.0 && self.fov_y_rad < std::f32::consts::PI) {
            return Err(CoreError::InvalidCamera {
                name: "fov_y_rad",
                value: self.fov_y_rad,
            });
        }
        if !(self.aspect > 0.0) || !self.aspect.is_finite() {
            return Err(CoreError::InvalidCamera {
                name: "aspect",
                value: self.aspect,
            });
        }
        if !(self.z_near > 0.0 && self.z_near < self.z_far) {
            return Err(CoreError::ClipPlanes {
                near: self.z_near,
                far: self.z_far,
            });
        }
        Ok(())
    }
}
