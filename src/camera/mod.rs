//! Cameras
//!
//! - [`Camera`]: view source (Euler rotation or look-at target) plus
//!   projection parameters, with lazily recomputed matrices
//! - [`Camera2D`] / [`Camera3D`]: scene components wrapping a [`Camera`]
//! - [`find_active_cameras`]: per-frame camera selection
//!
//! Projections use the OpenGL clip convention (NDC z in `[-1, 1]`).

mod camera2d;
mod camera3d;
mod selection;

pub use camera2d::Camera2D;
pub use camera3d::{Camera3D, OrbitActions};
pub use selection::{ActiveCameras, find_active_cameras};

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::errors::{LumenError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionType {
    #[default]
    Perspective,
    Orthographic,
}

/// Orthographic volume bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicParams {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthographicParams {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: -1.0,
            far: 1.0,
        }
    }
}

/// A view plus a projection.
///
/// Every setter only marks the camera dirty; [`update_matrices`] rebuilds the
/// cached matrices when needed and the getters return the cached values.
///
/// [`update_matrices`]: Camera::update_matrices
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    /// Euler angles in radians: x = pitch, y = yaw, z = roll.
    rotation: Vec3,
    target: Vec3,
    use_target: bool,
    up: Vec3,

    projection_type: ProjectionType,
    /// Vertical field of view in radians.
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    ortho: OrthographicParams,

    view_matrix: Mat4,
    projection_matrix: Mat4,
    dirty: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            target: Vec3::NEG_Z,
            use_target: false,
            up: Vec3::Y,
            projection_type: ProjectionType::Perspective,
            fov: 45f32.to_radians(),
            aspect: 4.0 / 3.0,
            near: 0.1,
            far: 100.0,
            ortho: OrthographicParams::default(),
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            dirty: true,
        }
    }
}

impl Camera {
    /// Perspective camera; `fov` is in radians.
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Result<Self> {
        let mut camera = Self::default();
        camera.set_perspective(fov, aspect, near, far)?;
        camera.update_matrices();
        Ok(camera)
    }

    pub fn new_orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<Self> {
        let mut camera = Self::default();
        camera.set_orthographic(left, right, bottom, top, near, far)?;
        camera.update_matrices();
        Ok(camera)
    }

    /// Fallback 3D pose: 45° perspective looking from (5, 5, 5) at the origin.
    #[must_use]
    pub fn default_3d(aspect: f32) -> Self {
        let mut camera = Self {
            fov: 45f32.to_radians(),
            aspect: if aspect > 0.0 { aspect } else { 4.0 / 3.0 },
            ..Self::default()
        };
        camera.set_position(Vec3::splat(5.0));
        camera.set_target(Vec3::ZERO);
        camera.set_use_target(true);
        camera.update_matrices();
        camera
    }

    // ========================================================================
    // Setters
    // ========================================================================

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    /// Euler angles in radians (pitch, yaw, roll).
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.dirty = true;
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.dirty = true;
    }

    pub fn set_use_target(&mut self, use_target: bool) {
        self.use_target = use_target;
        self.dirty = true;
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up.normalize_or(Vec3::Y);
        self.dirty = true;
    }

    /// Switches to a perspective projection.
    ///
    /// Rejects `near <= 0` and `far <= near`; the camera is left unchanged.
    pub fn set_perspective(&mut self, fov: f32, aspect: f32, near: f32, far: f32) -> Result<()> {
        if near <= 0.0 {
            return Err(LumenError::InvalidProjection(format!(
                "near plane must be positive (got {near})"
            )));
        }
        if far <= near {
            return Err(LumenError::InvalidProjection(format!(
                "far plane ({far}) must be greater than near plane ({near})"
            )));
        }
        if fov <= 0.0 || fov >= std::f32::consts::PI || aspect <= 0.0 {
            return Err(LumenError::InvalidProjection(format!(
                "fov {fov} rad / aspect {aspect} out of range"
            )));
        }
        self.projection_type = ProjectionType::Perspective;
        self.fov = fov;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.dirty = true;
        Ok(())
    }

    /// Switches to an orthographic projection.
    pub fn set_orthographic(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<()> {
        if far <= near {
            return Err(LumenError::InvalidProjection(format!(
                "far plane ({far}) must be greater than near plane ({near})"
            )));
        }
        if left == right || bottom == top {
            return Err(LumenError::InvalidProjection(
                "orthographic volume has zero width or height".to_string(),
            ));
        }
        self.projection_type = ProjectionType::Orthographic;
        self.ortho = OrthographicParams {
            left,
            right,
            bottom,
            top,
            near,
            far,
        };
        self.dirty = true;
        Ok(())
    }

    /// Changes only the aspect ratio of a perspective camera.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect > 0.0 {
            self.aspect = aspect;
            self.dirty = true;
        }
    }

    // ========================================================================
    // Matrices
    // ========================================================================

    /// Rebuilds the view and projection matrices if dirty.
    ///
    /// Returns whether anything was recomputed.
    pub fn update_matrices(&mut self) -> bool {
        if !self.dirty {
            return false;
        }

        let forward = self.forward();
        let up = self.up_vector();
        self.view_matrix = Mat4::look_at_rh(self.position, self.position + forward, up);

        self.projection_matrix = match self.projection_type {
            ProjectionType::Perspective => {
                Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let o = self.ortho;
                Mat4::orthographic_rh_gl(o.left, o.right, o.bottom, o.top, o.near, o.far)
            }
        };

        self.dirty = false;
        true
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    // ========================================================================
    // Basis
    // ========================================================================

    /// Unit view direction.
    ///
    /// Target mode points at the target; Euler mode applies yaw, then pitch,
    /// then roll to `-Z`.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        if self.use_target {
            let dir = self.target - self.position;
            if dir.length_squared() > 1e-12 {
                return dir.normalize();
            }
        }
        let q = Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z);
        (q * Vec3::NEG_Z).normalize()
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        let forward = self.forward();
        let right = forward.cross(self.up);
        if right.length_squared() < 1e-8 {
            // Looking straight along the up vector.
            return Vec3::X;
        }
        right.normalize()
    }

    /// Up vector re-orthogonalized against the view direction, with roll
    /// applied in Euler mode.
    #[must_use]
    pub fn up_vector(&self) -> Vec3 {
        let forward = self.forward();
        let up = self.right().cross(forward).normalize();
        if self.use_target || self.rotation.z == 0.0 {
            up
        } else {
            Quat::from_axis_angle(forward, self.rotation.z) * up
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[must_use]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    #[must_use]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    #[must_use]
    pub fn is_using_target(&self) -> bool {
        self.use_target
    }

    #[must_use]
    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    #[must_use]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    #[must_use]
    pub fn near(&self) -> f32 {
        match self.projection_type {
            ProjectionType::Perspective => self.near,
            ProjectionType::Orthographic => self.ortho.near,
        }
    }

    #[must_use]
    pub fn far(&self) -> f32 {
        match self.projection_type {
            ProjectionType::Perspective => self.far,
            ProjectionType::Orthographic => self.ortho.far,
        }
    }

    #[must_use]
    pub fn orthographic(&self) -> OrthographicParams {
        self.ortho
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ========================================================================
    // Screen mapping
    // ========================================================================

    /// Maps a world point to screen pixels (origin top-left, Y down).
    #[must_use]
    pub fn world_to_screen(&self, world: Vec3, viewport: Vec2) -> Vec2 {
        let clip = self.view_projection_matrix() * world.extend(1.0);
        let ndc = if clip.w.abs() > f32::EPSILON {
            clip.truncate() / clip.w
        } else {
            clip.truncate()
        };
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        )
    }

    /// Maps screen pixels to the world point at NDC depth `ndc_z`.
    #[must_use]
    pub fn screen_to_world(&self, screen: Vec2, viewport: Vec2, ndc_z: f32) -> Vec3 {
        let ndc = screen_to_ndc(screen, viewport);
        let inv = self.view_projection_matrix().inverse();
        let world = inv * Vec4::new(ndc.x, ndc.y, ndc_z, 1.0);
        if world.w.abs() > f32::EPSILON {
            world.truncate() / world.w
        } else {
            world.truncate()
        }
    }

    /// World-space direction of the ray through a screen pixel.
    #[must_use]
    pub fn screen_to_world_ray(&self, screen: Vec2, viewport: Vec2) -> Vec3 {
        let ndc = screen_to_ndc(screen, viewport);
        let clip = Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
        let mut eye = self.projection_matrix.inverse() * clip;
        eye.z = -1.0;
        eye.w = 0.0;
        let world = self.view_matrix.inverse() * eye;
        world.truncate().normalize_or_zero()
    }
}

fn screen_to_ndc(screen: Vec2, viewport: Vec2) -> Vec2 {
    let size = viewport.max(Vec2::ONE);
    Vec2::new(
        screen.x / size.x * 2.0 - 1.0,
        1.0 - screen.y / size.y * 2.0,
    )
}
