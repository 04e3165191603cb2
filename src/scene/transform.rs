use glam::{Affine2, Affine3A, Mat3, Mat4, Quat, Vec2, Vec3};

/// 3D transform component.
///
/// Holds the node's local TRS, the cached local and world matrices, and the
/// shadow state used to detect changes between frames.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,

            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,
        }
    }

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    // ========================================================================
    // Change detection
    // ========================================================================

    /// Recomputes the local matrix if any TRS field changed.
    ///
    /// Returns whether the matrix was rebuilt.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix =
                Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);

            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    // ========================================================================
    // Matrices
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.world_matrix)
    }

    pub fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = mat;
    }

    /// Global position taken from the world matrix.
    #[must_use]
    pub fn global_position(&self) -> Vec3 {
        Vec3::from(self.world_matrix.translation)
    }

    /// Global rotation taken from the world matrix.
    #[must_use]
    pub fn global_rotation(&self) -> Quat {
        let (_, rotation, _) = self.world_matrix.to_scale_rotation_translation();
        rotation
    }

    /// Orients the transform toward `target`, both in parent space.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward.cross(up).length_squared() < 1e-4 {
            return;
        }

        let right = forward.cross(up).normalize();
        let new_up = right.cross(forward).normalize();
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, new_up, -forward));
    }

    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// 2D transform of a world-space node. Y points up.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform2D {
    pub position: Vec2,
    /// Radians, counter-clockwise.
    pub rotation: f32,
    pub scale: Vec2,

    pub(crate) world: Affine2,
}

impl Transform2D {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            world: Affine2::IDENTITY,
        }
    }

    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn local_affine(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.position)
    }

    #[must_use]
    pub fn global_position(&self) -> Vec2 {
        self.world.translation
    }

    /// Accumulated scale along the world axes.
    #[must_use]
    pub fn global_scale(&self) -> Vec2 {
        Vec2::new(
            self.world.matrix2.x_axis.length(),
            self.world.matrix2.y_axis.length(),
        )
    }

    #[must_use]
    pub fn global_rotation(&self) -> f32 {
        self.world.matrix2.x_axis.y.atan2(self.world.matrix2.x_axis.x)
    }

    /// World matrix lifted into 3D (z = 0 plane).
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Mat4 {
        let m = self.world.matrix2;
        let t = self.world.translation;
        Mat4::from_cols(
            m.x_axis.extend(0.0).extend(0.0),
            m.y_axis.extend(0.0).extend(0.0),
            glam::Vec4::Z,
            t.extend(0.0).extend(1.0),
        )
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::new()
    }
}

/// Rectangle of a UI control. `position` is the rectangle centre in the
/// coordinate space of the pass the control renders in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlRect {
    pub position: Vec2,
    pub size: Vec2,

    pub(crate) global_position: Vec2,
}

impl ControlRect {
    #[must_use]
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            global_position: position,
        }
    }

    #[must_use]
    pub fn global_position(&self) -> Vec2 {
        self.global_position
    }

    /// Whether `point` lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size * 0.5;
        let min = self.global_position - half;
        let max = self.global_position + half;
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}

impl Default for ControlRect {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::new(100.0, 30.0))
    }
}
