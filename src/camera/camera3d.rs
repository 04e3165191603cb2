use glam::{EulerRot, Quat, Vec2, Vec3};
use rustc_hash::FxHashSet;
use uuid::Uuid;

use super::{Camera, ProjectionType};
use crate::scene::component::{Component, UpdateContext};
use crate::scene::events::{InputEvent, MouseButton};
use crate::scene::export::{ExportField, ExportType, ExportValue};
use crate::scene::node::Node;

const MOUSE_ORBIT_SENSITIVITY: f32 = 0.1;
const TANK_ORBIT_SPEED: f32 = 90.0;
const SCROLL_ZOOM_SPEED: f32 = 1.0;
const PITCH_LIMIT: f32 = 89.0;

static SCHEMA: &[ExportField] = &[
    ExportField::new("offset", ExportType::Vec3, ExportValue::Vec3([0.0, 0.0, 0.0]), "Offset rotated by the node rotation"),
    ExportField::new("fov", ExportType::Float, ExportValue::Float(45.0), "Vertical field of view in degrees"),
    ExportField::new("near_plane", ExportType::Float, ExportValue::Float(0.1), "Near clip distance"),
    ExportField::new("far_plane", ExportType::Float, ExportValue::Float(100.0), "Far clip distance"),
    ExportField::new("projection_type", ExportType::Enum(&["Perspective", "Orthographic"]), ExportValue::Enum(0), "Projection kind"),
    ExportField::new("orthographic_size", ExportType::Float, ExportValue::Float(10.0), "Half height of the orthographic volume"),
    ExportField::new("enabled", ExportType::Bool, ExportValue::Bool(true), "Whether the camera can be selected"),
    ExportField::new("is_current", ExportType::Bool, ExportValue::Bool(false), "Prefer this camera over other enabled ones"),
    ExportField::new("follow_target", ExportType::NodeReference, ExportValue::None, "Node to orbit and follow"),
    ExportField::new("follow_smoothing", ExportType::Float, ExportValue::Float(0.1), "0 snaps to the target, 1 never moves"),
    ExportField::new("follow_distance", ExportType::Float, ExportValue::Float(5.0), "Initial orbit distance"),
    ExportField::new("follow_height", ExportType::Float, ExportValue::Float(2.0), "Target height; the camera looks at half of it"),
    ExportField::new("mouse_orbit_enabled", ExportType::Bool, ExportValue::Bool(true), "Right mouse drag orbits"),
    ExportField::new("tank_orbit_enabled", ExportType::Bool, ExportValue::Bool(false), "Input actions orbit"),
    ExportField::new("scroll_zoom_enabled", ExportType::Bool, ExportValue::Bool(true), "Mouse wheel zooms"),
    ExportField::new("min_zoom", ExportType::Float, ExportValue::Float(1.0), "Closest orbit distance"),
    ExportField::new("max_zoom", ExportType::Float, ExportValue::Float(20.0), "Farthest orbit distance"),
    ExportField::new("orbit_left_action", ExportType::String, ExportValue::String("camera_orbit_left"), "Action name for orbit left"),
    ExportField::new("orbit_right_action", ExportType::String, ExportValue::String("camera_orbit_right"), "Action name for orbit right"),
    ExportField::new("orbit_up_action", ExportType::String, ExportValue::String("camera_orbit_up"), "Action name for orbit up"),
    ExportField::new("orbit_down_action", ExportType::String, ExportValue::String("camera_orbit_down"), "Action name for orbit down"),
];

/// Input action names driving tank-style orbit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrbitActions {
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
}

impl Default for OrbitActions {
    fn default() -> Self {
        Self {
            left: "camera_orbit_left".to_string(),
            right: "camera_orbit_right".to_string(),
            up: "camera_orbit_up".to_string(),
            down: "camera_orbit_down".to_string(),
        }
    }
}

/// Perspective or orthographic 3D camera component with an optional
/// third-person follow/orbit rig.
///
/// Angles exposed by this component are in degrees.
#[derive(Debug, Clone)]
pub struct Camera3D {
    camera: Camera,
    offset: Vec3,
    fov: f32,
    near: f32,
    far: f32,
    projection_type: ProjectionType,
    orthographic_size: f32,
    enabled: bool,
    current: bool,

    follow_target: Option<Uuid>,
    follow_smoothing: f32,
    follow_distance: f32,
    follow_height: f32,

    pub mouse_orbit_enabled: bool,
    pub tank_orbit_enabled: bool,
    pub scroll_zoom_enabled: bool,
    min_zoom: f32,
    max_zoom: f32,
    orbit_yaw: f32,
    orbit_pitch: f32,
    current_zoom: f32,
    pub actions: OrbitActions,

    orbit_button_held: bool,
    held_actions: FxHashSet<String>,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera3D {
    #[must_use]
    pub fn new() -> Self {
        let mut camera = Self {
            camera: Camera::default(),
            offset: Vec3::ZERO,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            projection_type: ProjectionType::Perspective,
            orthographic_size: 10.0,
            enabled: true,
            current: false,
            follow_target: None,
            follow_smoothing: 0.1,
            follow_distance: 5.0,
            follow_height: 2.0,
            mouse_orbit_enabled: true,
            tank_orbit_enabled: false,
            scroll_zoom_enabled: true,
            min_zoom: 1.0,
            max_zoom: 20.0,
            orbit_yaw: 180.0,
            orbit_pitch: -15.0,
            current_zoom: 5.0,
            actions: OrbitActions::default(),
            orbit_button_held: false,
            held_actions: FxHashSet::default(),
        };
        camera.apply_projection(800.0 / 600.0);
        camera.camera.update_matrices();
        camera
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn set_offset(&mut self, offset: Vec3) {
        self.offset = offset;
    }

    /// Degrees, clamped to `[1, 179]`.
    pub fn set_fov(&mut self, degrees: f32) {
        self.fov = degrees.clamp(1.0, 179.0);
    }

    /// Clamped to at least 0.001; pushes the far plane out if needed.
    pub fn set_near_plane(&mut self, near: f32) {
        self.near = near.max(0.001);
        self.far = self.far.max(self.near + 0.001);
    }

    /// Clamped to at least `near + 0.001`.
    pub fn set_far_plane(&mut self, far: f32) {
        self.far = far.max(self.near + 0.001);
    }

    pub fn set_projection_type(&mut self, projection_type: ProjectionType) {
        self.projection_type = projection_type;
    }

    /// Clamped to at least 0.1.
    pub fn set_orthographic_size(&mut self, size: f32) {
        self.orthographic_size = size.max(0.1);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_current(&mut self, current: bool) {
        self.current = current;
    }

    pub fn set_follow_target(&mut self, target: Option<Uuid>) {
        self.follow_target = target;
        if target.is_none() {
            self.camera.set_use_target(false);
        }
    }

    pub fn set_follow_smoothing(&mut self, smoothing: f32) {
        self.follow_smoothing = smoothing.clamp(0.0, 1.0);
    }

    /// Clamped to at least 0.1; also resets the current orbit zoom.
    pub fn set_follow_distance(&mut self, distance: f32) {
        self.follow_distance = distance.max(0.1);
        self.current_zoom = self.follow_distance;
    }

    pub fn set_follow_height(&mut self, height: f32) {
        self.follow_height = height;
    }

    pub fn set_zoom_limits(&mut self, min: f32, max: f32) {
        self.min_zoom = min.max(0.1);
        self.max_zoom = max.max(self.min_zoom);
        self.current_zoom = self.current_zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Orbit angles in degrees; pitch is clamped to ±89°.
    pub fn set_orbit(&mut self, yaw: f32, pitch: f32) {
        self.orbit_yaw = yaw;
        self.orbit_pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    // ========================================================================
    // Getters
    // ========================================================================

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[must_use]
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    #[must_use]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    #[must_use]
    pub fn near_plane(&self) -> f32 {
        self.near
    }

    #[must_use]
    pub fn far_plane(&self) -> f32 {
        self.far
    }

    #[must_use]
    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    #[must_use]
    pub fn orthographic_size(&self) -> f32 {
        self.orthographic_size
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current
    }

    #[must_use]
    pub fn follow_target(&self) -> Option<Uuid> {
        self.follow_target
    }

    /// `(yaw, pitch)` in degrees.
    #[must_use]
    pub fn orbit(&self) -> (f32, f32) {
        (self.orbit_yaw, self.orbit_pitch)
    }

    #[must_use]
    pub fn current_zoom(&self) -> f32 {
        self.current_zoom
    }

    // ========================================================================
    // Matrices
    // ========================================================================

    fn apply_projection(&mut self, aspect: f32) {
        let aspect = if aspect > 0.0 { aspect } else { 4.0 / 3.0 };
        let result = match self.projection_type {
            ProjectionType::Perspective => {
                self.camera
                    .set_perspective(self.fov.to_radians(), aspect, self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let h = self.orthographic_size;
                let w = h * aspect;
                self.camera.set_orthographic(-w, w, -h, h, self.near, self.far)
            }
        };
        if let Err(err) = result {
            log::warn!("Camera3D: {err}");
        }
    }

    /// Rebuilds the camera from the owner's global transform.
    pub fn update_camera(&mut self, owner: &Node, aspect: f32) {
        let (position, rotation) = owner.transform().map_or((Vec3::ZERO, Quat::IDENTITY), |t| {
            (t.global_position(), t.global_rotation())
        });
        self.update_camera_at(position, rotation, aspect);
    }

    /// Same as [`update_camera`](Self::update_camera) with the owner's
    /// global position and rotation given directly.
    pub fn update_camera_at(&mut self, position: Vec3, rotation: Quat, aspect: f32) {
        self.camera.set_position(position + rotation * self.offset);
        if !self.camera.is_using_target() {
            let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
            self.camera.set_rotation(Vec3::new(pitch, yaw, roll));
        }
        self.apply_projection(aspect);
        self.camera.update_matrices();
    }

    /// Offset of the camera from the look target for the current orbit.
    #[must_use]
    pub fn orbit_offset(&self) -> Vec3 {
        let yaw = self.orbit_yaw.to_radians();
        let pitch = self.orbit_pitch.to_radians();
        self.current_zoom
            * Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos())
    }

    /// Rotation aligning the local +Y axis with a surface normal.
    #[must_use]
    pub fn align_to_surface_normal(normal: Vec3) -> Quat {
        let normal = normal.normalize_or(Vec3::Y);
        Quat::from_rotation_arc(Vec3::Y, normal)
    }

    #[must_use]
    pub fn screen_to_world_ray(&self, screen: Vec2, viewport_size: Vec2) -> Vec3 {
        self.camera.screen_to_world_ray(screen, viewport_size)
    }

    #[must_use]
    pub fn world_to_screen(&self, world: Vec3, viewport_size: Vec2) -> Vec2 {
        self.camera.world_to_screen(world, viewport_size)
    }

    // ========================================================================
    // Rig
    // ========================================================================

    fn update_tank_orbit(&mut self, delta_time: f32) {
        if !self.tank_orbit_enabled || self.follow_target.is_none() {
            return;
        }
        let step = TANK_ORBIT_SPEED * delta_time;
        if self.held_actions.contains(&self.actions.left) {
            self.orbit_yaw -= step;
        }
        if self.held_actions.contains(&self.actions.right) {
            self.orbit_yaw += step;
        }
        if self.held_actions.contains(&self.actions.up) {
            self.orbit_pitch += step;
        }
        if self.held_actions.contains(&self.actions.down) {
            self.orbit_pitch -= step;
        }
        self.orbit_pitch = self.orbit_pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    fn update_follow(&mut self, ctx: &mut UpdateContext<'_>) {
        let Some(target_id) = self.follow_target else {
            self.camera.set_use_target(false);
            return;
        };
        let Some(target) = ctx
            .scene
            .find_by_uuid(target_id)
            .and_then(|id| ctx.scene.node(id))
        else {
            return;
        };
        let target_pos = if target.is_3d() {
            target.global_position()
        } else {
            Vec3::ZERO
        };

        let look_target = target_pos + Vec3::new(0.0, self.follow_height * 0.5, 0.0);
        let desired = look_target + self.orbit_offset();

        if let Some(owner) = ctx.owner().filter(|o| o.is_3d()) {
            let next = if self.follow_smoothing > 0.0 {
                let t = 1.0 - self.follow_smoothing.powf(ctx.delta_time);
                owner.global_position().lerp(desired, t)
            } else {
                desired
            };
            ctx.set_owner_position_3d(next);
        }

        self.camera.set_target(look_target);
        self.camera.set_use_target(true);
    }
}

impl Component for Camera3D {
    fn type_name(&self) -> &'static str {
        "Camera3D"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn on_update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.update_tank_orbit(ctx.delta_time);
        self.update_follow(ctx);
    }

    fn on_input(&mut self, _ctx: &mut UpdateContext<'_>, event: &InputEvent) {
        match event {
            InputEvent::MouseButton {
                button: MouseButton::Right,
                pressed,
                ..
            } => self.orbit_button_held = *pressed,
            InputEvent::MouseMoved { delta, .. } => {
                if self.mouse_orbit_enabled && self.orbit_button_held && self.follow_target.is_some()
                {
                    self.orbit_yaw -= delta.x * MOUSE_ORBIT_SENSITIVITY;
                    self.orbit_pitch = (self.orbit_pitch - delta.y * MOUSE_ORBIT_SENSITIVITY)
                        .clamp(-PITCH_LIMIT, PITCH_LIMIT);
                }
            }
            InputEvent::MouseWheel { delta } => {
                if self.scroll_zoom_enabled && delta.y != 0.0 {
                    self.current_zoom = (self.current_zoom - delta.y * SCROLL_ZOOM_SPEED)
                        .clamp(self.min_zoom, self.max_zoom);
                }
            }
            InputEvent::Action { name, pressed } => {
                if *pressed {
                    self.held_actions.insert(name.clone());
                } else {
                    self.held_actions.remove(name);
                }
            }
            _ => {}
        }
    }

    fn export_schema(&self) -> &'static [ExportField] {
        SCHEMA
    }
}
