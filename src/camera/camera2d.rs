use glam::{Vec2, Vec3, Vec4};
use uuid::Uuid;

use super::Camera;
use crate::scene::component::{Component, UpdateContext};
use crate::scene::export::{ExportField, ExportType, ExportValue};
use crate::scene::node::Node;

const MIN_ZOOM: f32 = 0.01;

static SCHEMA: &[ExportField] = &[
    ExportField::new("offset", ExportType::Vec2, ExportValue::Vec2([0.0, 0.0]), "Camera offset from the node position"),
    ExportField::new("zoom", ExportType::Float, ExportValue::Float(1.0), "Zoom factor (1 = pixel-perfect)"),
    ExportField::new("rotation", ExportType::Float, ExportValue::Float(0.0), "Camera rotation in radians"),
    ExportField::new("enabled", ExportType::Bool, ExportValue::Bool(true), "Whether the camera can be selected"),
    ExportField::new("is_current", ExportType::Bool, ExportValue::Bool(false), "Prefer this camera over other enabled ones"),
    ExportField::new("follow_target", ExportType::NodeReference, ExportValue::None, "Node to follow"),
    ExportField::new("follow_smoothing", ExportType::Float, ExportValue::Float(0.1), "0 snaps to the target, 1 never moves"),
];

/// Orthographic 2D camera component.
///
/// Looks down `-Z` at the owner's global position plus `offset`; the visible
/// half-extent is half the viewport divided by `zoom`. World Y points up.
#[derive(Debug, Clone)]
pub struct Camera2D {
    camera: Camera,
    offset: Vec2,
    zoom: f32,
    rotation: f32,
    enabled: bool,
    current: bool,
    follow_target: Option<Uuid>,
    follow_smoothing: f32,
    viewport_size: Vec2,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera2D {
    #[must_use]
    pub fn new() -> Self {
        let mut camera = Self {
            camera: Camera::default(),
            offset: Vec2::ZERO,
            zoom: 1.0,
            rotation: 0.0,
            enabled: true,
            current: false,
            follow_target: None,
            follow_smoothing: 0.1,
            viewport_size: Vec2::new(800.0, 600.0),
        };
        camera.rebuild(Vec2::ZERO);
        camera
    }

    // --- Settings -----------------------------------------------------------

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Clamped to at least 0.01.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(MIN_ZOOM);
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_current(&mut self, current: bool) {
        self.current = current;
    }

    pub fn set_follow_target(&mut self, target: Option<Uuid>) {
        self.follow_target = target;
    }

    /// Clamped to `[0, 1]`.
    pub fn set_follow_smoothing(&mut self, smoothing: f32) {
        self.follow_smoothing = smoothing.clamp(0.0, 1.0);
    }

    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.rotation
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

    #[must_use]
    pub fn follow_smoothing(&self) -> f32 {
        self.follow_smoothing
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    // --- Matrices -----------------------------------------------------------

    /// Rebuilds the camera for the owner's current position and the given
    /// viewport size.
    pub fn update_camera(&mut self, owner: &Node, viewport_size: Vec2) {
        self.update_camera_at(owner.global_position_2d(), viewport_size);
    }

    /// Same as [`update_camera`](Self::update_camera) with the owner's
    /// global position given directly.
    pub fn update_camera_at(&mut self, owner_position: Vec2, viewport_size: Vec2) {
        self.viewport_size = viewport_size.max(Vec2::ONE);
        self.rebuild(owner_position);
    }

    fn rebuild(&mut self, owner_position: Vec2) {
        let center = owner_position + self.offset;
        let half = self.viewport_size * 0.5 / self.zoom;

        self.camera.set_use_target(false);
        self.camera.set_position(Vec3::new(center.x, center.y, 0.0));
        self.camera.set_rotation(Vec3::new(0.0, 0.0, self.rotation));
        if let Err(err) = self
            .camera
            .set_orthographic(-half.x, half.x, -half.y, half.y, -1000.0, 1000.0)
        {
            log::warn!("Camera2D: {err}");
        }
        self.camera.update_matrices();
    }

    /// Visible world rectangle as `(left, top, right, bottom)`.
    #[must_use]
    pub fn bounds(&self) -> Vec4 {
        let half = self.viewport_size * 0.5 / self.zoom;
        let center = self.camera.position();
        Vec4::new(
            center.x - half.x,
            center.y + half.y,
            center.x + half.x,
            center.y - half.y,
        )
    }

    #[must_use]
    pub fn screen_to_world(&self, screen: Vec2, viewport_size: Vec2) -> Vec2 {
        self.camera
            .screen_to_world(screen, viewport_size, 0.0)
            .truncate()
    }

    #[must_use]
    pub fn world_to_screen(&self, world: Vec2, viewport_size: Vec2) -> Vec2 {
        self.camera.world_to_screen(world.extend(0.0), viewport_size)
    }
}

impl Component for Camera2D {
    fn type_name(&self) -> &'static str {
        "Camera2D"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn on_update(&mut self, ctx: &mut UpdateContext<'_>) {
        let Some(target_id) = self.follow_target else {
            return;
        };
        let Some(target) = ctx
            .scene
            .find_by_uuid(target_id)
            .and_then(|id| ctx.scene.node(id))
        else {
            log::debug!("Camera2D: follow target {target_id} not found");
            return;
        };
        if !target.is_2d() {
            return;
        }
        let Some(owner) = ctx.owner() else {
            return;
        };
        if !owner.is_2d() {
            return;
        }

        let target_pos = target.global_position_2d();
        let next = if self.follow_smoothing > 0.0 {
            let t = 1.0 - self.follow_smoothing.powf(ctx.delta_time);
            owner.global_position_2d().lerp(target_pos, t)
        } else {
            target_pos
        };
        ctx.set_owner_position_2d(next);
    }

    fn export_schema(&self) -> &'static [ExportField] {
        SCHEMA
    }
}
