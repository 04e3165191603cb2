//! Component contract.
//!
//! Components are the only things in a scene that produce output. They are
//! owned by a node and receive:
//!
//! - construction hooks: `on_awake` (when attached) and `on_ready` (when the
//!   scene starts),
//! - `on_update(ctx)` once per simulation step,
//! - `on_input(ctx, event)` for forwarded input,
//! - `submit_renderables(ctx)` once per render pass the owner takes part in,
//! - `on_destroy` when the owner is removed.
//!
//! Render submission runs with a zero delta time and must not depend on it.

use std::any::Any;

use glam::{Vec2, Vec3};

use crate::mesh::Mesh;
use crate::renderer::RenderContext;
use crate::scene::events::{InputEvent, UiEvent, UiEventSender};
use crate::scene::export::ExportField;
use crate::scene::node::Node;
use crate::scene::scene::Scene;
use crate::scene::NodeId;

/// Upcasting helper implemented for every `'static` type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub trait Component: AsAny + std::fmt::Debug {
    /// Stable string identity ("Sprite2D", "Camera3D", ...).
    fn type_name(&self) -> &'static str;

    /// Disabled components receive no hooks except `on_destroy`.
    fn is_active(&self) -> bool {
        true
    }

    fn on_awake(&mut self) {}

    fn on_ready(&mut self) {}

    fn on_update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    fn on_input(&mut self, _ctx: &mut UpdateContext<'_>, _event: &InputEvent) {}

    fn on_destroy(&mut self) {}

    fn submit_renderables(&mut self, _ctx: &mut RenderContext<'_>) {}

    /// Geometry drawn into shadow maps, if the component casts shadows.
    fn shadow_geometry(&self) -> Option<&Mesh> {
        None
    }

    fn export_schema(&self) -> &'static [ExportField] {
        &[]
    }
}

/// Deferred change to the owning node requested during an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum OwnerRequest {
    Position3D(Vec3),
    Position2D(Vec2),
}

/// Read-only scene access handed to `on_update` and `on_input`.
///
/// The owner's own components are detached while the hook runs, so
/// `owner()` shows the node without them.
pub struct UpdateContext<'a> {
    pub scene: &'a Scene,
    pub owner_id: NodeId,
    pub delta_time: f32,
    ui_events: UiEventSender,
    pub(crate) requests: Vec<OwnerRequest>,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(scene: &'a Scene, owner_id: NodeId, delta_time: f32) -> Self {
        Self {
            scene,
            owner_id,
            delta_time,
            ui_events: scene.ui_event_sender(),
            requests: Vec::new(),
        }
    }

    /// The node owning the component.
    #[must_use]
    pub fn owner(&self) -> Option<&'a Node> {
        self.scene.node(self.owner_id)
    }

    /// Moves a `Node3D` owner once the hook returns.
    pub fn set_owner_position_3d(&mut self, position: Vec3) {
        self.requests.push(OwnerRequest::Position3D(position));
    }

    /// Moves a `Node2D` owner once the hook returns.
    pub fn set_owner_position_2d(&mut self, position: Vec2) {
        self.requests.push(OwnerRequest::Position2D(position));
    }

    pub fn emit(&self, event: UiEvent) {
        self.ui_events.send(event);
    }
}
