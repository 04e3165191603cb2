use glam::{Mat4, Vec2, Vec3};
use uuid::Uuid;

use crate::scene::component::Component;
use crate::scene::transform::{ControlRect, Transform, Transform2D};
use crate::scene::NodeId;

/// Category of a node plus its category-specific spatial payload.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Grouping node without a transform.
    Node,
    Node3D(Transform),
    Node2D(Transform2D),
    /// UI control. World-space controls render with the 2D camera; the
    /// others are pinned to the viewport.
    Control { rect: ControlRect, world_space: bool },
}

impl NodeKind {
    #[must_use]
    pub fn node3d() -> Self {
        NodeKind::Node3D(Transform::new())
    }

    #[must_use]
    pub fn node2d() -> Self {
        NodeKind::Node2D(Transform2D::new())
    }

    #[must_use]
    pub fn control(rect: ControlRect, world_space: bool) -> Self {
        NodeKind::Control { rect, world_space }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Node => "Node",
            NodeKind::Node3D(_) => "Node3D",
            NodeKind::Node2D(_) => "Node2D",
            NodeKind::Control { .. } => "Control",
        }
    }
}

/// A scene node: shared header plus [`NodeKind`] payload.
///
/// The scene owns nodes exclusively, and each node owns its components.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    uuid: Uuid,
    /// Inactive nodes and their subtrees are skipped by every walk.
    pub active: bool,
    /// Hidden nodes and their subtrees are skipped by the render walk.
    pub visible: bool,
    pub kind: NodeKind,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) components: Vec<Box<dyn Component>>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4(),
            active: true,
            visible: true,
            kind,
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    // ========================================================================
    // Category predicates
    // ========================================================================

    #[must_use]
    pub fn is_3d(&self) -> bool {
        matches!(self.kind, NodeKind::Node3D(_))
    }

    #[must_use]
    pub fn is_2d(&self) -> bool {
        matches!(self.kind, NodeKind::Node2D(_))
    }

    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self.kind, NodeKind::Control { .. })
    }

    /// `Some(world_space)` for controls, `None` for every other category.
    #[must_use]
    pub fn control_world_space(&self) -> Option<bool> {
        match self.kind {
            NodeKind::Control { world_space, .. } => Some(world_space),
            _ => None,
        }
    }

    /// Active and visible.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.active && self.visible
    }

    // ========================================================================
    // Spatial accessors
    // ========================================================================

    #[must_use]
    pub fn transform(&self) -> Option<&Transform> {
        match &self.kind {
            NodeKind::Node3D(t) => Some(t),
            _ => None,
        }
    }

    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        match &mut self.kind {
            NodeKind::Node3D(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn transform_2d(&self) -> Option<&Transform2D> {
        match &self.kind {
            NodeKind::Node2D(t) => Some(t),
            _ => None,
        }
    }

    pub fn transform_2d_mut(&mut self) -> Option<&mut Transform2D> {
        match &mut self.kind {
            NodeKind::Node2D(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn rect(&self) -> Option<&ControlRect> {
        match &self.kind {
            NodeKind::Control { rect, .. } => Some(rect),
            _ => None,
        }
    }

    pub fn rect_mut(&mut self) -> Option<&mut ControlRect> {
        match &mut self.kind {
            NodeKind::Control { rect, .. } => Some(rect),
            _ => None,
        }
    }

    /// Global 4x4 transform of the node, whatever its category.
    #[must_use]
    pub fn global_transform(&self) -> Mat4 {
        match &self.kind {
            NodeKind::Node => Mat4::IDENTITY,
            NodeKind::Node3D(t) => t.world_matrix_as_mat4(),
            NodeKind::Node2D(t) => t.world_matrix_as_mat4(),
            NodeKind::Control { rect, .. } => {
                Mat4::from_translation(rect.global_position().extend(0.0))
            }
        }
    }

    #[must_use]
    pub fn global_position(&self) -> Vec3 {
        self.global_transform().w_axis.truncate()
    }

    /// Global position projected onto the 2D plane.
    #[must_use]
    pub fn global_position_2d(&self) -> Vec2 {
        self.global_position().truncate()
    }

    /// Accumulated 2D scale; `(1, 1)` for non-2D nodes.
    #[must_use]
    pub fn scale_2d(&self) -> Vec2 {
        self.transform_2d()
            .map_or(Vec2::ONE, Transform2D::global_scale)
    }

    // ========================================================================
    // Components
    // ========================================================================

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| &**c)
    }

    /// First component of concrete type `T`.
    #[must_use]
    pub fn get_component<T: Component + 'static>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|c| (**c).as_any().downcast_ref::<T>())
    }

    pub fn get_component_mut<T: Component + 'static>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|c| (**c).as_any_mut().downcast_mut::<T>())
    }

    #[must_use]
    pub fn has_component(&self, type_name: &str) -> bool {
        self.components.iter().any(|c| c.type_name() == type_name)
    }
}
