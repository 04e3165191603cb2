//! Scene graph
//!
//! - [`Node`]: shared header (active, visible, children, components) plus a
//!   [`NodeKind`] payload for 3D, 2D and Control nodes
//! - [`Transform`], [`Transform2D`], [`ControlRect`]: per-category spatial data
//! - [`Scene`]: node arena, hierarchy editing, traversal and component hooks
//! - [`Component`]: the capability set the renderer drives
//! - [`ExportField`]: declarative per-component export schema
//! - [`UiEvent`]: messages emitted by UI components

pub mod component;
pub mod events;
pub mod export;
pub mod node;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use component::{AsAny, Component, UpdateContext};
pub use events::{InputEvent, Key, MouseButton, UiEvent, UiEventQueue, UiEventSender};
pub use export::{ExportField, ExportType, ExportValue};
pub use node::{Node, NodeKind};
pub use scene::Scene;
pub use transform::{ControlRect, Transform, Transform2D};

use slotmap::new_key_type;

new_key_type! {
    /// Handle of a node inside its [`Scene`].
    pub struct NodeId;
}
