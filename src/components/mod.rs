//! Built-in components.
//!
//! 2D components draw with the quad program during the 2D passes, 3D
//! components with the mesh programs during the 3D pass. Each one returns
//! early when the renderer's [`RenderingContext`](crate::settings::RenderingContext)
//! hides its category.

pub mod mesh_instance;
pub mod sprite;
pub mod sprite3d;
pub mod tilemap;
pub mod ui;

pub use mesh_instance::{MeshInstance3D, Primitive, SkinnedMesh3D};
pub use sprite::Sprite2D;
pub use sprite3d::Sprite3D;
pub use tilemap::Tilemap2D;
pub use ui::{Button, ColorRect, FillDirection, Label, ProgressBar};
