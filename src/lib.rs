//! Lumen: scene rendering and lighting for 2D/3D editors and runtimes.
//!
//! A [`Scene`] of nodes owns components; every frame the [`Renderer`]
//! walks it once per pass (3D world, 2D world, screen-space UI), collects
//! [`RenderCommand`](renderer::RenderCommand)s from the components and
//! flushes them to a [`GraphicsDevice`]. Lighting, shadow maps, skyboxes
//! and text are prepared around those passes.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod camera;
pub mod components;
pub mod device;
pub mod errors;
pub mod lighting;
pub mod logging;
pub mod mesh;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod skybox;
pub mod text;
pub mod tilemap;
pub mod viewport;

pub use camera::{Camera, Camera2D, Camera3D};
pub use components::{
    Button, ColorRect, Label, MeshInstance3D, ProgressBar, SkinnedMesh3D, Sprite2D, Sprite3D, Tilemap2D,
};
pub use device::{GraphicsDevice, HeadlessDevice};
pub use errors::{LumenError, Result};
pub use lighting::{DirectionalLight, LightingSystem, OmniLight, SpotLight};
pub use mesh::{Mesh, Vertex};
pub use renderer::{FrameStats, Renderer};
pub use scene::{Component, Node, NodeId, NodeKind, Scene, UiEvent};
pub use settings::{ProjectSettings, RendererSettings, RenderingContext};
pub use skybox::Skybox3D;
pub use text::{TextRenderParams, TextRenderer};
pub use viewport::ViewportManager;
