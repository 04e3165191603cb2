//! Renderer core
//!
//! [`Renderer`] owns the graphics device, the resource cache, the text
//! renderer, the lighting system, the built-in programs and the per-frame
//! command queue. There is no global state: the embedding engine keeps one
//! `Renderer` and passes scenes to it.
//!
//! # Frame protocol
//!
//! [`Renderer::render_scene_with_cameras`]:
//!
//! 1. collect lights, let skyboxes add ambient, fog and their sun
//! 2. render shadow maps
//! 3. pick the active cameras
//! 4. begin the frame and clear
//! 5. 3D pass: skyboxes, then `Node3D` subtrees, flush
//! 6. 2D world pass: `Node2D` and world-space controls, flush
//! 7. screen pass: screen-space controls, flush
//!
//! Within a pass, commands are drawn in scene pre-order. Submission never
//! fails: commands without geometry are skipped and counted in
//! [`FrameStats`].

pub mod command;
pub mod context;
pub mod quad;
pub mod shaders;

pub use command::{RenderCommand, ShaderHint, ShaderKind};
pub use context::{RenderContext, RenderPass};
pub use quad::{QuadGeometry, TextureRegion};

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::camera::{Camera, Camera2D, Camera3D, find_active_cameras};
use crate::device::{
    BlendFactor, BufferId, BufferKind, BufferUsage, ClearFlags, GraphicsDevice, HeadlessDevice,
    Primitive, ShaderId, TextureFormat, TextureId, UniformValue, VertexArrayId, VertexLayout,
};
use crate::errors::Result;
use crate::lighting::{LightingSystem, ShadowStats};
use crate::logging::RateLimiter;
use crate::resources::ResourceCache;
use crate::scene::{Node, NodeId, Scene};
use crate::settings::{ProjectSettings, RendererSettings, RenderingContext, TextureFilter};
use crate::skybox::{self, Skybox3D};
use crate::text::TextRenderer;
use crate::viewport::ViewportManager;

use self::shaders::MAX_BONES;

/// Component types the regular walk never asks to submit.
const WALK_SKIPPED_TYPES: [&str; 3] = ["Camera2D", "Camera3D", "Skybox3D"];

/// Skipped draws between two diagnostic lines.
const SKIPPED_LOG_PERIOD: u32 = 60;

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Commands queued during the pass.
    pub submitted: u32,
    /// Draw calls issued.
    pub drawn: u32,
    /// Commands dropped for missing geometry.
    pub skipped: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub passes: [PassStats; 3],
    pub shadow: ShadowStats,
}

impl FrameStats {
    #[must_use]
    pub fn pass(&self, pass: RenderPass) -> &PassStats {
        &self.passes[pass.index()]
    }

    #[must_use]
    pub fn total_drawn(&self) -> u32 {
        self.passes.iter().map(|p| p.drawn).sum()
    }

    #[must_use]
    pub fn total_skipped(&self) -> u32 {
        self.passes.iter().map(|p| p.skipped).sum()
    }
}

// ============================================================================
// Device objects
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct BuiltinShaders {
    mesh: ShaderId,
    skinned: ShaderId,
    quad: ShaderId,
    text: ShaderId,
    skybox: ShaderId,
}

impl BuiltinShaders {
    fn create(device: &mut dyn GraphicsDevice) -> Result<Self> {
        Ok(Self {
            mesh: device.create_shader(shaders::MESH_VERTEX_SHADER, shaders::MESH_FRAGMENT_SHADER)?,
            skinned: device
                .create_shader(shaders::SKINNED_VERTEX_SHADER, shaders::MESH_FRAGMENT_SHADER)?,
            quad: device.create_shader(shaders::QUAD_VERTEX_SHADER, shaders::QUAD_FRAGMENT_SHADER)?,
            text: device.create_shader(shaders::QUAD_VERTEX_SHADER, shaders::TEXT_FRAGMENT_SHADER)?,
            skybox: device
                .create_shader(skybox::SKYBOX_VERTEX_SHADER, skybox::SKYBOX_FRAGMENT_SHADER)?,
        })
    }

    fn destroy(self, device: &mut dyn GraphicsDevice) {
        for shader in [self.mesh, self.skinned, self.quad, self.text, self.skybox] {
            device.destroy_shader(shader);
        }
    }

    fn for_kind(&self, kind: ShaderKind) -> ShaderId {
        match kind {
            ShaderKind::Skybox => self.skybox,
            ShaderKind::Skinned => self.skinned,
            ShaderKind::Text => self.text,
            ShaderKind::Quad2D => self.quad,
            ShaderKind::Mesh3D => self.mesh,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SkyboxCube {
    vao: VertexArrayId,
    buffer: BufferId,
}

impl SkyboxCube {
    fn create(device: &mut dyn GraphicsDevice) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(&skybox::CUBE_VERTICES);
        let buffer =
            device.create_buffer(BufferKind::Vertex, BufferUsage::Static, bytes.len(), Some(bytes))?;
        let vao = device.create_vertex_array()?;
        device.set_vertex_buffer(vao, buffer, &VertexLayout::packed(&[3]))?;
        Ok(Self { vao, buffer })
    }

    fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_vertex_array(self.vao);
        device.destroy_buffer(self.buffer);
    }
}

/// Everything created by [`Renderer::initialize`].
#[derive(Debug, Clone, Copy)]
struct GpuObjects {
    shaders: BuiltinShaders,
    quads: QuadGeometry,
    skybox_cube: SkyboxCube,
    white_texture: TextureId,
}

impl GpuObjects {
    fn create(device: &mut dyn GraphicsDevice) -> Result<Self> {
        let shaders = BuiltinShaders::create(device)?;
        let quads = QuadGeometry::create(device)?;
        let skybox_cube = SkyboxCube::create(device)?;
        let white_texture = device.create_texture_2d(
            1,
            1,
            TextureFormat::Rgba8,
            TextureFilter::Nearest,
            Some(&[255, 255, 255, 255]),
        )?;
        Ok(Self {
            shaders,
            quads,
            skybox_cube,
            white_texture,
        })
    }

    fn destroy(self, device: &mut dyn GraphicsDevice) {
        self.shaders.destroy(device);
        self.quads.destroy(device);
        self.skybox_cube.destroy(device);
        device.destroy_texture(self.white_texture);
    }
}

// ============================================================================
// Renderer
// ============================================================================

pub struct Renderer {
    settings: RendererSettings,
    device: Option<Box<dyn GraphicsDevice>>,
    gpu: Option<GpuObjects>,

    resources: ResourceCache,
    text: TextRenderer,
    lighting: LightingSystem,
    viewport: ViewportManager,
    context: RenderingContext,

    queue: Vec<RenderCommand>,
    view: Mat4,
    projection: Mat4,
    camera_position: Vec3,
    current_pass: RenderPass,

    stats: FrameStats,
    bone_names: Vec<String>,
    skipped_log: RateLimiter,
    glyph_log: RateLimiter,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("device", &self.device.as_ref().map(|d| d.name().to_string()))
            .field("context", &self.context)
            .field("queued", &self.queue.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RendererSettings::default())
    }
}

impl Renderer {
    #[must_use]
    pub fn new(settings: RendererSettings) -> Self {
        let (width, height) = settings.screen_size;
        Self {
            resources: ResourceCache::new(settings.texture_filter, settings.dpi_scale_override),
            text: TextRenderer::new(settings.max_text_cache_entries),
            lighting: LightingSystem::new(settings.shadow_quality, settings.shadows_enabled),
            viewport: ViewportManager::new(width as f32, height as f32),
            context: RenderingContext::Runtime,
            settings,
            device: None,
            gpu: None,
            queue: Vec::new(),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            current_pass: RenderPass::World3D,
            stats: FrameStats::default(),
            bone_names: (0..MAX_BONES).map(|i| format!("boneTransforms[{i}]")).collect(),
            skipped_log: RateLimiter::new(SKIPPED_LOG_PERIOD),
            glyph_log: RateLimiter::new(SKIPPED_LOG_PERIOD),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Takes ownership of `device` (a [`HeadlessDevice`] when `None`) and
    /// creates the built-in programs, quads, skybox cube, white texture and
    /// the lighting system's objects.
    ///
    /// A second call is a no-op. On failure nothing is kept.
    pub fn initialize(&mut self, device: Option<Box<dyn GraphicsDevice>>) -> Result<()> {
        if self.is_initialized() {
            log::debug!("Renderer already initialized");
            return Ok(());
        }

        let mut device = device.unwrap_or_else(|| Box::new(HeadlessDevice::new()));
        let gpu = GpuObjects::create(device.as_mut())?;
        if let Err(err) = self.lighting.initialize(device.as_mut()) {
            gpu.destroy(device.as_mut());
            return Err(err);
        }

        let (width, height) = (self.viewport.bounds().width, self.viewport.bounds().height);
        device.set_viewport(0, 0, width as i32, height as i32);

        log::info!("Renderer initialized on '{}' device", device.name());
        self.device = Some(device);
        self.gpu = Some(gpu);
        Ok(())
    }

    /// Releases every device object and the device itself.
    pub fn shutdown(&mut self) {
        let Some(mut device) = self.device.take() else {
            return;
        };
        self.queue.clear();
        self.resources.clear(device.as_mut());
        self.text.clear_cache();
        self.lighting.shutdown(device.as_mut());
        if let Some(gpu) = self.gpu.take() {
            gpu.destroy(device.as_mut());
        }
        log::info!("Renderer shut down");
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.device.is_some() && self.gpu.is_some()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn device_mut(&mut self) -> Option<&mut (dyn GraphicsDevice + 'static)> {
        self.device.as_deref_mut()
    }

    #[must_use]
    pub fn lighting(&self) -> &LightingSystem {
        &self.lighting
    }

    pub fn lighting_mut(&mut self) -> &mut LightingSystem {
        &mut self.lighting
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceCache {
        &mut self.resources
    }

    #[must_use]
    pub fn text_renderer(&self) -> &TextRenderer {
        &self.text
    }

    pub fn text_renderer_mut(&mut self) -> &mut TextRenderer {
        &mut self.text
    }

    #[must_use]
    pub fn viewport(&self) -> &ViewportManager {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportManager {
        &mut self.viewport
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    #[must_use]
    pub fn camera_position(&self) -> Vec3 {
        self.camera_position
    }

    /// 1×1 white texture substituted for missing textures.
    #[must_use]
    pub fn white_texture(&self) -> Option<TextureId> {
        self.gpu.map(|g| g.white_texture)
    }

    #[must_use]
    pub fn quads(&self) -> Option<QuadGeometry> {
        self.gpu.map(|g| g.quads)
    }

    /// Statistics of the last frame.
    #[must_use]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn rendering_context(&self) -> RenderingContext {
        self.context
    }

    /// Switches between runtime and editor behaviour, including the text
    /// DPI policy.
    pub fn set_rendering_context(&mut self, context: RenderingContext) {
        self.context = context;
        self.text.set_rendering_context(context);
    }

    // ========================================================================
    // Frame protocol
    // ========================================================================

    /// Renders `scene` with the cameras it contains, falling back to the
    /// default poses for missing ones.
    pub fn render_scene_with_cameras(
        &mut self,
        scene: &mut Scene,
        project: Option<&ProjectSettings>,
        clear: bool,
    ) {
        if !self.is_initialized() {
            log::warn!("render_scene_with_cameras called before initialize");
            return;
        }

        if let Some(project) = project {
            self.viewport.update_from_project(project);
            if let Some(quality) = project.shadow_quality {
                self.lighting.set_shadow_quality(quality);
            }
        }

        self.prepare_lighting(scene);
        let cameras = find_active_cameras(scene);

        let clear_color = project
            .and_then(|p| p.background_color)
            .map_or_else(|| self.settings.clear_color(), Vec4::from_array);
        self.begin_frame(clear.then_some(clear_color));

        // 3D
        let aspect = self.viewport.bounds().aspect;
        let camera_3d = cameras
            .camera_3d
            .and_then(|id| update_camera_3d(scene, id, aspect));
        let camera_3d = camera_3d.unwrap_or_else(|| Camera::default_3d(aspect));
        self.set_camera(&camera_3d);
        self.current_pass = RenderPass::World3D;
        self.queue_skyboxes(scene);
        self.walk(scene, RenderPass::World3D, |node| RenderPass::World3D.includes(node));
        self.flush();

        // 2D world
        let screen = self.viewport.bounds().size();
        let default_2d = self.viewport.world_projection(1.0, Vec2::ZERO);
        match cameras
            .camera_2d
            .and_then(|id| update_camera_2d(scene, id, screen))
        {
            Some(camera) => self.set_camera(&camera),
            None => self.set_matrices(Mat4::IDENTITY, default_2d),
        }
        self.current_pass = RenderPass::World2D;
        self.walk(scene, RenderPass::World2D, |node| RenderPass::World2D.includes(node));
        self.flush();

        // Screen-space controls
        self.set_matrices(Mat4::IDENTITY, default_2d);
        self.current_pass = RenderPass::Screen;
        self.walk(scene, RenderPass::Screen, |node| RenderPass::Screen.includes(node));
        self.flush();

        self.stats.shadow = self.lighting.stats();
    }

    /// Renders every visible node in one pass with `camera`, bypassing
    /// camera selection.
    pub fn render_scene(&mut self, scene: &mut Scene, camera: &mut Camera, clear: bool) {
        if !self.is_initialized() {
            log::warn!("render_scene called before initialize");
            return;
        }

        self.prepare_lighting(scene);
        let clear_color = self.settings.clear_color();
        self.begin_frame(clear.then_some(clear_color));

        camera.update_matrices();
        self.set_camera(camera);
        self.current_pass = RenderPass::World3D;
        self.queue_skyboxes(scene);
        self.walk(scene, RenderPass::World3D, |_| true);
        self.end_frame();

        self.stats.shadow = self.lighting.stats();
    }

    /// Resets the queue and statistics and optionally clears colour and
    /// depth.
    pub fn begin_frame(&mut self, clear_color: Option<Vec4>) {
        self.queue.clear();
        self.stats = FrameStats::default();
        let bounds = *self.viewport.bounds();
        let Some(device) = self.device.as_deref_mut() else {
            return;
        };
        self.resources.release_retired(device);
        device.set_viewport(0, 0, bounds.width as i32, bounds.height as i32);
        if let Some(color) = clear_color {
            device.clear(color, ClearFlags::COLOR | ClearFlags::DEPTH);
        }
    }

    /// Draws whatever is still queued.
    pub fn end_frame(&mut self) {
        self.flush();
    }

    /// Queues a command for the current pass.
    pub fn submit(&mut self, command: RenderCommand) {
        self.queue.push(command);
    }

    /// Sets the matrices used by the following flushes.
    pub fn set_matrices(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
        self.camera_position = view.inverse().w_axis.truncate();
    }

    fn set_camera(&mut self, camera: &Camera) {
        self.view = camera.view_matrix();
        self.projection = camera.projection_matrix();
        self.camera_position = camera.position();
    }

    /// Collects lights, applies skybox lighting and renders shadow maps.
    fn prepare_lighting(&mut self, scene: &mut Scene) {
        scene.update_transforms();
        self.lighting.update_from_scene(scene);
        for id in scene.renderable_nodes() {
            let node = &scene[id];
            if !node.is_3d() {
                continue;
            }
            for sky in node.components().filter_map(|c| c.as_any().downcast_ref::<Skybox3D>()) {
                if sky.enabled {
                    sky.apply_lighting(&mut self.lighting);
                }
            }
        }
        if let Some(device) = self.device.as_deref_mut() {
            self.lighting.render_shadow_maps(scene, device, &mut self.resources);
        }
    }

    /// Queues one command per active skybox on visible 3D nodes.
    fn queue_skyboxes(&mut self, scene: &Scene) {
        let (Some(device), Some(gpu)) = (self.device.as_deref_mut(), self.gpu) else {
            return;
        };
        for id in scene.renderable_nodes() {
            let node = &scene[id];
            if !node.is_3d() {
                continue;
            }
            for sky in node.components().filter_map(|c| c.as_any().downcast_ref::<Skybox3D>()) {
                if !sky.enabled {
                    continue;
                }
                let texture = if sky.mode.uses_texture() && !sky.texture_path.is_empty() {
                    self.resources.load_texture(device, &sky.texture_path, false).id
                } else {
                    None
                };
                self.queue.push(RenderCommand {
                    vertex_array: Some(gpu.skybox_cube.vao),
                    vertex_count: 36,
                    skybox: Some(Box::new(sky.draw_params(texture))),
                    ..RenderCommand::default()
                });
            }
        }
    }

    /// Lets every active component of the visible nodes accepted by
    /// `accept` submit for `pass`. Children are visited whatever their
    /// parent's category.
    fn walk(&mut self, scene: &mut Scene, pass: RenderPass, accept: impl Fn(&Node) -> bool) {
        let (Some(device), Some(gpu)) = (self.device.as_deref_mut(), self.gpu) else {
            return;
        };
        let viewport_size = self.viewport.bounds().size();

        for id in scene.renderable_nodes() {
            if !accept(&scene[id]) {
                continue;
            }
            let mut components = std::mem::take(&mut scene[id].components);
            {
                let mut ctx = RenderContext {
                    queue: &mut self.queue,
                    device: &mut *device,
                    resources: &mut self.resources,
                    text: &mut self.text,
                    glyph_log: &mut self.glyph_log,
                    quads: gpu.quads,
                    white_texture: gpu.white_texture,
                    node: &scene[id],
                    pass,
                    rendering_context: self.context,
                    view: self.view,
                    projection: self.projection,
                    viewport_size,
                    delta_time: 0.0,
                };
                for component in components
                    .iter_mut()
                    .filter(|c| c.is_active() && !WALK_SKIPPED_TYPES.contains(&c.type_name()))
                {
                    component.submit_renderables(&mut ctx);
                }
            }
            scene[id].components = components;
        }

        self.stats.passes[pass.index()].submitted += self.queue.len() as u32;
    }

    // ========================================================================
    // Flush
    // ========================================================================

    /// Draws and drains the queue.
    ///
    /// Every command ends with depth test enabled; skybox draws restore the
    /// full device state they change.
    pub fn flush(&mut self) {
        let mut commands = std::mem::take(&mut self.queue);
        let (Some(device), Some(gpu)) = (self.device.as_deref_mut(), self.gpu) else {
            return;
        };
        let pass = self.current_pass.index();

        for command in &commands {
            if !command.is_drawable() {
                self.stats.passes[pass].skipped += 1;
                if self.skipped_log.tick() {
                    log::debug!(
                        "Skipped {} draws without geometry (last: {:?})",
                        self.skipped_log.count(),
                        command.vertex_array
                    );
                }
                continue;
            }

            let kind = command.shader_kind(&gpu.quads);
            let shader = gpu.shaders.for_kind(kind);

            if let Some(sky) = &command.skybox {
                let saved = device.state();
                device.set_depth_test(false);
                device.set_depth_write(false);
                device.use_shader(Some(shader));
                sky.apply_uniforms(device, shader, self.view, self.projection);
                device.bind_vertex_array(command.vertex_array);
                device.draw(Primitive::Triangles, command.vertex_count, 0);
                device.restore_state(&saved);
                self.stats.passes[pass].drawn += 1;
                continue;
            }

            match kind {
                ShaderKind::Skinned => device.set_depth_test(true),
                ShaderKind::Text | ShaderKind::Quad2D => {
                    device.set_depth_test(false);
                    device.set_blending(true);
                    device.set_blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
                }
                ShaderKind::Mesh3D | ShaderKind::Skybox => {
                    device.set_depth_test(true);
                    device.set_blending(true);
                    device.set_blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
                }
            }
            device.use_shader(Some(shader));

            if matches!(kind, ShaderKind::Mesh3D | ShaderKind::Skinned) {
                if command.use_lighting {
                    self.lighting.bind_uniforms(device, shader, self.camera_position);
                }
                device.set_uniform(shader, "uUseLighting", UniformValue::Int(i32::from(command.use_lighting)));
            }

            if kind == ShaderKind::Skinned {
                // Slots past the skeleton are reset to identity.
                let bones = command
                    .bone_transforms
                    .iter()
                    .copied()
                    .chain(std::iter::repeat(Mat4::IDENTITY));
                for (name, bone) in self.bone_names.iter().zip(bones) {
                    device.set_uniform(shader, name, UniformValue::Mat4(bone));
                }
            }

            let dynamic = command.vertex_array.is_some_and(|vao| gpu.quads.is_dynamic(vao));
            if dynamic && let Some(region) = &command.texture_region {
                gpu.quads.update_dynamic(device, region);
            }

            device.set_uniform(shader, "model", UniformValue::Mat4(command.model));
            device.set_uniform(shader, "color", UniformValue::Vec4(command.color));
            device.set_uniform(shader, "view", UniformValue::Mat4(self.view));
            device.set_uniform(shader, "projection", UniformValue::Mat4(self.projection));

            if kind == ShaderKind::Quad2D {
                device.set_uniform(shader, "cornerRadius", UniformValue::Float(command.corner_radius));
                device.set_uniform(shader, "rectSize", UniformValue::Vec2(command.rect_size));
                device.set_uniform(
                    shader,
                    "useCornerRadius",
                    UniformValue::Int(i32::from(command.use_corner_radius)),
                );
            }

            device.bind_texture(0, Some(command.texture.unwrap_or(gpu.white_texture)));
            device.set_uniform(shader, "texture1", UniformValue::Sampler(0));

            device.bind_vertex_array(command.vertex_array);
            if command.use_indices && command.index_count > 0 {
                device.draw_indexed(Primitive::Triangles, command.index_count, 0);
            } else {
                device.draw(Primitive::Triangles, command.vertex_count, 0);
            }
            self.stats.passes[pass].drawn += 1;

            if dynamic && command.reset_dynamic_quad {
                gpu.quads.reset_dynamic(device);
            }
        }

        device.bind_vertex_array(None);
        device.set_depth_test(true);

        commands.clear();
        self.queue = commands;
    }
}

/// Refreshes the 3D camera on `id` from its owner and returns a copy.
fn update_camera_3d(scene: &mut Scene, id: NodeId, aspect: f32) -> Option<Camera> {
    let node = scene.node(id)?;
    let (position, rotation) = node
        .transform()
        .map(|t| (t.global_position(), t.global_rotation()))?;
    let camera = scene.node_mut(id)?.get_component_mut::<Camera3D>()?;
    camera.update_camera_at(position, rotation, aspect);
    Some(camera.camera().clone())
}

/// Refreshes the 2D camera on `id` from its owner and returns a copy.
fn update_camera_2d(scene: &mut Scene, id: NodeId, viewport_size: Vec2) -> Option<Camera> {
    let position = scene.node(id)?.global_position_2d();
    let camera = scene.node_mut(id)?.get_component_mut::<Camera2D>()?;
    camera.update_camera_at(position, viewport_size);
    Some(camera.camera().clone())
}
