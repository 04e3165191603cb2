//! Per-node submission context.
//!
//! The renderer hands a [`RenderContext`] to every active component of a
//! visited node. Components never touch the device directly for drawing:
//! they queue [`RenderCommand`]s through the helpers here, which fill in
//! the shared quads, the white texture and the shader hints.

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::command::{RenderCommand, ShaderHint};
use super::quad::{QUAD_INDEX_COUNT, QUAD_VERTEX_COUNT, QuadGeometry, TextureRegion};
use super::shaders::MAX_BONES;
use crate::device::{GraphicsDevice, TextureId};
use crate::logging::RateLimiter;
use crate::mesh::{GpuMesh, Mesh};
use crate::resources::{FontSource, ResourceCache};
use crate::scene::Node;
use crate::settings::RenderingContext;
use crate::text::{GlyphInstance, GlyphSink, TextRenderParams, TextRenderer};

/// The three scene passes, in frame order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// `Node3D` subtrees with the 3D camera; skyboxes first.
    World3D,
    /// `Node2D` and world-space controls with the 2D camera.
    World2D,
    /// Screen-space controls.
    Screen,
}

impl RenderPass {
    pub const ALL: [RenderPass; 3] = [RenderPass::World3D, RenderPass::World2D, RenderPass::Screen];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            RenderPass::World3D => 0,
            RenderPass::World2D => 1,
            RenderPass::Screen => 2,
        }
    }

    /// Whether nodes of `node`'s category submit in this pass.
    #[must_use]
    pub fn includes(self, node: &Node) -> bool {
        match self {
            RenderPass::World3D => node.is_3d(),
            RenderPass::World2D => node.is_2d() || node.control_world_space() == Some(true),
            RenderPass::Screen => node.control_world_space() == Some(false),
        }
    }
}

pub struct RenderContext<'a> {
    pub(crate) queue: &'a mut Vec<RenderCommand>,
    pub(crate) device: &'a mut dyn GraphicsDevice,
    pub(crate) resources: &'a mut ResourceCache,
    pub(crate) text: &'a mut TextRenderer,
    pub(crate) glyph_log: &'a mut RateLimiter,
    pub(crate) quads: QuadGeometry,
    pub(crate) white_texture: TextureId,
    pub(crate) node: &'a Node,
    pub(crate) pass: RenderPass,
    pub(crate) rendering_context: RenderingContext,
    pub(crate) view: Mat4,
    pub(crate) projection: Mat4,
    pub(crate) viewport_size: Vec2,
    /// Always zero: submission must not depend on time.
    pub delta_time: f32,
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("node", &self.node.name)
            .field("pass", &self.pass)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<'a> RenderContext<'a> {
    // ========================================================================
    // Frame info
    // ========================================================================

    /// The node whose components are submitting.
    #[must_use]
    pub fn node(&self) -> &'a Node {
        self.node
    }

    #[must_use]
    pub fn pass(&self) -> RenderPass {
        self.pass
    }

    #[must_use]
    pub fn rendering_context(&self) -> RenderingContext {
        self.rendering_context
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
    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    #[must_use]
    pub fn white_texture(&self) -> TextureId {
        self.white_texture
    }

    #[must_use]
    pub fn quads(&self) -> &QuadGeometry {
        &self.quads
    }

    /// Commands queued so far in this pass.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    // ========================================================================
    // Resources
    // ========================================================================

    pub fn resources(&mut self) -> &mut ResourceCache {
        self.resources
    }

    pub fn text_renderer(&mut self) -> &mut TextRenderer {
        self.text
    }

    /// Texture for `path` (vertically flipped), `None` when it fails to load.
    pub fn load_texture(&mut self, path: &str) -> Option<TextureId> {
        if path.is_empty() {
            return None;
        }
        self.resources.get_texture(self.device, path).id
    }

    /// Texture for `path` with explicit flip, plus its pixel size.
    pub fn load_texture_sized(&mut self, path: &str, flip_vertically: bool) -> Option<(TextureId, u32, u32)> {
        if path.is_empty() {
            return None;
        }
        let texture = self.resources.load_texture(self.device, path, flip_vertically);
        texture.id.map(|id| (id, texture.width, texture.height))
    }

    /// Uploads `mesh` through the cache.
    pub fn upload_mesh(&mut self, mesh: &Mesh) -> Option<GpuMesh> {
        self.resources.mesh(self.device, mesh)
    }

    // ========================================================================
    // Submission
    // ========================================================================

    pub fn submit(&mut self, command: RenderCommand) {
        self.queue.push(command);
    }

    fn quad_command(&self, transform: Mat4, color: Vec4, texture: Option<TextureId>) -> RenderCommand {
        RenderCommand {
            model: transform,
            vertex_array: Some(self.quads.static_quad.vao),
            vertex_count: QUAD_VERTEX_COUNT,
            index_count: QUAD_INDEX_COUNT,
            use_indices: true,
            texture: Some(texture.unwrap_or(self.white_texture)),
            color,
            ..RenderCommand::default()
        }
    }

    /// Unit quad scaled and placed by `transform`.
    pub fn render_quad(&mut self, transform: Mat4, color: Vec4, texture: Option<TextureId>) {
        let command = self.quad_command(transform, color, texture);
        self.submit(command);
    }

    /// Quad sampling a sub-rectangle of `texture`, drawn with the dynamic
    /// quad.
    pub fn render_quad_region(
        &mut self,
        transform: Mat4,
        color: Vec4,
        texture: Option<TextureId>,
        region: TextureRegion,
    ) {
        let mut command = self.quad_command(transform, color, texture);
        command.vertex_array = Some(self.quads.dynamic_quad.vao);
        command.texture_region = Some(region);
        self.submit(command);
    }

    /// Quad masked by a rounded-rectangle SDF. `size` is the on-screen size
    /// in pixels.
    pub fn render_rounded_quad(
        &mut self,
        transform: Mat4,
        color: Vec4,
        corner_radius: f32,
        size: Vec2,
        texture: Option<TextureId>,
    ) {
        let mut command = self.quad_command(transform, color, texture);
        command.corner_radius = corner_radius;
        command.rect_size = size;
        command.use_corner_radius = corner_radius > 0.0;
        self.submit(command);
    }

    /// One glyph quad drawn with the text program.
    pub fn render_text_glyph(&mut self, transform: Mat4, color: Vec4, texture: TextureId) {
        if self.glyph_log.tick() {
            log::trace!("Glyph draw #{}: color {color}", self.glyph_log.count());
        }
        let command = RenderCommand {
            model: transform,
            vertex_array: Some(self.quads.dynamic_quad.vao),
            vertex_count: QUAD_VERTEX_COUNT,
            index_count: QUAD_INDEX_COUNT,
            use_indices: true,
            texture: Some(texture),
            color,
            hint: ShaderHint::Text,
            texture_region: Some(TextureRegion::full()),
            reset_dynamic_quad: true,
            ..RenderCommand::default()
        };
        self.submit(command);
    }

    /// Direct glyph walk without layout: `\n` returns to `position.x` one
    /// `font_size × scale` lower; unknown characters are skipped.
    pub fn render_text(
        &mut self,
        text: &str,
        position: Vec2,
        scale: f32,
        color: Vec4,
        font: &FontSource,
        font_size: u32,
    ) {
        let key = self.resources.load_font(font, font_size);
        self.resources.prepare_glyphs(Some(&mut *self.device), &key, text);
        let Some(font) = self.resources.font(&key) else {
            return;
        };
        let factor = self.text.scale_factor(font) * scale;

        let mut glyphs = Vec::new();
        let mut cursor = position;
        for ch in text.chars() {
            if ch == '\n' {
                cursor.x = position.x;
                cursor.y -= font_size as f32 * scale;
                continue;
            }
            let Some(glyph) = font.glyph(ch) else {
                continue;
            };
            if let Some(texture) = glyph.texture
                && !glyph.is_blank()
            {
                let x = (cursor.x + glyph.bearing.x as f32 * factor).round();
                let mut y = cursor.y + glyph.baseline_to_bottom as f32 * factor;
                if glyph.baseline_to_bottom < -2 {
                    y -= glyph.baseline_to_bottom as f32 * 0.25 * factor;
                }
                let size = glyph.size.as_vec2() * factor;
                let center = Vec2::new(x, y.round()) + size * 0.5;
                glyphs.push(GlyphInstance {
                    transform: Mat4::from_translation(center.extend(0.0))
                        * Mat4::from_scale(Vec3::new(size.x, size.y, 1.0)),
                    color,
                    texture,
                });
            }
            cursor.x += glyph.advance_px() * factor;
        }

        for glyph in &glyphs {
            self.submit_glyph(glyph);
        }
    }

    /// Lays out `params` with the text renderer and queues the glyphs, or
    /// adds them to the open batch.
    pub fn render_text_params(&mut self, params: &TextRenderParams, position: Vec2) {
        let mut glyphs: Vec<GlyphInstance> = Vec::new();
        self.text
            .add_to_batch(self.resources, Some(&mut *self.device), params, position, &mut glyphs);
        for glyph in &glyphs {
            self.submit_glyph(glyph);
        }
    }

    pub fn begin_text_batch(&mut self, font: &FontSource, font_size: u32) {
        let mut glyphs: Vec<GlyphInstance> = Vec::new();
        self.text.begin_batch(font, font_size, &mut glyphs);
        for glyph in &glyphs {
            self.submit_glyph(glyph);
        }
    }

    pub fn end_text_batch(&mut self) {
        let mut glyphs: Vec<GlyphInstance> = Vec::new();
        self.text.end_batch(&mut glyphs);
        for glyph in &glyphs {
            self.submit_glyph(glyph);
        }
    }

    /// Static mesh; uploaded on first use.
    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        transform: Mat4,
        color: Vec4,
        texture: Option<TextureId>,
        use_lighting: bool,
    ) {
        let Some(gpu) = self.upload_mesh(mesh) else {
            return;
        };
        self.render_gpu_mesh(&gpu, transform, color, texture, use_lighting);
    }

    /// Already uploaded mesh.
    pub fn render_gpu_mesh(
        &mut self,
        mesh: &GpuMesh,
        transform: Mat4,
        color: Vec4,
        texture: Option<TextureId>,
        use_lighting: bool,
    ) {
        let command = RenderCommand {
            model: transform,
            vertex_array: Some(mesh.vao),
            vertex_count: mesh.vertex_count,
            index_count: mesh.index_count,
            use_indices: mesh.index_count > 0,
            texture: Some(texture.unwrap_or(self.white_texture)),
            color,
            use_lighting,
            ..RenderCommand::default()
        };
        self.submit(command);
    }

    /// Skinned mesh; at most [`MAX_BONES`] bone matrices are kept.
    pub fn render_skinned_mesh(
        &mut self,
        mesh: &Mesh,
        transform: Mat4,
        color: Vec4,
        texture: Option<TextureId>,
        bone_transforms: &[Mat4],
        use_lighting: bool,
    ) {
        let Some(gpu) = self.upload_mesh(mesh) else {
            return;
        };
        let bones = &bone_transforms[..bone_transforms.len().min(MAX_BONES)];
        let command = RenderCommand {
            model: transform,
            vertex_array: Some(gpu.vao),
            vertex_count: gpu.vertex_count,
            index_count: gpu.index_count,
            use_indices: gpu.index_count > 0,
            texture: Some(texture.unwrap_or(self.white_texture)),
            color,
            hint: ShaderHint::Skinned,
            bone_transforms: bones.to_vec(),
            use_lighting,
            ..RenderCommand::default()
        };
        self.submit(command);
    }
}

impl GlyphSink for RenderContext<'_> {
    fn submit_glyph(&mut self, glyph: &GlyphInstance) {
        self.render_text_glyph(glyph.transform, glyph.color, glyph.texture);
    }
}
