//! Graphics-device abstraction
//!
//! The renderer core never talks to a GPU API directly. Everything it needs
//! (shaders, buffers, vertex arrays, textures, fixed-function state, clears
//! and draws) goes through the object-safe [`GraphicsDevice`] trait, and
//! every GPU object is referred to by a typed, generational handle.
//!
//! All calls happen on the rendering thread; implementations are not
//! required to be `Sync`.
//!
//! [`HeadlessDevice`] is the built-in implementation. It validates shader
//! sources, keeps CPU copies of all objects and records every clear and draw,
//! which makes whole frames observable and comparable.

mod headless;

pub use headless::{DeviceCommand, DeviceLog, DrawRecord, HeadlessDevice};

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3, Vec4};
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::errors::Result;
use crate::settings::TextureFilter;

new_key_type! {
    /// Linked shader program.
    pub struct ShaderId;
    /// Vertex or index buffer.
    pub struct BufferId;
    /// Vertex-array object binding vertex layout and index buffer.
    pub struct VertexArrayId;
    /// 2D texture or depth texture array.
    pub struct TextureId;
}

// ============================================================================
// Descriptors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8,
    Rgb8,
    Rgba8,
    Depth32F,
}

impl TextureFormat {
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 | TextureFormat::Depth32F => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
}

bitflags! {
    /// Buffers affected by [`GraphicsDevice::clear`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Value pushed into a named shader uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    /// Texture unit index for a sampler uniform.
    Sampler(u32),
}

/// One interleaved vertex attribute (always `f32` components).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    /// Byte offset inside one vertex.
    pub offset: u32,
}

/// Interleaved layout of a vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Bytes per vertex.
    pub stride: u32,
    pub attributes: SmallVec<[VertexAttribute; 8]>,
}

impl VertexLayout {
    /// Builds a tightly packed layout from per-attribute component counts,
    /// assigning locations in order.
    #[must_use]
    pub fn packed(components: &[u32]) -> Self {
        let mut attributes = SmallVec::new();
        let mut offset = 0;
        for (location, &count) in components.iter().enumerate() {
            attributes.push(VertexAttribute {
                location: location as u32,
                components: count,
                offset,
            });
            offset += count * 4;
        }
        Self {
            stride: offset,
            attributes,
        }
    }
}

/// Snapshot of the fixed-function state, used to save and restore around
/// passes that reconfigure the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blending: bool,
    pub blend_func: (BlendFactor, BlendFactor),
    pub cull_mode: CullMode,
    pub color_write: bool,
    pub viewport: [i32; 4],
    /// Depth layer currently rendered into; `None` is the default target.
    pub depth_target: Option<(TextureId, u32)>,
    pub shader: Option<ShaderId>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: true,
            blending: false,
            blend_func: (BlendFactor::One, BlendFactor::Zero),
            cull_mode: CullMode::None,
            color_write: true,
            viewport: [0, 0, 0, 0],
            depth_target: None,
            shader: None,
        }
    }
}

// ============================================================================
// GraphicsDevice
// ============================================================================

/// Abstract GPU interface consumed by the renderer core.
///
/// Creation calls return `Result`; per-frame calls (state changes, uniform
/// uploads, draws) are infallible and silently ignore stale handles.
pub trait GraphicsDevice {
    /// Human-readable backend name for diagnostics.
    fn name(&self) -> &str;

    // --- Shaders -----------------------------------------------------------

    /// Compiles and links a program from GLSL sources.
    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Result<ShaderId>;
    fn destroy_shader(&mut self, shader: ShaderId);
    fn use_shader(&mut self, shader: Option<ShaderId>);
    fn set_uniform(&mut self, shader: ShaderId, name: &str, value: UniformValue);

    // --- Buffers -----------------------------------------------------------

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        usage: BufferUsage,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<BufferId>;
    fn update_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8]) -> Result<()>;
    fn destroy_buffer(&mut self, buffer: BufferId);

    // --- Vertex arrays -----------------------------------------------------

    fn create_vertex_array(&mut self) -> Result<VertexArrayId>;
    fn set_vertex_buffer(
        &mut self,
        vao: VertexArrayId,
        buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<()>;
    fn set_index_buffer(&mut self, vao: VertexArrayId, buffer: BufferId) -> Result<()>;
    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>);
    fn destroy_vertex_array(&mut self, vao: VertexArrayId);

    // --- Textures ----------------------------------------------------------

    fn create_texture_2d(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        filter: TextureFilter,
        data: Option<&[u8]>,
    ) -> Result<TextureId>;
    /// Allocates a square depth texture array with `layers` slices.
    fn create_depth_array(&mut self, size: u32, layers: u32) -> Result<TextureId>;
    fn bind_texture(&mut self, slot: u32, texture: Option<TextureId>);
    /// Binds a depth texture array for sampling.
    fn bind_texture_array(&mut self, slot: u32, texture: TextureId) {
        self.bind_texture(slot, Some(texture));
    }
    fn destroy_texture(&mut self, texture: TextureId);
    /// Redirects depth output to one slice of a depth array, or back to the
    /// default framebuffer with `None`.
    fn bind_depth_target(&mut self, target: Option<(TextureId, u32)>);

    // --- Fixed-function state ----------------------------------------------

    fn set_depth_test(&mut self, enabled: bool);
    fn set_depth_write(&mut self, enabled: bool);
    fn set_blending(&mut self, enabled: bool);
    fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn set_cull_mode(&mut self, mode: CullMode);
    fn set_color_write(&mut self, enabled: bool);
    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    // --- Commands ----------------------------------------------------------

    fn clear(&mut self, color: Vec4, flags: ClearFlags);
    fn draw(&mut self, primitive: Primitive, count: u32, first: u32);
    fn draw_indexed(&mut self, primitive: Primitive, count: u32, first: u32);

    /// Current fixed-function state.
    fn state(&self) -> DeviceState;

    /// Re-applies a previously captured state.
    fn restore_state(&mut self, state: &DeviceState) {
        self.bind_depth_target(state.depth_target);
        let [x, y, w, h] = state.viewport;
        self.set_viewport(x, y, w, h);
        self.use_shader(state.shader);
        self.set_depth_test(state.depth_test);
        self.set_depth_write(state.depth_write);
        self.set_blending(state.blending);
        self.set_blend_func(state.blend_func.0, state.blend_func.1);
        self.set_cull_mode(state.cull_mode);
        self.set_color_write(state.color_write);
    }
}
