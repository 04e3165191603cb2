//! Headless graphics device.
//!
//! Keeps CPU copies of every object and records clears and draws into a
//! shared [`DeviceLog`]. Two identical frames produce identical logs, so
//! [`DeviceLog::frame_digest`] stands in for a framebuffer comparison.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec4;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use xxhash_rust::xxh3::xxh3_64;

use super::{
    BlendFactor, BufferId, BufferKind, BufferUsage, ClearFlags, CullMode, DeviceState,
    GraphicsDevice, Primitive, ShaderId, TextureFormat, TextureId, UniformValue, VertexArrayId,
    VertexLayout,
};
use crate::errors::{LumenError, Result, ShaderStage};
use crate::settings::TextureFilter;

const TEXTURE_UNITS: usize = 16;

// ============================================================================
// Recorded commands
// ============================================================================

/// One recorded draw call with the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub shader: Option<ShaderId>,
    pub vertex_array: Option<VertexArrayId>,
    pub primitive: Primitive,
    pub count: u32,
    pub first: u32,
    pub indexed: bool,
    /// Uniforms of the bound program at draw time, sorted by name.
    pub uniforms: BTreeMap<String, UniformValue>,
    /// `(unit, texture)` pairs bound at draw time.
    pub textures: Vec<(u32, TextureId)>,
    pub state: DeviceState,
    /// Contents of the bound vertex buffer when it is dynamic.
    pub dynamic_vertices: Option<Vec<f32>>,
}

impl DrawRecord {
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    #[must_use]
    pub fn texture_at(&self, unit: u32) -> Option<TextureId> {
        self.textures
            .iter()
            .find(|(slot, _)| *slot == unit)
            .map(|(_, texture)| *texture)
    }

    /// Whether the draw went into a shadow-map slice.
    #[must_use]
    pub fn is_depth_only(&self) -> bool {
        self.state.depth_target.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    Clear {
        color: Vec4,
        flags: ClearFlags,
        target: Option<(TextureId, u32)>,
    },
    Draw(Box<DrawRecord>),
}

/// Shared, append-only command log of a [`HeadlessDevice`].
///
/// Cloning the log is cheap; all clones observe the same commands.
#[derive(Debug, Clone, Default)]
pub struct DeviceLog {
    inner: Arc<Mutex<Vec<DeviceCommand>>>,
}

impl DeviceLog {
    fn push(&self, command: DeviceCommand) {
        self.inner.lock().push(command);
    }

    /// Copy of all commands recorded since the last [`take`](Self::take).
    #[must_use]
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.inner.lock().clone()
    }

    /// Removes and returns all recorded commands.
    pub fn take(&self) -> Vec<DeviceCommand> {
        std::mem::take(&mut *self.inner.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Draws recorded into the default framebuffer.
    #[must_use]
    pub fn color_draws(&self) -> Vec<DrawRecord> {
        self.inner
            .lock()
            .iter()
            .filter_map(|cmd| match cmd {
                DeviceCommand::Draw(draw) if !draw.is_depth_only() => Some((**draw).clone()),
                _ => None,
            })
            .collect()
    }

    /// Hash of everything recorded so far.
    #[must_use]
    pub fn frame_digest(&self) -> u64 {
        let text = format!("{:?}", *self.inner.lock());
        xxh3_64(text.as_bytes())
    }
}

// ============================================================================
// Object storage
// ============================================================================

#[derive(Debug)]
struct ShaderRecord {
    uniforms: FxHashMap<String, UniformValue>,
}

#[derive(Debug)]
struct BufferRecord {
    kind: BufferKind,
    usage: BufferUsage,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct VertexArrayRecord {
    vertex_buffer: Option<(BufferId, VertexLayout)>,
    index_buffer: Option<BufferId>,
}

#[derive(Debug)]
#[allow(dead_code)]
struct TextureRecord {
    width: u32,
    height: u32,
    layers: u32,
    format: TextureFormat,
    filter: TextureFilter,
    data: Option<Vec<u8>>,
}

// ============================================================================
// HeadlessDevice
// ============================================================================

/// Deterministic, GPU-less [`GraphicsDevice`].
#[derive(Debug)]
pub struct HeadlessDevice {
    shaders: SlotMap<ShaderId, ShaderRecord>,
    buffers: SlotMap<BufferId, BufferRecord>,
    vertex_arrays: SlotMap<VertexArrayId, VertexArrayRecord>,
    textures: SlotMap<TextureId, TextureRecord>,

    state: DeviceState,
    bound_vertex_array: Option<VertexArrayId>,
    bound_textures: [Option<TextureId>; TEXTURE_UNITS],

    log: DeviceLog,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::with_log(DeviceLog::default())
    }

    /// Creates a device that records into an existing log handle.
    #[must_use]
    pub fn with_log(log: DeviceLog) -> Self {
        Self {
            shaders: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            vertex_arrays: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            state: DeviceState::default(),
            bound_vertex_array: None,
            bound_textures: [None; TEXTURE_UNITS],
            log,
        }
    }

    #[must_use]
    pub fn log(&self) -> DeviceLog {
        self.log.clone()
    }

    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32, u32)> {
        self.textures
            .get(texture)
            .map(|t| (t.width, t.height, t.layers))
    }

    fn dynamic_vertices(&self) -> Option<Vec<f32>> {
        let vao = self.vertex_arrays.get(self.bound_vertex_array?)?;
        let (buffer_id, _) = vao.vertex_buffer.as_ref()?;
        let buffer = self.buffers.get(*buffer_id)?;
        if buffer.usage != BufferUsage::Dynamic {
            return None;
        }
        Some(
            buffer
                .data
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        )
    }

    fn record_draw(&mut self, primitive: Primitive, count: u32, first: u32, indexed: bool) {
        let uniforms = self
            .state
            .shader
            .and_then(|id| self.shaders.get(id))
            .map(|s| {
                s.uniforms
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect::<BTreeMap<_, _>>()
            })
            .unwrap_or_default();

        let textures = self
            .bound_textures
            .iter()
            .enumerate()
            .filter_map(|(unit, tex)| tex.map(|t| (unit as u32, t)))
            .collect();

        self.log.push(DeviceCommand::Draw(Box::new(DrawRecord {
            shader: self.state.shader,
            vertex_array: self.bound_vertex_array,
            primitive,
            count,
            first,
            indexed,
            uniforms,
            textures,
            state: self.state,
            dynamic_vertices: self.dynamic_vertices(),
        })));
    }
}

// ============================================================================
// Shader validation
// ============================================================================

/// Strips qualifiers and returns the variable name declared by a
/// `in`/`out` line, if the line is such a declaration.
fn interface_name<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let mut rest = line.trim();
    if rest.starts_with("layout") {
        let close = rest.find(')')?;
        rest = rest[close + 1..].trim_start();
    }
    for qualifier in ["flat ", "smooth ", "noperspective "] {
        if let Some(stripped) = rest.strip_prefix(qualifier) {
            rest = stripped.trim_start();
        }
    }
    let rest = rest.strip_prefix(keyword)?.strip_prefix(' ')?;
    let decl = rest.split(';').next()?.trim();
    let name = decl.split_whitespace().last()?;
    Some(name.split('[').next().unwrap_or(name))
}

fn validate_stage(src: &str, stage: ShaderStage) -> Result<()> {
    let fail = |message: &str| LumenError::ShaderCompile {
        stage,
        message: message.to_string(),
    };
    if src.trim().is_empty() {
        return Err(fail("empty source"));
    }
    if !src.trim_start().starts_with("#version") {
        return Err(fail("missing #version directive"));
    }
    if !src.contains("void main") {
        return Err(fail("missing entry point 'void main'"));
    }
    if src.matches('{').count() != src.matches('}').count() {
        return Err(fail("unbalanced braces"));
    }
    Ok(())
}

fn validate_link(vertex_src: &str, fragment_src: &str) -> Result<()> {
    let outputs: Vec<&str> = vertex_src
        .lines()
        .filter_map(|l| interface_name(l, "out"))
        .collect();
    for line in fragment_src.lines() {
        if let Some(name) = interface_name(line, "in")
            && !outputs.contains(&name)
        {
            return Err(LumenError::ShaderLink(format!(
                "fragment input '{name}' is not written by the vertex stage"
            )));
        }
    }
    Ok(())
}

// ============================================================================
// GraphicsDevice impl
// ============================================================================

impl GraphicsDevice for HeadlessDevice {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Result<ShaderId> {
        validate_stage(vertex_src, ShaderStage::Vertex)?;
        validate_stage(fragment_src, ShaderStage::Fragment)?;
        validate_link(vertex_src, fragment_src)?;
        Ok(self.shaders.insert(ShaderRecord {
            uniforms: FxHashMap::default(),
        }))
    }

    fn destroy_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(shader);
        if self.state.shader == Some(shader) {
            self.state.shader = None;
        }
    }

    fn use_shader(&mut self, shader: Option<ShaderId>) {
        self.state.shader = shader.filter(|id| self.shaders.contains_key(*id));
    }

    fn set_uniform(&mut self, shader: ShaderId, name: &str, value: UniformValue) {
        if let Some(record) = self.shaders.get_mut(shader) {
            record.uniforms.insert(name.to_string(), value);
        }
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        usage: BufferUsage,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<BufferId> {
        let mut bytes = vec![0u8; size];
        if let Some(data) = data {
            if data.len() > size {
                return Err(LumenError::ResourceInvalid(format!(
                    "initial data ({} bytes) exceeds buffer size ({size} bytes)",
                    data.len()
                )));
            }
            bytes[..data.len()].copy_from_slice(data);
        }
        Ok(self.buffers.insert(BufferRecord {
            kind,
            usage,
            data: bytes,
        }))
    }

    fn update_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8]) -> Result<()> {
        let record = self
            .buffers
            .get_mut(buffer)
            .ok_or(LumenError::InvalidHandle { kind: "buffer" })?;
        let end = offset + data.len();
        if end > record.data.len() {
            return Err(LumenError::ResourceInvalid(format!(
                "buffer update [{offset}, {end}) out of bounds ({} bytes)",
                record.data.len()
            )));
        }
        record.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(buffer);
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId> {
        Ok(self.vertex_arrays.insert(VertexArrayRecord::default()))
    }

    fn set_vertex_buffer(
        &mut self,
        vao: VertexArrayId,
        buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<()> {
        match self.buffers.get(buffer) {
            Some(b) if b.kind == BufferKind::Vertex => {}
            Some(_) => {
                return Err(LumenError::ResourceInvalid(
                    "index buffer bound as vertex buffer".to_string(),
                ));
            }
            None => return Err(LumenError::InvalidHandle { kind: "buffer" }),
        }
        let record = self
            .vertex_arrays
            .get_mut(vao)
            .ok_or(LumenError::InvalidHandle {
                kind: "vertex array",
            })?;
        record.vertex_buffer = Some((buffer, layout.clone()));
        Ok(())
    }

    fn set_index_buffer(&mut self, vao: VertexArrayId, buffer: BufferId) -> Result<()> {
        match self.buffers.get(buffer) {
            Some(b) if b.kind == BufferKind::Index => {}
            Some(_) => {
                return Err(LumenError::ResourceInvalid(
                    "vertex buffer bound as index buffer".to_string(),
                ));
            }
            None => return Err(LumenError::InvalidHandle { kind: "buffer" }),
        }
        let record = self
            .vertex_arrays
            .get_mut(vao)
            .ok_or(LumenError::InvalidHandle {
                kind: "vertex array",
            })?;
        record.index_buffer = Some(buffer);
        Ok(())
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>) {
        self.bound_vertex_array = vao.filter(|id| self.vertex_arrays.contains_key(*id));
    }

    fn destroy_vertex_array(&mut self, vao: VertexArrayId) {
        self.vertex_arrays.remove(vao);
        if self.bound_vertex_array == Some(vao) {
            self.bound_vertex_array = None;
        }
    }

    fn create_texture_2d(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        filter: TextureFilter,
        data: Option<&[u8]>,
    ) -> Result<TextureId> {
        if width == 0 || height == 0 {
            return Err(LumenError::ResourceInvalid(format!(
                "texture size {width}x{height} is empty"
            )));
        }
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if let Some(data) = data
            && data.len() != expected
        {
            return Err(LumenError::ResourceInvalid(format!(
                "texture data is {} bytes, expected {expected}",
                data.len()
            )));
        }
        Ok(self.textures.insert(TextureRecord {
            width,
            height,
            layers: 1,
            format,
            filter,
            data: data.map(<[u8]>::to_vec),
        }))
    }

    fn create_depth_array(&mut self, size: u32, layers: u32) -> Result<TextureId> {
        if size == 0 || layers == 0 {
            return Err(LumenError::ResourceInvalid(
                "depth array must have a size and at least one layer".to_string(),
            ));
        }
        Ok(self.textures.insert(TextureRecord {
            width: size,
            height: size,
            layers,
            format: TextureFormat::Depth32F,
            filter: TextureFilter::Bilinear,
            data: None,
        }))
    }

    fn bind_texture(&mut self, slot: u32, texture: Option<TextureId>) {
        if let Some(unit) = self.bound_textures.get_mut(slot as usize) {
            *unit = texture.filter(|id| self.textures.contains_key(*id));
        }
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(texture);
        for unit in &mut self.bound_textures {
            if *unit == Some(texture) {
                *unit = None;
            }
        }
        if matches!(self.state.depth_target, Some((t, _)) if t == texture) {
            self.state.depth_target = None;
        }
    }

    fn bind_depth_target(&mut self, target: Option<(TextureId, u32)>) {
        self.state.depth_target = target.filter(|(id, layer)| {
            self.textures
                .get(*id)
                .is_some_and(|t| t.format == TextureFormat::Depth32F && *layer < t.layers)
        });
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.state.depth_write = enabled;
    }

    fn set_blending(&mut self, enabled: bool) {
        self.state.blending = enabled;
    }

    fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.state.blend_func = (src, dst);
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.state.cull_mode = mode;
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.state.color_write = enabled;
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.state.viewport = [x, y, width, height];
    }

    fn clear(&mut self, color: Vec4, flags: ClearFlags) {
        self.log.push(DeviceCommand::Clear {
            color,
            flags,
            target: self.state.depth_target,
        });
    }

    fn draw(&mut self, primitive: Primitive, count: u32, first: u32) {
        self.record_draw(primitive, count, first, false);
    }

    fn draw_indexed(&mut self, primitive: Primitive, count: u32, first: u32) {
        self.record_draw(primitive, count, first, true);
    }

    fn state(&self) -> DeviceState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "#version 330 core\nlayout (location = 0) in vec3 aPos;\nout vec2 vUv;\nvoid main() { vUv = aPos.xy; }\n";
    const FS: &str = "#version 330 core\nin vec2 vUv;\nout vec4 FragColor;\nvoid main() { FragColor = vec4(vUv, 0.0, 1.0); }\n";

    #[test]
    fn interface_names_are_extracted() {
        assert_eq!(
            interface_name("layout (location = 0) in vec3 aPos;", "in"),
            Some("aPos")
        );
        assert_eq!(interface_name("flat out int vId;", "out"), Some("vId"));
        assert_eq!(interface_name("uniform vec3 uColor;", "in"), None);
        assert_eq!(interface_name("int index = 0;", "in"), None);
    }

    #[test]
    fn rejects_invalid_stages() {
        let mut device = HeadlessDevice::new();
        assert!(matches!(
            device.create_shader("", FS),
            Err(LumenError::ShaderCompile {
                stage: ShaderStage::Vertex,
                ..
            })
        ));
        assert!(matches!(
            device.create_shader(VS, "#version 330 core\n"),
            Err(LumenError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
    }

    #[test]
    fn rejects_unlinked_inputs() {
        let mut device = HeadlessDevice::new();
        let fs = FS.replace("in vec2 vUv;", "in vec2 vUv;\nin vec3 vNormal;");
        assert!(matches!(
            device.create_shader(VS, &fs),
            Err(LumenError::ShaderLink(_))
        ));
        assert!(device.create_shader(VS, FS).is_ok());
    }

    #[test]
    fn records_dynamic_vertex_snapshot() {
        let mut device = HeadlessDevice::new();
        let log = device.log();
        let shader = device.create_shader(VS, FS).unwrap();
        let data: Vec<u8> = [1.0f32, 2.0, 3.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();
        let vbo = device
            .create_buffer(BufferKind::Vertex, BufferUsage::Dynamic, 12, Some(&data))
            .unwrap();
        let vao = device.create_vertex_array().unwrap();
        device
            .set_vertex_buffer(vao, vbo, &VertexLayout::packed(&[3]))
            .unwrap();
        device.use_shader(Some(shader));
        device.bind_vertex_array(Some(vao));
        device.draw(Primitive::Triangles, 3, 0);

        let draws = log.color_draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].dynamic_vertices, Some(vec![1.0, 2.0, 3.0]));
    }
}
