//! Unit quads shared by every 2D draw.
//!
//! Both quads span `[-0.5, 0.5]²` with `vec2 position, vec2 uv` vertices
//! and six indices. The static quad never changes; the dynamic one has its
//! UVs rewritten before region draws and restored afterwards on request.

use glam::Vec4;

use crate::device::{
    BufferId, BufferKind, BufferUsage, GraphicsDevice, VertexArrayId, VertexLayout,
};
use crate::errors::Result;

pub const QUAD_VERTEX_COUNT: u32 = 4;
pub const QUAD_INDEX_COUNT: u32 = 6;

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Default vertices. Image rows are stored top first, so the bottom edge
/// samples `v = 1`.
#[rustfmt::skip]
pub const DEFAULT_QUAD_VERTICES: [f32; 16] = [
    -0.5, -0.5,  0.0, 1.0,
     0.5, -0.5,  1.0, 1.0,
     0.5,  0.5,  1.0, 0.0,
    -0.5,  0.5,  0.0, 0.0,
];

/// Sub-rectangle of a texture in normalized `(u, v, width, height)`, with
/// optional mirroring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureRegion {
    pub rect: Vec4,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl TextureRegion {
    #[must_use]
    pub fn new(rect: Vec4, flip_h: bool, flip_v: bool) -> Self {
        Self { rect, flip_h, flip_v }
    }

    /// Whole texture, sampled top row first like the static quad.
    #[must_use]
    pub fn full() -> Self {
        Self::new(Vec4::new(0.0, 0.0, 1.0, 1.0), false, true)
    }

    /// Pixel rectangle of a `width × height` texture.
    #[must_use]
    pub fn from_pixels(x: f32, y: f32, w: f32, h: f32, width: u32, height: u32) -> Self {
        let size = Vec4::new(width as f32, height as f32, width as f32, height as f32).max(Vec4::ONE);
        Self::new(Vec4::new(x, y, w, h) / size, false, false)
    }

    /// Quad vertices sampling this region.
    #[must_use]
    pub fn vertices(&self) -> [f32; 16] {
        let mut u_min = self.rect.x;
        let mut v_min = self.rect.y;
        let mut u_max = self.rect.x + self.rect.z;
        let mut v_max = self.rect.y + self.rect.w;
        if self.flip_h {
            std::mem::swap(&mut u_min, &mut u_max);
        }
        if self.flip_v {
            std::mem::swap(&mut v_min, &mut v_max);
        }

        #[rustfmt::skip]
        let vertices = [
            -0.5, -0.5,  u_min, v_min,
             0.5, -0.5,  u_max, v_min,
             0.5,  0.5,  u_max, v_max,
            -0.5,  0.5,  u_min, v_max,
        ];
        vertices
    }
}

/// One uploaded unit quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad {
    pub vao: VertexArrayId,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
}

impl Quad {
    fn create(device: &mut dyn GraphicsDevice, usage: BufferUsage) -> Result<Self> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&DEFAULT_QUAD_VERTICES);
        let vertex_buffer =
            device.create_buffer(BufferKind::Vertex, usage, vertex_bytes.len(), Some(vertex_bytes))?;
        let index_bytes: &[u8] = bytemuck::cast_slice(&QUAD_INDICES);
        let index_buffer = device.create_buffer(
            BufferKind::Index,
            BufferUsage::Static,
            index_bytes.len(),
            Some(index_bytes),
        )?;

        let vao = device.create_vertex_array()?;
        device.set_index_buffer(vao, index_buffer)?;
        device.set_vertex_buffer(vao, vertex_buffer, &VertexLayout::packed(&[2, 2]))?;

        Ok(Self {
            vao,
            vertex_buffer,
            index_buffer,
        })
    }

    fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_vertex_array(self.vao);
        device.destroy_buffer(self.vertex_buffer);
        device.destroy_buffer(self.index_buffer);
    }
}

/// The static and dynamic unit quads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadGeometry {
    pub static_quad: Quad,
    pub dynamic_quad: Quad,
}

impl QuadGeometry {
    pub fn create(device: &mut dyn GraphicsDevice) -> Result<Self> {
        Ok(Self {
            static_quad: Quad::create(device, BufferUsage::Static)?,
            dynamic_quad: Quad::create(device, BufferUsage::Dynamic)?,
        })
    }

    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        self.static_quad.destroy(device);
        self.dynamic_quad.destroy(device);
    }

    /// Whether `vao` is one of the two unit quads.
    #[must_use]
    pub fn is_quad(&self, vao: VertexArrayId) -> bool {
        vao == self.static_quad.vao || vao == self.dynamic_quad.vao
    }

    #[must_use]
    pub fn is_dynamic(&self, vao: VertexArrayId) -> bool {
        vao == self.dynamic_quad.vao
    }

    /// Rewrites the dynamic quad's UVs for `region`.
    pub fn update_dynamic(&self, device: &mut dyn GraphicsDevice, region: &TextureRegion) {
        let vertices = region.vertices();
        if let Err(err) =
            device.update_buffer(self.dynamic_quad.vertex_buffer, 0, bytemuck::cast_slice(&vertices))
        {
            log::warn!("Dynamic quad update failed: {err}");
        }
    }

    /// Restores the dynamic quad's default UVs.
    pub fn reset_dynamic(&self, device: &mut dyn GraphicsDevice) {
        if let Err(err) = device.update_buffer(
            self.dynamic_quad.vertex_buffer,
            0,
            bytemuck::cast_slice(&DEFAULT_QUAD_VERTICES),
        ) {
            log::warn!("Dynamic quad reset failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_region_matches_default_uvs() {
        assert_eq!(TextureRegion::full().vertices(), DEFAULT_QUAD_VERTICES);
    }

    #[test]
    fn horizontal_flip_swaps_u() {
        let region = TextureRegion::new(Vec4::new(0.25, 0.0, 0.25, 0.5), true, false);
        let v = region.vertices();
        assert_eq!((v[2], v[3]), (0.5, 0.0));
        assert_eq!((v[6], v[7]), (0.25, 0.0));
        assert_eq!((v[10], v[11]), (0.25, 0.5));
    }

    #[test]
    fn pixel_region_is_normalized() {
        let region = TextureRegion::from_pixels(32.0, 0.0, 32.0, 16.0, 128, 64);
        assert_eq!(region.rect, Vec4::new(0.25, 0.0, 0.25, 0.25));
    }
}
