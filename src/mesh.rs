//! CPU-side meshes and their GPU counterparts.
//!
//! A [`Mesh`] is plain data. Uploading goes through the resource cache,
//! which keys the GPU copy by [`Mesh::key`] so identical meshes share one
//! vertex array.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use xxhash_rust::xxh3::Xxh3;

use crate::device::{
    BufferId, BufferKind, BufferUsage, GraphicsDevice, VertexArrayId, VertexLayout,
};
use crate::errors::Result;

/// Interleaved vertex shared by static and skinned meshes.
///
/// Bone ids are stored as floats; a zero weight sum marks a vertex as rigid.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub bone_ids: [f32; 4],
    pub bone_weights: [f32; 4],
}

impl Vertex {
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
            tangent: [1.0, 0.0, 0.0],
            bitangent: [0.0, 1.0, 0.0],
            bone_ids: [0.0; 4],
            bone_weights: [0.0; 4],
        }
    }

    /// Attaches up to four bone influences.
    #[must_use]
    pub fn with_bones(mut self, ids: [u32; 4], weights: [f32; 4]) -> Self {
        self.bone_ids = ids.map(|id| id as f32);
        self.bone_weights = weights;
        self
    }

    #[must_use]
    pub fn is_skinned(&self) -> bool {
        self.bone_weights.iter().any(|w| *w > 0.0)
    }

    /// Attribute layout: position, normal, uv, tangent, bitangent, bone ids,
    /// bone weights at locations 0..=6.
    #[must_use]
    pub fn layout() -> VertexLayout {
        VertexLayout::packed(&[3, 3, 2, 3, 3, 4, 4])
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    key: u64,
    skinned: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let mut hasher = Xxh3::new();
        hasher.update(bytemuck::cast_slice(&vertices));
        hasher.update(bytemuck::cast_slice(&indices));
        let skinned = vertices.iter().any(Vertex::is_skinned);
        Self {
            key: hasher.digest(),
            vertices,
            indices,
            skinned,
        }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Content hash used as the GPU cache identity.
    #[must_use]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[must_use]
    pub fn is_skinned(&self) -> bool {
        self.skinned
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Highest bone index referenced with a non-zero weight.
    #[must_use]
    pub fn max_bone_index(&self) -> Option<u32> {
        self.vertices
            .iter()
            .flat_map(|v| {
                v.bone_ids
                    .iter()
                    .zip(v.bone_weights.iter())
                    .filter(|(_, w)| **w > 0.0)
                    .map(|(id, _)| *id as u32)
            })
            .max()
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    /// `width × height` quad in the XY plane facing +Z.
    #[must_use]
    pub fn quad(width: f32, height: f32) -> Self {
        let (w, h) = (width * 0.5, height * 0.5);
        let n = Vec3::Z;
        let vertices = vec![
            Vertex::new(Vec3::new(-w, -h, 0.0), n, Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(w, -h, 0.0), n, Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(w, h, 0.0), n, Vec2::new(1.0, 1.0)),
            Vertex::new(Vec3::new(-w, h, 0.0), n, Vec2::new(0.0, 1.0)),
        ];
        Self::new(vertices, vec![0, 1, 2, 2, 3, 0])
    }

    /// `width × depth` plane in the XZ plane facing +Y, split into
    /// `segments × segments` cells.
    #[must_use]
    pub fn plane(width: f32, depth: f32, segments: u32) -> Self {
        let segments = segments.max(1);
        let row = segments + 1;
        let mut vertices = Vec::with_capacity((row * row) as usize);
        for iz in 0..row {
            let v = iz as f32 / segments as f32;
            for ix in 0..row {
                let u = ix as f32 / segments as f32;
                let position = Vec3::new((u - 0.5) * width, 0.0, (v - 0.5) * depth);
                vertices.push(Vertex::new(position, Vec3::Y, Vec2::new(u, 1.0 - v)));
            }
        }

        let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
        for iz in 0..segments {
            for ix in 0..segments {
                let a = iz * row + ix;
                let b = a + row;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        Self::new(vertices, indices)
    }

    /// Axis-aligned cube centred on the origin, four vertices per face.
    #[must_use]
    pub fn cube(size: f32) -> Self {
        let s = size * 0.5;
        // (normal, tangent u axis, tangent v axis)
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u_axis, v_axis) in faces {
            let base = vertices.len() as u32;
            for (du, dv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (normal + u_axis * du + v_axis * dv) * s;
                let uv = Vec2::new((du + 1.0) * 0.5, (dv + 1.0) * 0.5);
                let mut vertex = Vertex::new(position, normal, uv);
                vertex.tangent = u_axis.to_array();
                vertex.bitangent = v_axis.to_array();
                vertices.push(vertex);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        Self::new(vertices, indices)
    }

    /// Uploads vertex and index data into a new vertex array.
    pub fn upload(&self, device: &mut dyn GraphicsDevice) -> Result<GpuMesh> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        let vertex_buffer = device.create_buffer(
            BufferKind::Vertex,
            BufferUsage::Static,
            vertex_bytes.len(),
            Some(vertex_bytes),
        )?;
        let vao = device.create_vertex_array()?;
        device.set_vertex_buffer(vao, vertex_buffer, &Vertex::layout())?;

        let index_buffer = if self.indices.is_empty() {
            None
        } else {
            let index_bytes: &[u8] = bytemuck::cast_slice(&self.indices);
            let buffer = device.create_buffer(
                BufferKind::Index,
                BufferUsage::Static,
                index_bytes.len(),
                Some(index_bytes),
            )?;
            device.set_index_buffer(vao, buffer)?;
            Some(buffer)
        };

        Ok(GpuMesh {
            vao,
            vertex_buffer,
            index_buffer,
            vertex_count: self.vertices.len() as u32,
            index_count: self.indices.len() as u32,
        })
    }
}

/// Device objects backing an uploaded [`Mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuMesh {
    pub vao: VertexArrayId,
    pub vertex_buffer: BufferId,
    pub index_buffer: Option<BufferId>,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.destroy_vertex_array(self.vao);
        device.destroy_buffer(self.vertex_buffer);
        if let Some(buffer) = self.index_buffer {
            device.destroy_buffer(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_six_faces() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.indices().len(), 36);
        assert!(cube.vertices().iter().all(|v| v.position.iter().all(|c| c.abs() == 1.0)));
    }

    #[test]
    fn identical_meshes_share_a_key() {
        assert_eq!(Mesh::quad(1.0, 1.0).key(), Mesh::quad(1.0, 1.0).key());
        assert_ne!(Mesh::quad(1.0, 1.0).key(), Mesh::quad(2.0, 1.0).key());
    }

    #[test]
    fn skinning_is_detected_from_weights() {
        let v = Vertex::new(Vec3::ZERO, Vec3::Y, Vec2::ZERO);
        let rigid = Mesh::new(vec![v], vec![]);
        assert!(!rigid.is_skinned());

        let skinned = Mesh::new(vec![v.with_bones([119, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])], vec![]);
        assert!(skinned.is_skinned());
        assert_eq!(skinned.max_bone_index(), Some(119));
    }
}
