use glam::{Mat4, Vec4};

use crate::mesh::Mesh;
use crate::renderer::RenderContext;
use crate::scene::component::Component;
use crate::scene::export::{ExportField, ExportType, ExportValue};

const PRIMITIVES: &[&str] = &["Quad", "Cube", "Plane"];

/// Built-in geometry of a [`MeshInstance3D`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Primitive {
    Quad,
    #[default]
    Cube,
    Plane,
}

impl Primitive {
    #[must_use]
    pub fn build(self, size: f32) -> Mesh {
        match self {
            Primitive::Quad => Mesh::quad(size, size),
            Primitive::Cube => Mesh::cube(size),
            Primitive::Plane => Mesh::plane(size, size, 1),
        }
    }
}

static MESH_INSTANCE_SCHEMA: &[ExportField] = &[
    ExportField::new("primitive", ExportType::Enum(PRIMITIVES), ExportValue::Enum(1), "Built-in geometry"),
    ExportField::new("size", ExportType::Float, ExportValue::Float(1.0), "Edge length"),
    ExportField::new("color", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Base color"),
    ExportField::new("texture_path", ExportType::FilePath, ExportValue::String(""), "Albedo texture"),
    ExportField::new("use_lighting", ExportType::Bool, ExportValue::Bool(true), "Apply scene lights"),
    ExportField::new("casts_shadows", ExportType::Bool, ExportValue::Bool(true), "Draw into shadow maps"),
];

/// Static mesh drawn on a `Node3D`.
#[derive(Debug, Clone)]
pub struct MeshInstance3D {
    pub color: Vec4,
    pub texture_path: String,
    pub use_lighting: bool,
    pub casts_shadows: bool,
    pub enabled: bool,
    primitive: Option<Primitive>,
    mesh: Mesh,
}

impl Default for MeshInstance3D {
    fn default() -> Self {
        Self::primitive(Primitive::Cube, 1.0)
    }
}

impl MeshInstance3D {
    #[must_use]
    pub fn primitive(primitive: Primitive, size: f32) -> Self {
        Self {
            primitive: Some(primitive),
            ..Self::from_mesh(primitive.build(size))
        }
    }

    #[must_use]
    pub fn from_mesh(mesh: Mesh) -> Self {
        Self {
            color: Vec4::ONE,
            texture_path: String::new(),
            use_lighting: true,
            casts_shadows: true,
            enabled: true,
            primitive: None,
            mesh,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// `None` for custom meshes.
    #[must_use]
    pub fn primitive_kind(&self) -> Option<Primitive> {
        self.primitive
    }

    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.mesh = mesh;
        self.primitive = None;
    }
}

impl Component for MeshInstance3D {
    fn type_name(&self) -> &'static str {
        "MeshInstance3D"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        if !ctx.rendering_context().shows_3d() || self.mesh.is_empty() {
            return;
        }
        let transform = ctx.node().global_transform();
        let texture = if self.texture_path.is_empty() {
            None
        } else {
            ctx.load_texture(&self.texture_path)
        };
        ctx.render_mesh(&self.mesh, transform, self.color, texture, self.use_lighting);
    }

    fn shadow_geometry(&self) -> Option<&Mesh> {
        (self.casts_shadows && !self.mesh.is_empty()).then_some(&self.mesh)
    }

    fn export_schema(&self) -> &'static [ExportField] {
        MESH_INSTANCE_SCHEMA
    }
}

static SKINNED_MESH_SCHEMA: &[ExportField] = &[
    ExportField::new("color", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Base color"),
    ExportField::new("texture_path", ExportType::FilePath, ExportValue::String(""), "Albedo texture"),
    ExportField::new("use_lighting", ExportType::Bool, ExportValue::Bool(true), "Apply scene lights"),
];

/// Mesh deformed by up to four bones per vertex.
///
/// `bone_transforms` are model-space skinning matrices; bones missing from
/// the list are left at identity.
#[derive(Debug, Clone)]
pub struct SkinnedMesh3D {
    pub mesh: Mesh,
    pub bone_transforms: Vec<Mat4>,
    pub color: Vec4,
    pub texture_path: String,
    pub use_lighting: bool,
    pub enabled: bool,
}

impl SkinnedMesh3D {
    #[must_use]
    pub fn new(mesh: Mesh) -> Self {
        let bones = mesh.max_bone_index().map_or(0, |max| max as usize + 1);
        Self {
            mesh,
            bone_transforms: vec![Mat4::IDENTITY; bones],
            color: Vec4::ONE,
            texture_path: String::new(),
            use_lighting: true,
            enabled: true,
        }
    }

    pub fn set_bone(&mut self, index: usize, transform: Mat4) {
        if index >= self.bone_transforms.len() {
            self.bone_transforms.resize(index + 1, Mat4::IDENTITY);
        }
        self.bone_transforms[index] = transform;
    }
}

impl Component for SkinnedMesh3D {
    fn type_name(&self) -> &'static str {
        "SkinnedMesh3D"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        if !ctx.rendering_context().shows_3d() || self.mesh.is_empty() {
            return;
        }
        let transform = ctx.node().global_transform();
        let texture = if self.texture_path.is_empty() {
            None
        } else {
            ctx.load_texture(&self.texture_path)
        };
        ctx.render_skinned_mesh(
            &self.mesh,
            transform,
            self.color,
            texture,
            &self.bone_transforms,
            self.use_lighting,
        );
    }

    fn export_schema(&self) -> &'static [ExportField] {
        SKINNED_MESH_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_geometry_follows_flag() {
        let mut instance = MeshInstance3D::default();
        assert!(instance.shadow_geometry().is_some());
        instance.casts_shadows = false;
        assert!(instance.shadow_geometry().is_none());
    }

    #[test]
    fn custom_mesh_clears_primitive() {
        let mut instance = MeshInstance3D::primitive(Primitive::Plane, 2.0);
        assert_eq!(instance.primitive_kind(), Some(Primitive::Plane));
        instance.set_mesh(Mesh::quad(1.0, 1.0));
        assert_eq!(instance.primitive_kind(), None);
    }

    #[test]
    fn set_bone_grows_the_palette() {
        let mut skinned = SkinnedMesh3D::new(Mesh::quad(1.0, 1.0));
        assert!(skinned.bone_transforms.is_empty());
        skinned.set_bone(2, Mat4::from_scale(glam::Vec3::splat(2.0)));
        assert_eq!(skinned.bone_transforms.len(), 3);
        assert_eq!(skinned.bone_transforms[0], Mat4::IDENTITY);
    }
}
