use glam::{Mat4, Vec2, Vec4};

use super::quad::{QuadGeometry, TextureRegion};
use super::shaders::MAX_BONES;
use crate::device::{TextureId, VertexArrayId};
use crate::skybox::SkyboxDraw;

/// Shader selection hint carried by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderHint {
    /// 2D for the unit quads, lit 3D otherwise.
    #[default]
    Auto,
    Text,
    Skinned,
}

/// Program a command is drawn with, resolved at flush time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Skybox,
    Skinned,
    Text,
    Quad2D,
    Mesh3D,
}

/// One deferred draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCommand {
    pub model: Mat4,
    pub vertex_array: Option<VertexArrayId>,
    pub vertex_count: u32,
    pub index_count: u32,
    pub use_indices: bool,
    /// `None` draws with the white texture.
    pub texture: Option<TextureId>,
    pub color: Vec4,
    pub hint: ShaderHint,

    pub corner_radius: f32,
    pub rect_size: Vec2,
    pub use_corner_radius: bool,

    /// UVs written into the dynamic quad before drawing.
    pub texture_region: Option<TextureRegion>,
    /// Restore the dynamic quad's default UVs after drawing.
    pub reset_dynamic_quad: bool,

    pub bone_transforms: Vec<Mat4>,
    pub use_lighting: bool,

    pub skybox: Option<Box<SkyboxDraw>>,
}

impl Default for RenderCommand {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            vertex_array: None,
            vertex_count: 0,
            index_count: 0,
            use_indices: false,
            texture: None,
            color: Vec4::ONE,
            hint: ShaderHint::Auto,
            corner_radius: 0.0,
            rect_size: Vec2::ZERO,
            use_corner_radius: false,
            texture_region: None,
            reset_dynamic_quad: false,
            bone_transforms: Vec::new(),
            use_lighting: false,
            skybox: None,
        }
    }
}

impl RenderCommand {
    /// Bones actually uploaded, at most [`MAX_BONES`].
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bone_transforms.len().min(MAX_BONES)
    }

    #[must_use]
    pub fn is_skybox(&self) -> bool {
        self.skybox.is_some()
    }

    /// Whether the command can produce a draw call.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.vertex_array.is_some()
            && ((self.use_indices && self.index_count > 0) || self.vertex_count > 0)
    }

    /// Skinned and text hints win; otherwise the unit quads use the 2D
    /// program and anything else the lit 3D one.
    #[must_use]
    pub fn shader_kind(&self, quads: &QuadGeometry) -> ShaderKind {
        if self.skybox.is_some() {
            return ShaderKind::Skybox;
        }
        match self.hint {
            ShaderHint::Skinned => ShaderKind::Skinned,
            ShaderHint::Text => ShaderKind::Text,
            ShaderHint::Auto => match self.vertex_array {
                Some(vao) if quads.is_quad(vao) => ShaderKind::Quad2D,
                _ => ShaderKind::Mesh3D,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_command_is_not_drawable() {
        assert!(!RenderCommand::default().is_drawable());
    }

    #[test]
    fn bone_count_is_capped() {
        let command = RenderCommand {
            bone_transforms: vec![Mat4::IDENTITY; 120],
            ..RenderCommand::default()
        };
        assert_eq!(command.bone_count(), MAX_BONES);
    }
}
