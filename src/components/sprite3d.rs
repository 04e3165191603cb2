use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::renderer::{RenderContext, TextureRegion};
use crate::scene::component::Component;
use crate::scene::export::{ExportField, ExportType, ExportValue};

static SCHEMA: &[ExportField] = &[
    ExportField::new("texture_path", ExportType::FilePath, ExportValue::String(""), "Sprite image"),
    ExportField::new("modulate", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Color modulation (RGBA)"),
    ExportField::new("size", ExportType::Vec2, ExportValue::Vec2([1.0, 1.0]), "Size in world units"),
    ExportField::new("offset", ExportType::Vec3, ExportValue::Vec3([0.0, 0.0, 0.0]), "Offset from the owner"),
    ExportField::new("centered", ExportType::Bool, ExportValue::Bool(true), "Center on the owner position"),
    ExportField::new("flip_h", ExportType::Bool, ExportValue::Bool(false), "Mirror horizontally"),
    ExportField::new("flip_v", ExportType::Bool, ExportValue::Bool(false), "Mirror vertically"),
    ExportField::new("region_enabled", ExportType::Bool, ExportValue::Bool(false), "Sample only region_rect"),
    ExportField::new("region_rect", ExportType::Vec4, ExportValue::Vec4([0.0, 0.0, 1.0, 1.0]), "Normalized region (u, v, w, h)"),
];

/// Textured quad drawn in the 3D pass, facing the owner's +Z.
#[derive(Debug, Clone)]
pub struct Sprite3D {
    pub texture_path: String,
    pub modulate: Vec4,
    pub size: Vec2,
    pub offset: Vec3,
    pub centered: bool,
    pub flip_h: bool,
    pub flip_v: bool,
    pub region_enabled: bool,
    /// Normalized `(u, v, w, h)` with `v` counted from the image top.
    pub region_rect: Vec4,
    pub enabled: bool,
}

impl Default for Sprite3D {
    fn default() -> Self {
        Self {
            texture_path: String::new(),
            modulate: Vec4::ONE,
            size: Vec2::ONE,
            offset: Vec3::ZERO,
            centered: true,
            flip_h: false,
            flip_v: false,
            region_enabled: false,
            region_rect: Vec4::new(0.0, 0.0, 1.0, 1.0),
            enabled: true,
        }
    }
}

impl Sprite3D {
    #[must_use]
    pub fn new(texture_path: impl Into<String>, size: Vec2) -> Self {
        Self {
            texture_path: texture_path.into(),
            size,
            ..Self::default()
        }
    }

    /// Offset, then the anchor shift when not centered, then scale.
    #[must_use]
    pub fn local_transform(&self) -> Mat4 {
        let anchor = if self.centered {
            Vec3::ZERO
        } else {
            Vec3::new(self.size.x, self.size.y, 0.0) * 0.5
        };
        Mat4::from_translation(self.offset + anchor) * Mat4::from_scale(Vec3::new(self.size.x, self.size.y, 1.0))
    }

    fn region(&self) -> Vec4 {
        if self.region_enabled {
            self.region_rect
        } else {
            Vec4::new(0.0, 0.0, 1.0, 1.0)
        }
    }
}

impl Component for Sprite3D {
    fn type_name(&self) -> &'static str {
        "Sprite3D"
    }

    fn is_active(&self) -> bool {
        self.enabled && self.size.x > 0.0 && self.size.y > 0.0
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        if !ctx.rendering_context().shows_3d() {
            return;
        }
        let transform = ctx.node().global_transform() * self.local_transform();
        let texture = ctx.load_texture_sized(&self.texture_path, false).map(|(id, _, _)| id);

        if !self.region_enabled && !self.flip_h && !self.flip_v {
            ctx.render_quad(transform, self.modulate, texture);
        } else {
            let region = TextureRegion::new(self.region(), self.flip_h, !self.flip_v);
            ctx.render_quad_region(transform, self.modulate, texture, region);
        }
    }

    fn export_schema(&self) -> &'static [ExportField] {
        SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncentered_sprite_puts_its_corner_on_the_offset() {
        let sprite = Sprite3D {
            size: Vec2::new(2.0, 4.0),
            offset: Vec3::new(0.0, 0.0, 1.0),
            centered: false,
            ..Sprite3D::default()
        };
        let corner = sprite.local_transform().transform_point3(Vec3::new(-0.5, -0.5, 0.0));
        assert!(corner.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn degenerate_size_is_inactive() {
        assert!(!Sprite3D::new("a.png", Vec2::new(0.0, 1.0)).is_active());
        assert!(Sprite3D::new("a.png", Vec2::ONE).is_active());
    }
}
