use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::renderer::{RenderContext, TextureRegion};
use crate::scene::component::Component;
use crate::scene::export::{ExportField, ExportType, ExportValue};

static SCHEMA: &[ExportField] = &[
    ExportField::new("texture_path", ExportType::FilePath, ExportValue::String(""), "Sprite image"),
    ExportField::new("modulate", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Color modulation (RGBA)"),
    ExportField::new("size", ExportType::Vec2, ExportValue::Vec2([100.0, 100.0]), "Size in pixels"),
    ExportField::new("centered", ExportType::Bool, ExportValue::Bool(true), "Center on the owner position"),
    ExportField::new("flip_h", ExportType::Bool, ExportValue::Bool(false), "Mirror horizontally"),
    ExportField::new("flip_v", ExportType::Bool, ExportValue::Bool(false), "Mirror vertically"),
    ExportField::new("texture_region", ExportType::Vec4, ExportValue::Vec4([0.0, 0.0, 1.0, 1.0]), "Normalized region (u, v, w, h)"),
    ExportField::new("region_enabled", ExportType::Bool, ExportValue::Bool(false), "Use the pixel region rectangle"),
    ExportField::new("region_rect", ExportType::Vec4, ExportValue::Vec4([0.0, 0.0, 0.0, 0.0]), "Pixel region (x, y, w, h)"),
    ExportField::new("hframes", ExportType::Int, ExportValue::Int(1), "Horizontal animation frames"),
    ExportField::new("vframes", ExportType::Int, ExportValue::Int(1), "Vertical animation frames"),
    ExportField::new("frame", ExportType::Int, ExportValue::Int(0), "Current frame"),
];

/// Textured quad on a `Node2D` or control.
#[derive(Debug, Clone)]
pub struct Sprite2D {
    pub texture_path: String,
    pub modulate: Vec4,
    pub size: Vec2,
    pub centered: bool,
    pub flip_h: bool,
    pub flip_v: bool,
    /// Normalized `(u, v, w, h)` with `v` counted from the image top.
    pub texture_region: Vec4,
    pub region_enabled: bool,
    /// Pixel rectangle used instead of `texture_region` when enabled.
    pub region_rect: Vec4,
    pub hframes: u32,
    pub vframes: u32,
    pub frame: u32,
    pub enabled: bool,
}

impl Default for Sprite2D {
    fn default() -> Self {
        Self {
            texture_path: String::new(),
            modulate: Vec4::ONE,
            size: Vec2::splat(100.0),
            centered: true,
            flip_h: false,
            flip_v: false,
            texture_region: Vec4::new(0.0, 0.0, 1.0, 1.0),
            region_enabled: false,
            region_rect: Vec4::ZERO,
            hframes: 1,
            vframes: 1,
            frame: 0,
            enabled: true,
        }
    }
}

impl Sprite2D {
    #[must_use]
    pub fn new(texture_path: impl Into<String>, size: Vec2) -> Self {
        Self {
            texture_path: texture_path.into(),
            size,
            ..Self::default()
        }
    }

    /// Normalized region after the pixel rectangle and frame selection.
    #[must_use]
    pub fn effective_region(&self, texture_size: Option<(u32, u32)>) -> Vec4 {
        let mut region = self.texture_region;
        if self.region_enabled
            && let Some((w, h)) = texture_size
            && w > 0
            && h > 0
        {
            let size = Vec4::new(w as f32, h as f32, w as f32, h as f32);
            region = self.region_rect / size;
        }

        let frames = (self.hframes.max(1), self.vframes.max(1));
        if frames != (1, 1) {
            let frame = self.frame % (frames.0 * frames.1);
            let fw = region.z / frames.0 as f32;
            let fh = region.w / frames.1 as f32;
            region = Vec4::new(
                region.x + (frame % frames.0) as f32 * fw,
                region.y + (frame / frames.0) as f32 * fh,
                fw,
                fh,
            );
        }
        region
    }

    /// Local quad transform: scaled to `size`, shifted so the top-left
    /// corner sits on the origin when not centered.
    #[must_use]
    pub fn local_transform(&self) -> Mat4 {
        let offset = if self.centered {
            Vec2::ZERO
        } else {
            Vec2::new(self.size.x, -self.size.y) * 0.5
        };
        Mat4::from_translation(offset.extend(0.0)) * Mat4::from_scale(Vec3::new(self.size.x, self.size.y, 1.0))
    }
}

impl Component for Sprite2D {
    fn type_name(&self) -> &'static str {
        "Sprite2D"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        if !ctx.rendering_context().shows_2d() {
            return;
        }
        let transform = ctx.node().global_transform() * self.local_transform();

        let loaded = ctx.load_texture_sized(&self.texture_path, false);
        let texture = loaded.map(|(id, _, _)| id);
        let region = self.effective_region(loaded.map(|(_, w, h)| (w, h)));

        let full = region == Vec4::new(0.0, 0.0, 1.0, 1.0);
        if full && !self.flip_h && !self.flip_v {
            ctx.render_quad(transform, self.modulate, texture);
        } else {
            // Rows are stored top first, so an unflipped sprite samples
            // the region with its v axis inverted.
            let region = TextureRegion::new(region, self.flip_h, !self.flip_v);
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
    fn frames_split_the_region() {
        let sprite = Sprite2D {
            hframes: 4,
            vframes: 2,
            frame: 5,
            ..Sprite2D::default()
        };
        assert_eq!(sprite.effective_region(None), Vec4::new(0.25, 0.5, 0.25, 0.5));
    }

    #[test]
    fn pixel_region_needs_texture_size() {
        let sprite = Sprite2D {
            region_enabled: true,
            region_rect: Vec4::new(16.0, 0.0, 16.0, 16.0),
            ..Sprite2D::default()
        };
        assert_eq!(sprite.effective_region(None), Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(
            sprite.effective_region(Some((64, 32))),
            Vec4::new(0.25, 0.0, 0.25, 0.5)
        );
    }
}
