use glam::{IVec2, Mat4, Vec2, Vec3, Vec4};

use crate::renderer::{RenderContext, TextureRegion};
use crate::scene::component::Component;
use crate::scene::export::{ExportField, ExportType, ExportValue};
use crate::tilemap::{TilemapLayer, TilemapProject, Tileset2D};

static SCHEMA: &[ExportField] = &[
    ExportField::new("tileset_path", ExportType::FilePath, ExportValue::String(""), "Path to tileset resource file"),
    ExportField::new("map_size", ExportType::Vec2, ExportValue::Vec2([10.0, 10.0]), "Map size in tiles"),
    ExportField::new("tile_size", ExportType::Vec2, ExportValue::Vec2([32.0, 32.0]), "Tile size in pixels"),
    ExportField::new("modulate", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Color modulation (RGBA)"),
];

/// Grid of tiles from one tileset, drawn on a `Node2D`.
///
/// Cell `(x, y)` has its top-left corner at `(x, -y) * tile_size` from the
/// owner; rows grow downwards. Each visible layer is drawn bottom to top
/// with its opacity multiplied into `modulate`.
#[derive(Debug, Clone)]
pub struct Tilemap2D {
    pub tileset_path: String,
    pub tile_size: IVec2,
    pub modulate: Vec4,
    pub enabled: bool,
    tileset: Option<Tileset2D>,
    tileset_failed: bool,
    layers: Vec<TilemapLayer>,
}

impl Default for Tilemap2D {
    fn default() -> Self {
        Self::new(IVec2::splat(10), IVec2::splat(32))
    }
}

impl Tilemap2D {
    #[must_use]
    pub fn new(map_size: IVec2, tile_size: IVec2) -> Self {
        Self {
            tileset_path: String::new(),
            tile_size,
            modulate: Vec4::ONE,
            enabled: true,
            tileset: None,
            tileset_failed: false,
            layers: vec![TilemapLayer::new("Layer", map_size)],
        }
    }

    /// Takes the layers of `project`; `tileset` supplies regions and the
    /// texture.
    #[must_use]
    pub fn from_project(project: &TilemapProject, tileset: Tileset2D) -> Self {
        Self {
            tile_size: project.tile_size,
            layers: project.layers().to_vec(),
            tileset: Some(tileset),
            ..Self::new(project.size(), project.tile_size)
        }
    }

    pub fn set_tileset(&mut self, tileset: Tileset2D) {
        self.tileset = Some(tileset);
        self.tileset_failed = false;
    }

    /// Reloads from `path` on the next submission.
    pub fn set_tileset_path(&mut self, path: impl Into<String>) {
        self.tileset_path = path.into();
        self.tileset = None;
        self.tileset_failed = false;
    }

    #[must_use]
    pub fn tileset(&self) -> Option<&Tileset2D> {
        self.tileset.as_ref()
    }

    #[must_use]
    pub fn layers(&self) -> &[TilemapLayer] {
        &self.layers
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut TilemapLayer> {
        self.layers.get_mut(index)
    }

    /// Sets a cell of the first layer.
    pub fn set_tile(&mut self, x: i32, y: i32, tile_id: i32) {
        if let Some(layer) = self.layers.first_mut() {
            layer.set_tile(x, y, crate::tilemap::TileInstance::new(tile_id, 0));
        }
    }

    /// Offset of cell `(x, y)`'s top-left corner from the owner.
    #[must_use]
    pub fn map_to_local(&self, cell: IVec2) -> Vec2 {
        Vec2::new(
            (cell.x * self.tile_size.x) as f32,
            -(cell.y * self.tile_size.y) as f32,
        )
    }

    /// Cell containing the local point `local`.
    #[must_use]
    pub fn local_to_map(&self, local: Vec2) -> IVec2 {
        let size = self.tile_size.max(IVec2::ONE).as_vec2();
        IVec2::new((local.x / size.x).floor() as i32, (-local.y / size.y).floor() as i32)
    }

    fn ensure_tileset(&mut self) {
        if self.tileset.is_some() || self.tileset_failed || self.tileset_path.is_empty() {
            return;
        }
        match Tileset2D::load_from_file(&self.tileset_path) {
            Ok(tileset) => {
                log::debug!("Loaded tileset '{}'", self.tileset_path);
                self.tileset = Some(tileset);
            }
            Err(err) => {
                log::warn!("Failed to load tileset '{}': {err}", self.tileset_path);
                self.tileset_failed = true;
            }
        }
    }
}

impl Component for Tilemap2D {
    fn type_name(&self) -> &'static str {
        "Tilemap2D"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        if !ctx.rendering_context().shows_2d() {
            return;
        }
        self.ensure_tileset();
        let Some(tileset) = &self.tileset else {
            return;
        };

        let loaded = ctx.load_texture_sized(&tileset.texture_path, false);
        let texture = loaded.map(|(id, _, _)| id);
        let texture_size = loaded.map_or(Vec2::ONE, |(_, w, h)| Vec2::new(w as f32, h as f32));

        let base = ctx.node().global_transform();
        let size = self.tile_size.as_vec2();
        let half = Vec2::new(size.x, -size.y) * 0.5;

        for layer in self.layers.iter().filter(|l| l.visible) {
            let color = self.modulate * Vec4::new(1.0, 1.0, 1.0, layer.opacity());
            for (x, y, cell) in layer.occupied() {
                let Some(tile) = tileset.tile(cell.tile_id) else {
                    continue;
                };
                let r = tile.texture_region;
                let rect = if loaded.is_some() {
                    Vec4::new(r.x / texture_size.x, r.y / texture_size.y, r.z / texture_size.x, r.w / texture_size.y)
                } else {
                    Vec4::new(0.0, 0.0, 1.0, 1.0)
                };

                let center = self.map_to_local(IVec2::new(x, y)) + half;
                let transform = base
                    * Mat4::from_translation(center.extend(0.0))
                    * Mat4::from_scale(Vec3::new(size.x, size.y, 1.0));
                let color = color * cell.metadata.tint * Vec4::new(1.0, 1.0, 1.0, cell.metadata.opacity);
                ctx.render_quad_region(transform, color, texture, TextureRegion::new(rect, false, true));
            }
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
    fn map_and_local_coordinates_agree() {
        let tilemap = Tilemap2D::new(IVec2::splat(4), IVec2::new(16, 8));
        assert_eq!(tilemap.map_to_local(IVec2::new(2, 3)), Vec2::new(32.0, -24.0));
        assert_eq!(tilemap.local_to_map(Vec2::new(33.0, -25.0)), IVec2::new(2, 3));
    }

    #[test]
    fn missing_tileset_file_is_not_retried() {
        let mut tilemap = Tilemap2D::default();
        tilemap.set_tileset_path("does/not/exist.tileset");
        tilemap.ensure_tileset();
        assert!(tilemap.tileset().is_none());
        assert!(tilemap.tileset_failed);
    }
}
