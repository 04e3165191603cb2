//! Tileset resources.
//!
//! A tileset slices one texture into a regular grid of tiles. Each tile
//! carries its pixel region, an optional collision shape and free-form
//! typed data. The JSON document is tagged `"type": "Tileset2D"`; enum
//! fields are stored as integers.

use std::collections::BTreeMap;
use std::path::Path;

use glam::{IVec2, Vec2, Vec4};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LumenError, Result};

const TILESET_TYPE: &str = "Tileset2D";
const TILESET_VERSION: &str = "1.0";

// ============================================================================
// Collision
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TileCollisionType {
    #[default]
    None = 0,
    Rectangle = 1,
    Circle = 2,
    Polygon = 3,
}

impl TryFrom<i32> for TileCollisionType {
    type Error = String;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Rectangle),
            2 => Ok(Self::Circle),
            3 => Ok(Self::Polygon),
            other => Err(format!("unknown collision type {other}")),
        }
    }
}

impl From<TileCollisionType> for i32 {
    fn from(value: TileCollisionType) -> Self {
        value as i32
    }
}

/// Collision shape in tile-local pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileCollisionShape {
    #[serde(rename = "type")]
    pub kind: TileCollisionType,
    pub offset: Vec2,
    pub size: Vec2,
    /// Polygon vertices; unused by the other kinds.
    pub points: Vec<Vec2>,
}

impl Default for TileCollisionShape {
    fn default() -> Self {
        Self {
            kind: TileCollisionType::None,
            offset: Vec2::ZERO,
            size: Vec2::ONE,
            points: Vec::new(),
        }
    }
}

// ============================================================================
// Custom data
// ============================================================================

/// Typed value attached to a tile.
///
/// Serialized as `{"type": <int>, "value": ...}` with String=0, Integer=1,
/// Float=2, Boolean=3 and Color=4 (`[r, g, b, a]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataValue", into = "RawDataValue")]
pub enum TileDataValue {
    String(String),
    Integer(i32),
    Float(f32),
    Boolean(bool),
    Color(Vec4),
}

impl TileDataValue {
    #[must_use]
    pub fn type_code(&self) -> i32 {
        match self {
            Self::String(_) => 0,
            Self::Integer(_) => 1,
            Self::Float(_) => 2,
            Self::Boolean(_) => 3,
            Self::Color(_) => 4,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawDataValue {
    #[serde(rename = "type")]
    kind: i32,
    value: Value,
}

impl TryFrom<RawDataValue> for TileDataValue {
    type Error = String;

    fn try_from(raw: RawDataValue) -> std::result::Result<Self, Self::Error> {
        let parsed = match raw.kind {
            0 => serde_json::from_value(raw.value).map(Self::String),
            1 => serde_json::from_value(raw.value).map(Self::Integer),
            2 => serde_json::from_value(raw.value).map(Self::Float),
            3 => serde_json::from_value(raw.value).map(Self::Boolean),
            4 => serde_json::from_value(raw.value).map(Self::Color),
            other => return Err(format!("unknown tile data type {other}")),
        };
        parsed.map_err(|err| err.to_string())
    }
}

impl From<TileDataValue> for RawDataValue {
    fn from(value: TileDataValue) -> Self {
        let kind = value.type_code();
        let value = match value {
            TileDataValue::String(s) => Value::from(s),
            TileDataValue::Integer(i) => Value::from(i),
            TileDataValue::Float(f) => Value::from(f),
            TileDataValue::Boolean(b) => Value::from(b),
            TileDataValue::Color(c) => Value::from(c.to_array().to_vec()),
        };
        Self { kind, value }
    }
}

// ============================================================================
// Tiles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileData {
    pub id: i32,
    pub grid_position: IVec2,
    /// Pixel rectangle `(x, y, w, h)` in the tileset texture.
    pub texture_region: Vec4,
    pub collision: TileCollisionShape,
    pub custom_data: BTreeMap<String, TileDataValue>,
}

impl TileData {
    #[must_use]
    pub fn new(id: i32, grid_position: IVec2) -> Self {
        Self {
            id,
            grid_position,
            texture_region: Vec4::ZERO,
            collision: TileCollisionShape::default(),
            custom_data: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Tileset2D
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Tileset2D {
    pub texture_path: String,
    pub tile_size: IVec2,
    pub grid_size: IVec2,
    pub spacing: i32,
    pub margin: i32,
    tiles: BTreeMap<i32, TileData>,
}

impl Default for Tileset2D {
    fn default() -> Self {
        Self {
            texture_path: String::new(),
            tile_size: IVec2::splat(32),
            grid_size: IVec2::ONE,
            spacing: 0,
            margin: 0,
            tiles: BTreeMap::new(),
        }
    }
}

/// On-disk layout.
#[derive(Serialize, Deserialize)]
struct TilesetDocument {
    #[serde(rename = "type")]
    kind: String,
    version: String,
    texture_path: String,
    tile_size: IVec2,
    grid_size: IVec2,
    spacing: i32,
    margin: i32,
    tiles: Vec<Value>,
}

impl Tileset2D {
    #[must_use]
    pub fn new(texture_path: impl Into<String>, tile_size: IVec2, grid_size: IVec2) -> Self {
        Self {
            texture_path: texture_path.into(),
            tile_size,
            grid_size,
            ..Self::default()
        }
    }

    // ========================================================================
    // Tiles
    // ========================================================================

    /// Inserts or replaces the tile with `tile.id`.
    pub fn add_tile(&mut self, tile: TileData) {
        self.tiles.insert(tile.id, tile);
    }

    pub fn remove_tile(&mut self, id: i32) -> Option<TileData> {
        self.tiles.remove(&id)
    }

    #[must_use]
    pub fn tile(&self, id: i32) -> Option<&TileData> {
        self.tiles.get(&id)
    }

    pub fn tile_mut(&mut self, id: i32) -> Option<&mut TileData> {
        self.tiles.get_mut(&id)
    }

    /// First tile whose grid position is `grid_position`.
    #[must_use]
    pub fn tile_at(&self, grid_position: IVec2) -> Option<&TileData> {
        self.tiles.values().find(|t| t.grid_position == grid_position)
    }

    /// Tile ids in ascending order.
    pub fn tile_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.tiles.keys().copied()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileData> {
        self.tiles.values()
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn clear_tiles(&mut self) {
        self.tiles.clear();
    }

    // ========================================================================
    // Grid math
    // ========================================================================

    /// Pixel rectangle of the cell at `grid_position`, honoring margin and
    /// spacing.
    #[must_use]
    pub fn calculate_texture_region(&self, grid_position: IVec2) -> Vec4 {
        let origin = IVec2::splat(self.margin) + grid_position * (self.tile_size + self.spacing);
        Vec4::new(
            origin.x as f32,
            origin.y as f32,
            self.tile_size.x as f32,
            self.tile_size.y as f32,
        )
    }

    /// The cell's region in normalized `(u, v, w, h)`, clamped to the
    /// texture. Falls back to the whole texture for a degenerate size.
    #[must_use]
    pub fn normalized_region(&self, grid_position: IVec2, texture_size: IVec2) -> Vec4 {
        if texture_size.x <= 0 || texture_size.y <= 0 {
            return Vec4::new(0.0, 0.0, 1.0, 1.0);
        }
        let pixels = self.calculate_texture_region(grid_position);
        let size = texture_size.as_vec2();
        let min = (Vec2::new(pixels.x, pixels.y) / size).clamp(Vec2::ZERO, Vec2::ONE);
        let max = (Vec2::new(pixels.x + pixels.z, pixels.y + pixels.w) / size)
            .clamp(Vec2::ZERO, Vec2::ONE);
        Vec4::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Row-major cell of `id`; `(0, 0)` for an empty grid.
    #[must_use]
    pub fn grid_position_from_id(&self, id: i32) -> IVec2 {
        if self.grid_size.x <= 0 {
            return IVec2::ZERO;
        }
        IVec2::new(id % self.grid_size.x, id / self.grid_size.x)
    }

    #[must_use]
    pub fn id_from_grid_position(&self, grid_position: IVec2) -> i32 {
        grid_position.y * self.grid_size.x + grid_position.x
    }

    /// Replaces all tiles with one per grid cell.
    pub fn generate_tiles_from_grid(&mut self) {
        self.tiles.clear();
        for y in 0..self.grid_size.y {
            for x in 0..self.grid_size.x {
                let position = IVec2::new(x, y);
                let mut tile = TileData::new(self.id_from_grid_position(position), position);
                tile.texture_region = self.calculate_texture_region(position);
                self.tiles.insert(tile.id, tile);
            }
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn to_json(&self) -> Result<String> {
        let tiles = self
            .tiles
            .values()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let document = TilesetDocument {
            kind: TILESET_TYPE.to_string(),
            version: TILESET_VERSION.to_string(),
            texture_path: self.texture_path.clone(),
            tile_size: self.tile_size,
            grid_size: self.grid_size,
            spacing: self.spacing,
            margin: self.margin,
            tiles,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Parses a tileset document. Malformed tiles are skipped with a
    /// warning.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: TilesetDocument = serde_json::from_str(json)?;
        if document.kind != TILESET_TYPE {
            return Err(LumenError::InvalidFormat {
                expected: TILESET_TYPE,
                found: document.kind,
            });
        }

        let mut tiles = BTreeMap::new();
        for value in document.tiles {
            match serde_json::from_value::<TileData>(value) {
                Ok(tile) => {
                    tiles.insert(tile.id, tile);
                }
                Err(err) => log::warn!("Skipping malformed tile: {err}"),
            }
        }

        Ok(Self {
            texture_path: document.texture_path,
            tile_size: document.tile_size,
            grid_size: document.grid_size,
            spacing: document.spacing,
            margin: document.margin,
            tiles,
        })
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LumenError::ResourceNotFound(path.display().to_string()));
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Tileset2D {
        let mut tileset = Tileset2D::new("tiles.png", IVec2::new(16, 16), IVec2::new(4, 2));
        tileset.spacing = 2;
        tileset.margin = 1;
        tileset
    }

    #[test]
    fn texture_region_accounts_for_margin_and_spacing() {
        let region = sheet().calculate_texture_region(IVec2::new(2, 1));
        assert_eq!(region, Vec4::new(37.0, 19.0, 16.0, 16.0));
    }

    #[test]
    fn normalized_region_is_clamped() {
        let tileset = sheet();
        let region = tileset.normalized_region(IVec2::new(3, 0), IVec2::new(64, 64));
        assert!((region.x - 55.0 / 64.0).abs() < 1e-6);
        assert!((region.x + region.z - 1.0).abs() < 1e-6);
        assert_eq!(
            tileset.normalized_region(IVec2::ZERO, IVec2::ZERO),
            Vec4::new(0.0, 0.0, 1.0, 1.0)
        );
    }

    #[test]
    fn grid_generation_is_row_major() {
        let mut tileset = sheet();
        tileset.generate_tiles_from_grid();
        assert_eq!(tileset.tile_count(), 8);
        assert_eq!(tileset.grid_position_from_id(5), IVec2::new(1, 1));
        assert_eq!(tileset.id_from_grid_position(IVec2::new(3, 1)), 7);
        assert_eq!(tileset.tile_at(IVec2::new(1, 1)).map(|t| t.id), Some(5));
    }

    #[test]
    fn unknown_data_type_is_rejected() {
        let raw = serde_json::json!({"type": 9, "value": 1});
        assert!(serde_json::from_value::<TileDataValue>(raw).is_err());
    }

    #[test]
    fn wrong_document_type_is_rejected() {
        let json = r#"{"type":"TilemapProject","version":"1.0","texture_path":"",
            "tile_size":[1,1],"grid_size":[1,1],"spacing":0,"margin":0,"tiles":[]}"#;
        assert!(matches!(
            Tileset2D::from_json(json),
            Err(LumenError::InvalidFormat { .. })
        ));
    }
}
