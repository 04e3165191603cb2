//! Layered tilemap projects.
//!
//! A project is a stack of equally sized layers plus the tilesets their
//! cells refer to. Layers serialize their cells row-major, with `null` for
//! empty cells.

use std::collections::BTreeMap;
use std::path::Path;

use glam::{IVec2, Vec4};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LumenError, Result};

const PROJECT_TYPE: &str = "TilemapProject";
const PROJECT_VERSION: &str = "1.0";
const DEFAULT_LAYER_NAME: &str = "Background";
/// Largest layer, in cells, a project file may declare.
pub const MAX_MAP_CELLS: usize = 2048 * 2048;

// ============================================================================
// Cells
// ============================================================================

/// Per-cell overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileMetadata {
    pub tags: BTreeMap<String, String>,
    pub properties: BTreeMap<String, f32>,
    pub data: BTreeMap<String, String>,
    pub collision_enabled: bool,
    pub opacity: f32,
    pub tint: Vec4,
}

impl Default for TileMetadata {
    fn default() -> Self {
        Self {
            tags: BTreeMap::new(),
            properties: BTreeMap::new(),
            data: BTreeMap::new(),
            collision_enabled: false,
            opacity: 1.0,
            tint: Vec4::ONE,
        }
    }
}

/// One placed tile. A negative `tile_id` marks an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileInstance {
    pub tile_id: i32,
    pub tileset_id: i32,
    pub metadata: TileMetadata,
}

impl Default for TileInstance {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl TileInstance {
    pub const EMPTY: Self = Self {
        tile_id: -1,
        tileset_id: 0,
        metadata: TileMetadata {
            tags: BTreeMap::new(),
            properties: BTreeMap::new(),
            data: BTreeMap::new(),
            collision_enabled: false,
            opacity: 1.0,
            tint: Vec4::ONE,
        },
    };

    #[must_use]
    pub fn new(tile_id: i32, tileset_id: i32) -> Self {
        Self {
            tile_id,
            tileset_id,
            ..Self::EMPTY
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tile_id < 0
    }

    fn same_tile(&self, other: &Self) -> bool {
        self.tile_id == other.tile_id && self.tileset_id == other.tileset_id
    }
}

// ============================================================================
// Layers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TilemapLayer {
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    opacity: f32,
    size: IVec2,
    tiles: Vec<TileInstance>,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct LayerDocument {
    name: String,
    visible: bool,
    locked: bool,
    opacity: f32,
    size: Option<IVec2>,
    tiles: Vec<Option<Value>>,
}

impl Default for LayerDocument {
    fn default() -> Self {
        Self {
            name: "Layer".to_string(),
            visible: true,
            locked: false,
            opacity: 1.0,
            size: None,
            tiles: Vec::new(),
        }
    }
}

fn cell_count(size: IVec2) -> usize {
    (size.x.max(0) as usize).saturating_mul(size.y.max(0) as usize)
}

fn check_size(size: IVec2) -> Result<()> {
    if size.x < 0 || size.y < 0 || cell_count(size) > MAX_MAP_CELLS {
        return Err(LumenError::ResourceInvalid(format!(
            "tilemap size {}x{} is out of range",
            size.x, size.y
        )));
    }
    Ok(())
}

impl TilemapLayer {
    #[must_use]
    pub fn new(name: impl Into<String>, size: IVec2) -> Self {
        Self {
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 1.0,
            size,
            tiles: vec![TileInstance::EMPTY; cell_count(size)],
        }
    }

    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    #[must_use]
    pub fn size(&self) -> IVec2 {
        self.size
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && x < self.size.x && y >= 0 && y < self.size.y)
            .then(|| (y * self.size.x + x) as usize)
    }

    /// Keeps the overlapping top-left region.
    pub fn resize(&mut self, new_size: IVec2) {
        let mut tiles = vec![TileInstance::EMPTY; cell_count(new_size)];
        for y in 0..self.size.y.min(new_size.y) {
            for x in 0..self.size.x.min(new_size.x) {
                let old = (y * self.size.x + x) as usize;
                let new = (y * new_size.x + x) as usize;
                tiles[new] = std::mem::take(&mut self.tiles[old]);
            }
        }
        self.size = new_size;
        self.tiles = tiles;
    }

    /// The cell at `(x, y)`; the empty tile outside the layer.
    #[must_use]
    pub fn tile(&self, x: i32, y: i32) -> &TileInstance {
        static EMPTY_TILE: TileInstance = TileInstance::EMPTY;
        self.index(x, y).map_or(&EMPTY_TILE, |i| &self.tiles[i])
    }

    /// Out-of-range writes are ignored.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: TileInstance) {
        if let Some(i) = self.index(x, y) {
            self.tiles[i] = tile;
        }
    }

    pub fn clear_tile(&mut self, x: i32, y: i32) {
        self.set_tile(x, y, TileInstance::EMPTY);
    }

    pub fn clear(&mut self) {
        self.tiles.fill(TileInstance::EMPTY);
    }

    pub fn fill(&mut self, tile: &TileInstance) {
        self.tiles.fill(tile.clone());
    }

    /// Replaces the 4-connected region of cells matching the one at
    /// `(x, y)` (same tile and tileset) with `tile`.
    pub fn flood_fill(&mut self, x: i32, y: i32, tile: &TileInstance) {
        let Some(start) = self.index(x, y) else {
            return;
        };
        let target = self.tiles[start].clone();
        if target.same_tile(tile) {
            return;
        }

        let mut stack = vec![IVec2::new(x, y)];
        while let Some(p) = stack.pop() {
            let Some(i) = self.index(p.x, p.y) else {
                continue;
            };
            if !self.tiles[i].same_tile(&target) {
                continue;
            }
            self.tiles[i] = tile.clone();
            stack.extend([
                p + IVec2::X,
                p - IVec2::X,
                p + IVec2::Y,
                p - IVec2::Y,
            ]);
        }
    }

    /// Occupied cells as `(x, y, tile)`, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32, &TileInstance)> {
        let width = self.size.x.max(1);
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_empty())
            .map(move |(i, t)| (i as i32 % width, i as i32 / width, t))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.iter().all(TileInstance::is_empty)
    }

    fn to_document(&self) -> Result<LayerDocument> {
        let tiles = self
            .tiles
            .iter()
            .map(|t| (!t.is_empty()).then(|| serde_json::to_value(t)).transpose())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(LayerDocument {
            name: self.name.clone(),
            visible: self.visible,
            locked: self.locked,
            opacity: self.opacity,
            size: Some(self.size),
            tiles,
        })
    }

    /// `size` is used when the document has none.
    fn from_document(document: LayerDocument, size: IVec2) -> Result<Self> {
        let size = document.size.unwrap_or(size);
        check_size(size)?;
        let mut layer = Self::new(document.name, size);
        layer.visible = document.visible;
        layer.locked = document.locked;
        layer.opacity = document.opacity;
        for (cell, value) in layer.tiles.iter_mut().zip(document.tiles) {
            *cell = match value {
                Some(value) => serde_json::from_value(value).unwrap_or_else(|err| {
                    log::warn!("Malformed tile cell: {err}");
                    TileInstance::EMPTY
                }),
                None => TileInstance::EMPTY,
            };
        }
        Ok(layer)
    }
}

// ============================================================================
// Tileset references
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilesetReference {
    pub id: i32,
    pub name: String,
    /// Path of the tileset document.
    pub path: String,
    pub tile_size: IVec2,
    pub grid_size: IVec2,
    pub spacing: i32,
    pub margin: i32,
}

impl Default for TilesetReference {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            path: String::new(),
            tile_size: IVec2::splat(32),
            grid_size: IVec2::ONE,
            spacing: 0,
            margin: 0,
        }
    }
}

impl TilesetReference {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }
}

// ============================================================================
// TilemapProject
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TilemapProject {
    pub name: String,
    pub tile_size: IVec2,
    pub background_color: Vec4,
    size: IVec2,
    tilesets: Vec<TilesetReference>,
    layers: Vec<TilemapLayer>,
    active_layer: usize,
    next_tileset_id: i32,
}

#[derive(Serialize, Deserialize)]
struct ProjectDocument {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<IVec2>,
    #[serde(default)]
    tile_size: Option<IVec2>,
    #[serde(default)]
    background_color: Option<Vec4>,
    #[serde(default)]
    active_layer: usize,
    #[serde(default)]
    tilesets: Vec<Value>,
    #[serde(default)]
    layers: Vec<LayerDocument>,
}

impl Default for TilemapProject {
    fn default() -> Self {
        let size = IVec2::new(20, 15);
        Self {
            name: "Untitled Tilemap".to_string(),
            tile_size: IVec2::splat(32),
            background_color: Vec4::new(0.2, 0.2, 0.2, 1.0),
            size,
            tilesets: Vec::new(),
            layers: vec![TilemapLayer::new(DEFAULT_LAYER_NAME, size)],
            active_layer: 0,
            next_tileset_id: 1,
        }
    }
}

impl TilemapProject {
    #[must_use]
    pub fn new(name: impl Into<String>, size: IVec2) -> Self {
        Self {
            name: name.into(),
            size,
            layers: vec![TilemapLayer::new(DEFAULT_LAYER_NAME, size)],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn size(&self) -> IVec2 {
        self.size
    }

    /// Resizes every layer.
    pub fn set_size(&mut self, size: IVec2) {
        self.size = size;
        for layer in &mut self.layers {
            layer.resize(size);
        }
    }

    // ========================================================================
    // Tilesets
    // ========================================================================

    /// Registers a tileset under a fresh id and returns it.
    pub fn add_tileset(&mut self, mut tileset: TilesetReference) -> i32 {
        tileset.id = self.next_tileset_id;
        self.next_tileset_id += 1;
        self.tilesets.push(tileset);
        self.next_tileset_id - 1
    }

    /// Removes the reference and clears every cell that used it.
    pub fn remove_tileset(&mut self, id: i32) {
        let before = self.tilesets.len();
        self.tilesets.retain(|t| t.id != id);
        if self.tilesets.len() == before {
            return;
        }
        for layer in &mut self.layers {
            for cell in &mut layer.tiles {
                if !cell.is_empty() && cell.tileset_id == id {
                    *cell = TileInstance::EMPTY;
                }
            }
        }
    }

    #[must_use]
    pub fn tileset(&self, id: i32) -> Option<&TilesetReference> {
        self.tilesets.iter().find(|t| t.id == id)
    }

    pub fn tileset_mut(&mut self, id: i32) -> Option<&mut TilesetReference> {
        self.tilesets.iter_mut().find(|t| t.id == id)
    }

    #[must_use]
    pub fn tilesets(&self) -> &[TilesetReference] {
        &self.tilesets
    }

    // ========================================================================
    // Layers
    // ========================================================================

    /// Appends an empty layer and returns its index.
    pub fn add_layer(&mut self, name: impl Into<String>) -> usize {
        self.layers.push(TilemapLayer::new(name, self.size));
        self.layers.len() - 1
    }

    /// Removes a layer. The project always keeps at least one.
    pub fn remove_layer(&mut self, index: usize) {
        if index >= self.layers.len() {
            return;
        }
        self.layers.remove(index);
        if self.active_layer >= index && self.active_layer > 0 {
            self.active_layer -= 1;
        }
        if self.layers.is_empty() {
            self.layers.push(TilemapLayer::new(DEFAULT_LAYER_NAME, self.size));
            self.active_layer = 0;
        }
    }

    /// Moves a layer, keeping the same layer active.
    pub fn move_layer(&mut self, from: usize, to: usize) {
        let len = self.layers.len();
        if from >= len || to >= len || from == to {
            return;
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);

        let active = self.active_layer;
        if active == from {
            self.active_layer = to;
        } else if from < active && to >= active {
            self.active_layer -= 1;
        } else if from > active && to <= active {
            self.active_layer += 1;
        }
    }

    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&TilemapLayer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut TilemapLayer> {
        self.layers.get_mut(index)
    }

    pub fn layer_by_name(&mut self, name: &str) -> Option<&mut TilemapLayer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }

    /// Bottom to top.
    #[must_use]
    pub fn layers(&self) -> &[TilemapLayer] {
        &self.layers
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn active_layer_index(&self) -> usize {
        self.active_layer
    }

    /// Out-of-range indices are ignored.
    pub fn set_active_layer_index(&mut self, index: usize) {
        if index < self.layers.len() {
            self.active_layer = index;
        }
    }

    pub fn active_layer_mut(&mut self) -> Option<&mut TilemapLayer> {
        self.layers.get_mut(self.active_layer)
    }

    /// Empties every layer.
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(TilemapLayer::is_empty)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn to_json(&self) -> Result<String> {
        let document = ProjectDocument {
            kind: PROJECT_TYPE.to_string(),
            version: PROJECT_VERSION.to_string(),
            name: Some(self.name.clone()),
            size: Some(self.size),
            tile_size: Some(self.tile_size),
            background_color: Some(self.background_color),
            active_layer: self.active_layer,
            tilesets: self
                .tilesets
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<_, _>>()?,
            layers: self
                .layers
                .iter()
                .map(TilemapLayer::to_document)
                .collect::<Result<_>>()?,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Parses a project document. Missing fields take their defaults,
    /// malformed tileset entries are skipped, and an empty layer list
    /// yields the default layer.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: ProjectDocument = serde_json::from_str(json)?;
        if document.kind != PROJECT_TYPE {
            return Err(LumenError::InvalidFormat {
                expected: PROJECT_TYPE,
                found: document.kind,
            });
        }

        let defaults = Self::default();
        let size = document.size.unwrap_or(defaults.size);
        check_size(size)?;

        let mut tilesets = Vec::with_capacity(document.tilesets.len());
        let mut next_tileset_id = 1;
        for value in document.tilesets {
            match serde_json::from_value::<TilesetReference>(value) {
                Ok(tileset) => {
                    next_tileset_id = next_tileset_id.max(tileset.id + 1);
                    tilesets.push(tileset);
                }
                Err(err) => log::warn!("Skipping malformed tileset reference: {err}"),
            }
        }

        let mut layers: Vec<_> = document
            .layers
            .into_iter()
            .map(|l| TilemapLayer::from_document(l, size))
            .collect::<Result<_>>()?;
        let mut active_layer = document.active_layer;
        if layers.is_empty() {
            layers.push(TilemapLayer::new(DEFAULT_LAYER_NAME, size));
            active_layer = 0;
        }
        if active_layer >= layers.len() {
            active_layer = 0;
        }

        Ok(Self {
            name: document.name.unwrap_or(defaults.name),
            tile_size: document.tile_size.unwrap_or(defaults.tile_size),
            background_color: document.background_color.unwrap_or(defaults.background_color),
            size,
            tilesets,
            layers,
            active_layer,
            next_tileset_id,
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

    #[test]
    fn oversized_project_is_rejected() {
        let json = r#"{"type":"TilemapProject","size":[2000000000,2000000000]}"#;
        assert!(matches!(
            TilemapProject::from_json(json),
            Err(LumenError::ResourceInvalid(_))
        ));
        assert_eq!(cell_count(IVec2::splat(i32::MAX)), (i32::MAX as usize).pow(2));
    }

    #[test]
    fn flood_fill_is_four_connected() {
        let mut layer = TilemapLayer::new("L", IVec2::new(4, 4));
        // Diagonal wall splits the layer.
        for i in 0..4 {
            layer.set_tile(i, i, TileInstance::new(9, 1));
        }
        layer.flood_fill(0, 3, &TileInstance::new(2, 1));
        assert_eq!(layer.tile(0, 3).tile_id, 2);
        assert_eq!(layer.tile(1, 2).tile_id, 2);
        assert_eq!(layer.tile(3, 0).tile_id, -1);
        assert_eq!(layer.tile(2, 2).tile_id, 9);
    }

    #[test]
    fn resize_keeps_overlap() {
        let mut layer = TilemapLayer::new("L", IVec2::new(3, 3));
        layer.set_tile(1, 1, TileInstance::new(4, 1));
        layer.set_tile(2, 2, TileInstance::new(5, 1));
        layer.resize(IVec2::new(2, 4));
        assert_eq!(layer.tile(1, 1).tile_id, 4);
        assert!(layer.tile(2, 2).is_empty());
        assert_eq!(layer.occupied().count(), 1);
    }

    #[test]
    fn removing_last_layer_recreates_default() {
        let mut project = TilemapProject::default();
        project.remove_layer(0);
        assert_eq!(project.layer_count(), 1);
        assert_eq!(project.layers()[0].name, DEFAULT_LAYER_NAME);
    }

    #[test]
    fn moving_layers_tracks_active() {
        let mut project = TilemapProject::default();
        project.add_layer("A");
        project.add_layer("B");
        project.set_active_layer_index(1);
        project.move_layer(0, 2);
        assert_eq!(project.active_layer_index(), 0);
        assert_eq!(project.layers()[0].name, "A");
    }

    #[test]
    fn removing_tileset_clears_its_cells() {
        let mut project = TilemapProject::default();
        let a = project.add_tileset(TilesetReference::new("a", "a.tileset"));
        let b = project.add_tileset(TilesetReference::new("b", "b.tileset"));
        if let Some(layer) = project.layer_mut(0) {
            layer.set_tile(0, 0, TileInstance::new(1, a));
            layer.set_tile(1, 0, TileInstance::new(1, b));
        }
        project.remove_tileset(a);
        assert!(project.layers()[0].tile(0, 0).is_empty());
        assert_eq!(project.layers()[0].tile(1, 0).tileset_id, b);
    }

    #[test]
    fn empty_cells_serialize_as_null() -> Result<()> {
        let mut project = TilemapProject::new("map", IVec2::new(2, 1));
        if let Some(layer) = project.layer_mut(0) {
            layer.set_tile(1, 0, TileInstance::new(3, 1));
        }
        let value: Value = serde_json::from_str(&project.to_json()?)?;
        let tiles = &value["layers"][0]["tiles"];
        assert!(tiles[0].is_null());
        assert_eq!(tiles[1]["tile_id"], 3);
        Ok(())
    }
}
