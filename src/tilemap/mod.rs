//! Tilemap data formats.
//!
//! [`Tileset2D`] documents slice a texture into tiles,
//! [`TilemapProject`] documents hold layered grids of tile instances, and
//! [`export`] writes painted 2.5D faces as OBJ with an optional atlas.

pub mod export;
pub mod project;
pub mod tileset;

pub use export::{ExportedFiles, PaintedFace, TextureAtlas, export_obj};
pub use project::{TileInstance, TileMetadata, TilemapLayer, TilemapProject, TilesetReference};
pub use tileset::{TileCollisionShape, TileCollisionType, TileData, TileDataValue, Tileset2D};
