//! Tilemap Format Tests
//!
//! Tests for:
//! - Tileset documents (regions, grid ids, save/load)
//! - Tilemap project documents (layers, editing, save/load, size limits)
//! - 2.5D OBJ export with atlas generation
//! - Tilemap2D drawing through the renderer

use std::collections::BTreeMap;
use std::path::PathBuf;

use glam::{IVec2, Vec2, Vec4};

use lumen::device::{DeviceLog, HeadlessDevice};
use lumen::renderer::RenderPass;
use lumen::scene::NodeKind;
use lumen::tilemap::{
    PaintedFace, TileCollisionType, TileData, TileDataValue, TileInstance, TilemapProject,
    Tileset2D, TilesetReference, export_obj,
};
use lumen::{LumenError, Renderer, RendererSettings, Scene, Tilemap2D};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lumen-{name}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    dir
}

fn sample_tileset() -> Tileset2D {
    let mut tileset = Tileset2D::new("tiles.png", IVec2::splat(16), IVec2::new(4, 2));
    tileset.generate_tiles_from_grid();
    tileset
}

// ============================================================================
// Tileset Tests
// ============================================================================

#[test]
fn tileset_grid_ids_are_row_major() {
    let tileset = sample_tileset();
    assert_eq!(tileset.tile_count(), 8);
    assert_eq!(tileset.id_from_grid_position(IVec2::new(1, 1)), 5);
    assert_eq!(tileset.grid_position_from_id(6), IVec2::new(2, 1));
    assert_eq!(tileset.tile_at(IVec2::new(3, 0)).map(|t| t.id), Some(3));
}

#[test]
fn tileset_save_load_keeps_tile_data() -> anyhow::Result<()> {
    let dir = temp_dir("tileset");
    let path = dir.join("terrain.tileset");

    let mut tileset = sample_tileset();
    tileset.spacing = 2;
    let mut tile = TileData::new(9, IVec2::new(0, 0));
    tile.collision.kind = TileCollisionType::Rectangle;
    tile.custom_data.insert("damage".to_string(), TileDataValue::Integer(3));
    tile.custom_data.insert(
        "tint".to_string(),
        TileDataValue::Color(Vec4::new(1.0, 0.5, 0.0, 1.0)),
    );
    tileset.add_tile(tile);

    tileset.save_to_file(&path)?;
    let loaded = Tileset2D::load_from_file(&path)?;

    assert_eq!(loaded.spacing, 2);
    assert_eq!(loaded.tile_count(), tileset.tile_count());
    let tile = loaded.tile(9).expect("tile 9");
    assert_eq!(tile.collision.kind, TileCollisionType::Rectangle);
    assert_eq!(tile.custom_data.get("damage"), Some(&TileDataValue::Integer(3)));

    let _ = std::fs::remove_dir_all(dir);
    Ok(())
}

#[test]
fn project_with_absurd_size_is_rejected() {
    let json = r#"{"type": "TilemapProject", "name": "Huge", "size": [100000, 100000], "layers": []}"#;
    assert!(matches!(
        TilemapProject::from_json(json),
        Err(LumenError::ResourceInvalid(_))
    ));
}

#[test]
fn tileset_missing_file_is_an_error() {
    assert!(Tileset2D::load_from_file("/nonexistent/terrain.tileset").is_err());
}

// ============================================================================
// Project Tests
// ============================================================================

#[test]
fn project_flood_fill_stops_at_other_tiles() {
    let mut project = TilemapProject::new("Level", IVec2::new(5, 5));
    let layer = project.active_layer_mut().expect("layer");
    for y in 0..5 {
        layer.set_tile(2, y, TileInstance::new(1, 1));
    }
    layer.flood_fill(0, 0, &TileInstance::new(7, 1));

    let layer = project.layer(0).expect("layer");
    assert_eq!(layer.tile(1, 4).tile_id, 7);
    assert_eq!(layer.tile(2, 2).tile_id, 1);
    assert!(layer.tile(3, 0).is_empty());
}

#[test]
fn project_save_load_round_trip() -> anyhow::Result<()> {
    let dir = temp_dir("project");
    let path = dir.join("level.tilemap");

    let mut project = TilemapProject::new("Level", IVec2::new(8, 6));
    let tileset = project.add_tileset(TilesetReference::new("Terrain", "terrain.png"));
    let upper = project.add_layer("Decor");
    project.set_active_layer_index(upper);
    if let Some(layer) = project.active_layer_mut() {
        layer.set_tile(3, 2, TileInstance::new(4, tileset));
        layer.set_opacity(0.5);
    }
    project.save_to_file(&path)?;

    let loaded = TilemapProject::load_from_file(&path)?;
    assert_eq!(loaded.name, "Level");
    assert_eq!(loaded.size(), IVec2::new(8, 6));
    assert_eq!(loaded.layer_count(), 2);
    assert_eq!(loaded.active_layer_index(), upper);
    assert_eq!(loaded.tilesets().len(), 1);

    let layer = loaded.layer(upper).expect("decor layer");
    assert_eq!(layer.name, "Decor");
    assert_eq!(layer.tile(3, 2).tile_id, 4);
    assert_eq!(layer.tile(3, 2).tileset_id, tileset);
    assert!((layer.opacity() - 0.5).abs() < 1e-6);

    let _ = std::fs::remove_dir_all(dir);
    Ok(())
}

#[test]
fn project_remove_tileset_clears_its_cells() {
    let mut project = TilemapProject::new("Level", IVec2::new(4, 4));
    let a = project.add_tileset(TilesetReference::new("A", "a.png"));
    let b = project.add_tileset(TilesetReference::new("B", "b.png"));
    if let Some(layer) = project.active_layer_mut() {
        layer.set_tile(0, 0, TileInstance::new(1, a));
        layer.set_tile(1, 0, TileInstance::new(1, b));
    }
    project.remove_tileset(a);

    let layer = project.layer(0).expect("layer");
    assert!(layer.tile(0, 0).is_empty());
    assert_eq!(layer.tile(1, 0).tileset_id, b);
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn export_writes_obj_mtl_and_atlas() -> anyhow::Result<()> {
    let dir = temp_dir("export");
    let path = dir.join("scene.obj");
    let faces = vec![
        PaintedFace {
            tileset_id: 1,
            tile_id: 0,
            ..PaintedFace::default()
        },
        PaintedFace {
            tileset_id: 2,
            tile_id: 3,
            double_sided: false,
            ..PaintedFace::default()
        },
    ];

    let files = export_obj(&path, &faces, &BTreeMap::new(), true)?;
    assert_eq!(files.mtl, Some(dir.join("scene.mtl")));
    assert_eq!(files.atlas, Some(dir.join("scene_atlas.png")));

    let obj = std::fs::read_to_string(&path)?;
    assert!(obj.contains("mtllib scene.mtl"));
    assert!(obj.contains("usemtl atlas_material"));
    assert_eq!(obj.lines().filter(|l| l.starts_with("f ")).count(), 6);

    let mtl = std::fs::read_to_string(dir.join("scene.mtl"))?;
    assert!(mtl.contains("map_Kd scene_atlas.png"));

    let atlas = image::open(dir.join("scene_atlas.png"))?;
    assert_eq!((atlas.width(), atlas.height()), (512, 512));

    let _ = std::fs::remove_dir_all(dir);
    Ok(())
}

#[test]
fn export_without_faces_fails() {
    let dir = temp_dir("export-empty");
    assert!(export_obj(dir.join("empty.obj"), &[], &BTreeMap::new(), true).is_err());
    let _ = std::fs::remove_dir_all(dir);
}

// ============================================================================
// Tilemap2D Tests
// ============================================================================

#[test]
fn tilemap2d_draws_one_quad_per_known_tile() {
    let log = DeviceLog::default();
    let mut renderer = Renderer::new(RendererSettings::default());
    renderer
        .initialize(Some(Box::new(HeadlessDevice::with_log(log.clone()))))
        .expect("init");

    let mut tilemap = Tilemap2D::new(IVec2::splat(4), IVec2::splat(16));
    tilemap.set_tileset(sample_tileset());
    tilemap.set_tile(0, 0, 1);
    tilemap.set_tile(1, 0, 2);
    tilemap.set_tile(2, 2, 42);

    let mut scene = Scene::new("tiles");
    let root = scene.root();
    let node = scene.add_child(root, "Map", NodeKind::node2d());
    scene.add_component(node, Box::new(tilemap));

    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert_eq!(renderer.stats().pass(RenderPass::World2D).drawn, 2);
}

#[test]
fn tilemap2d_cell_corners_follow_rows_downwards() {
    let tilemap = Tilemap2D::new(IVec2::splat(4), IVec2::splat(32));
    assert_eq!(tilemap.map_to_local(IVec2::new(1, 1)), Vec2::new(32.0, -32.0));
    assert_eq!(tilemap.local_to_map(Vec2::new(5.0, -5.0)), IVec2::ZERO);
}
