//! Scene, Camera and Text Tests
//!
//! Tests for:
//! - Node hierarchy (create, reparent, remove, traversal)
//! - 2D world transform propagation
//! - Active camera selection
//! - Camera2D screen/world conversion
//! - Camera projection validation
//! - Text layout measurement, wrapping, justification and caching

use glam::{IVec2, Vec2};

use lumen::camera::{Camera2D, Camera3D, find_active_cameras};
use lumen::resources::{FontSource, ResourceCache};
use lumen::scene::{NodeKind, Transform2D};
use lumen::settings::TextureFilter;
use lumen::text::{HorizontalAlign, TextRenderParams, TextRenderer, VerticalAlign};
use lumen::{Camera, LumenError, Scene, Sprite2D, Tilemap2D};

const EPSILON: f32 = 1e-3;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec2(a: Vec2, b: Vec2) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y)
}

fn node2d_at(x: f32, y: f32) -> NodeKind {
    NodeKind::Node2D(Transform2D::from_position(Vec2::new(x, y)))
}

// ============================================================================
// Hierarchy Tests
// ============================================================================

#[test]
fn scene_pre_order_visits_parents_first() {
    let mut scene = Scene::new("tree");
    let a = scene.create_node("A", NodeKind::Node);
    let b = scene.add_child(a, "B", NodeKind::Node);
    let c = scene.create_node("C", NodeKind::Node);

    let order = scene.pre_order();
    assert_eq!(order, vec![scene.root(), a, b, c]);
}

#[test]
fn scene_remove_node_removes_subtree() {
    let mut scene = Scene::new("tree");
    let a = scene.create_node("A", NodeKind::Node);
    let b = scene.add_child(a, "B", NodeKind::Node);
    scene.remove_node(a);

    assert!(scene.node(a).is_none());
    assert!(scene.node(b).is_none());
    assert!(scene.is_empty());
}

#[test]
fn scene_reparent_rejects_cycles() {
    let mut scene = Scene::new("tree");
    let a = scene.create_node("A", NodeKind::Node);
    let b = scene.add_child(a, "B", NodeKind::Node);

    assert!(!scene.reparent(a, b));
    assert!(scene.reparent(b, scene.root()));
    assert_eq!(scene[b].parent(), Some(scene.root()));
}

#[test]
fn scene_find_by_name_and_uuid() {
    let mut scene = Scene::new("tree");
    let a = scene.create_node("Player", NodeKind::node2d());
    let uuid = scene[a].uuid();

    assert_eq!(scene.find_by_name("Player"), Some(a));
    assert_eq!(scene.find_by_uuid(uuid), Some(a));
    assert_eq!(scene.find_by_name("Missing"), None);
}

#[test]
fn hidden_subtree_is_not_renderable() {
    let mut scene = Scene::new("tree");
    let a = scene.create_node("A", NodeKind::node2d());
    let b = scene.add_child(a, "B", NodeKind::node2d());
    scene[a].visible = false;

    let renderable = scene.renderable_nodes();
    assert!(!renderable.contains(&a));
    assert!(!renderable.contains(&b));
    assert!(scene.active_nodes().contains(&b));
}

#[test]
fn node2d_world_position_accumulates() {
    let mut scene = Scene::new("tree");
    let parent = scene.create_node("Parent", node2d_at(10.0, 5.0));
    let child = scene.add_child(parent, "Child", node2d_at(3.0, -2.0));
    scene.update_transforms();

    assert!(approx_vec2(scene[child].global_position_2d(), Vec2::new(13.0, 3.0)));
}

#[test]
fn components_of_finds_every_instance() {
    let mut scene = Scene::new("tree");
    let a = scene.create_node("A", NodeKind::node2d());
    let b = scene.create_node("B", NodeKind::node2d());
    scene.add_component(a, Box::new(Sprite2D::default()));
    scene.add_component(b, Box::new(Sprite2D::default()));
    scene.add_component(b, Box::new(Tilemap2D::new(IVec2::splat(2), IVec2::splat(8))));

    assert_eq!(scene.components_of::<Sprite2D>().len(), 2);
    assert_eq!(scene.components_of::<Tilemap2D>().len(), 1);
    assert!(scene[b].has_component("Tilemap2D"));
}

// ============================================================================
// Camera Tests
// ============================================================================

#[test]
fn current_camera_wins_over_first() {
    let mut scene = Scene::new("cams");
    let first = scene.create_node("First", NodeKind::node2d());
    let second = scene.create_node("Second", NodeKind::node2d());
    scene.add_component(first, Box::new(Camera2D::new()));
    let mut current = Camera2D::new();
    current.set_current(true);
    scene.add_component(second, Box::new(current));

    let cameras = find_active_cameras(&scene);
    assert_eq!(cameras.camera_2d, Some(second));
    assert_eq!(cameras.camera_3d, None);
}

#[test]
fn first_enabled_camera_is_promoted() {
    let mut scene = Scene::new("cams");
    let disabled = scene.create_node("Disabled", NodeKind::node3d());
    let enabled = scene.create_node("Enabled", NodeKind::node3d());
    let mut off = Camera3D::new();
    off.set_enabled(false);
    scene.add_component(disabled, Box::new(off));
    scene.add_component(enabled, Box::new(Camera3D::new()));

    assert_eq!(find_active_cameras(&scene).camera_3d, Some(enabled));
}

#[test]
fn camera2d_screen_world_round_trip() {
    let mut camera = Camera2D::new();
    camera.set_zoom(2.0);
    let viewport = Vec2::new(800.0, 600.0);
    camera.update_camera_at(Vec2::new(100.0, 50.0), viewport);

    let center = camera.screen_to_world(viewport * 0.5, viewport);
    assert!(approx_vec2(center, Vec2::new(100.0, 50.0)));

    let world = Vec2::new(120.0, 40.0);
    let screen = camera.world_to_screen(world, viewport);
    assert!(approx_vec2(camera.screen_to_world(screen, viewport), world));
}

#[test]
fn camera2d_zoom_is_clamped() {
    let mut camera = Camera2D::new();
    camera.set_zoom(0.0);
    assert!(camera.zoom() > 0.0);
}

// ============================================================================
// Text Layout Tests
// ============================================================================

fn text_setup() -> (TextRenderer, ResourceCache) {
    (
        TextRenderer::new(100),
        ResourceCache::new(TextureFilter::Bilinear, Some(1.0)),
    )
}

#[test]
fn text_width_grows_with_length() {
    let (mut text, mut cache) = text_setup();
    let short = text.measure_text(&mut cache, "ab", &FontSource::Builtin, 16, 0.0);
    let long = text.measure_text(&mut cache, "abcd", &FontSource::Builtin, 16, 0.0);
    assert!(short.x > 0.0);
    assert!(approx(long.x, short.x * 2.0));
}

#[test]
fn text_word_wrap_breaks_lines() {
    let (mut text, mut cache) = text_setup();
    let single = text.measure_text(&mut cache, "lorem", &FontSource::Builtin, 16, 0.0);
    let params = TextRenderParams::new("lorem ipsum dolor", FontSource::Builtin, 16)
        .with_bounds(Vec2::new(single.x * 1.5, 0.0), true);

    let layout = text.calculate_layout(&mut cache, &params);
    assert!(layout.is_valid);
    assert_eq!(layout.lines.len(), 3);
    assert!(layout.lines.iter().all(|line| line.width <= single.x * 1.5 + EPSILON));
}

#[test]
fn text_center_alignment_offsets_lines() {
    let (mut text, mut cache) = text_setup();
    let params = TextRenderParams::new("hi", FontSource::Builtin, 16)
        .with_align(HorizontalAlign::Center, VerticalAlign::Top)
        .with_bounds(Vec2::new(200.0, 0.0), false);

    let layout = text.calculate_layout(&mut cache, &params);
    let line = &layout.lines[0];
    assert!(approx(line.x_offset, (200.0 - line.width) * 0.5));
}

#[test]
fn text_layouts_are_cached() {
    let (mut text, mut cache) = text_setup();
    let params = TextRenderParams::new("cached", FontSource::Builtin, 16);
    assert!(!text.is_layout_cached(&mut cache, &params));
    let _ = text.calculate_layout(&mut cache, &params);
    assert!(text.is_layout_cached(&mut cache, &params));
    assert_eq!(text.cached_layouts(), 1);

    text.clear_cache();
    assert_eq!(text.cached_layouts(), 0);
}

#[test]
fn empty_text_has_no_size() {
    let (mut text, mut cache) = text_setup();
    let size = text.measure_text(&mut cache, "", &FontSource::Builtin, 16, 0.0);
    assert_eq!(size, Vec2::ZERO);
}

#[test]
fn text_justify_stretches_a_single_line() {
    let (mut text, mut cache) = text_setup();
    let params = TextRenderParams::new("aa bb cc", FontSource::Builtin, 16)
        .with_align(HorizontalAlign::Justify, VerticalAlign::Top)
        .with_bounds(Vec2::new(200.0, 0.0), false);

    let layout = text.calculate_layout(&mut cache, &params);
    let line = &layout.lines[0];
    assert!(line.extra_per_space > 0.0);
    assert!(approx(line.width + 2.0 * line.extra_per_space, 200.0));
}

#[test]
fn text_justify_leaves_last_line_ragged() {
    let (mut text, mut cache) = text_setup();
    let params = TextRenderParams::new("aa bb\ncc dd", FontSource::Builtin, 16)
        .with_align(HorizontalAlign::Justify, VerticalAlign::Top)
        .with_bounds(Vec2::new(200.0, 0.0), true);

    let layout = text.calculate_layout(&mut cache, &params);
    assert_eq!(layout.lines.len(), 2);
    assert!(approx(layout.lines[0].width + layout.lines[0].extra_per_space, 200.0));
    assert_eq!(layout.lines[1].extra_per_space, 0.0);
    assert_eq!(layout.lines[1].x_offset, 0.0);
}

#[test]
fn text_zero_width_bound_splits_on_newlines_only() {
    let (mut text, mut cache) = text_setup();
    let params = TextRenderParams::new("one two\nthree", FontSource::Builtin, 16)
        .with_bounds(Vec2::ZERO, true);

    let layout = text.calculate_layout(&mut cache, &params);
    let lines: Vec<&str> = layout.lines.iter().map(|line| line.text.as_str()).collect();
    assert_eq!(lines, ["one two", "three"]);
}

#[test]
fn text_overlong_word_gets_its_own_line() {
    let (mut text, mut cache) = text_setup();
    let word = text.measure_text(&mut cache, "lorem", &FontSource::Builtin, 16, 0.0);
    let params = TextRenderParams::new("a lorem b", FontSource::Builtin, 16)
        .with_bounds(Vec2::new(word.x * 0.5, 0.0), true);

    let layout = text.calculate_layout(&mut cache, &params);
    let lines: Vec<&str> = layout.lines.iter().map(|line| line.text.as_str()).collect();
    assert_eq!(lines, ["a", "lorem", "b"]);
    assert!(approx(layout.lines[1].width, word.x));
}

#[test]
fn text_missing_font_lays_out_with_builtin() {
    let (mut text, mut cache) = text_setup();
    let params = TextRenderParams::new("hello", FontSource::Path("/nonexistent/font.ttf".into()), 16);
    let missing = text.calculate_layout(&mut cache, &params);
    let builtin = text.measure_text(&mut cache, "hello", &FontSource::Builtin, 16, 0.0);

    assert!(missing.is_valid);
    assert!(approx(missing.total_size.x, builtin.x));
}

// ============================================================================
// Camera Projection Tests
// ============================================================================

#[test]
fn perspective_rejects_far_not_beyond_near() -> anyhow::Result<()> {
    let mut camera = Camera::default_3d(16.0 / 9.0);
    camera.set_perspective(1.0, 1.5, 0.5, 50.0)?;

    let err = camera.set_perspective(1.0, 1.5, 10.0, 10.0);
    assert!(matches!(err, Err(LumenError::InvalidProjection(_))));
    assert!(camera.set_perspective(1.0, 1.5, 10.0, 5.0).is_err());

    assert!(approx(camera.near(), 0.5));
    assert!(approx(camera.far(), 50.0));
    Ok(())
}
