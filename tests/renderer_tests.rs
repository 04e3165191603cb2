//! Renderer Frame Tests
//!
//! Tests for:
//! - Pass order and node routing (3D, 2D world, screen space)
//! - Frame clearing with project and settings colors
//! - Skipped draws and per-pass statistics
//! - Skybox draws restoring device state
//! - Shadow pass bookkeeping and slot order
//! - Skinning palette resets between draws
//! - Frame determinism, direct and batched text submission

use glam::{Mat4, Vec2, Vec3, Vec4};

use lumen::device::{DeviceCommand, DeviceLog, GraphicsDevice, HeadlessDevice, UniformValue};
use lumen::lighting::{LightType, LightingSystem};
use lumen::renderer::{RenderCommand, RenderContext, RenderPass};
use lumen::resources::{FontSource, ResourceCache};
use lumen::scene::{ControlRect, NodeKind};
use lumen::settings::{ShadowQuality, TextureFilter};
use lumen::skybox::Skybox3D;
use lumen::text::{GlyphInstance, TextRenderParams, TextRenderer};
use lumen::{
    Camera, ColorRect, Component, DirectionalLight, Mesh, MeshInstance3D, OmniLight, ProjectSettings,
    Renderer, RendererSettings, RenderingContext, Scene, SkinnedMesh3D, Sprite3D,
};

const EPSILON: f32 = 1e-4;

fn approx_vec4(a: Vec4, b: Vec4) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn renderer() -> (Renderer, DeviceLog) {
    let log = DeviceLog::default();
    let mut renderer = Renderer::new(RendererSettings::default());
    renderer
        .initialize(Some(Box::new(HeadlessDevice::with_log(log.clone()))))
        .expect("headless device initializes");
    log.take();
    (renderer, log)
}

fn mixed_scene() -> Scene {
    let mut scene = Scene::new("mixed");
    let root = scene.root();

    let cube = scene.add_child(root, "Cube", NodeKind::node3d());
    scene.add_component(cube, Box::new(MeshInstance3D::default()));

    let panel = scene.add_child(root, "Panel", NodeKind::node2d());
    scene.add_component(panel, Box::new(ColorRect::new(Vec4::new(1.0, 0.0, 0.0, 1.0))));

    let hud = scene.add_child(
        root,
        "Hud",
        NodeKind::control(ControlRect::new(Vec2::new(50.0, 20.0), Vec2::new(100.0, 40.0)), false),
    );
    scene.add_component(hud, Box::new(ColorRect::new(Vec4::ONE).with_corner_radius(4.0)));
    scene
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn renderer_initialize_is_idempotent() {
    let (mut renderer, _log) = renderer();
    assert!(renderer.is_initialized());
    assert!(renderer.initialize(None).is_ok());
    assert!(renderer.white_texture().is_some());
}

#[test]
fn renderer_frame_before_initialize_is_ignored() {
    let mut renderer = Renderer::new(RendererSettings::default());
    let mut scene = mixed_scene();
    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert_eq!(renderer.stats().total_drawn(), 0);
}

#[test]
fn renderer_shutdown_releases_device() {
    let (mut renderer, _log) = renderer();
    renderer.shutdown();
    assert!(!renderer.is_initialized());
    assert!(renderer.white_texture().is_none());
}

// ============================================================================
// Frame Protocol Tests
// ============================================================================

#[test]
fn frame_routes_nodes_to_their_pass() {
    let (mut renderer, _log) = renderer();
    let mut scene = mixed_scene();
    renderer.render_scene_with_cameras(&mut scene, None, true);

    let stats = renderer.stats();
    assert_eq!(stats.pass(RenderPass::World3D).drawn, 1);
    assert_eq!(stats.pass(RenderPass::World2D).drawn, 1);
    assert_eq!(stats.pass(RenderPass::Screen).drawn, 1);
    assert_eq!(stats.total_skipped(), 0);
    assert_eq!(renderer.queue_len(), 0);
}

#[test]
fn frame_draws_3d_before_2d_before_screen() {
    let (mut renderer, log) = renderer();
    let mut scene = mixed_scene();
    renderer.render_scene_with_cameras(&mut scene, None, true);

    let draws = log.color_draws();
    assert_eq!(draws.len(), 3);
    // The mesh uses lighting; the two quads do not set the flag at all.
    assert_eq!(draws[0].uniform("uUseLighting"), Some(UniformValue::Int(1)));
    assert_eq!(draws[2].uniform("useCornerRadius"), Some(UniformValue::Int(1)));
    assert!(!draws[1].state.depth_test);
}

#[test]
fn frame_clears_with_project_background() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new("empty");
    let project = ProjectSettings {
        background_color: Some([0.1, 0.2, 0.3, 1.0]),
        ..ProjectSettings::default()
    };
    renderer.render_scene_with_cameras(&mut scene, Some(&project), true);

    let clear = log.commands().into_iter().find_map(|cmd| match cmd {
        DeviceCommand::Clear { color, target: None, .. } => Some(color),
        _ => None,
    });
    let color = clear.expect("frame cleared");
    assert!(approx_vec4(color, Vec4::new(0.1, 0.2, 0.3, 1.0)));
}

#[test]
fn frame_clears_with_settings_color_without_project() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new("empty");
    renderer.render_scene_with_cameras(&mut scene, None, true);

    let expected = renderer.settings().clear_color();
    let cleared = log.commands().into_iter().any(|cmd| {
        matches!(cmd, DeviceCommand::Clear { color, target: None, .. } if approx_vec4(color, expected))
    });
    assert!(cleared);
}

#[test]
fn frame_without_clear_leaves_target() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new("empty");
    renderer.render_scene_with_cameras(&mut scene, None, false);
    assert!(
        !log.commands()
            .iter()
            .any(|cmd| matches!(cmd, DeviceCommand::Clear { target: None, .. }))
    );
}

#[test]
fn render_scene_uses_a_single_pass() {
    let (mut renderer, _log) = renderer();
    let mut scene = mixed_scene();
    let mut camera = Camera::default_3d(4.0 / 3.0);
    renderer.render_scene(&mut scene, &mut camera, true);

    assert_eq!(renderer.stats().pass(RenderPass::World3D).drawn, 3);
    assert_eq!(renderer.stats().pass(RenderPass::Screen).drawn, 0);
}

#[test]
fn editor_2d_context_hides_3d_content() {
    let (mut renderer, _log) = renderer();
    renderer.set_rendering_context(RenderingContext::Editor2D);
    let mut scene = mixed_scene();
    renderer.render_scene_with_cameras(&mut scene, None, true);

    assert_eq!(renderer.stats().pass(RenderPass::World3D).drawn, 0);
    assert_eq!(renderer.stats().pass(RenderPass::World2D).drawn, 1);
}

#[test]
fn disabled_component_submits_nothing() {
    let (mut renderer, _log) = renderer();
    let mut scene = Scene::new("disabled");
    let root = scene.root();
    let panel = scene.add_child(root, "Panel", NodeKind::node2d());
    let rect = ColorRect {
        enabled: false,
        ..ColorRect::default()
    };
    scene.add_component(panel, Box::new(rect));

    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert_eq!(renderer.stats().total_drawn(), 0);
}

// ============================================================================
// Flush Tests
// ============================================================================

#[test]
fn flush_skips_commands_without_geometry() {
    let (mut renderer, log) = renderer();
    renderer.begin_frame(None);
    renderer.submit(RenderCommand::default());
    renderer.submit(RenderCommand::default());
    renderer.end_frame();

    assert_eq!(renderer.stats().total_skipped(), 2);
    assert_eq!(renderer.stats().total_drawn(), 0);
    assert!(log.color_draws().is_empty());
}

#[test]
fn flush_leaves_depth_test_enabled() {
    let (mut renderer, _log) = renderer();
    let mut scene = mixed_scene();
    renderer.render_scene_with_cameras(&mut scene, None, true);
    let device = renderer.device_mut().expect("device");
    assert!(device.state().depth_test);
}

#[test]
fn skybox_draw_restores_device_state() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new("sky");
    let root = scene.root();
    let sky = scene.add_child(root, "Sky", NodeKind::node3d());
    scene.add_component(sky, Box::new(Skybox3D::solid(Vec4::new(0.2, 0.4, 0.8, 1.0))));
    let cube = scene.add_child(root, "Cube", NodeKind::node3d());
    scene.add_component(cube, Box::new(MeshInstance3D::default()));

    renderer.render_scene_with_cameras(&mut scene, None, true);

    let draws = log.color_draws();
    assert_eq!(draws.len(), 2);
    let sky_draw = &draws[0];
    assert_eq!(sky_draw.uniform("skyboxMode"), Some(UniformValue::Int(0)));
    assert!(!sky_draw.state.depth_test);
    assert!(!sky_draw.state.depth_write);
    assert_eq!(sky_draw.count, 36);

    let mesh_draw = &draws[1];
    assert!(mesh_draw.state.depth_test);
    assert!(mesh_draw.state.depth_write);
}

// ============================================================================
// Shadow Tests
// ============================================================================

#[test]
fn directional_light_renders_one_shadow_slice() {
    let (mut renderer, log) = renderer();
    let mut scene = mixed_scene();
    let root = scene.root();
    let sun = scene.add_child(root, "Sun", NodeKind::node3d());
    scene.add_component(sun, Box::new(DirectionalLight::new()));

    renderer.render_scene_with_cameras(&mut scene, None, true);

    assert_eq!(renderer.lighting().light_count(), 1);
    assert_eq!(renderer.lighting().lights()[0].shadow_map_index, 0);
    assert_eq!(renderer.lighting().light_space_matrices().len(), 1);

    let shadow = renderer.stats().shadow;
    assert_eq!(shadow.slices_rendered, 1);
    assert_eq!(shadow.caster_draws, 1);

    let depth_draws = log
        .commands()
        .into_iter()
        .filter(|cmd| matches!(cmd, DeviceCommand::Draw(d) if d.is_depth_only()))
        .count();
    assert_eq!(depth_draws, 1);
}

#[test]
fn skybox_sun_joins_light_list() {
    let (mut renderer, _log) = renderer();
    let mut scene = Scene::new("sky");
    let root = scene.root();
    let sky = scene.add_child(root, "Sky", NodeKind::node3d());
    scene.add_component(sky, Box::new(Skybox3D::new()));

    renderer.render_scene_with_cameras(&mut scene, None, true);

    let lights = renderer.lighting().lights();
    assert_eq!(lights.len(), 1);
    let direction = Vec3::from_array(lights[0].direction);
    assert!((direction.length() - 1.0).abs() < EPSILON);
}

#[test]
fn shadow_slots_follow_collection_order() {
    let mut scene = Scene::new("lamps");
    let root = scene.root();
    for i in 0..8 {
        let lamp = scene.add_child(root, format!("Lamp{i}"), NodeKind::node3d());
        scene.add_component(lamp, Box::new(OmniLight::new()));
    }
    let sun = scene.add_child(root, "Sun", NodeKind::node3d());
    scene.add_component(sun, Box::new(DirectionalLight::new()));
    scene.update_transforms();

    let mut lighting = LightingSystem::default();
    lighting.update_from_scene(&scene);

    let lights = lighting.lights();
    assert_eq!(lights.len(), 9);
    // The sun sorts first but was collected after the slots ran out.
    assert_eq!(lights[0].light_type(), LightType::Directional);
    assert_eq!(lights[0].shadow_slot(), None);
    let slots: Vec<Option<u32>> = lights[1..].iter().map(|l| l.shadow_slot()).collect();
    assert_eq!(slots, (0..8).map(Some).collect::<Vec<_>>());
    assert!(lights[1..].iter().all(|l| l.light_type() == LightType::Point));
}

#[test]
fn shadow_quality_change_applies_next_frame() {
    let (mut renderer, _log) = renderer();
    let mut scene = mixed_scene();
    let root = scene.root();
    let sun = scene.add_child(root, "Sun", NodeKind::node3d());
    scene.add_component(sun, Box::new(DirectionalLight::new()));

    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert_eq!(renderer.lighting().shadow_map_size(), Some(2048));

    let project = ProjectSettings {
        shadow_quality: Some(ShadowQuality::High),
        ..ProjectSettings::default()
    };
    renderer.render_scene_with_cameras(&mut scene, Some(&project), true);
    assert_eq!(renderer.lighting().shadow_map_size(), Some(4096));
}

// ============================================================================
// Skinning Tests
// ============================================================================

#[test]
fn skinned_draw_resets_unused_bones_to_identity() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new("skin");
    let root = scene.root();

    let mut posed = SkinnedMesh3D::new(Mesh::cube(1.0));
    posed.set_bone(2, Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)));
    let first = scene.add_child(root, "Posed", NodeKind::node3d());
    scene.add_component(first, Box::new(posed));

    let mut short = SkinnedMesh3D::new(Mesh::cube(1.0));
    short.set_bone(0, Mat4::IDENTITY);
    let second = scene.add_child(root, "Short", NodeKind::node3d());
    scene.add_component(second, Box::new(short));

    renderer.render_scene_with_cameras(&mut scene, None, true);

    let draws = log.color_draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(
        draws[0].uniform("boneTransforms[2]"),
        Some(UniformValue::Mat4(Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0))))
    );
    assert_eq!(draws[1].uniform("boneTransforms[2]"), Some(UniformValue::Mat4(Mat4::IDENTITY)));
}

// ============================================================================
// Sprite3D Tests
// ============================================================================

#[test]
fn sprite3d_draws_in_the_3d_pass() {
    let (mut renderer, log) = renderer();
    let mut scene = Scene::new("billboards");
    let root = scene.root();
    let plain = scene.add_child(root, "Plain", NodeKind::node3d());
    scene.add_component(plain, Box::new(Sprite3D::new("", Vec2::new(2.0, 1.0))));
    let flipped = scene.add_child(root, "Flipped", NodeKind::node3d());
    scene.add_component(
        flipped,
        Box::new(Sprite3D {
            flip_h: true,
            ..Sprite3D::default()
        }),
    );

    renderer.render_scene_with_cameras(&mut scene, None, true);

    assert_eq!(renderer.stats().pass(RenderPass::World3D).drawn, 2);
    assert_eq!(renderer.stats().pass(RenderPass::World2D).drawn, 0);
    let draws = log.color_draws();
    assert!(draws[0].dynamic_vertices.is_none());
    assert!(draws[1].dynamic_vertices.is_some());
}

#[test]
fn editor_2d_context_hides_sprite3d() {
    let (mut renderer, _log) = renderer();
    renderer.set_rendering_context(RenderingContext::Editor2D);
    let mut scene = Scene::new("hidden");
    let root = scene.root();
    let node = scene.add_child(root, "Sprite", NodeKind::node3d());
    scene.add_component(node, Box::new(Sprite3D::default()));

    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert_eq!(renderer.stats().total_drawn(), 0);
}

// ============================================================================
// Determinism Tests
// ============================================================================

#[test]
fn identical_frames_produce_identical_digests() {
    let digest = || {
        let (mut renderer, log) = renderer();
        let mut scene = mixed_scene();
        let root = scene.root();
        let sun = scene.add_child(root, "Sun", NodeKind::node3d());
        scene.add_component(sun, Box::new(DirectionalLight::new()));
        renderer.render_scene_with_cameras(&mut scene, None, true);
        log.frame_digest()
    };
    assert_eq!(digest(), digest());
}

// ============================================================================
// Text Batch Tests
// ============================================================================

#[test]
fn text_batch_defers_glyphs_until_flush() {
    let mut device = HeadlessDevice::new();
    let mut cache = ResourceCache::new(TextureFilter::Bilinear, Some(1.0));
    let mut text = TextRenderer::new(100);
    let mut out: Vec<GlyphInstance> = Vec::new();

    let params = TextRenderParams::new("abc", FontSource::Builtin, 16);
    text.begin_batch(&FontSource::Builtin, 16, &mut out);
    assert!(text.is_batching());
    for origin in [Vec2::ZERO, Vec2::new(0.0, 40.0)] {
        text.add_to_batch(&mut cache, Some(&mut device as &mut dyn GraphicsDevice), &params, origin, &mut out);
    }
    assert!(out.is_empty());
    assert_eq!(text.batch_len(), 6);

    text.end_batch(&mut out);
    assert_eq!(out.len(), 6);
    assert!(!text.is_batching());
    assert_eq!(text.batch_len(), 0);
}

/// Draws a fixed string with the direct glyph walk.
#[derive(Debug)]
struct Caption(&'static str);

impl Component for Caption {
    fn type_name(&self) -> &'static str {
        "Caption"
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        ctx.render_text(self.0, Vec2::ZERO, 1.0, Vec4::ONE, &FontSource::Builtin, 16);
    }
}

#[test]
fn direct_text_advances_by_pixel_advance() {
    let log = DeviceLog::default();
    let mut renderer = Renderer::new(RendererSettings {
        dpi_scale_override: Some(1.0),
        ..RendererSettings::default()
    });
    renderer
        .initialize(Some(Box::new(HeadlessDevice::with_log(log.clone()))))
        .expect("headless device initializes");
    let mut scene = Scene::new("caption");
    let root = scene.root();
    let id = scene.add_child(root, "Caption", NodeKind::node2d());
    scene.add_component(id, Box::new(Caption("aaaaaa")));
    log.take();

    renderer.render_scene_with_cameras(&mut scene, None, true);

    let xs: Vec<f32> = log
        .color_draws()
        .iter()
        .filter_map(|draw| match draw.uniform("model") {
            Some(UniformValue::Mat4(model)) => Some(model.w_axis.x),
            _ => None,
        })
        .collect();
    assert_eq!(xs.len(), 6);
    // Builtin advance is 0.6 em: five steps of 9.6 px.
    assert!((xs[5] - xs[0] - 48.0).abs() <= 1.0);
}

#[test]
fn dpi_change_frees_glyphs_on_next_frame() {
    let (mut renderer, _log) = renderer();
    let mut scene = Scene::new("caption");
    let root = scene.root();
    let id = scene.add_child(root, "Caption", NodeKind::node2d());
    scene.add_component(id, Box::new(Caption("dpi")));

    renderer.render_scene_with_cameras(&mut scene, None, true);
    let scale = renderer.resources().dpi_scale();
    renderer.resources_mut().set_dpi_scale(scale + 1.0);
    assert_eq!(renderer.resources().retired_font_count(), 1);

    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert_eq!(renderer.resources().retired_font_count(), 0);
}
