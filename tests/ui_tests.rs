//! UI and 2D Component Tests
//!
//! Tests for:
//! - Button hover, press and click events
//! - Label and Button submission in the screen pass
//! - Labels with an unresolvable font
//! - ProgressBar track, fill and caption
//! - Sprite2D static and dynamic quad selection

use glam::{Vec2, Vec4};

use lumen::device::{DeviceLog, HeadlessDevice};
use lumen::renderer::RenderPass;
use lumen::scene::{ControlRect, InputEvent, MouseButton, NodeId, NodeKind};
use lumen::components::FillDirection;
use lumen::resources::FontSource;
use lumen::{Button, Label, ProgressBar, Renderer, RendererSettings, Scene, Sprite2D, UiEvent};

fn button_scene() -> (Scene, NodeId) {
    let mut scene = Scene::new("ui");
    let root = scene.root();
    let id = scene.add_child(
        root,
        "Ok",
        NodeKind::control(ControlRect::new(Vec2::new(100.0, 100.0), Vec2::new(80.0, 30.0)), false),
    );
    scene.add_component(id, Box::new(Button::new("OK")));
    scene.update_transforms();
    (scene, id)
}

fn click(scene: &mut Scene, position: Vec2, release_at: Vec2) {
    scene.dispatch_input(&InputEvent::MouseButton {
        button: MouseButton::Left,
        pressed: true,
        position,
    });
    scene.dispatch_input(&InputEvent::MouseButton {
        button: MouseButton::Left,
        pressed: false,
        position: release_at,
    });
}

fn renderer() -> Renderer {
    let mut renderer = Renderer::new(RendererSettings::default());
    renderer
        .initialize(Some(Box::new(HeadlessDevice::with_log(DeviceLog::default()))))
        .expect("init");
    renderer
}

// ============================================================================
// Button Event Tests
// ============================================================================

#[test]
fn button_click_inside_emits_pressed_clicked_released() {
    let (mut scene, id) = button_scene();
    let uuid = scene[id].uuid();

    click(&mut scene, Vec2::new(110.0, 95.0), Vec2::new(120.0, 100.0));

    assert_eq!(
        scene.drain_ui_events(),
        vec![
            UiEvent::Pressed { node: uuid },
            UiEvent::Clicked { node: uuid },
            UiEvent::Released { node: uuid },
        ]
    );
    assert!(scene.drain_ui_events().is_empty());
}

#[test]
fn button_release_outside_does_not_click() {
    let (mut scene, id) = button_scene();
    let uuid = scene[id].uuid();

    click(&mut scene, Vec2::new(100.0, 100.0), Vec2::new(400.0, 400.0));

    let events = scene.drain_ui_events();
    assert_eq!(
        events,
        vec![UiEvent::Pressed { node: uuid }, UiEvent::Released { node: uuid }]
    );
}

#[test]
fn button_press_outside_is_ignored() {
    let (mut scene, _id) = button_scene();
    click(&mut scene, Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
    assert!(scene.drain_ui_events().is_empty());
}

#[test]
fn button_hover_changes_once_per_transition() {
    let (mut scene, id) = button_scene();
    let uuid = scene[id].uuid();

    for position in [Vec2::new(100.0, 100.0), Vec2::new(105.0, 100.0), Vec2::new(500.0, 0.0)] {
        scene.dispatch_input(&InputEvent::MouseMoved {
            position,
            delta: Vec2::ZERO,
        });
    }

    assert_eq!(
        scene.drain_ui_events(),
        vec![
            UiEvent::HoverChanged { node: uuid, hovered: true },
            UiEvent::HoverChanged { node: uuid, hovered: false },
        ]
    );
}

#[test]
fn disabled_button_emits_nothing() {
    let (mut scene, id) = button_scene();
    if let Some(button) = scene[id].get_component_mut::<Button>() {
        button.disabled = true;
    }
    click(&mut scene, Vec2::new(100.0, 100.0), Vec2::new(100.0, 100.0));
    assert!(scene.drain_ui_events().is_empty());
}

// ============================================================================
// Submission Tests
// ============================================================================

#[test]
fn button_draws_in_screen_pass() {
    let mut renderer = renderer();
    let (mut scene, _id) = button_scene();
    renderer.render_scene_with_cameras(&mut scene, None, true);

    let screen = renderer.stats().pass(RenderPass::Screen);
    // Drop shadow and background, then the caption glyphs.
    assert!(screen.drawn >= 2);
    assert_eq!(screen.skipped, 0);
    assert_eq!(renderer.stats().pass(RenderPass::World2D).drawn, 0);
}

#[test]
fn empty_label_submits_nothing() {
    let mut renderer = renderer();
    let mut scene = Scene::new("labels");
    let root = scene.root();
    let id = scene.add_child(
        root,
        "Caption",
        NodeKind::control(ControlRect::new(Vec2::ZERO, Vec2::new(200.0, 40.0)), false),
    );
    scene.add_component(id, Box::new(Label::new("")));

    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert_eq!(renderer.stats().total_drawn(), 0);
}

#[test]
fn label_with_missing_font_still_draws_glyphs() {
    let mut renderer = renderer();
    let mut scene = Scene::new("labels");
    let root = scene.root();
    let id = scene.add_child(
        root,
        "Caption",
        NodeKind::control(ControlRect::new(Vec2::ZERO, Vec2::new(200.0, 40.0)), false),
    );
    scene.add_component(
        id,
        Box::new(Label {
            font: FontSource::Path("/nonexistent/font.ttf".into()),
            ..Label::new("Hello")
        }),
    );

    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert!(renderer.stats().pass(RenderPass::Screen).drawn > 0);
}

fn progress_scene(bar: ProgressBar) -> Scene {
    let mut scene = Scene::new("progress");
    let root = scene.root();
    let id = scene.add_child(
        root,
        "Loading",
        NodeKind::control(ControlRect::new(Vec2::new(10.0, 10.0), Vec2::new(200.0, 24.0)), false),
    );
    scene.add_component(id, Box::new(bar));
    scene
}

#[test]
fn progress_bar_draws_border_track_and_fill() {
    let mut renderer = renderer();
    let mut bar = ProgressBar::new(0.0, 10.0);
    bar.set_value(5.0);
    bar.show_percentage = false;
    let mut scene = progress_scene(bar);

    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert_eq!(renderer.stats().pass(RenderPass::Screen).drawn, 3);
}

#[test]
fn empty_progress_bar_skips_the_fill() {
    let mut renderer = renderer();
    let mut bar = ProgressBar::default();
    bar.border_width = 0.0;
    bar.show_percentage = false;
    bar.fill_direction = FillDirection::TopToBottom;
    let mut scene = progress_scene(bar);

    renderer.render_scene_with_cameras(&mut scene, None, true);
    assert_eq!(renderer.stats().pass(RenderPass::Screen).drawn, 1);
}

#[test]
fn progress_bar_caption_adds_glyph_draws() {
    let mut renderer = renderer();
    let mut bar = ProgressBar::new(0.0, 1.0);
    bar.set_progress(0.25);
    let mut scene = progress_scene(bar);

    renderer.render_scene_with_cameras(&mut scene, None, true);
    // Border, track and fill, then "25%".
    assert!(renderer.stats().pass(RenderPass::Screen).drawn > 3);
}

#[test]
fn sprite_flip_uses_dynamic_quad() {
    let log = DeviceLog::default();
    let mut renderer = Renderer::new(RendererSettings::default());
    renderer
        .initialize(Some(Box::new(HeadlessDevice::with_log(log.clone()))))
        .expect("init");

    let mut scene = Scene::new("sprites");
    let root = scene.root();
    let plain = scene.add_child(root, "Plain", NodeKind::node2d());
    scene.add_component(plain, Box::new(Sprite2D::new("", Vec2::splat(32.0))));
    let flipped = scene.add_child(root, "Flipped", NodeKind::node2d());
    let mut sprite = Sprite2D::new("", Vec2::splat(32.0));
    sprite.flip_h = true;
    sprite.modulate = Vec4::new(1.0, 1.0, 1.0, 0.5);
    scene.add_component(flipped, Box::new(sprite));

    log.take();
    renderer.render_scene_with_cameras(&mut scene, None, true);

    let draws = log.color_draws();
    assert_eq!(draws.len(), 2);
    assert_ne!(draws[0].vertex_array, draws[1].vertex_array);
    assert!(draws[0].dynamic_vertices.is_none());
    assert!(draws[1].dynamic_vertices.is_some());
}
