//! Control components.
//!
//! Controls are sized by their node's rect; on other node kinds the
//! component's own `size` is used. Text is placed from the rect's top-left
//! corner with the first baseline one font size below it.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::renderer::RenderContext;
use crate::resources::FontSource;
use crate::scene::component::{Component, UpdateContext};
use crate::scene::events::{InputEvent, MouseButton, UiEvent};
use crate::scene::export::{ExportField, ExportType, ExportValue};
use crate::scene::node::Node;
use crate::text::{HorizontalAlign, TextRenderParams, VerticalAlign};

const ALIGN_H: &[&str] = &["Left", "Center", "Right", "Justify"];
const ALIGN_V: &[&str] = &["Top", "Center", "Bottom", "Baseline"];

fn owner_size(node: &Node, fallback: Vec2) -> Vec2 {
    node.rect().map_or(fallback, |rect| rect.size)
}

/// First-baseline origin for text boxed in `size` around the owner.
fn text_origin(node: &Node, size: Vec2, font_size: u32) -> Vec2 {
    let center = node.global_transform().w_axis.truncate().truncate();
    center + Vec2::new(-size.x * 0.5, size.y * 0.5 - font_size as f32)
}

fn box_transform(node: &Node, size: Vec2, offset: Vec2) -> Mat4 {
    node.global_transform()
        * Mat4::from_translation(offset.extend(0.0))
        * Mat4::from_scale(Vec3::new(size.x, size.y, 1.0))
}

// ============================================================================
// ColorRect
// ============================================================================

static COLOR_RECT_SCHEMA: &[ExportField] = &[
    ExportField::new("color", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Fill color"),
    ExportField::new("corner_radius", ExportType::Float, ExportValue::Float(0.0), "Corner radius in pixels"),
    ExportField::new("size", ExportType::Vec2, ExportValue::Vec2([100.0, 100.0]), "Size when not on a control"),
];

/// Solid rectangle with optional rounded corners.
#[derive(Debug, Clone)]
pub struct ColorRect {
    pub color: Vec4,
    pub corner_radius: f32,
    pub size: Vec2,
    pub enabled: bool,
}

impl Default for ColorRect {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            corner_radius: 0.0,
            size: Vec2::splat(100.0),
            enabled: true,
        }
    }
}

impl ColorRect {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius.max(0.0);
        self
    }
}

impl Component for ColorRect {
    fn type_name(&self) -> &'static str {
        "ColorRect"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        if !ctx.rendering_context().shows_2d() {
            return;
        }
        let node = ctx.node();
        let size = owner_size(node, self.size);
        let transform = box_transform(node, size, Vec2::ZERO);
        ctx.render_rounded_quad(transform, self.color, self.corner_radius, size, None);
    }

    fn export_schema(&self) -> &'static [ExportField] {
        COLOR_RECT_SCHEMA
    }
}

// ============================================================================
// Label
// ============================================================================

static LABEL_SCHEMA: &[ExportField] = &[
    ExportField::new("text", ExportType::String, ExportValue::String(""), "Displayed text"),
    ExportField::new("font", ExportType::Font, ExportValue::None, "Font; empty uses the built-in font"),
    ExportField::new("font_size", ExportType::Int, ExportValue::Int(16), "Font size in pixels"),
    ExportField::new("color", ExportType::Color, ExportValue::Vec4([1.0, 1.0, 1.0, 1.0]), "Text color"),
    ExportField::new("horizontal_align", ExportType::Enum(ALIGN_H), ExportValue::Enum(0), "Horizontal alignment"),
    ExportField::new("vertical_align", ExportType::Enum(ALIGN_V), ExportValue::Enum(0), "Vertical alignment"),
    ExportField::new("word_wrap", ExportType::Bool, ExportValue::Bool(false), "Wrap at the rect width"),
    ExportField::new("size", ExportType::Vec2, ExportValue::Vec2([200.0, 40.0]), "Bounds when not on a control"),
];

#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    pub font: FontSource,
    pub font_size: u32,
    pub color: Vec4,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    pub line_spacing: f32,
    pub word_wrap: bool,
    pub size: Vec2,
    pub enabled: bool,
}

impl Default for Label {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: FontSource::Builtin,
            font_size: 16,
            color: Vec4::ONE,
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_spacing: 1.0,
            word_wrap: false,
            size: Vec2::new(200.0, 40.0),
            enabled: true,
        }
    }
}

impl Label {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Layout parameters for a box of `bounds`.
    #[must_use]
    pub fn params(&self, bounds: Vec2) -> TextRenderParams {
        let mut params = TextRenderParams::new(self.text.clone(), self.font.clone(), self.font_size)
            .with_color(self.color)
            .with_align(self.horizontal_align, self.vertical_align)
            .with_bounds(bounds, self.word_wrap);
        params.line_spacing = self.line_spacing;
        params
    }
}

impl Component for Label {
    fn type_name(&self) -> &'static str {
        "Label"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        if self.text.is_empty() || !ctx.rendering_context().shows_2d() {
            return;
        }
        let node = ctx.node();
        let size = owner_size(node, self.size);
        let origin = text_origin(node, size, self.font_size);
        ctx.render_text_params(&self.params(size), origin);
    }

    fn export_schema(&self) -> &'static [ExportField] {
        LABEL_SCHEMA
    }
}

// ============================================================================
// Button
// ============================================================================

static BUTTON_SCHEMA: &[ExportField] = &[
    ExportField::new("text", ExportType::String, ExportValue::String("Button"), "Caption"),
    ExportField::new("font_size", ExportType::Int, ExportValue::Int(16), "Caption size in pixels"),
    ExportField::new("normal_color", ExportType::Color, ExportValue::Vec4([0.24, 0.26, 0.31, 1.0]), "Idle background"),
    ExportField::new("hover_color", ExportType::Color, ExportValue::Vec4([0.28, 0.30, 0.36, 1.0]), "Background under the cursor"),
    ExportField::new("pressed_color", ExportType::Color, ExportValue::Vec4([0.20, 0.22, 0.26, 1.0]), "Background while held"),
    ExportField::new("disabled_color", ExportType::Color, ExportValue::Vec4([0.15, 0.16, 0.18, 1.0]), "Background when disabled"),
    ExportField::new("text_color", ExportType::Color, ExportValue::Vec4([0.875, 0.875, 0.875, 1.0]), "Caption color"),
    ExportField::new("corner_radius", ExportType::Float, ExportValue::Float(6.0), "Corner radius in pixels"),
    ExportField::new("disabled", ExportType::Bool, ExportValue::Bool(false), "Ignore input"),
];

const SHADOW_OFFSET: Vec2 = Vec2::new(2.0, -2.0);
const SHADOW_COLOR: Vec4 = Vec4::new(0.0, 0.0, 0.0, 0.3);

/// Clickable control.
///
/// A left press inside the rect emits [`UiEvent::Pressed`]; releasing it
/// inside emits [`UiEvent::Clicked`] followed by [`UiEvent::Released`],
/// outside only `Released`. Hover changes emit [`UiEvent::HoverChanged`].
#[derive(Debug, Clone)]
pub struct Button {
    pub text: String,
    pub font: FontSource,
    pub font_size: u32,
    pub normal_color: Vec4,
    pub hover_color: Vec4,
    pub pressed_color: Vec4,
    pub disabled_color: Vec4,
    pub text_color: Vec4,
    pub corner_radius: f32,
    pub disabled: bool,
    pub size: Vec2,
    pub enabled: bool,
    hovered: bool,
    pressed: bool,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            text: "Button".to_string(),
            font: FontSource::Builtin,
            font_size: 16,
            normal_color: Vec4::new(0.24, 0.26, 0.31, 1.0),
            hover_color: Vec4::new(0.28, 0.30, 0.36, 1.0),
            pressed_color: Vec4::new(0.20, 0.22, 0.26, 1.0),
            disabled_color: Vec4::new(0.15, 0.16, 0.18, 1.0),
            text_color: Vec4::new(0.875, 0.875, 0.875, 1.0),
            corner_radius: 6.0,
            disabled: false,
            size: Vec2::new(120.0, 36.0),
            enabled: true,
            hovered: false,
            pressed: false,
        }
    }
}

impl Button {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    #[must_use]
    pub fn background_color(&self) -> Vec4 {
        if self.disabled {
            self.disabled_color
        } else if self.pressed {
            self.pressed_color
        } else if self.hovered {
            self.hover_color
        } else {
            self.normal_color
        }
    }

    fn contains(node: &Node, size: Vec2, point: Vec2) -> bool {
        match node.rect() {
            Some(rect) => rect.contains(point),
            None => {
                let center = node.global_transform().w_axis.truncate().truncate();
                let d = (point - center).abs();
                d.x <= size.x * 0.5 && d.y <= size.y * 0.5
            }
        }
    }
}

impl Component for Button {
    fn type_name(&self) -> &'static str {
        "Button"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn on_input(&mut self, ctx: &mut UpdateContext<'_>, event: &InputEvent) {
        if self.disabled {
            return;
        }
        let Some(owner) = ctx.owner() else {
            return;
        };
        let node = owner.uuid();

        match *event {
            InputEvent::MouseMoved { position, .. } => {
                let inside = Self::contains(owner, self.size, position);
                if inside != self.hovered {
                    self.hovered = inside;
                    ctx.emit(UiEvent::HoverChanged { node, hovered: inside });
                }
            }
            InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed,
                position,
            } => {
                let inside = Self::contains(owner, self.size, position);
                if pressed {
                    if inside {
                        self.pressed = true;
                        ctx.emit(UiEvent::Pressed { node });
                    }
                } else if self.pressed {
                    self.pressed = false;
                    if inside {
                        ctx.emit(UiEvent::Clicked { node });
                    }
                    ctx.emit(UiEvent::Released { node });
                }
            }
            _ => {}
        }
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        if !ctx.rendering_context().shows_2d() {
            return;
        }
        let node = ctx.node();
        let size = owner_size(node, self.size);

        if !self.pressed {
            let shadow = box_transform(node, size, SHADOW_OFFSET);
            ctx.render_rounded_quad(shadow, SHADOW_COLOR, self.corner_radius, size, None);
        }
        let background = box_transform(node, size, Vec2::ZERO);
        ctx.render_rounded_quad(background, self.background_color(), self.corner_radius, size, None);

        if !self.text.is_empty() {
            let params = TextRenderParams::new(self.text.clone(), self.font.clone(), self.font_size)
                .with_color(self.text_color)
                .with_align(HorizontalAlign::Center, VerticalAlign::Center)
                .with_bounds(size, false);
            let origin = text_origin(node, size, self.font_size);
            ctx.render_text_params(&params, origin);
        }
    }

    fn export_schema(&self) -> &'static [ExportField] {
        BUTTON_SCHEMA
    }
}

// ============================================================================
// ProgressBar
// ============================================================================

const FILL_DIRECTIONS: &[&str] = &["LeftToRight", "RightToLeft", "TopToBottom", "BottomToTop"];

static PROGRESS_BAR_SCHEMA: &[ExportField] = &[
    ExportField::new("value", ExportType::Float, ExportValue::Float(0.0), "Current value"),
    ExportField::new("min_value", ExportType::Float, ExportValue::Float(0.0), "Value of an empty bar"),
    ExportField::new("max_value", ExportType::Float, ExportValue::Float(100.0), "Value of a full bar"),
    ExportField::new("fill_direction", ExportType::Enum(FILL_DIRECTIONS), ExportValue::Enum(0), "Edge the fill grows from"),
    ExportField::new("background_color", ExportType::Color, ExportValue::Vec4([0.15, 0.17, 0.20, 1.0]), "Track color"),
    ExportField::new("fill_color", ExportType::Color, ExportValue::Vec4([0.26, 0.59, 0.98, 1.0]), "Fill color"),
    ExportField::new("border_color", ExportType::Color, ExportValue::Vec4([0.10, 0.12, 0.15, 1.0]), "Outline color"),
    ExportField::new("border_width", ExportType::Float, ExportValue::Float(1.0), "Outline width in pixels"),
    ExportField::new("corner_radius", ExportType::Float, ExportValue::Float(4.0), "Corner radius in pixels"),
    ExportField::new("show_percentage", ExportType::Bool, ExportValue::Bool(true), "Draw the percentage"),
    ExportField::new("custom_text", ExportType::String, ExportValue::String(""), "Caption replacing the percentage"),
    ExportField::new("font_size", ExportType::Int, ExportValue::Int(12), "Caption size in pixels"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillDirection {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

/// Horizontal or vertical gauge over `[min_value, max_value]`.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    value: f32,
    min_value: f32,
    max_value: f32,
    pub fill_direction: FillDirection,
    pub background_color: Vec4,
    pub fill_color: Vec4,
    pub border_color: Vec4,
    pub border_width: f32,
    pub corner_radius: f32,
    pub show_percentage: bool,
    pub custom_text: String,
    pub text_color: Vec4,
    pub font: FontSource,
    pub font_size: u32,
    pub size: Vec2,
    pub enabled: bool,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self {
            value: 0.0,
            min_value: 0.0,
            max_value: 100.0,
            fill_direction: FillDirection::LeftToRight,
            background_color: Vec4::new(0.15, 0.17, 0.20, 1.0),
            fill_color: Vec4::new(0.26, 0.59, 0.98, 1.0),
            border_color: Vec4::new(0.10, 0.12, 0.15, 1.0),
            border_width: 1.0,
            corner_radius: 4.0,
            show_percentage: true,
            custom_text: String::new(),
            text_color: Vec4::new(0.875, 0.875, 0.875, 1.0),
            font: FontSource::Builtin,
            font_size: 12,
            size: Vec2::new(100.0, 20.0),
            enabled: true,
        }
    }
}

impl ProgressBar {
    #[must_use]
    pub fn new(min_value: f32, max_value: f32) -> Self {
        let mut bar = Self::default();
        bar.set_range(min_value, max_value);
        bar
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Clamped to the range.
    pub fn set_value(&mut self, value: f32) {
        self.value = value.clamp(self.min_value, self.max_value);
    }

    #[must_use]
    pub fn range(&self) -> (f32, f32) {
        (self.min_value, self.max_value)
    }

    /// A reversed range collapses to `min_value`.
    pub fn set_range(&mut self, min_value: f32, max_value: f32) {
        self.min_value = min_value;
        self.max_value = max_value.max(min_value);
        self.set_value(self.value);
    }

    /// Fraction in `[0, 1]`; zero for an empty range.
    #[must_use]
    pub fn progress(&self) -> f32 {
        let span = self.max_value - self.min_value;
        if span <= 0.0 {
            return 0.0;
        }
        (self.value - self.min_value) / span
    }

    pub fn set_progress(&mut self, progress: f32) {
        let progress = progress.clamp(0.0, 1.0);
        self.value = self.min_value + progress * (self.max_value - self.min_value);
    }

    /// Caption drawn over the bar, if any.
    #[must_use]
    pub fn caption(&self) -> Option<String> {
        if !self.custom_text.is_empty() {
            Some(self.custom_text.clone())
        } else if self.show_percentage {
            Some(format!("{}%", (self.progress() * 100.0) as i32))
        } else {
            None
        }
    }

    /// Size of the filled part and its centre offset inside a bar of `size`.
    #[must_use]
    pub fn fill_rect(&self, size: Vec2) -> (Vec2, Vec2) {
        let p = self.progress();
        let half = size * 0.5;
        match self.fill_direction {
            FillDirection::LeftToRight => {
                let fill = Vec2::new(size.x * p, size.y);
                (fill, Vec2::new(-half.x + fill.x * 0.5, 0.0))
            }
            FillDirection::RightToLeft => {
                let fill = Vec2::new(size.x * p, size.y);
                (fill, Vec2::new(half.x - fill.x * 0.5, 0.0))
            }
            FillDirection::TopToBottom => {
                let fill = Vec2::new(size.x, size.y * p);
                (fill, Vec2::new(0.0, half.y - fill.y * 0.5))
            }
            FillDirection::BottomToTop => {
                let fill = Vec2::new(size.x, size.y * p);
                (fill, Vec2::new(0.0, -half.y + fill.y * 0.5))
            }
        }
    }
}

impl Component for ProgressBar {
    fn type_name(&self) -> &'static str {
        "ProgressBar"
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn submit_renderables(&mut self, ctx: &mut RenderContext<'_>) {
        if !ctx.rendering_context().shows_2d() {
            return;
        }
        let node = ctx.node();
        let size = owner_size(node, self.size);

        if self.border_width > 0.0 {
            let outline = size + Vec2::splat(self.border_width * 2.0);
            let transform = box_transform(node, outline, Vec2::ZERO);
            let radius = self.corner_radius + self.border_width;
            ctx.render_rounded_quad(transform, self.border_color, radius, outline, None);
        }
        let track = box_transform(node, size, Vec2::ZERO);
        ctx.render_rounded_quad(track, self.background_color, self.corner_radius, size, None);

        let (fill, offset) = self.fill_rect(size);
        if fill.x > 0.0 && fill.y > 0.0 {
            let transform = box_transform(node, fill, offset);
            let radius = self.corner_radius.min(fill.min_element() * 0.5);
            ctx.render_rounded_quad(transform, self.fill_color, radius, fill, None);
        }

        if let Some(caption) = self.caption() {
            let params = TextRenderParams::new(caption, self.font.clone(), self.font_size)
                .with_color(self.text_color)
                .with_align(HorizontalAlign::Center, VerticalAlign::Center)
                .with_bounds(size, false);
            let origin = text_origin(node, size, self.font_size);
            ctx.render_text_params(&params, origin);
        }
    }

    fn export_schema(&self) -> &'static [ExportField] {
        PROGRESS_BAR_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_color_follows_state() {
        let mut button = Button::default();
        assert_eq!(button.background_color(), button.normal_color);
        button.hovered = true;
        assert_eq!(button.background_color(), button.hover_color);
        button.pressed = true;
        assert_eq!(button.background_color(), button.pressed_color);
        button.disabled = true;
        assert_eq!(button.background_color(), button.disabled_color);
    }

    #[test]
    fn label_params_use_bounds() {
        let label = Label {
            word_wrap: true,
            ..Label::new("hello")
        };
        let params = label.params(Vec2::new(80.0, 20.0));
        assert_eq!(params.bounds, Vec2::new(80.0, 20.0));
        assert!(params.word_wrap);
        assert_eq!(params.text, "hello");
    }

    #[test]
    fn progress_bar_clamps_and_fills_from_the_chosen_edge() {
        let mut bar = ProgressBar::new(10.0, 20.0);
        bar.set_value(25.0);
        assert_eq!(bar.value(), 20.0);
        bar.set_value(15.0);
        assert!((bar.progress() - 0.5).abs() < 1e-6);
        assert_eq!(bar.caption().as_deref(), Some("50%"));

        let (fill, offset) = bar.fill_rect(Vec2::new(100.0, 20.0));
        assert_eq!(fill, Vec2::new(50.0, 20.0));
        assert_eq!(offset, Vec2::new(-25.0, 0.0));

        bar.fill_direction = FillDirection::BottomToTop;
        let (fill, offset) = bar.fill_rect(Vec2::new(100.0, 20.0));
        assert_eq!(fill, Vec2::new(100.0, 10.0));
        assert_eq!(offset, Vec2::new(0.0, -5.0));
    }

    #[test]
    fn progress_bar_reversed_range_is_empty() {
        let mut bar = ProgressBar::new(5.0, 1.0);
        assert_eq!(bar.range(), (5.0, 5.0));
        bar.set_value(100.0);
        assert_eq!(bar.progress(), 0.0);
    }

    #[test]
    fn negative_corner_radius_is_clamped() {
        assert_eq!(ColorRect::default().with_corner_radius(-3.0).corner_radius, 0.0);
    }
}
