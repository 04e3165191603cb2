use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::resources::FontSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
    /// Stretches every line but the last of a wrapped block to the width
    /// bound by widening spaces.
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
    Baseline,
}

/// Everything that affects how a piece of text is laid out and drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRenderParams {
    pub text: String,
    pub font: FontSource,
    pub font_size: u32,
    pub color: Vec4,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    /// Multiplier on the font height.
    pub line_spacing: f32,
    /// Extra pixels added after every glyph.
    pub kerning: f32,
    /// Width and height bounds; `0` disables that axis.
    pub bounds: Vec2,
    pub word_wrap: bool,
}

impl Default for TextRenderParams {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: FontSource::Builtin,
            font_size: 16,
            color: Vec4::ONE,
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            line_spacing: 1.0,
            kerning: 0.0,
            bounds: Vec2::ZERO,
            word_wrap: false,
        }
    }
}

impl TextRenderParams {
    #[must_use]
    pub fn new(text: impl Into<String>, font: FontSource, font_size: u32) -> Self {
        Self {
            text: text.into(),
            font,
            font_size,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_align(mut self, horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        self.horizontal_align = horizontal;
        self.vertical_align = vertical;
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: Vec2, word_wrap: bool) -> Self {
        self.bounds = bounds;
        self.word_wrap = word_wrap;
        self
    }
}
