use glam::{Mat4, Vec2, Vec3};

use super::batch::GlyphInstance;
use super::params::{HorizontalAlign, TextRenderParams, VerticalAlign};
use crate::resources::Font;

/// Descenders deeper than this (raster pixels) are nudged up.
const DESCENDER_THRESHOLD: i32 = -2;
const DESCENDER_ADJUSTMENT: f32 = 0.25;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLine {
    pub text: String,
    /// Natural width, before justification.
    pub width: f32,
    /// Alignment offset from the layout's left edge.
    pub x_offset: f32,
    /// Distance of this line's baseline below the first one.
    pub y_offset: f32,
    /// Extra width given to every space when the line is justified.
    pub extra_per_space: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLayout {
    pub lines: Vec<TextLine>,
    pub total_size: Vec2,
    pub line_height: f32,
    pub cache_key: u64,
    /// `false` when the font could not be resolved.
    pub is_valid: bool,
}

impl TextLayout {
    #[must_use]
    pub fn invalid(cache_key: u64) -> Self {
        Self {
            cache_key,
            ..Self::default()
        }
    }
}

/// Width of `text` on one line: advances, the per-glyph kerning offset and
/// the font's pair kerning, all scaled.
pub(crate) fn line_width(font: &mut Font, text: &str, scale: f32, kerning: f32) -> f32 {
    let chars: Vec<char> = text.chars().collect();
    let mut width = 0.0;
    for (i, &ch) in chars.iter().enumerate() {
        let Some(glyph) = font.ensure_glyph(ch).copied() else {
            continue;
        };
        let mut adjustment = kerning;
        if let Some(&next) = chars.get(i + 1)
            && font.has_kerning()
        {
            adjustment += font.kerning(ch, next) * scale;
        }
        width += glyph.advance_px() * scale + adjustment;
    }
    width
}

/// Breaks text into lines.
///
/// Without a positive width bound or with wrapping off, only `'\n'` breaks
/// lines. Otherwise words are packed greedily; a word wider than the bound
/// gets a line of its own and is never split.
pub(crate) fn split_lines(
    font: &mut Font,
    text: &str,
    bounds: Vec2,
    word_wrap: bool,
    scale: f32,
    kerning: f32,
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    if bounds.x <= 0.0 || !word_wrap {
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        if text.ends_with('\n') && lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        return lines;
    }

    let mut lines = Vec::new();
    let paragraphs = text.strip_suffix('\n').unwrap_or(text);
    for paragraph in paragraphs.split('\n') {
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if line_width(font, &candidate, scale, kerning) <= bounds.x {
                current = candidate;
            } else if current.is_empty() {
                lines.push(word.to_string());
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Lays out `params.text` with an already resolved font.
pub(crate) fn build_layout(
    font: &mut Font,
    params: &TextRenderParams,
    scale: f32,
    cache_key: u64,
) -> TextLayout {
    let mut layout = TextLayout {
        cache_key,
        is_valid: true,
        ..TextLayout::default()
    };
    if params.text.is_empty() {
        return layout;
    }

    layout.line_height = font.height as f32 * scale * params.line_spacing;

    let texts = split_lines(
        font,
        &params.text,
        params.bounds,
        params.word_wrap,
        scale,
        params.kerning,
    );
    let count = texts.len();
    let mut max_width = 0.0f32;

    for (i, text) in texts.into_iter().enumerate() {
        let width = line_width(font, &text, scale, params.kerning);
        let mut line = TextLine {
            width,
            y_offset: i as f32 * layout.line_height,
            ..TextLine::default()
        };

        if params.bounds.x > 0.0 {
            match params.horizontal_align {
                HorizontalAlign::Left => {}
                HorizontalAlign::Center => line.x_offset = (params.bounds.x - width) * 0.5,
                HorizontalAlign::Right => line.x_offset = params.bounds.x - width,
                HorizontalAlign::Justify => {
                    // A single wrapped line is stretched; in longer blocks the
                    // last line stays left-aligned.
                    let justifiable = i + 1 < count || count == 1;
                    let spaces = text.matches(' ').count();
                    if justifiable && spaces > 0 && width < params.bounds.x {
                        line.extra_per_space = (params.bounds.x - width) / spaces as f32;
                    }
                }
            }
        }

        max_width = max_width.max(width);
        line.text = text;
        layout.lines.push(line);
    }

    layout.total_size = Vec2::new(
        if params.bounds.x > 0.0 { params.bounds.x } else { max_width },
        layout.lines.len() as f32 * layout.line_height,
    );
    layout
}

/// Offset of the whole block inside the height bound.
#[must_use]
pub fn vertical_offset(params: &TextRenderParams, layout: &TextLayout) -> f32 {
    if params.bounds.y <= 0.0 {
        return 0.0;
    }
    match params.vertical_align {
        VerticalAlign::Top | VerticalAlign::Baseline => 0.0,
        VerticalAlign::Center => (params.bounds.y - layout.total_size.y) * 0.5,
        VerticalAlign::Bottom => params.bounds.y - layout.total_size.y,
    }
}

/// Places every visible glyph of `layout`.
///
/// `position` is the baseline origin of the first line. World Y points up,
/// so later lines and positive vertical offsets move down.
pub(crate) fn place_glyphs(
    font: &Font,
    layout: &TextLayout,
    position: Vec2,
    params: &TextRenderParams,
    scale: f32,
) -> Vec<GlyphInstance> {
    let mut out = Vec::new();
    if !layout.is_valid {
        return out;
    }
    let v_offset = vertical_offset(params, layout);

    for line in &layout.lines {
        if line.text.is_empty() {
            continue;
        }
        let baseline_y = position.y - v_offset - line.y_offset;
        let mut x = position.x + line.x_offset;

        let chars: Vec<char> = line.text.chars().collect();
        for (i, &ch) in chars.iter().enumerate() {
            let Some(glyph) = font.glyph(ch) else {
                continue;
            };

            if let Some(texture) = glyph.texture
                && !glyph.is_blank()
            {
                let glyph_x = (x + glyph.bearing.x as f32 * scale).round();
                let mut glyph_y = baseline_y + glyph.baseline_to_bottom as f32 * scale;
                if glyph.baseline_to_bottom < DESCENDER_THRESHOLD {
                    glyph_y -= glyph.baseline_to_bottom as f32 * DESCENDER_ADJUSTMENT * scale;
                }
                let glyph_y = glyph_y.round();

                let size = glyph.size.as_vec2() * scale;
                let center = Vec2::new(glyph_x, glyph_y) + size * 0.5;
                out.push(GlyphInstance {
                    transform: Mat4::from_translation(center.extend(0.0))
                        * Mat4::from_scale(Vec3::new(size.x, size.y, 1.0)),
                    color: params.color,
                    texture,
                });
            }

            let mut adjustment = params.kerning;
            if let Some(&next) = chars.get(i + 1)
                && font.has_kerning()
            {
                adjustment += font.kerning(ch, next) * scale;
            }
            if ch == ' ' {
                adjustment += line.extra_per_space;
            }
            x += glyph.advance_px() * scale + adjustment;
        }
    }
    out
}
