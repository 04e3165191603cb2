use std::path::PathBuf;

use glam::{IVec2, UVec2};
use rustc_hash::FxHashMap;

use crate::device::TextureId;
use crate::errors::{LumenError, Result};

/// First and last code point of the glyph set generated with every font.
pub const DEFAULT_GLYPH_RANGE: (char, char) = (' ', '~');

/// Where a font comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FontSource {
    /// A font file on disk.
    Path(PathBuf),
    /// An installed font looked up by family and style.
    System {
        family: String,
        style: String,
        bold: bool,
        italic: bool,
    },
    /// The built-in monospace box font. Always available.
    #[default]
    Builtin,
}

impl FontSource {
    #[must_use]
    pub fn system(family: impl Into<String>, style: impl Into<String>) -> Self {
        let style = style.into();
        let lower = style.to_ascii_lowercase();
        Self::System {
            family: family.into(),
            bold: lower.contains("bold"),
            italic: lower.contains("italic") || lower.contains("oblique"),
            style,
        }
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System { .. })
    }
}

/// Identity of a cached font: source plus requested pixel size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub source: FontSource,
    pub size: u32,
}

impl FontKey {
    #[must_use]
    pub fn new(source: FontSource, size: u32) -> Self {
        Self { source, size }
    }
}

/// One rasterized glyph.
///
/// Sizes and offsets are in raster pixels (requested size × DPI scale).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// `None` for blank glyphs (space) and before upload.
    pub texture: Option<TextureId>,
    pub size: UVec2,
    /// `x` = left side bearing, `y` = top of the glyph above the baseline.
    pub bearing: IVec2,
    /// Bottom of the glyph relative to the baseline (negative below it).
    pub baseline_to_bottom: i32,
    /// Horizontal advance in 1/64 pixel units.
    pub advance: u32,
    pub dpi_scale: f32,
}

impl Glyph {
    /// Advance in raster pixels.
    #[inline]
    #[must_use]
    pub fn advance_px(&self) -> f32 {
        self.advance as f32 / 64.0
    }

    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.size.x == 0 || self.size.y == 0
    }
}

/// Coverage bitmap waiting for a device upload.
#[derive(Debug, Clone)]
pub(crate) struct PendingBitmap {
    pub ch: char,
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

enum Face {
    Outline(Box<fontdue::Font>),
    Builtin,
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Outline(_) => f.write_str("Outline"),
            Face::Builtin => f.write_str("Builtin"),
        }
    }
}

/// A font rasterized at one size, with its lazily built glyph atlas.
#[derive(Debug)]
pub struct Font {
    face: Face,
    /// Requested size in logical pixels.
    pub size: u32,
    /// Rasterization size in physical pixels.
    pub scaled_size: u32,
    pub family: String,
    pub style: String,
    pub ascent: i32,
    pub descent: i32,
    pub line_skip: i32,
    pub height: i32,
    pub dpi_scale: f32,
    pub is_system_font: bool,
    glyphs: FxHashMap<char, Glyph>,
    pending: Vec<PendingBitmap>,
}

fn scaled(size: u32, dpi_scale: f32) -> u32 {
    ((size as f32 * dpi_scale).round() as u32).max(1)
}

impl Font {
    /// Parses an outline font and rasterizes it at `size × dpi_scale`.
    pub fn from_bytes(
        bytes: &[u8],
        size: u32,
        dpi_scale: f32,
        family: impl Into<String>,
        style: impl Into<String>,
        is_system_font: bool,
    ) -> Result<Self> {
        let face = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| LumenError::FontLoad(e.to_string()))?;
        let scaled_size = scaled(size, dpi_scale);
        let px = scaled_size as f32;

        let (ascent, descent, line_skip) = face.horizontal_line_metrics(px).map_or(
            (px * 0.8, -px * 0.2, px * 1.2),
            |m| (m.ascent, m.descent, m.new_line_size),
        );

        let mut font = Self {
            face: Face::Outline(Box::new(face)),
            size,
            scaled_size,
            family: family.into(),
            style: style.into(),
            ascent: ascent.round() as i32,
            descent: descent.round() as i32,
            line_skip: line_skip.round() as i32,
            height: (ascent - descent).round() as i32,
            dpi_scale,
            is_system_font,
            glyphs: FxHashMap::default(),
            pending: Vec::new(),
        };
        font.ensure_default_glyphs();
        Ok(font)
    }

    /// Monospace font of outlined boxes, used when no real font resolves.
    #[must_use]
    pub fn builtin(size: u32, dpi_scale: f32) -> Self {
        let scaled_size = scaled(size, dpi_scale);
        let px = scaled_size as f32;
        let ascent = (px * 0.8).round() as i32;
        let descent = -(px * 0.2).round() as i32;
        let mut font = Self {
            face: Face::Builtin,
            size,
            scaled_size,
            family: "Builtin".to_string(),
            style: "Regular".to_string(),
            ascent,
            descent,
            line_skip: ascent - descent,
            height: ascent - descent,
            dpi_scale,
            is_system_font: false,
            glyphs: FxHashMap::default(),
            pending: Vec::new(),
        };
        font.ensure_default_glyphs();
        font
    }

    #[must_use]
    pub fn is_builtin(&self) -> bool {
        matches!(self.face, Face::Builtin)
    }

    #[must_use]
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Rasterizes the default printable set.
    pub fn ensure_default_glyphs(&mut self) {
        let (first, last) = DEFAULT_GLYPH_RANGE;
        for ch in first..=last {
            self.ensure_glyph(ch);
        }
    }

    /// Returns the glyph for `ch`, rasterizing it first if the atlas does not
    /// have it yet. Control characters have no glyph.
    pub fn ensure_glyph(&mut self, ch: char) -> Option<&Glyph> {
        if ch.is_control() {
            return None;
        }
        if !self.glyphs.contains_key(&ch) {
            let (glyph, bitmap) = self.rasterize(ch);
            if let Some(bitmap) = bitmap {
                self.pending.push(bitmap);
            }
            self.glyphs.insert(ch, glyph);
        }
        self.glyphs.get(&ch)
    }

    /// Pair kerning in raster pixels; zero without a kerning table.
    #[must_use]
    pub fn kerning(&self, left: char, right: char) -> f32 {
        match &self.face {
            Face::Outline(face) => face
                .horizontal_kern(left, right, self.scaled_size as f32)
                .unwrap_or(0.0),
            Face::Builtin => 0.0,
        }
    }

    /// Whether pair kerning can be queried at all.
    #[must_use]
    pub fn has_kerning(&self) -> bool {
        matches!(self.face, Face::Outline(_))
    }

    pub(crate) fn take_pending(&mut self) -> Vec<PendingBitmap> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn set_glyph_texture(&mut self, ch: char, texture: TextureId) {
        if let Some(glyph) = self.glyphs.get_mut(&ch) {
            glyph.texture = Some(texture);
        }
    }

    /// Every uploaded glyph texture.
    pub fn glyph_textures(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.glyphs.values().filter_map(|g| g.texture)
    }

    fn rasterize(&self, ch: char) -> (Glyph, Option<PendingBitmap>) {
        match &self.face {
            Face::Outline(face) => {
                let (metrics, coverage) = face.rasterize(ch, self.scaled_size as f32);
                let glyph = Glyph {
                    texture: None,
                    size: UVec2::new(metrics.width as u32, metrics.height as u32),
                    bearing: IVec2::new(metrics.xmin, metrics.ymin + metrics.height as i32),
                    baseline_to_bottom: metrics.ymin,
                    advance: (metrics.advance_width * 64.0).round() as u32,
                    dpi_scale: self.dpi_scale,
                };
                let bitmap = (!glyph.is_blank()).then(|| PendingBitmap {
                    ch,
                    width: glyph.size.x,
                    height: glyph.size.y,
                    coverage,
                });
                (glyph, bitmap)
            }
            Face::Builtin => self.rasterize_box(ch),
        }
    }

    fn rasterize_box(&self, ch: char) -> (Glyph, Option<PendingBitmap>) {
        let px = self.scaled_size as f32;
        let advance = (px * 0.6 * 64.0).round() as u32;
        if ch.is_whitespace() {
            let glyph = Glyph {
                texture: None,
                size: UVec2::ZERO,
                bearing: IVec2::ZERO,
                baseline_to_bottom: 0,
                advance,
                dpi_scale: self.dpi_scale,
            };
            return (glyph, None);
        }

        let width = ((px * 0.5).round() as u32).max(1);
        let height = ((px * 0.7).round() as u32).max(1);
        let mut coverage = vec![0u8; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    coverage[(y * width + x) as usize] = 255;
                }
            }
        }

        let glyph = Glyph {
            texture: None,
            size: UVec2::new(width, height),
            bearing: IVec2::new((px * 0.05).round() as i32, height as i32),
            baseline_to_bottom: 0,
            advance,
            dpi_scale: self.dpi_scale,
        };
        let bitmap = PendingBitmap {
            ch,
            width,
            height,
            coverage,
        };
        (glyph, Some(bitmap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_font_covers_printable_ascii() {
        let font = Font::builtin(16, 1.0);
        assert_eq!(font.glyph_count(), 95);
        assert!(font.glyph(' ').is_some_and(Glyph::is_blank));
        let a = font.glyph('a').copied();
        assert!(a.is_some_and(|g| !g.is_blank()));
        assert!(a.is_some_and(|g| g.advance == (16.0f32 * 0.6 * 64.0).round() as u32));
    }

    #[test]
    fn builtin_font_rasterizes_at_dpi_size() {
        let font = Font::builtin(16, 2.0);
        assert_eq!(font.scaled_size, 32);
        assert_eq!(font.height, font.ascent - font.descent);
    }

    #[test]
    fn atlas_extends_lazily() {
        let mut font = Font::builtin(16, 1.0);
        let before = font.glyph_count();
        assert!(font.glyph('é').is_none());
        assert!(font.ensure_glyph('é').is_some());
        assert_eq!(font.glyph_count(), before + 1);
        assert!(font.ensure_glyph('\n').is_none());
    }
}
