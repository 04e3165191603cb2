use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;

use crate::device::TextureId;
use crate::resources::FontKey;

/// One positioned glyph quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphInstance {
    /// Translation to the quad centre times the glyph size.
    pub transform: Mat4,
    pub color: Vec4,
    pub texture: TextureId,
}

/// Receiver of glyph quads.
pub trait GlyphSink {
    fn submit_glyph(&mut self, glyph: &GlyphInstance);
}

impl GlyphSink for Vec<GlyphInstance> {
    fn submit_glyph(&mut self, glyph: &GlyphInstance) {
        self.push(*glyph);
    }
}

/// Glyphs accumulated for one `(font, size)` pair.
#[derive(Debug, Default)]
pub struct TextBatch {
    pub font: Option<FontKey>,
    pub glyphs: Vec<GlyphInstance>,
}

impl TextBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn clear(&mut self) {
        self.glyphs.clear();
    }

    /// Submits the glyphs grouped by texture (in first-use order), each
    /// group ordered by colour so similar colours end up adjacent, and
    /// empties the batch.
    pub fn flush(&mut self, sink: &mut dyn GlyphSink) {
        if self.glyphs.is_empty() {
            return;
        }

        let mut slots: FxHashMap<TextureId, usize> = FxHashMap::default();
        let mut groups: Vec<Vec<GlyphInstance>> = Vec::new();
        for glyph in self.glyphs.drain(..) {
            let slot = *slots.entry(glyph.texture).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(glyph);
        }

        for mut group in groups {
            group.sort_by(|a, b| color_weight(a.color).total_cmp(&color_weight(b.color)));
            for glyph in &group {
                sink.submit_glyph(glyph);
            }
        }
    }
}

fn color_weight(color: Vec4) -> f32 {
    color.x + color.y + color.z + color.w
}
