//! Unified text rendering
//!
//! - [`TextRenderParams`]: text, font, size, colour, alignment, bounds, wrap
//! - [`TextRenderer::calculate_layout`]: line breaking, alignment and
//!   justification, memoized per parameter set
//! - [`TextRenderer::render_layout`]: glyph placement into a [`GlyphSink`]
//! - batching: [`begin_batch`], [`add_to_batch`], [`flush_batch`],
//!   [`end_batch`]
//!
//! Fonts are rasterized at `size × dpi`. At runtime glyphs are drawn at
//! `1 / dpi` to get back to logical size; inside the editor the host UI
//! already applies DPI scaling, so the factor is `1`.
//!
//! [`begin_batch`]: TextRenderer::begin_batch
//! [`add_to_batch`]: TextRenderer::add_to_batch
//! [`flush_batch`]: TextRenderer::flush_batch
//! [`end_batch`]: TextRenderer::end_batch

pub mod batch;
pub mod layout;
pub mod params;

pub use batch::{GlyphInstance, GlyphSink, TextBatch};
pub use layout::{TextLayout, TextLine};
pub use params::{HorizontalAlign, TextRenderParams, VerticalAlign};

use std::hash::Hasher;

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::Xxh3;

use crate::device::GraphicsDevice;
use crate::resources::{Font, FontKey, FontSource, ResourceCache};
use crate::settings::RenderingContext;

/// Layout cache size at which every entry is dropped.
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 100;

#[derive(Debug)]
pub struct TextRenderer {
    context: RenderingContext,
    layouts: FxHashMap<u64, TextLayout>,
    max_cache_entries: usize,
    batch: TextBatch,
    batching: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_ENTRIES)
    }
}

impl TextRenderer {
    #[must_use]
    pub fn new(max_cache_entries: usize) -> Self {
        Self {
            context: RenderingContext::Runtime,
            layouts: FxHashMap::default(),
            max_cache_entries: max_cache_entries.max(1),
            batch: TextBatch::default(),
            batching: false,
        }
    }

    /// Switching context changes the glyph scale, so cached layouts are
    /// dropped.
    pub fn set_rendering_context(&mut self, context: RenderingContext) {
        if self.context != context {
            self.context = context;
            self.layouts.clear();
        }
    }

    #[must_use]
    pub fn rendering_context(&self) -> RenderingContext {
        self.context
    }

    /// Factor applied to raster-pixel glyph metrics.
    #[must_use]
    pub fn scale_factor(&self, font: &Font) -> f32 {
        if self.context.is_editor() {
            1.0
        } else {
            1.0 / font.dpi_scale
        }
    }

    fn cache_key(params: &TextRenderParams, scale: f32) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(params.text.as_bytes());
        hasher.update(format!("{:?}", params.font).as_bytes());
        hasher.write_u32(params.font_size);
        hasher.write_u8(params.horizontal_align as u8);
        hasher.write_u8(params.vertical_align as u8);
        hasher.write_u32(params.line_spacing.to_bits());
        hasher.write_u32(params.kerning.to_bits());
        hasher.write_u32(params.bounds.x.to_bits());
        hasher.write_u32(params.bounds.y.to_bits());
        hasher.write_u8(u8::from(params.word_wrap));
        hasher.write_u32(scale.to_bits());
        hasher.digest()
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Lays out `params`, returning the memoized layout when one exists.
    ///
    /// Empty text yields an empty valid layout. An unresolvable font is
    /// laid out with the builtin fallback.
    pub fn calculate_layout(
        &mut self,
        cache: &mut ResourceCache,
        params: &TextRenderParams,
    ) -> TextLayout {
        let key = cache.load_font(&params.font, params.font_size);
        let Some(font) = cache.font_mut(&key) else {
            return TextLayout::invalid(Self::cache_key(params, 1.0));
        };

        let scale = self.scale_factor(font);
        let cache_key = Self::cache_key(params, scale);
        if let Some(layout) = self.layouts.get(&cache_key) {
            return layout.clone();
        }

        let layout = layout::build_layout(font, params, scale, cache_key);
        if self.layouts.len() >= self.max_cache_entries {
            log::debug!("Text layout cache full ({} entries), clearing", self.layouts.len());
            self.layouts.clear();
        }
        self.layouts.insert(cache_key, layout.clone());
        layout
    }

    /// Whether a layout for `params` is memoized.
    pub fn is_layout_cached(&self, cache: &mut ResourceCache, params: &TextRenderParams) -> bool {
        let key = cache.load_font(&params.font, params.font_size);
        let Some(font) = cache.font(&key) else {
            return false;
        };
        let key = Self::cache_key(params, self.scale_factor(font));
        self.layouts.contains_key(&key)
    }

    pub fn clear_cache(&mut self) {
        self.layouts.clear();
    }

    #[must_use]
    pub fn cached_layouts(&self) -> usize {
        self.layouts.len()
    }

    /// Size of the laid-out block.
    pub fn calculate_text_size(&mut self, cache: &mut ResourceCache, params: &TextRenderParams) -> Vec2 {
        self.calculate_layout(cache, params).total_size
    }

    /// Unbounded, unwrapped size of `text`.
    pub fn measure_text(
        &mut self,
        cache: &mut ResourceCache,
        text: &str,
        font: &FontSource,
        font_size: u32,
        kerning: f32,
    ) -> Vec2 {
        let params = TextRenderParams {
            text: text.to_string(),
            font: font.clone(),
            font_size,
            kerning,
            bounds: Vec2::ZERO,
            word_wrap: false,
            ..Default::default()
        };
        self.calculate_text_size(cache, &params)
    }

    /// `(ascent, descent, line height)` in drawn pixels.
    pub fn font_metrics(&self, cache: &mut ResourceCache, font: &FontSource, font_size: u32) -> Vec3 {
        let key = cache.load_font(font, font_size);
        let Some(font) = cache.font(&key) else {
            return Vec3::ZERO;
        };
        let scale = self.scale_factor(font);
        Vec3::new(font.ascent as f32, font.descent as f32, font.height as f32) * scale
    }

    /// Pair kerning between two characters in drawn pixels.
    pub fn get_kerning(
        &self,
        cache: &mut ResourceCache,
        left: char,
        right: char,
        font: &FontSource,
        font_size: u32,
    ) -> f32 {
        let key = cache.load_font(font, font_size);
        let Some(font) = cache.font(&key) else {
            return 0.0;
        };
        if !font.has_kerning() {
            return 0.0;
        }
        font.kerning(left, right) * self.scale_factor(font)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Places the glyphs of `layout` at `position` (the first baseline).
    ///
    /// While batching, glyphs go into the current batch instead of `sink`.
    pub fn render_layout(
        &mut self,
        cache: &mut ResourceCache,
        device: Option<&mut dyn GraphicsDevice>,
        layout: &TextLayout,
        position: Vec2,
        params: &TextRenderParams,
        sink: &mut dyn GlyphSink,
    ) {
        if !layout.is_valid || layout.lines.is_empty() {
            return;
        }
        let key = cache.load_font(&params.font, params.font_size);
        cache.prepare_glyphs(device, &key, &params.text);
        let Some(font) = cache.font(&key) else {
            return;
        };

        let glyphs = layout::place_glyphs(font, layout, position, params, self.scale_factor(font));
        if self.batching {
            self.batch.glyphs.extend(glyphs);
        } else {
            for glyph in &glyphs {
                sink.submit_glyph(glyph);
            }
        }
    }

    /// Lays out and renders in one step.
    pub fn render_text(
        &mut self,
        cache: &mut ResourceCache,
        device: Option<&mut dyn GraphicsDevice>,
        params: &TextRenderParams,
        position: Vec2,
        sink: &mut dyn GlyphSink,
    ) {
        let layout = self.calculate_layout(cache, params);
        self.render_layout(cache, device, &layout, position, params, sink);
    }

    /// Rasterizes (and uploads) `characters` ahead of time.
    pub fn prewarm_glyph_atlas(
        &self,
        cache: &mut ResourceCache,
        device: Option<&mut dyn GraphicsDevice>,
        font: &FontSource,
        font_size: u32,
        characters: &str,
    ) {
        let key = cache.load_font(font, font_size);
        cache.prepare_glyphs(device, &key, characters);
    }

    // ========================================================================
    // Batching
    // ========================================================================

    /// Flushes any open batch into `sink` and starts a new one for
    /// `(font, size)`.
    pub fn begin_batch(&mut self, font: &FontSource, font_size: u32, sink: &mut dyn GlyphSink) {
        if self.batching {
            self.batch.flush(sink);
        }
        self.batch.clear();
        self.batch.font = Some(FontKey::new(font.clone(), font_size.max(1)));
        self.batching = true;
    }

    /// Adds laid-out glyphs to the batch. A different font or size flushes
    /// the batch first. Without an open batch this renders immediately.
    pub fn add_to_batch(
        &mut self,
        cache: &mut ResourceCache,
        device: Option<&mut dyn GraphicsDevice>,
        params: &TextRenderParams,
        position: Vec2,
        sink: &mut dyn GlyphSink,
    ) {
        if !self.batching {
            self.render_text(cache, device, params, position, sink);
            return;
        }

        let key = FontKey::new(params.font.clone(), params.font_size.max(1));
        if self.batch.font.as_ref() != Some(&key) {
            self.batch.flush(sink);
            self.batch.font = Some(key);
        }
        self.render_text(cache, device, params, position, sink);
    }

    pub fn flush_batch(&mut self, sink: &mut dyn GlyphSink) {
        if self.batching {
            self.batch.flush(sink);
        }
    }

    /// Flushes and leaves batching mode.
    pub fn end_batch(&mut self, sink: &mut dyn GlyphSink) {
        if self.batching {
            self.batch.flush(sink);
            self.batching = false;
            self.batch.font = None;
        }
    }

    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batching
    }

    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }

    /// Human-readable cache and batch summary.
    #[must_use]
    pub fn cache_stats(&self) -> String {
        let mut stats = format!(
            "layout cache: {}/{} entries, batching: {}",
            self.layouts.len(),
            self.max_cache_entries,
            if self.batching { "yes" } else { "no" }
        );
        if self.batching {
            stats.push_str(&format!(", batch: {} glyphs", self.batch.len()));
        }
        stats
    }
}
