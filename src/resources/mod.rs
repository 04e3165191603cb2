//! Resource cache
//!
//! Maps asset identities to loaded device resources:
//!
//! - textures by `(path, flip_vertically)`,
//! - fonts by `(source, size)`, each with a lazily extended glyph atlas,
//! - uploaded meshes by content hash.
//!
//! Texture loads report failure through an invalid result
//! (`Texture::is_valid`) that is never cached, so a later retry can succeed.
//! Fonts never fail: an unresolvable source is served by the builtin box
//! font, cached under the requested key. [`ResourceCache::clear`] releases
//! every device object the cache owns.

pub mod font;
pub mod system_fonts;
pub mod texture;

pub use font::{Font, FontKey, FontSource, Glyph};
pub use system_fonts::SystemFont;
pub use texture::{Texture, TextureKey};

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::device::{GraphicsDevice, TextureFormat};
use crate::errors::{LumenError, Result};
use crate::mesh::{GpuMesh, Mesh};
use crate::settings::TextureFilter;

/// Resolves the DPI scale: explicit override, else `GDK_SCALE`, else 1.
/// Always clamped to `[1, 4]`.
#[must_use]
pub fn detect_dpi_scale(override_scale: Option<f32>) -> f32 {
    let scale = override_scale
        .or_else(|| {
            std::env::var("GDK_SCALE")
                .ok()
                .and_then(|v| v.trim().parse::<f32>().ok())
        })
        .filter(|s| s.is_finite())
        .unwrap_or(1.0);
    scale.clamp(1.0, 4.0)
}

#[derive(Debug)]
pub struct ResourceCache {
    texture_filter: TextureFilter,
    dpi_scale: f32,
    textures: FxHashMap<TextureKey, Texture>,
    fonts: FxHashMap<FontKey, Font>,
    /// Fonts dropped by a DPI change whose glyph textures still await
    /// destruction.
    retired_fonts: Vec<Font>,
    meshes: FxHashMap<u64, GpuMesh>,
    system_fonts: Option<Vec<SystemFont>>,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(TextureFilter::default(), None)
    }
}

impl ResourceCache {
    #[must_use]
    pub fn new(texture_filter: TextureFilter, dpi_override: Option<f32>) -> Self {
        let dpi_scale = detect_dpi_scale(dpi_override);
        log::info!("Resource cache DPI scale: {dpi_scale}x");
        Self {
            texture_filter,
            dpi_scale,
            textures: FxHashMap::default(),
            fonts: FxHashMap::default(),
            retired_fonts: Vec::new(),
            meshes: FxHashMap::default(),
            system_fonts: None,
        }
    }

    #[must_use]
    pub fn dpi_scale(&self) -> f32 {
        self.dpi_scale
    }

    /// Changes the DPI scale. Fonts loaded at the old scale leave the
    /// lookup map; their glyph textures are released by the next
    /// [`release_retired`](Self::release_retired) or [`clear`](Self::clear).
    pub fn set_dpi_scale(&mut self, scale: f32) {
        let scale = scale.clamp(1.0, 4.0);
        if (scale - self.dpi_scale).abs() > f32::EPSILON {
            self.dpi_scale = scale;
            self.retired_fonts
                .extend(self.fonts.drain().map(|(_, font)| font));
        }
    }

    /// Destroys the glyph textures of fonts retired by a DPI change.
    pub fn release_retired(&mut self, device: &mut dyn GraphicsDevice) {
        for font in self.retired_fonts.drain(..) {
            for id in font.glyph_textures() {
                device.destroy_texture(id);
            }
        }
    }

    /// Fonts retired by a DPI change and not yet released.
    #[must_use]
    pub fn retired_font_count(&self) -> usize {
        self.retired_fonts.len()
    }

    #[must_use]
    pub fn texture_filter(&self) -> TextureFilter {
        self.texture_filter
    }

    /// Applies to textures loaded from now on.
    pub fn set_texture_filter(&mut self, filter: TextureFilter) {
        self.texture_filter = filter;
    }

    // ========================================================================
    // Textures
    // ========================================================================

    /// Loads (or returns the cached) texture for `path`.
    pub fn load_texture(
        &mut self,
        device: &mut dyn GraphicsDevice,
        path: impl AsRef<Path>,
        flip_vertically: bool,
    ) -> Texture {
        let key = TextureKey::new(path.as_ref(), flip_vertically);
        if let Some(texture) = self.textures.get(&key) {
            return *texture;
        }

        let loaded = texture::decode_image(&key.path, flip_vertically)
            .and_then(|image| texture::upload_rgba(device, &image, self.texture_filter));
        match loaded {
            Ok(texture) => {
                log::debug!(
                    "Loaded texture '{}' ({}x{})",
                    key.path.display(),
                    texture.width,
                    texture.height
                );
                self.textures.insert(key, texture);
                texture
            }
            Err(err) => {
                log::warn!("Failed to load texture '{}': {err}", key.path.display());
                Texture::INVALID
            }
        }
    }

    /// [`load_texture`](Self::load_texture) with the default vertical flip.
    pub fn get_texture(&mut self, device: &mut dyn GraphicsDevice, path: impl AsRef<Path>) -> Texture {
        self.load_texture(device, path, true)
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ========================================================================
    // Fonts
    // ========================================================================

    /// Loads (or finds) the font for `source` at `size` and returns its
    /// cache key.
    ///
    /// A source that cannot be resolved is replaced by
    /// [`builtin_fallback`](Self::builtin_fallback) under the same key, so
    /// text keeps rendering.
    pub fn load_font(&mut self, source: &FontSource, size: u32) -> FontKey {
        let key = FontKey::new(source.clone(), size.max(1));
        if self.fonts.contains_key(&key) {
            return key;
        }

        let font = match self.resolve_font(source, key.size) {
            Ok(font) => {
                log::debug!(
                    "Loaded font '{} {}' at {}px (raster {}px)",
                    font.family,
                    font.style,
                    font.size,
                    font.scaled_size
                );
                font
            }
            Err(err) => {
                log::warn!("Failed to load font {source:?} at {size}px, using builtin: {err}");
                self.builtin_fallback(key.size)
            }
        };
        self.fonts.insert(key.clone(), font);
        key
    }

    /// The box-glyph font at `size` and the current DPI scale.
    #[must_use]
    pub fn builtin_fallback(&self, size: u32) -> Font {
        Font::builtin(size.max(1), self.dpi_scale)
    }

    fn resolve_font(&mut self, source: &FontSource, size: u32) -> Result<Font> {
        let dpi = self.dpi_scale;
        match source {
            FontSource::Builtin => Ok(Font::builtin(size, dpi)),
            FontSource::Path(path) => {
                if path.as_os_str().is_empty() {
                    return self.resolve_font(
                        &FontSource::system(system_fonts::DEFAULT_FAMILY, "Regular"),
                        size,
                    );
                }
                let bytes = std::fs::read(path)
                    .map_err(|_| LumenError::ResourceNotFound(path.display().to_string()))?;
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                let (family, style) = system_fonts::split_style_suffix(stem);
                Font::from_bytes(&bytes, size, dpi, family, style, false)
            }
            FontSource::System { family, style, .. } => {
                let found = self
                    .find_system_font(family, style)
                    .or_else(|| self.find_system_font(system_fonts::DEFAULT_FAMILY, "Regular"))
                    .ok_or_else(|| {
                        LumenError::ResourceNotFound(format!("system font '{family} {style}'"))
                    })?;
                let bytes = std::fs::read(&found.file_path)?;
                Font::from_bytes(&bytes, size, dpi, found.family_name, found.style_name, true)
            }
        }
    }

    #[must_use]
    pub fn font(&self, key: &FontKey) -> Option<&Font> {
        self.fonts.get(key)
    }

    pub fn font_mut(&mut self, key: &FontKey) -> Option<&mut Font> {
        self.fonts.get_mut(key)
    }

    #[must_use]
    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    /// Makes sure every character of `text` is in the font's atlas and, with
    /// a device, that every rasterized glyph has a texture.
    pub fn prepare_glyphs(
        &mut self,
        device: Option<&mut dyn GraphicsDevice>,
        key: &FontKey,
        text: &str,
    ) {
        let Some(font) = self.fonts.get_mut(key) else {
            return;
        };
        for ch in text.chars() {
            font.ensure_glyph(ch);
        }
        if let Some(device) = device
            && font.has_pending()
        {
            upload_glyphs(device, font);
        }
    }

    // ========================================================================
    // System fonts
    // ========================================================================

    /// Installed fonts, enumerated on first use.
    pub fn system_fonts(&mut self) -> &[SystemFont] {
        self.system_fonts
            .get_or_insert_with(system_fonts::enumerate_system_fonts)
    }

    /// Replaces the enumerated list, e.g. with fonts from a project folder.
    pub fn set_system_fonts(&mut self, fonts: Vec<SystemFont>) {
        self.system_fonts = Some(fonts);
    }

    /// Re-scans `dirs` instead of the platform font directories.
    pub fn scan_font_dirs(&mut self, dirs: &[PathBuf]) {
        self.system_fonts = Some(system_fonts::enumerate_fonts_in(dirs));
    }

    pub fn find_system_font(&mut self, family: &str, style: &str) -> Option<SystemFont> {
        system_fonts::find_system_font(self.system_fonts(), family, style).cloned()
    }

    // ========================================================================
    // Meshes
    // ========================================================================

    /// Uploads `mesh` once and returns its device objects.
    pub fn mesh(&mut self, device: &mut dyn GraphicsDevice, mesh: &Mesh) -> Option<GpuMesh> {
        if mesh.is_empty() {
            return None;
        }
        if let Some(gpu) = self.meshes.get(&mesh.key()) {
            return Some(*gpu);
        }
        match mesh.upload(device) {
            Ok(gpu) => {
                self.meshes.insert(mesh.key(), gpu);
                Some(gpu)
            }
            Err(err) => {
                log::warn!("Failed to upload mesh {:016x}: {err}", mesh.key());
                None
            }
        }
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Destroys every cached device object and empties the cache.
    pub fn clear(&mut self, device: &mut dyn GraphicsDevice) {
        for (_, texture) in self.textures.drain() {
            if let Some(id) = texture.id {
                device.destroy_texture(id);
            }
        }
        for (_, font) in self.fonts.drain() {
            for id in font.glyph_textures() {
                device.destroy_texture(id);
            }
        }
        self.release_retired(device);
        for (_, mesh) in self.meshes.drain() {
            mesh.destroy(device);
        }
        log::debug!("Resource cache cleared");
    }
}

/// Uploads pending glyph bitmaps as single-channel textures. Glyphs always
/// sample linearly regardless of the global filter.
fn upload_glyphs(device: &mut dyn GraphicsDevice, font: &mut Font) {
    for bitmap in font.take_pending() {
        match device.create_texture_2d(
            bitmap.width,
            bitmap.height,
            TextureFormat::R8,
            TextureFilter::Bilinear,
            Some(&bitmap.coverage),
        ) {
            Ok(id) => font.set_glyph_texture(bitmap.ch, id),
            Err(err) => log::warn!("Failed to upload glyph {:?}: {err}", bitmap.ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpi_override_is_clamped() {
        assert_eq!(detect_dpi_scale(Some(0.5)), 1.0);
        assert_eq!(detect_dpi_scale(Some(2.0)), 2.0);
        assert_eq!(detect_dpi_scale(Some(8.0)), 4.0);
    }

    #[test]
    fn missing_font_file_falls_back_to_builtin() {
        let mut cache = ResourceCache::new(TextureFilter::Nearest, Some(1.0));
        let source = FontSource::Path(PathBuf::from("/definitely/not/here.ttf"));
        let key = cache.load_font(&source, 16);
        assert_eq!(key.source, source);
        assert!(cache.font(&key).is_some_and(Font::is_builtin));
        assert_eq!(cache.font_count(), 1);
    }

    #[test]
    fn dpi_change_releases_old_glyph_textures() {
        use crate::device::HeadlessDevice;

        let mut device = HeadlessDevice::new();
        let mut cache = ResourceCache::new(TextureFilter::Nearest, Some(1.0));
        let key = cache.load_font(&FontSource::Builtin, 16);
        cache.prepare_glyphs(Some(&mut device), &key, "Hello");
        let before = device.live_textures();
        assert!(before > 0);

        cache.set_dpi_scale(2.0);
        assert_eq!(cache.font_count(), 0);
        assert_eq!(cache.retired_font_count(), 1);

        cache.clear(&mut device);
        assert_eq!(cache.retired_font_count(), 0);
        assert_eq!(device.live_textures(), 0);
    }
}
