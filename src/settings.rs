//! Renderer Settings & Project Configuration
//!
//! This module defines the configuration consumed by the renderer core:
//!
//! - [`RendererSettings`]: process-level knobs (shadow quality, texture
//!   filtering, DPI override, render resolution overrides).
//! - [`ProjectSettings`]: the per-project document (JSON) that the embedding
//!   engine hands to [`Renderer::render_scene_with_cameras`].
//! - [`RenderingContext`]: tells components whether they run inside the game
//!   runtime or one of the editor viewports.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lumen::settings::{RendererSettings, ShadowQuality, TextureFilter};
//!
//! // Defaults: medium shadows, bilinear filtering, platform DPI
//! let settings = RendererSettings::default();
//!
//! // Crisp pixel-art configuration with cheap shadows
//! let settings = RendererSettings {
//!     shadow_quality: ShadowQuality::Low,
//!     texture_filter: TextureFilter::Nearest,
//!     ..Default::default()
//! };
//!
//! let mut renderer = Renderer::new(settings);
//! renderer.initialize(None)?;
//! ```
//!
//! [`Renderer::render_scene_with_cameras`]: crate::renderer::Renderer::render_scene_with_cameras

use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

// ---------------------------------------------------------------------------
// ShadowQuality
// ---------------------------------------------------------------------------

/// Shadow quality tier.
///
/// Controls both the resolution of every slice in the shadow-map array and
/// the PCF sample budget used by the shading stage.
///
/// | Tier     | Map size | PCF budget |
/// |----------|----------|------------|
/// | `Low`    | 1024     | 9          |
/// | `Medium` | 2048     | 16         |
/// | `High`   | 4096     | 25         |
/// | `Ultra`  | 4096     | 25         |
///
/// Changing the tier invalidates the shadow-map array; it is reallocated at
/// the start of the next shadow pass, so the frame in flight keeps the
/// previous tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowQuality {
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl ShadowQuality {
    /// Width and height of one shadow-map slice in texels.
    #[must_use]
    pub const fn map_size(self) -> u32 {
        match self {
            ShadowQuality::Low => 1024,
            ShadowQuality::Medium => 2048,
            ShadowQuality::High | ShadowQuality::Ultra => 4096,
        }
    }

    /// Upper bound on PCF taps per shaded fragment.
    #[must_use]
    pub const fn pcf_budget(self) -> u32 {
        match self {
            ShadowQuality::Low => 9,
            ShadowQuality::Medium => 16,
            ShadowQuality::High | ShadowQuality::Ultra => 25,
        }
    }
}

// ---------------------------------------------------------------------------
// TextureFilter
// ---------------------------------------------------------------------------

/// Process-wide texture sampling policy.
///
/// Glyph textures ignore this policy and always use linear filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFilter {
    /// Point sampling; keeps pixel art sharp.
    Nearest,
    /// Linear sampling with mipmaps.
    #[default]
    Bilinear,
    /// Linear sampling with a sharpened LOD bias, approximating bicubic.
    Bicubic,
}

// ---------------------------------------------------------------------------
// RenderingContext
// ---------------------------------------------------------------------------

/// Where the renderer is currently being driven from.
///
/// Components consult this to skip rendering where they do not apply: 2D
/// components hide in `Editor3D`, 3D components hide in `Editor2D`. The text
/// renderer also uses it to pick its DPI policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderingContext {
    #[default]
    Runtime,
    Editor2D,
    Editor3D,
}

impl RenderingContext {
    #[must_use]
    pub const fn is_editor(self) -> bool {
        matches!(self, RenderingContext::Editor2D | RenderingContext::Editor3D)
    }

    /// Whether 2D content (Node2D and Control components) should draw.
    #[must_use]
    pub const fn shows_2d(self) -> bool {
        !matches!(self, RenderingContext::Editor3D)
    }

    /// Whether 3D content should draw.
    #[must_use]
    pub const fn shows_3d(self) -> bool {
        !matches!(self, RenderingContext::Editor2D)
    }
}

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

/// Process-level renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Shadow-map resolution and PCF budget.
    pub shadow_quality: ShadowQuality,
    /// Master switch for the shadow pass.
    pub shadows_enabled: bool,
    /// Sampling policy for loaded textures.
    pub texture_filter: TextureFilter,
    /// Replaces the detected platform DPI scale (clamped to `[1, 4]`).
    pub dpi_scale_override: Option<f32>,
    /// Initial logical screen size.
    pub screen_size: (u32, u32),
    /// Clear color used when no project background is supplied.
    pub clear_color: [f32; 4],
    /// Entries kept in the text-layout cache before a bulk eviction.
    pub max_text_cache_entries: usize,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shadow_quality: ShadowQuality::Medium,
            shadows_enabled: true,
            texture_filter: TextureFilter::Bilinear,
            dpi_scale_override: None,
            screen_size: (800, 600),
            clear_color: [0.12, 0.12, 0.14, 1.0],
            max_text_cache_entries: 100,
        }
    }
}

impl RendererSettings {
    #[must_use]
    pub fn clear_color(&self) -> Vec4 {
        Vec4::from_array(self.clear_color)
    }
}

// ---------------------------------------------------------------------------
// ProjectSettings
// ---------------------------------------------------------------------------

/// Project document consumed by the frame protocol.
///
/// Only the fields the renderer reads are modelled here; the embedding engine
/// owns the rest of the project file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub name: String,
    /// Logical resolution the game renders at.
    pub render_resolution: (u32, u32),
    /// Size of the OS window; may differ from the render resolution.
    pub window_size: (u32, u32),
    /// Debug override that replaces `render_resolution` when set.
    pub debug_render_resolution: Option<(u32, u32)>,
    /// Debug scale applied to the window size.
    pub debug_window_scale: Option<f32>,
    /// Frame clear color; the editor gray is used when absent.
    pub background_color: Option<[f32; 4]>,
    pub shadow_quality: Option<ShadowQuality>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
            render_resolution: (800, 600),
            window_size: (800, 600),
            debug_render_resolution: None,
            debug_window_scale: None,
            background_color: None,
            shadow_quality: None,
        }
    }
}

impl ProjectSettings {
    /// Parses a project document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a project document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The resolution passes render at, honoring the debug override.
    #[must_use]
    pub fn effective_render_resolution(&self) -> (u32, u32) {
        self.debug_render_resolution.unwrap_or(self.render_resolution)
    }

    /// Window size after the debug scale.
    #[must_use]
    pub fn effective_window_size(&self) -> (u32, u32) {
        match self.debug_window_scale {
            Some(scale) if scale > 0.0 => (
                (self.window_size.0 as f32 * scale).round() as u32,
                (self.window_size.1 as f32 * scale).round() as u32,
            ),
            _ => self.window_size,
        }
    }
}
