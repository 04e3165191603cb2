use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::device::{GraphicsDevice, TextureFormat, TextureId};
use crate::errors::{LumenError, Result};
use crate::settings::TextureFilter;

/// Identity of a cached image texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub path: PathBuf,
    pub flip_vertically: bool,
}

impl TextureKey {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, flip_vertically: bool) -> Self {
        Self {
            path: path.into(),
            flip_vertically,
        }
    }
}

/// Result of a texture load.
///
/// Loads never fail loudly: a texture that could not be decoded or uploaded
/// comes back with [`is_valid`](Self::is_valid) `== false` and callers
/// substitute the white texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Texture {
    pub id: Option<TextureId>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub const INVALID: Self = Self {
        id: None,
        width: 0,
        height: 0,
    };

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }
}

/// Decodes an image file into RGBA8, flipping rows when asked so the first
/// row is the bottom of the image.
pub fn decode_image(path: &Path, flip_vertically: bool) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(LumenError::ResourceNotFound(path.display().to_string()));
    }
    let mut rgba = image::open(path)?.to_rgba8();
    if flip_vertically {
        image::imageops::flip_vertical_in_place(&mut rgba);
    }
    Ok(rgba)
}

/// Uploads an RGBA8 image with the given filter.
pub fn upload_rgba(
    device: &mut dyn GraphicsDevice,
    image: &RgbaImage,
    filter: TextureFilter,
) -> Result<Texture> {
    let (width, height) = image.dimensions();
    let id = device.create_texture_2d(
        width,
        height,
        TextureFormat::Rgba8,
        filter,
        Some(image.as_raw()),
    )?;
    Ok(Texture {
        id: Some(id),
        width,
        height,
    })
}
