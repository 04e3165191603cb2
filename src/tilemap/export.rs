//! 2.5D tilemap export.
//!
//! Painted faces are written as a Wavefront OBJ. With an atlas, every
//! tileset used by a face is scaled into one 256 px slot of a square PNG
//! (`ceil(sqrt(n))` slots per side), face UVs are remapped into their slot,
//! and a sibling MTL declares `atlas_material`.
//!
//! Output files for `dir/name.obj` are `dir/name.mtl` and
//! `dir/name_atlas.png`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage, imageops};

use crate::errors::{LumenError, Result};

/// Pixel size of one tileset slot in the atlas.
pub const ATLAS_SLOT_SIZE: u32 = 256;

/// Fill of slots whose tileset image could not be loaded.
pub const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);

const MATERIAL_NAME: &str = "atlas_material";

/// One painted quad.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintedFace {
    /// Counter-clockwise corners.
    pub vertices: [Vec3; 4],
    pub uvs: [Vec2; 4],
    /// Negative for untextured faces.
    pub tileset_id: i32,
    pub tile_id: i32,
    pub normal: Vec3,
    /// Also emit the reversed triangles.
    pub double_sided: bool,
}

impl Default for PaintedFace {
    fn default() -> Self {
        Self {
            vertices: [
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
                Vec3::new(-0.5, 0.5, 0.0),
            ],
            uvs: [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
            tileset_id: -1,
            tile_id: -1,
            normal: Vec3::Z,
            double_sided: true,
        }
    }
}

/// Where an atlas slot landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasSlot {
    /// Top-left corner in normalized atlas coordinates.
    pub uv_offset: Vec2,
    /// Whether the magenta placeholder was used.
    pub placeholder: bool,
}

/// Packed tileset atlas.
#[derive(Debug, Clone)]
pub struct TextureAtlas {
    pub image: RgbaImage,
    /// Slots per side.
    pub slots_per_side: u32,
    pub slots: BTreeMap<i32, AtlasSlot>,
}

impl TextureAtlas {
    /// Packs the tilesets referenced by `faces`, in ascending id order.
    ///
    /// `tileset_paths` maps tileset ids to image files. Missing entries and
    /// unreadable images get a magenta slot. Returns `None` when no face is
    /// textured.
    #[must_use]
    pub fn build(faces: &[PaintedFace], tileset_paths: &BTreeMap<i32, PathBuf>) -> Option<Self> {
        let used: BTreeSet<i32> = faces
            .iter()
            .filter(|f| f.tileset_id >= 0)
            .map(|f| f.tileset_id)
            .collect();
        if used.is_empty() {
            return None;
        }

        let slots_per_side = (used.len() as f32).sqrt().ceil() as u32;
        let total = slots_per_side * ATLAS_SLOT_SIZE;
        let mut image = RgbaImage::new(total, total);
        let mut slots = BTreeMap::new();

        for (index, &tileset_id) in used.iter().enumerate() {
            let index = index as u32;
            let x = (index % slots_per_side) * ATLAS_SLOT_SIZE;
            let y = (index / slots_per_side) * ATLAS_SLOT_SIZE;

            let slot_image = tileset_paths
                .get(&tileset_id)
                .and_then(|path| match image::open(path) {
                    Ok(img) => Some(img.resize(
                        ATLAS_SLOT_SIZE,
                        ATLAS_SLOT_SIZE,
                        imageops::FilterType::Triangle,
                    )),
                    Err(err) => {
                        log::warn!("Tileset image '{}' unavailable: {err}", path.display());
                        None
                    }
                });
            let placeholder = slot_image.is_none();
            match slot_image {
                Some(img) => imageops::overlay(&mut image, &img.to_rgba8(), x.into(), y.into()),
                None => {
                    let fill = RgbaImage::from_pixel(ATLAS_SLOT_SIZE, ATLAS_SLOT_SIZE, PLACEHOLDER_COLOR);
                    imageops::replace(&mut image, &fill, x.into(), y.into());
                }
            }

            slots.insert(
                tileset_id,
                AtlasSlot {
                    uv_offset: Vec2::new(x as f32, y as f32) / total as f32,
                    placeholder,
                },
            );
        }

        Some(Self {
            image,
            slots_per_side,
            slots,
        })
    }

    /// Remaps a face UV into the slot of `tileset_id`. UVs of unknown
    /// tilesets pass through.
    #[must_use]
    pub fn remap(&self, tileset_id: i32, uv: Vec2) -> Vec2 {
        match self.slots.get(&tileset_id) {
            Some(slot) => slot.uv_offset + uv / self.slots_per_side as f32,
            None => uv,
        }
    }
}

/// Files produced by [`export_obj`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub obj: PathBuf,
    pub mtl: Option<PathBuf>,
    pub atlas: Option<PathBuf>,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}

/// OBJ text for `faces`, with UVs remapped through `atlas` when given.
#[must_use]
pub fn obj_source(faces: &[PaintedFace], atlas: Option<&TextureAtlas>, mtl_name: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Tilemap 2.5D export");
    let _ = writeln!(out, "# Faces: {}\n", faces.len());
    if let Some(name) = mtl_name {
        let _ = writeln!(out, "mtllib {name}\n");
    }

    for face in faces {
        for v in &face.vertices {
            let _ = writeln!(out, "v {} {} {}", v.x, v.y, v.z);
        }
    }
    out.push('\n');

    for face in faces {
        for &uv in &face.uvs {
            let uv = atlas.map_or(uv, |a| a.remap(face.tileset_id, uv));
            let _ = writeln!(out, "vt {} {}", uv.x, uv.y);
        }
    }
    out.push('\n');

    for face in faces {
        for _ in 0..4 {
            let n = face.normal;
            let _ = writeln!(out, "vn {} {} {}", n.x, n.y, n.z);
        }
    }
    out.push('\n');

    if mtl_name.is_some() {
        let _ = writeln!(out, "usemtl {MATERIAL_NAME}");
    }

    let corner = |i: usize| format!("{i}/{i}/{i}");
    for (index, face) in faces.iter().enumerate() {
        let base = index * 4 + 1;
        let [a, b, c, d] = [base, base + 1, base + 2, base + 3].map(corner);
        let _ = writeln!(out, "f {a} {b} {c}");
        let _ = writeln!(out, "f {a} {c} {d}");
        if face.double_sided {
            let _ = writeln!(out, "f {a} {c} {b}");
            let _ = writeln!(out, "f {a} {d} {c}");
        }
    }
    out
}

#[must_use]
pub fn mtl_source(texture_file: &str) -> String {
    format!(
        "# Material file for Tilemap 2.5D export\n\n\
         newmtl {MATERIAL_NAME}\n\
         Ka 1.0 1.0 1.0\n\
         Kd 1.0 1.0 1.0\n\
         Ks 0.0 0.0 0.0\n\
         Ns 0.0\n\
         map_Kd {texture_file}\n"
    )
}

/// Writes `faces` to `path`, plus the MTL and atlas PNG when
/// `generate_atlas` is set and at least one face is textured.
pub fn export_obj(
    path: impl AsRef<Path>,
    faces: &[PaintedFace],
    tileset_paths: &BTreeMap<i32, PathBuf>,
    generate_atlas: bool,
) -> Result<ExportedFiles> {
    let path = path.as_ref();
    if faces.is_empty() {
        return Err(LumenError::ResourceInvalid("no faces to export".to_string()));
    }

    let atlas = if generate_atlas {
        TextureAtlas::build(faces, tileset_paths)
    } else {
        None
    };

    let mut files = ExportedFiles {
        obj: path.to_path_buf(),
        mtl: None,
        atlas: None,
    };

    let mut mtl_name = None;
    if let Some(atlas) = &atlas {
        let atlas_path = sibling(path, "_atlas.png");
        atlas.image.save(&atlas_path)?;

        let mtl_path = sibling(path, ".mtl");
        let texture_file = atlas_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        std::fs::write(&mtl_path, mtl_source(&texture_file))?;

        mtl_name = mtl_path.file_name().map(|n| n.to_string_lossy().into_owned());
        files.mtl = Some(mtl_path);
        files.atlas = Some(atlas_path);
    }

    std::fs::write(path, obj_source(faces, atlas.as_ref(), mtl_name.as_deref()))?;
    log::info!("Exported {} faces to '{}'", faces.len(), path.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(tileset_id: i32, double_sided: bool) -> PaintedFace {
        PaintedFace {
            tileset_id,
            double_sided,
            ..PaintedFace::default()
        }
    }

    #[test]
    fn single_sided_face_has_two_triangles() {
        let obj = obj_source(&[face(-1, false)], None, None);
        let faces: Vec<_> = obj.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces, ["f 1/1/1 2/2/2 3/3/3", "f 1/1/1 3/3/3 4/4/4"]);
        assert!(!obj.contains("usemtl"));
    }

    #[test]
    fn double_sided_face_adds_reversed_triangles() {
        let obj = obj_source(&[face(-1, false), face(-1, true)], None, None);
        let faces: Vec<_> = obj.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces.len(), 6);
        assert_eq!(faces[4], "f 5/5/5 7/7/7 6/6/6");
        assert_eq!(faces[5], "f 5/5/5 8/8/8 7/7/7");
    }

    #[test]
    fn missing_tileset_image_gets_magenta_slot() {
        let faces = [face(1, true), face(2, true), face(7, true)];
        let atlas = TextureAtlas::build(&faces, &BTreeMap::new()).map(|a| (a.slots_per_side, a));
        let Some((side, atlas)) = atlas else {
            panic!("atlas expected");
        };
        assert_eq!(side, 2);
        assert_eq!(atlas.image.dimensions(), (512, 512));
        assert!(atlas.slots.values().all(|s| s.placeholder));
        assert_eq!(*atlas.image.get_pixel(300, 10), PLACEHOLDER_COLOR);
        assert_eq!(atlas.slots[&7].uv_offset, Vec2::new(0.0, 0.5));
        assert_eq!(atlas.remap(7, Vec2::ONE), Vec2::new(0.5, 1.0));
    }

    #[test]
    fn untextured_faces_build_no_atlas() {
        assert!(TextureAtlas::build(&[face(-1, true)], &BTreeMap::new()).is_none());
    }
}
