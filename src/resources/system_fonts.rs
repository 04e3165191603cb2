//! Installed font discovery.

use std::path::{Path, PathBuf};

/// Font file found in one of the platform font directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFont {
    pub family_name: String,
    pub style_name: String,
    pub file_path: PathBuf,
    pub is_bold: bool,
    pub is_italic: bool,
}

impl SystemFont {
    /// "Family" for the regular style, "Family Style" otherwise.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.style_name == "Regular" {
            self.family_name.clone()
        } else {
            format!("{} {}", self.family_name, self.style_name)
        }
    }
}

#[cfg(target_os = "windows")]
const FONT_DIRS: &[&str] = &["C:/Windows/Fonts/", "C:/Windows/System32/Fonts/"];

#[cfg(not(target_os = "windows"))]
const FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/",
    "/usr/local/share/fonts/",
    "/System/Library/Fonts/",
    "/Library/Fonts/",
];

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// Longest suffixes first so "-BoldItalic" is not read as "-Bold".
const STYLE_SUFFIXES: &[&str] = &[
    "-BoldItalic",
    "_BoldItalic",
    "-Regular",
    "_Regular",
    "-Italic",
    "_Italic",
    "-Bold",
    "_Bold",
];

/// Family name used when a requested system font cannot be found.
#[cfg(target_os = "windows")]
pub const DEFAULT_FAMILY: &str = "Arial";
#[cfg(target_os = "macos")]
pub const DEFAULT_FAMILY: &str = "Helvetica";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_FAMILY: &str = "DejaVu Sans";

/// Scans the platform font directories.
#[must_use]
pub fn enumerate_system_fonts() -> Vec<SystemFont> {
    let dirs: Vec<PathBuf> = FONT_DIRS.iter().map(PathBuf::from).collect();
    let fonts = enumerate_fonts_in(&dirs);
    log::info!("Enumerated {} system fonts", fonts.len());
    fonts
}

/// Recursively collects font files under `dirs`, sorted by family then
/// style.
#[must_use]
pub fn enumerate_fonts_in(dirs: &[PathBuf]) -> Vec<SystemFont> {
    let mut fonts = Vec::new();
    let mut stack: Vec<PathBuf> = dirs.iter().filter(|d| d.is_dir()).cloned().collect();

    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if is_font_file(&path)
                && let Some(font) = extract_font_metadata(&path)
            {
                fonts.push(font);
            }
        }
    }

    fonts.sort_by(|a, b| {
        a.family_name
            .cmp(&b.family_name)
            .then_with(|| a.style_name.cmp(&b.style_name))
            .then_with(|| a.file_path.cmp(&b.file_path))
    });
    fonts
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Reads family and style from the font's name table, falling back to the
/// file name.
#[must_use]
pub fn extract_font_metadata(path: &Path) -> Option<SystemFont> {
    let from_table = std::fs::read(path).ok().and_then(|bytes| {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()).ok()?;
        font.name().map(str::to_string)
    });

    let stem = path.file_stem()?.to_str()?;
    let (family_from_stem, style) = split_style_suffix(stem);
    let family_name = match from_table {
        Some(name) if !name.is_empty() => strip_style_words(&name, &style),
        _ => family_from_stem,
    };
    if family_name.is_empty() {
        return None;
    }

    let lower = stem.to_ascii_lowercase();
    Some(SystemFont {
        family_name,
        is_bold: lower.contains("bold"),
        is_italic: lower.contains("italic") || lower.contains("oblique"),
        style_name: style,
        file_path: path.to_path_buf(),
    })
}

/// Splits "Family-Style" file stems.
#[must_use]
pub fn split_style_suffix(stem: &str) -> (String, String) {
    for suffix in STYLE_SUFFIXES {
        if let Some(pos) = stem.find(suffix) {
            return (stem[..pos].to_string(), suffix[1..].to_string());
        }
    }
    (stem.to_string(), "Regular".to_string())
}

/// Full names in the name table often include the style ("DejaVu Sans
/// Bold"); drop it to get the family.
fn strip_style_words(full_name: &str, style: &str) -> String {
    full_name
        .strip_suffix(style)
        .map_or(full_name, str::trim_end)
        .to_string()
}

/// Finds an installed font by family and style, falling back to the family's
/// "Regular" style.
#[must_use]
pub fn find_system_font<'a>(fonts: &'a [SystemFont], family: &str, style: &str) -> Option<&'a SystemFont> {
    fonts
        .iter()
        .find(|f| f.family_name == family && f.style_name == style)
        .or_else(|| {
            fonts
                .iter()
                .find(|f| f.family_name == family && f.style_name == "Regular")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_suffixes_are_split() {
        assert_eq!(
            split_style_suffix("Roboto-BoldItalic"),
            ("Roboto".to_string(), "BoldItalic".to_string())
        );
        assert_eq!(
            split_style_suffix("Inter_Bold"),
            ("Inter".to_string(), "Bold".to_string())
        );
        assert_eq!(
            split_style_suffix("Mono"),
            ("Mono".to_string(), "Regular".to_string())
        );
    }

    #[test]
    fn display_name_omits_regular() {
        let mut font = SystemFont {
            family_name: "Inter".into(),
            style_name: "Regular".into(),
            file_path: PathBuf::from("Inter-Regular.ttf"),
            is_bold: false,
            is_italic: false,
        };
        assert_eq!(font.display_name(), "Inter");
        font.style_name = "Bold".into();
        assert_eq!(font.display_name(), "Inter Bold");
    }

    #[test]
    fn lookup_falls_back_to_regular() {
        let fonts = vec![SystemFont {
            family_name: "Inter".into(),
            style_name: "Regular".into(),
            file_path: PathBuf::from("Inter-Regular.ttf"),
            is_bold: false,
            is_italic: false,
        }];
        let found = find_system_font(&fonts, "Inter", "Light");
        assert_eq!(found.map(|f| f.style_name.as_str()), Some("Regular"));
        assert!(find_system_font(&fonts, "Missing", "Regular").is_none());
    }
}
