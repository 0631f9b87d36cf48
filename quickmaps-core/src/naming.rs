//! Output file and folder naming.

use crate::classify::MapType;
use crate::preset::ImageFormat;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Name used when sanitizing leaves nothing.
pub const EMPTY_NAME: &str = "noname";

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn unsafe_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"))
}

/// Folder/file-safe form of a material name for map export: dots become
/// underscores, nothing else changes.
pub fn material_dir_name(name: &str) -> String {
    name.replace('.', "_")
}

/// Strict filename sanitizer used for embedded texture extraction.
///
/// Dots become underscores, whitespace runs collapse to one underscore, and
/// anything outside `[A-Za-z0-9._-]` is dropped. Empty results become
/// [`EMPTY_NAME`]. Applying it twice gives the same result as once.
pub fn sanitize_filename(name: &str) -> String {
    let name = material_dir_name(name);
    let name = whitespace_re().replace_all(&name, "_");
    let name = unsafe_chars_re().replace_all(&name, "");
    if name.is_empty() {
        EMPTY_NAME.to_string()
    } else {
        name.into_owned()
    }
}

/// Filename for an exported map:
/// `{prefix}{material}_{map}{suffix}.{ext}`.
///
/// Misc maps carry the image's own name in place of the map label.
pub fn map_filename(
    prefix: &str,
    material: &str,
    map: MapType,
    image_name: &str,
    suffix: &str,
    format: ImageFormat,
) -> String {
    let token = match map {
        MapType::Misc => material_dir_name(image_name),
        other => other.label().to_string(),
    };
    format!(
        "{}{}_{}{}.{}",
        prefix,
        material_dir_name(material),
        token,
        suffix,
        format.extension()
    )
}

/// Filename for a packed MRAO image.
pub fn packed_filename(prefix: &str, material: &str, suffix: &str, format: ImageFormat) -> String {
    format!(
        "{}{}_packedMRAO{}.{}",
        prefix,
        material_dir_name(material),
        suffix,
        format.extension()
    )
}

/// First free variant of `path`: the path itself, then `stem_001.ext`,
/// `stem_002.ext`, ... according to `exists`.
pub fn ensure_unique_path<F>(path: &Path, exists: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    if !exists(path) {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let mut counter = 1u32;
    loop {
        let candidate = parent.join(format!("{}_{:03}{}", stem, counter, ext));
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
