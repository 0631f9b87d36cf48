//! Export settings and the optional `quickmaps.toml` config file.
//!
//! ```toml
//! [export]
//! preset = "unreal"
//! directory = "//exported_maps"
//! suffix = "_4k"
//!
//! [unpack]
//! directory = "//unpacked"
//! format = "JPEG"
//! ```
//!
//! Directories starting with `//` are relative to the scene's project
//! directory.

use crate::preset::{ExportPreset, ImageFormat};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "quickmaps.toml";

/// Fallback folder for map export when the target cannot be created.
pub const EXPORT_FALLBACK_DIR: &str = "exported_maps";
/// Fallback folder for embedded texture extraction.
pub const UNPACK_FALLBACK_DIR: &str = "qup_unpacked_textures";

/// Settings for [`export_maps`](crate::export::export_maps)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub directory: String,
    pub preset: ExportPreset,
    pub format: ImageFormat,
    pub prefix: String,
    pub suffix: String,
    pub packed: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: "//exported_maps/".to_string(),
            preset: ExportPreset::Default,
            format: ImageFormat::Png,
            prefix: String::new(),
            suffix: String::new(),
            packed: false,
        }
    }
}

impl ExportConfig {
    /// Copy of this config with the preset's format, prefix, suffix and
    /// packing mode, replacing whatever was set before.
    pub fn with_preset(self, preset: ExportPreset) -> Self {
        let settings = preset.settings();
        Self {
            preset,
            format: settings.format,
            prefix: settings.prefix,
            suffix: settings.suffix,
            packed: settings.packed,
            ..self
        }
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Apply a config file section: preset first, then explicit fields.
    pub fn merge_file(self, file: &ExportSection) -> Self {
        let mut config = match file.preset {
            Some(preset) => self.with_preset(preset),
            None => self,
        };
        if let Some(ref dir) = file.directory {
            config.directory = dir.clone();
        }
        if let Some(format) = file.format {
            config.format = format;
        }
        if let Some(ref prefix) = file.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(ref suffix) = file.suffix {
            config.suffix = suffix.clone();
        }
        config
    }
}

/// Settings for [`extract_embedded`](crate::unpack::extract_embedded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackConfig {
    pub directory: String,
    pub format: ImageFormat,
}

impl Default for UnpackConfig {
    fn default() -> Self {
        Self {
            directory: "//qup_export".to_string(),
            format: ImageFormat::Png,
        }
    }
}

impl UnpackConfig {
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn merge_file(mut self, file: &UnpackSection) -> Self {
        if let Some(ref dir) = file.directory {
            self.directory = dir.clone();
        }
        if let Some(format) = file.format {
            self.format = format;
        }
        self
    }
}

/// `[export]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSection {
    pub preset: Option<ExportPreset>,
    pub directory: Option<String>,
    pub format: Option<ImageFormat>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

/// `[unpack]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnpackSection {
    pub directory: Option<String>,
    pub format: Option<ImageFormat>,
}

/// Contents of `quickmaps.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub unpack: UnpackSection,
}

impl ConfigFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load `path` if given, else `quickmaps.toml` in the working directory
    /// when it exists, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Resolve a configured directory. `//` prefixes are taken relative to
/// `project_dir` (or the working directory when there is none).
pub fn resolve_dir(raw: &str, project_dir: Option<&Path>) -> PathBuf {
    match raw.strip_prefix("//") {
        Some(rest) => {
            let base = project_dir.unwrap_or_else(|| Path::new("."));
            base.join(rest.trim_start_matches(['/', '\\']))
        }
        None => PathBuf::from(raw),
    }
}

/// Where to export when the configured directory cannot be created:
/// next to the project first, then on the user's desktop.
pub fn fallback_dirs(project_dir: Option<&Path>, folder: &str) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(project) = project_dir {
        dirs.push(project.join(folder));
    }
    if let Some(home) = home_dir() {
        dirs.push(home.join("Desktop").join(folder));
    }
    dirs
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
