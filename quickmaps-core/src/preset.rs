//! Output formats and export presets.
//!
//! A preset is a fixed bundle of format / prefix / suffix / packing mode.
//! Applying one replaces those fields wholesale; see
//! [`ExportConfig::with_preset`](crate::config::ExportConfig::with_preset).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image formats textures can be written as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Targa,
    Bmp,
    Tiff,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 5] = [
        ImageFormat::Png,
        ImageFormat::Jpeg,
        ImageFormat::Targa,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
    ];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Targa => "tga",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tif",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Targa => "TARGA",
            ImageFormat::Bmp => "BMP",
            ImageFormat::Tiff => "TIFF",
        }
    }

    /// JPEG has no alpha channel.
    pub fn has_alpha(&self) -> bool {
        !matches!(self, ImageFormat::Jpeg)
    }

    pub fn to_image_format(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Targa => image::ImageFormat::Tga,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ImageFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "targa" | "tga" => Ok(ImageFormat::Targa),
            "bmp" => Ok(ImageFormat::Bmp),
            "tiff" | "tif" => Ok(ImageFormat::Tiff),
            _ => Err(crate::Error::Config(format!(
                "Unknown format: {}. Use png, jpeg, targa, bmp, or tiff.",
                s
            ))),
        }
    }
}

/// Named export configuration bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPreset {
    #[default]
    Default,
    /// Unreal Engine PBR: TGA maps
    UnrealPbr,
    /// Unity HDRP: PNG maps
    UnityHdrp,
    /// One packed Metallic-Roughness-AO image per material
    PackedMrao,
}

/// Fields a preset controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetSettings {
    pub format: ImageFormat,
    pub prefix: String,
    pub suffix: String,
    pub packed: bool,
}

impl ExportPreset {
    pub const ALL: [ExportPreset; 4] = [
        ExportPreset::Default,
        ExportPreset::UnrealPbr,
        ExportPreset::UnityHdrp,
        ExportPreset::PackedMrao,
    ];

    pub fn settings(&self) -> PresetSettings {
        let (format, prefix, packed) = match self {
            ExportPreset::Default => (ImageFormat::Png, "", false),
            ExportPreset::UnrealPbr => (ImageFormat::Targa, "", false),
            ExportPreset::UnityHdrp => (ImageFormat::Png, "", false),
            ExportPreset::PackedMrao => (ImageFormat::Targa, "packed_", true),
        };
        PresetSettings {
            format,
            prefix: prefix.to_string(),
            suffix: String::new(),
            packed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportPreset::Default => "Default",
            ExportPreset::UnrealPbr => "Unreal Engine PBR",
            ExportPreset::UnityHdrp => "Unity HDRP",
            ExportPreset::PackedMrao => "Packed MRAO",
        }
    }

    /// Identifier accepted by [`FromStr`].
    pub fn id(&self) -> &'static str {
        match self {
            ExportPreset::Default => "default",
            ExportPreset::UnrealPbr => "unreal",
            ExportPreset::UnityHdrp => "unity",
            ExportPreset::PackedMrao => "packed",
        }
    }
}

impl FromStr for ExportPreset {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(ExportPreset::Default),
            "unreal" | "unreal_pbr" => Ok(ExportPreset::UnrealPbr),
            "unity" | "unity_hdrp" => Ok(ExportPreset::UnityHdrp),
            "packed" | "packed_mrao" | "mrao" => Ok(ExportPreset::PackedMrao),
            _ => Err(crate::Error::Config(format!(
                "Unknown preset: {}. Use default, unreal, unity, or packed.",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::Targa.extension(), "tga");
        assert_eq!(ImageFormat::Tiff.extension(), "tif");
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Bmp.extension(), "bmp");
    }

    #[test]
    fn preset_table() {
        let packed = ExportPreset::PackedMrao.settings();
        assert_eq!(packed.format, ImageFormat::Targa);
        assert_eq!(packed.prefix, "packed_");
        assert!(packed.packed);

        assert_eq!(ExportPreset::UnrealPbr.settings().format, ImageFormat::Targa);
        assert_eq!(ExportPreset::UnityHdrp.settings().format, ImageFormat::Png);
        for preset in ExportPreset::ALL {
            assert_eq!(preset.settings().suffix, "");
        }
        assert!(!ExportPreset::Default.settings().packed);
    }

    #[test]
    fn parse_names() {
        assert_eq!("TGA".parse::<ImageFormat>().unwrap(), ImageFormat::Targa);
        assert_eq!("unity_hdrp".parse::<ExportPreset>().unwrap(), ExportPreset::UnityHdrp);
        assert!("webp".parse::<ImageFormat>().is_err());
        for preset in ExportPreset::ALL {
            assert_eq!(preset.id().parse::<ExportPreset>().unwrap(), preset);
        }
    }

    #[test]
    fn serde_names() {
        assert_eq!(serde_json::to_string(&ImageFormat::Targa).unwrap(), "\"TARGA\"");
        let p: ExportPreset = serde_json::from_str("\"packed_mrao\"").unwrap();
        assert_eq!(p, ExportPreset::PackedMrao);
    }
}
