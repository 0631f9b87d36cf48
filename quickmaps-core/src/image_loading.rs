//! Image loading.
//!
//! Decodes PNG, JPG, TGA, BMP and TIFF files into float RGBA buffers
//! (values in [0, 1], 4 floats per pixel, row-major).

use crate::material::PixelBuffer;
use crate::Result;
use image::{DynamicImage, ImageFormat};
use std::path::Path;

/// Supported image formats for loading
pub const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Tga,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// A decoded texture image
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixels: PixelBuffer,
    /// Source format used when loading
    pub format: ImageFormat,
    /// Detected channel/color info
    pub color_type: String,
}

impl LoadedImage {
    fn from_dynamic(image: DynamicImage, format: ImageFormat) -> Self {
        let color_type = format!("{:?}", image.color());
        let pixels = PixelBuffer::from_image(image.to_rgba32f());
        Self {
            pixels,
            format,
            color_type,
        }
    }
}

/// Loads texture images from disk
pub struct ImageLoader;

impl ImageLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadedImage> {
        let path = path.as_ref();
        let reader = image::ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            crate::Error::Other(format!("Unrecognized image format: {}", path.display()))
        })?;

        if !SUPPORTED_FORMATS.contains(&format) {
            return Err(crate::Error::Other(format!(
                "Unsupported format: {:?}. Use PNG, JPG, TGA, BMP, or TIFF.",
                format
            )));
        }

        let image = reader.decode()?;
        Ok(LoadedImage::from_dynamic(image, format))
    }

    /// Load and keep only the pixels.
    pub fn load_pixels<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
        Ok(Self::load(path)?.pixels)
    }
}
