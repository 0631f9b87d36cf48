//! Where exported pixel buffers go.
//!
//! Drivers never touch the filesystem directly; they ask an [`ImageSink`] to
//! create folders and persist buffers. [`FsSink`] writes real files,
//! [`DryRunSink`] only records what would be written.

use crate::material::PixelBuffer;
use crate::preset::ImageFormat;
use crate::{Error, Result};
use image::DynamicImage;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Windows ERROR_BAD_NETPATH.
const BAD_NETPATH: i32 = 53;

/// Persistence requests made by the export drivers
pub trait ImageSink {
    /// Create `path` and any missing parents.
    fn create_dir_all(&mut self, path: &Path) -> Result<()>;

    /// Whether something already occupies `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Persist `buffer` at `path` encoded as `format`.
    fn write(&mut self, path: &Path, buffer: &PixelBuffer, format: ImageFormat) -> Result<()>;
}

/// Writes files to the local filesystem with the `image` crate.
#[derive(Debug, Default)]
pub struct FsSink;

impl FsSink {
    pub fn new() -> Self {
        Self
    }
}

impl ImageSink for FsSink {
    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).map_err(|e| directory_error(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write(&mut self, path: &Path, buffer: &PixelBuffer, format: ImageFormat) -> Result<()> {
        encode(buffer, format)?
            .save_with_format(path, format.to_image_format())
            .map_err(|source| Error::Persist {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Converts a float buffer to the 8-bit layout `format` can store.
pub fn encode(buffer: &PixelBuffer, format: ImageFormat) -> Result<DynamicImage> {
    let image = DynamicImage::ImageRgba32F(buffer.to_image()?);
    Ok(if format.has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    })
}

/// Build a [`Error::DirectoryCreate`], flagging probable network path trouble.
pub fn directory_error(path: &Path, source: std::io::Error) -> Error {
    let network = is_network_failure(path, &source);
    Error::DirectoryCreate {
        path: path.to_path_buf(),
        network,
        source,
    }
}

/// Heuristic: UNC path, "network path" in the message, or ERROR_BAD_NETPATH.
pub fn is_network_failure(path: &Path, error: &std::io::Error) -> bool {
    error.raw_os_error() == Some(BAD_NETPATH)
        || error.to_string().to_lowercase().contains("network path")
        || path.to_string_lossy().starts_with(r"\\")
}

/// A write the [`DryRunSink`] accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Records directories and writes without touching disk.
///
/// Paths "written" during the run count as existing, so unique-name
/// resolution behaves as it would for real.
#[derive(Debug, Default)]
pub struct DryRunSink {
    pub dirs: Vec<PathBuf>,
    pub writes: Vec<PlannedWrite>,
    taken: HashSet<PathBuf>,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageSink for DryRunSink {
    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        if !self.dirs.iter().any(|d| d == path) {
            self.dirs.push(path.to_path_buf());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.taken.contains(path) || path.exists()
    }

    fn write(&mut self, path: &Path, buffer: &PixelBuffer, format: ImageFormat) -> Result<()> {
        self.taken.insert(path.to_path_buf());
        self.writes.push(PlannedWrite {
            path: path.to_path_buf(),
            format,
            width: buffer.width(),
            height: buffer.height(),
        });
        Ok(())
    }
}
