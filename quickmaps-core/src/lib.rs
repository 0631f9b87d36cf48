//! # QuickMaps Core
//!
//! Texture map classification, MRAO channel packing and batch export of
//! material textures. Used by the `quickmaps` CLI.
//!
//! ## Architecture
//!
//! - [`material`] - Pixel buffers, texture references and materials
//! - [`classify`] - Map type detection from node links and names
//! - [`packing`] - Metallic/Roughness/AO channel packing
//! - [`preset`] - Output formats and export presets
//! - [`naming`] - File name sanitizing and collision-free paths
//! - [`scene`] - Scene manifests (objects, slots, materials)
//! - [`sink`] - Where exported images go (filesystem or dry run)
//! - [`export`] - Map export driver
//! - [`unpack`] - Embedded texture extraction driver
//! - [`report`] - Per-run results and failures

pub mod classify;
pub mod config;
pub mod export;
pub mod image_loading;
pub mod material;
pub mod naming;
pub mod packing;
pub mod preset;
pub mod report;
pub mod scene;
pub mod sink;
pub mod unpack;

// Re-export main types for convenient access
pub use classify::{classify, classify_from_link, classify_from_name, MapType};
pub use config::{ConfigFile, ExportConfig, UnpackConfig};
pub use export::{classify_material, export_maps};
pub use image_loading::{ImageLoader, LoadedImage};
pub use material::{Material, PixelBuffer, TextureRef};
pub use naming::{ensure_unique_path, sanitize_filename};
pub use packing::{pack_mrao, MraoSources, PackError};
pub use preset::{ExportPreset, ImageFormat, PresetSettings};
pub use report::{ExportFailure, ExportReport, ExportedFile, FailureKind};
pub use scene::{Scene, SceneManifest, Selection};
pub use sink::{DryRunSink, FsSink, ImageSink};
pub use unpack::extract_embedded;

use std::path::PathBuf;

/// Common result type for QuickMaps operations
pub type Result<T> = std::result::Result<T, Error>;

/// Library-wide error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error("Failed to write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{}", directory_message(path, *network, source))]
    DirectoryCreate {
        path: PathBuf,
        /// The path looks like an unreachable network location
        network: bool,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

fn directory_message(path: &std::path::Path, network: bool, source: &std::io::Error) -> String {
    if network {
        format!(
            "Cannot create folder {} (network path unreachable): {}",
            path.display(),
            source
        )
    } else {
        format!("Cannot create folder {}: {}", path.display(), source)
    }
}
