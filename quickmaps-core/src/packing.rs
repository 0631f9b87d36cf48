//! Metallic / Roughness / AO channel packing.
//!
//! - **R channel** = Metallic
//! - **G channel** = Roughness
//! - **B channel** = Ambient Occlusion
//! - **A channel** = 1.0
//!
//! Each input is treated as grayscale (R channel used). A missing input packs
//! as zeros. Inputs must all be the same size; nothing is resized.

use crate::material::{PixelBuffer, TextureRef, CHANNELS};
use std::fmt;

/// Why a packed MRAO buffer could not be produced
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PackError {
    #[error("no metallic, roughness or AO maps found")]
    NoSourceMaps,

    #[error("size mismatch: expected {width}x{height}, got {}", list_offenders(.offending))]
    SizeMismatch {
        width: u32,
        height: u32,
        offending: Vec<MismatchedImage>,
    },
}

/// An input whose dimensions disagree with the packing target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchedImage {
    pub image_name: String,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for MismatchedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}x{})", self.image_name, self.width, self.height)
    }
}

fn list_offenders(offending: &[MismatchedImage]) -> String {
    offending
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pack up to three grayscale maps into one RGBA buffer (R=metallic,
/// G=roughness, B=AO, A=1.0).
///
/// The target size comes from the first present input in argument order.
/// Any present input of another size fails the whole call.
pub fn pack_mrao(
    metallic: Option<&TextureRef>,
    roughness: Option<&TextureRef>,
    ao: Option<&TextureRef>,
) -> Result<PixelBuffer, PackError> {
    let inputs = [metallic, roughness, ao];
    let Some(base) = inputs.iter().flatten().next() else {
        return Err(PackError::NoSourceMaps);
    };
    let (width, height) = (base.width(), base.height());

    let offending: Vec<MismatchedImage> = inputs
        .iter()
        .flatten()
        .filter(|t| t.width() != width || t.height() != height)
        .map(|t| MismatchedImage {
            image_name: t.image_name().to_string(),
            width: t.width(),
            height: t.height(),
        })
        .collect();
    if !offending.is_empty() {
        return Err(PackError::SizeMismatch {
            width,
            height,
            offending,
        });
    }

    let pixel_count = (width as usize) * (height as usize);
    let gray = |t: Option<&TextureRef>| match t {
        Some(t) => t.pixels().channel(0),
        None => vec![0.0; pixel_count],
    };
    let m = gray(metallic);
    let r = gray(roughness);
    let a = gray(ao);

    let mut data = Vec::with_capacity(pixel_count * CHANNELS);
    for i in 0..pixel_count {
        data.extend_from_slice(&[m[i], r[i], a[i], 1.0]);
    }

    Ok(PixelBuffer::from_raw_parts(width, height, data))
}

/// The textures of one material feeding a packed MRAO image.
#[derive(Debug, Clone, Copy, Default)]
pub struct MraoSources<'a> {
    pub metallic: Option<&'a TextureRef>,
    pub roughness: Option<&'a TextureRef>,
    pub ao: Option<&'a TextureRef>,
}

impl<'a> MraoSources<'a> {
    /// First texture whose image name contains "metal", "rough" and "ao"
    /// respectively (case-insensitive), in node order. Node links are not
    /// consulted, so an AO map wired into a mix node still packs.
    pub fn select(textures: &'a [TextureRef]) -> Self {
        let find = |keyword: &str| {
            textures
                .iter()
                .find(|t| t.image_name().to_lowercase().contains(keyword))
        };
        Self {
            metallic: find("metal"),
            roughness: find("rough"),
            ao: find("ao"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metallic.is_none() && self.roughness.is_none() && self.ao.is_none()
    }

    pub fn pack(&self) -> Result<PixelBuffer, PackError> {
        pack_mrao(self.metallic, self.roughness, self.ao)
    }
}
