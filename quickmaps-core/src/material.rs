//! Materials and the texture references they carry.
//!
//! A [`TextureRef`] is one image texture node of a material: the image's
//! float RGBA pixels plus the names and link target the classifier looks at.

use crate::Result;

/// Floats per pixel (RGBA interleaved).
pub const CHANNELS: usize = 4;

/// RGBA float pixel data
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl PixelBuffer {
    /// Wrap raw RGBA floats (row-major). Fails if `data` does not hold exactly
    /// `width * height * 4` values.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = pixel_count(width, height) * CHANNELS;
        if data.len() != expected {
            return Err(crate::Error::InvalidBuffer(format!(
                "{}x{} RGBA buffer needs {} values, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Caller guarantees `data.len() == width * height * 4`.
    pub(crate) fn from_raw_parts(width: u32, height: u32, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), pixel_count(width, height) * CHANNELS);
        Self {
            width,
            height,
            data,
        }
    }

    /// Buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [f32; 4]) -> Self {
        let count = pixel_count(width, height);
        let mut data = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        pixel_count(self.width, self.height)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<f32> {
        self.data
    }

    /// Get pixel at (x, y) as [R, G, B, A]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// One value per pixel taken from channel `index` (0 = R .. 3 = A).
    pub fn channel(&self, index: usize) -> Vec<f32> {
        self.data
            .iter()
            .skip(index)
            .step_by(CHANNELS)
            .copied()
            .collect()
    }

    pub fn to_image(&self) -> Result<image::Rgba32FImage> {
        image::Rgba32FImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| crate::Error::InvalidBuffer("Invalid texture dimensions".into()))
    }

    pub fn from_image(image: image::Rgba32FImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize)
}

/// An image texture node of a material.
///
/// Built once by the scene adapter and read-only afterwards.
#[derive(Debug, Clone)]
pub struct TextureRef {
    image_name: String,
    node_name: String,
    node_label: String,
    connected_socket_name: Option<String>,
    connected_node_kind: Option<String>,
    embedded: bool,
    pixels: PixelBuffer,
}

impl TextureRef {
    pub fn new(image_name: impl Into<String>, pixels: PixelBuffer) -> Self {
        Self {
            image_name: image_name.into(),
            node_name: String::new(),
            node_label: String::new(),
            connected_socket_name: None,
            connected_node_kind: None,
            embedded: false,
            pixels,
        }
    }

    pub fn with_node(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.node_name = name.into();
        self.node_label = label.into();
        self
    }

    /// Record where the node's color output is linked: the target socket
    /// name and/or the kind of the target node.
    pub fn with_connection(mut self, socket_name: Option<String>, node_kind: Option<String>) -> Self {
        self.connected_socket_name = socket_name;
        self.connected_node_kind = node_kind;
        self
    }

    /// Mark the image as embedded in the scene file.
    pub fn with_embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn node_label(&self) -> &str {
        &self.node_label
    }

    pub fn connected_socket_name(&self) -> Option<&str> {
        self.connected_socket_name.as_deref()
    }

    pub fn connected_node_kind(&self) -> Option<&str> {
        self.connected_node_kind.as_deref()
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width
    }

    pub fn height(&self) -> u32 {
        self.pixels.height
    }
}

/// A material with its image texture nodes in node-tree order.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Materials without a node tree have no textures to export.
    pub use_nodes: bool,
    pub textures: Vec<TextureRef>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            use_nodes: true,
            textures: Vec::new(),
        }
    }

    pub fn with_texture(mut self, texture: TextureRef) -> Self {
        self.textures.push(texture);
        self
    }

    pub fn embedded_textures(&self) -> impl Iterator<Item = &TextureRef> {
        self.textures.iter().filter(|t| t.is_embedded())
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}
