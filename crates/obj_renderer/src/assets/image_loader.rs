//! Image loading utilities for texture data
//!
//! Decodes diffuse maps into RGBA8 pixels ready for the texture registry.

use crate::error::{MeshError, MeshResult};

/// Decoded image data ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGBA pixel data, row-major from the top-left corner
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Decode an image file held in memory
    ///
    /// `name` is only used for error reporting and logging.
    pub fn from_bytes(name: &str, bytes: &[u8]) -> MeshResult<Self> {
        let img = image::load_from_memory(bytes).map_err(|source| MeshError::ImageDecode {
            name: name.to_string(),
            source,
        })?;

        // Convert to RGBA8 format (standard for GPU upload)
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("Decoded image '{}' ({}x{})", name, width, height);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Get the size of the image data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}
