//! Per-mesh texture cache
//!
//! Diffuse maps are keyed by the file name written in the material, so
//! groups sharing a texture share one GPU texture. Each file is loaded at
//! most once per mesh.

use std::collections::HashMap;

use crate::assets::resource_provider::{read_bytes, ResourceProvider};
use crate::assets::ImageData;
use crate::error::MeshResult;
use crate::render::backend::{TextureHandle, TextureRegistry};

/// Texture file name to GPU texture handle
#[derive(Debug, Default)]
pub struct TextureCache {
    bindings: HashMap<String, TextureHandle>,
}

impl TextureCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of an already loaded texture
    pub fn get(&self, file: &str) -> Option<TextureHandle> {
        self.bindings.get(file).copied()
    }

    /// Handle of `file`, loading and registering it on first use
    pub fn get_or_load(
        &mut self,
        file: &str,
        provider: &dyn ResourceProvider,
        registry: &mut dyn TextureRegistry,
    ) -> MeshResult<TextureHandle> {
        if let Some(handle) = self.get(file) {
            return Ok(handle);
        }

        let bytes = read_bytes(provider, file)?;
        let image = ImageData::from_bytes(file, &bytes)?;
        let handle = TextureHandle::mint();
        let size = image.size_bytes();
        registry.register_image(handle, image)?;

        log::debug!("Registered texture '{}' as {} ({} bytes)", file, handle, size);
        self.bindings.insert(file.to_string(), handle);
        Ok(handle)
    }

    /// Forget `file` and destroy its texture
    pub fn evict(&mut self, file: &str, registry: &mut dyn TextureRegistry) -> bool {
        match self.bindings.remove(file) {
            Some(handle) => {
                registry.destroy(handle);
                true
            }
            None => false,
        }
    }

    /// Destroy every texture, returning how many were released
    pub fn release_all(&mut self, registry: &mut dyn TextureRegistry) -> usize {
        let count = self.bindings.len();
        for (_, handle) in self.bindings.drain() {
            registry.destroy(handle);
        }
        count
    }

    /// Number of loaded textures
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no texture is loaded
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
