//! Configuration system
//!
//! Renderer and parser settings can be kept in `.toml` or `.ron` files and
//! loaded through the [`Config`] trait. Every field has a default matching
//! the stock shader set, so a partial file only overrides what it names.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::render::VertexFormat;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Options controlling how OBJ files are parsed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Fan-triangulate polygons with more than three vertices instead of rejecting them
    pub triangulate: bool,
}

/// Shader and uniform names used when drawing a mesh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Program used for groups whose material has a diffuse texture
    pub lit_textured_program: String,
    /// Program used for groups whose material has only a diffuse color
    pub position_color_program: String,
    /// Program used for groups without a resolvable material
    pub position_program: String,
    /// Scalar uniform receiving the light level
    pub light_level_uniform: String,
    /// Vec3 uniform receiving the view-space light direction
    pub light_direction_uniform: String,
    /// Texture unit diffuse maps are bound to
    pub texture_unit: u32,
    /// Parser options
    pub parse: ParseOptions,
}

impl RendererConfig {
    /// Program name for a baked vertex layout
    pub fn program_for(&self, format: VertexFormat) -> &str {
        match format {
            VertexFormat::PositionTextureColorNormal => &self.lit_textured_program,
            VertexFormat::PositionColor => &self.position_color_program,
            VertexFormat::Position => &self.position_program,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            lit_textured_program: "obj_lit".to_string(),
            position_color_program: "position_color".to_string(),
            position_program: "position".to_string(),
            light_level_uniform: "LightLevel".to_string(),
            light_direction_uniform: "LightPosition".to_string(),
            texture_unit: 0,
            parse: ParseOptions::default(),
        }
    }
}

impl Config for RendererConfig {}
