//! Crate-level error type

use std::fmt;

use thiserror::Error;

use crate::assets::ParseError;
use crate::render::RenderError;

/// Per-vertex attribute a textured material requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingAttribute {
    /// Texture coordinate index
    TexCoord,
    /// Normal index
    Normal,
}

impl fmt::Display for MissingAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TexCoord => f.write_str("texture coordinate"),
            Self::Normal => f.write_str("normal"),
        }
    }
}

/// Errors produced while loading, baking, drawing or releasing a mesh
#[derive(Error, Debug)]
pub enum MeshError {
    /// The resource provider could not open or read a file
    #[error("Failed to read resource '{name}': {source}")]
    ResourceIo {
        /// Resource name as given to the provider
        name: String,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// Malformed mesh or material file
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A texture file was read but could not be decoded
    #[error("Failed to decode texture '{name}': {source}")]
    ImageDecode {
        /// Texture file name
        name: String,
        /// Decoder failure
        #[source]
        source: image::ImageError,
    },

    /// A material declares a diffuse texture but the geometry lacks UV or normal data
    #[error("Material '{material}' has a diffuse texture but face {face} has no {missing} index")]
    CorruptGeometry {
        /// Material name of the offending group
        material: String,
        /// Index of the face in the parsed document
        face: usize,
        /// Attribute that was absent
        missing: MissingAttribute,
    },

    /// Operation on a mesh that has been closed
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// A rendering collaborator failed
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for mesh operations
pub type MeshResult<T> = Result<T, MeshError>;
