//! Rendering: vertex layouts, GPU baking, lighting and the draw path
//!
//! The GPU, shader and texture services of the host engine are reached
//! through the traits in [`backend`]; [`headless`] provides a recording
//! implementation of all of them.

pub mod backend;
pub mod baker;
pub mod headless;
pub mod lighting;
pub mod obj_mesh;
pub mod texture_cache;
pub mod vertex;

#[cfg(test)]
mod tests;

pub use backend::{
    BackendResult, BufferHandle, GpuDevice, RenderContext, ShaderLibrary, ShaderProgram, TextureHandle,
    TextureRegistry, UniformValue, WorldOracle,
};
pub use baker::{BakedGroup, BakedMesh, Baker};
pub use headless::{Command, HeadlessBackend};
pub use lighting::{LightState, LightingEstimator, LightingInputs};
pub use obj_mesh::{MeshState, MeshStats, ObjMesh};
pub use texture_cache::TextureCache;
pub use vertex::{VertexAttributes, VertexData, VertexFormat};

use thiserror::Error;

/// Errors reported by rendering collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// GPU resource (buffer, texture) creation failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A draw call failed
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// The shader library has no program with this name
    #[error("Shader program not found: {0}")]
    ShaderNotFound(String),
}
