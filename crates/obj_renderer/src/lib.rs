//! # OBJ Renderer
//!
//! Loads textured Wavefront OBJ/MTL meshes and draws them through a host
//! engine's GPU services with a time-of-day sun light.
//!
//! ## Features
//!
//! - **OBJ/MTL Parsing**: positions, texture coordinates, normals, triangles and diffuse materials
//! - **Material Grouping**: one vertex buffer per material, drawn in first-use order
//! - **Lazy Baking**: GPU buffers and textures are created on the first draw and rolled back on failure
//! - **Sun Lighting**: scalar light level and sun direction from time of day, weather and light levels
//! - **Backend Agnostic**: GPU, shaders and textures are reached through traits; a headless backend is included
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use obj_renderer::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut mesh = ObjMesh::open("teapot.obj", DirectoryProvider::new("assets/models"))?;
//!     let mut backend = HeadlessBackend::new();
//!
//!     let mut ctx = backend.context(Mat4::identity(), DVec3::zeros());
//!     mesh.draw_in_world(&mut ctx, None, &Mat4::identity(), &Mat4::identity(), DVec3::zeros())?;
//!     mesh.close(&mut ctx)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod error;
pub mod foundation;
pub mod render;

pub use error::{MeshError, MeshResult, MissingAttribute};

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        assets::{DirectoryProvider, InMemoryProvider, ResourceProvider},
        config::{Config, ParseOptions, RendererConfig},
        foundation::math::{BlockPos, DVec3, Mat4, Vec3},
        render::{
            GpuDevice, HeadlessBackend, LightState, LightingEstimator, MeshState, ObjMesh, RenderContext,
            ShaderLibrary, TextureRegistry, WorldOracle,
        },
        MeshError, MeshResult,
    };
}
