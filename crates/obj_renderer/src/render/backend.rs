//! Backend abstraction traits for the rendering system
//!
//! A mesh never talks to a graphics API directly. The host engine provides
//! these services:
//!
//! - [`GpuDevice`]: static vertex buffers, texture binding and draw calls
//! - [`ShaderLibrary`]: ready-to-bind programs looked up by name
//! - [`TextureRegistry`]: GPU textures created from decoded images
//! - [`WorldOracle`]: time of day, weather and light levels (optional)
//!
//! The first three are bundled per frame in a [`RenderContext`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::ImageData;
use crate::foundation::math::{BlockPos, DVec3, Mat4, Vec3};
use crate::render::vertex::VertexData;
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Opaque handle of a GPU vertex buffer, minted by the [`GpuDevice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Process-unique handle of a texture, minted by the mesh that loads it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u64);

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

impl TextureHandle {
    /// Mint a handle no other texture in this process has
    pub fn mint() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric id
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj_renderer:texture/{}", self.0)
    }
}

/// Value pushed to a named shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `vec3`
    Vec3(Vec3),
}

/// GPU buffer and draw services
pub trait GpuDevice {
    /// Upload a vertex stream as a static (rarely updated) buffer
    fn create_static_buffer(&mut self, vertices: &VertexData) -> BackendResult<BufferHandle>;

    /// Release a buffer created by [`GpuDevice::create_static_buffer`]
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Set up render state (depth test, blending, back-face culling) for mesh drawing
    fn begin_mesh_pass(&mut self);

    /// Restore render state and unbind any vertex buffer
    fn end_mesh_pass(&mut self);

    /// Draw a buffer as triangles with the currently bound program
    fn draw(&mut self, buffer: BufferHandle, model_view: &Mat4, projection: &Mat4) -> BackendResult<()>;
}

/// A compiled shader program
pub trait ShaderProgram {
    /// Make this the active program
    fn bind(&mut self);

    /// Set a uniform by name, returning `false` when the program has no such uniform
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool;
}

/// Lookup of registered shader programs
pub trait ShaderLibrary {
    /// Program registered under `name`
    fn program(&mut self, name: &str) -> Option<&mut dyn ShaderProgram>;
}

/// GPU texture creation and destruction
pub trait TextureRegistry {
    /// Create a texture from decoded pixels under `handle`
    fn register_image(&mut self, handle: TextureHandle, image: ImageData) -> BackendResult<()>;

    /// Destroy a texture previously registered
    fn destroy(&mut self, handle: TextureHandle);
}

/// Host world queries used to derive the light state
pub trait WorldOracle {
    /// Time of day in ticks (24000 per day)
    fn time_of_day(&self) -> i64;

    /// Angle of the sun in radians
    fn sky_angle_radians(&self) -> f32;

    /// Sky light level (0..=15) at `pos`
    fn sky_light(&self, pos: BlockPos) -> u8;

    /// Block light level (0..=15) at `pos`
    fn block_light(&self, pos: BlockPos) -> u8;

    /// Rain intensity (0..=1)
    fn rain_intensity(&self) -> f32;

    /// Thunder intensity (0..=1)
    fn thunder_intensity(&self) -> f32;
}

/// Services and per-frame camera state needed to bake, draw and release a mesh
pub struct RenderContext<'a> {
    /// Buffer and draw services
    pub device: &'a mut dyn GpuDevice,
    /// Shader lookup
    pub shaders: &'a mut dyn ShaderLibrary,
    /// Texture creation
    pub textures: &'a mut dyn TextureRegistry,
    /// Current projection matrix
    pub projection: Mat4,
    /// Camera position in world space
    pub camera_position: DVec3,
}
