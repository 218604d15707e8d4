//! Headless rendering backend
//!
//! Implements every backend service in memory and records each call as a
//! [`Command`], so meshes can be driven without a GPU. Used by the test
//! suite and the `mesh_viewer` tool.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{new_key_type, Key, KeyData, SlotMap};

use crate::assets::ImageData;
use crate::config::RendererConfig;
use crate::foundation::math::{DVec3, Mat4};
use crate::render::backend::{
    BackendResult, BufferHandle, GpuDevice, RenderContext, ShaderLibrary, ShaderProgram, TextureHandle,
    TextureRegistry, UniformValue,
};
use crate::render::vertex::{VertexData, VertexFormat};
use crate::render::RenderError;

new_key_type! {
    struct BufferKey;
}

/// A recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Static buffer upload
    CreateBuffer {
        /// New buffer
        buffer: BufferHandle,
        /// Vertex layout
        format: VertexFormat,
        /// Vertices uploaded
        vertex_count: usize,
    },
    /// Buffer release
    DestroyBuffer(BufferHandle),
    /// Texture creation
    RegisterTexture {
        /// Texture handle
        texture: TextureHandle,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Texture release
    DestroyTexture(TextureHandle),
    /// Texture bound to a unit
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Bound texture
        texture: TextureHandle,
    },
    /// Program made active
    BindProgram(String),
    /// Uniform written
    SetUniform {
        /// Program owning the uniform
        program: String,
        /// Uniform name
        name: String,
        /// Written value
        value: UniformValue,
    },
    /// Mesh render state set up
    BeginPass,
    /// Mesh render state restored
    EndPass,
    /// Draw call
    Draw {
        /// Buffer drawn
        buffer: BufferHandle,
        /// Model-view matrix
        model_view: Mat4,
        /// Projection matrix
        projection: Mat4,
    },
}

type CommandLog = Rc<RefCell<Vec<Command>>>;

/// In-memory [`GpuDevice`]
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    buffers: SlotMap<BufferKey, VertexData>,
    log: CommandLog,
    uploads: usize,
    draws: usize,
    upload_limit: Option<usize>,
    fail_draws: bool,
    in_pass: bool,
}

impl HeadlessDevice {
    /// Number of successful buffer uploads so far
    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    /// Buffers created and not yet destroyed
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of draw calls issued
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// Contents of a live buffer
    pub fn buffer(&self, buffer: BufferHandle) -> Option<&VertexData> {
        self.buffers.get(Self::key(buffer))
    }

    /// Whether a mesh pass is open
    pub fn in_pass(&self) -> bool {
        self.in_pass
    }

    /// Make every upload after the first `limit` successful ones fail
    pub fn fail_uploads_after(&mut self, limit: Option<usize>) {
        self.upload_limit = limit;
    }

    /// Make draw calls fail
    pub fn fail_draws(&mut self, fail: bool) {
        self.fail_draws = fail;
    }

    fn key(buffer: BufferHandle) -> BufferKey {
        KeyData::from_ffi(buffer.0).into()
    }

    fn record(&self, command: Command) {
        self.log.borrow_mut().push(command);
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_static_buffer(&mut self, vertices: &VertexData) -> BackendResult<BufferHandle> {
        if self.upload_limit.is_some_and(|limit| self.uploads >= limit) {
            return Err(RenderError::ResourceCreationFailed(format!(
                "upload limit of {} buffers reached",
                self.uploads
            )));
        }

        let key = self.buffers.insert(vertices.clone());
        let buffer = BufferHandle(key.data().as_ffi());
        self.uploads += 1;
        self.record(Command::CreateBuffer {
            buffer,
            format: vertices.format(),
            vertex_count: vertices.vertex_count(),
        });
        Ok(buffer)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(Self::key(buffer)).is_none() {
            log::warn!("Destroying unknown buffer {:?}", buffer);
        }
        self.record(Command::DestroyBuffer(buffer));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.record(Command::BindTexture { unit, texture });
    }

    fn begin_mesh_pass(&mut self) {
        self.in_pass = true;
        self.record(Command::BeginPass);
    }

    fn end_mesh_pass(&mut self) {
        self.in_pass = false;
        self.record(Command::EndPass);
    }

    fn draw(&mut self, buffer: BufferHandle, model_view: &Mat4, projection: &Mat4) -> BackendResult<()> {
        if self.fail_draws {
            return Err(RenderError::RenderingFailed("draw failure injected".to_string()));
        }
        if !self.buffers.contains_key(Self::key(buffer)) {
            return Err(RenderError::RenderingFailed(format!("unknown buffer {:?}", buffer)));
        }

        self.draws += 1;
        self.record(Command::Draw {
            buffer,
            model_view: *model_view,
            projection: *projection,
        });
        Ok(())
    }
}

/// Program of a [`HeadlessShaders`] library
#[derive(Debug)]
pub struct HeadlessProgram {
    name: String,
    uniforms: HashMap<String, Option<UniformValue>>,
    log: CommandLog,
}

impl HeadlessProgram {
    /// Last value written to `uniform`
    pub fn uniform(&self, uniform: &str) -> Option<UniformValue> {
        self.uniforms.get(uniform).copied().flatten()
    }
}

impl ShaderProgram for HeadlessProgram {
    fn bind(&mut self) {
        self.log.borrow_mut().push(Command::BindProgram(self.name.clone()));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        match self.uniforms.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                self.log.borrow_mut().push(Command::SetUniform {
                    program: self.name.clone(),
                    name: name.to_string(),
                    value,
                });
                true
            }
            None => false,
        }
    }
}

/// In-memory [`ShaderLibrary`]
#[derive(Debug, Default)]
pub struct HeadlessShaders {
    programs: HashMap<String, HeadlessProgram>,
    log: CommandLog,
}

impl HeadlessShaders {
    /// Register a program declaring the given uniforms
    pub fn register(&mut self, name: &str, uniforms: &[&str]) {
        let program = HeadlessProgram {
            name: name.to_string(),
            uniforms: uniforms.iter().map(|u| (u.to_string(), None)).collect(),
            log: Rc::clone(&self.log),
        };
        self.programs.insert(name.to_string(), program);
    }

    /// Remove a program
    pub fn remove(&mut self, name: &str) -> bool {
        self.programs.remove(name).is_some()
    }

    /// Registered program by name
    pub fn get(&self, name: &str) -> Option<&HeadlessProgram> {
        self.programs.get(name)
    }
}

impl ShaderLibrary for HeadlessShaders {
    fn program(&mut self, name: &str) -> Option<&mut dyn ShaderProgram> {
        self.programs
            .get_mut(name)
            .map(|program| program as &mut dyn ShaderProgram)
    }
}

/// In-memory [`TextureRegistry`]
#[derive(Debug, Default)]
pub struct HeadlessTextures {
    live: HashMap<TextureHandle, ImageData>,
    log: CommandLog,
    registered: usize,
    destroyed: usize,
}

impl HeadlessTextures {
    /// Number of textures ever registered
    pub fn registered_count(&self) -> usize {
        self.registered
    }

    /// Number of destroy calls
    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    /// Textures registered and not yet destroyed
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Dimensions of a live texture
    pub fn size_of(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.live.get(&handle).map(|image| (image.width, image.height))
    }
}

impl TextureRegistry for HeadlessTextures {
    fn register_image(&mut self, handle: TextureHandle, image: ImageData) -> BackendResult<()> {
        if self.live.contains_key(&handle) {
            return Err(RenderError::ResourceCreationFailed(format!("{} already registered", handle)));
        }

        self.log.borrow_mut().push(Command::RegisterTexture {
            texture: handle,
            width: image.width,
            height: image.height,
        });
        self.live.insert(handle, image);
        self.registered += 1;
        Ok(())
    }

    fn destroy(&mut self, handle: TextureHandle) {
        if self.live.remove(&handle).is_none() {
            log::warn!("Destroying unknown texture {}", handle);
        }
        self.destroyed += 1;
        self.log.borrow_mut().push(Command::DestroyTexture(handle));
    }
}

/// Device, shaders and textures sharing one command log
#[derive(Debug)]
pub struct HeadlessBackend {
    /// Buffer and draw services
    pub device: HeadlessDevice,
    /// Shader programs
    pub shaders: HeadlessShaders,
    /// Texture registry
    pub textures: HeadlessTextures,
    log: CommandLog,
}

impl HeadlessBackend {
    /// Backend with the stock program names
    pub fn new() -> Self {
        Self::with_programs(&RendererConfig::default())
    }

    /// Backend with the programs named by `config`
    ///
    /// The lit program declares the light uniforms; the color and
    /// position-only programs declare none.
    pub fn with_programs(config: &RendererConfig) -> Self {
        let log = CommandLog::default();
        let mut shaders = HeadlessShaders {
            programs: HashMap::new(),
            log: Rc::clone(&log),
        };
        shaders.register(
            &config.lit_textured_program,
            &[config.light_level_uniform.as_str(), config.light_direction_uniform.as_str()],
        );
        shaders.register(&config.position_color_program, &[]);
        shaders.register(&config.position_program, &[]);

        Self {
            device: HeadlessDevice {
                log: Rc::clone(&log),
                ..HeadlessDevice::default()
            },
            shaders,
            textures: HeadlessTextures {
                log: Rc::clone(&log),
                ..HeadlessTextures::default()
            },
            log,
        }
    }

    /// Borrow all services as a frame context
    pub fn context(&mut self, projection: Mat4, camera_position: DVec3) -> RenderContext<'_> {
        RenderContext {
            device: &mut self.device,
            shaders: &mut self.shaders,
            textures: &mut self.textures,
            projection,
            camera_position,
        }
    }

    /// Every recorded call, oldest first
    pub fn commands(&self) -> Vec<Command> {
        self.log.borrow().clone()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    fn blank_image(width: u32, height: u32) -> ImageData {
        ImageData {
            data: vec![0; (width * height * 4) as usize],
            width,
            height,
        }
    }

    fn triangle() -> VertexData {
        let mut data = VertexData::with_capacity(VertexFormat::Position, 3);
        data.push_position(Vec3::new(0.0, 0.0, 0.0));
        data.push_position(Vec3::new(1.0, 0.0, 0.0));
        data.push_position(Vec3::new(0.0, 1.0, 0.0));
        data
    }

    #[test]
    fn test_buffer_lifecycle() {
        let mut backend = HeadlessBackend::new();
        let buffer = backend.device.create_static_buffer(&triangle()).unwrap();

        assert_eq!(backend.device.buffer(buffer).map(VertexData::vertex_count), Some(3));
        backend.device.destroy_buffer(buffer);
        assert_eq!(backend.device.live_buffer_count(), 0);
        assert!(backend
            .device
            .draw(buffer, &Mat4::identity(), &Mat4::identity())
            .is_err());
        assert_eq!(
            backend.commands(),
            [
                Command::CreateBuffer {
                    buffer,
                    format: VertexFormat::Position,
                    vertex_count: 3
                },
                Command::DestroyBuffer(buffer),
            ]
        );
    }

    #[test]
    fn test_upload_limit() {
        let mut backend = HeadlessBackend::new();
        backend.device.fail_uploads_after(Some(1));

        assert!(backend.device.create_static_buffer(&triangle()).is_ok());
        assert!(matches!(
            backend.device.create_static_buffer(&triangle()),
            Err(RenderError::ResourceCreationFailed(_))
        ));
        assert_eq!(backend.device.upload_count(), 1);
    }

    #[test]
    fn test_programs_only_accept_declared_uniforms() {
        let mut backend = HeadlessBackend::new();

        let lit = backend.shaders.program("obj_lit").unwrap();
        assert!(lit.set_uniform("LightLevel", UniformValue::Float(0.5)));
        let color = backend.shaders.program("position_color").unwrap();
        assert!(!color.set_uniform("LightLevel", UniformValue::Float(0.5)));
        assert!(backend.shaders.program("missing").is_none());

        assert_eq!(
            backend.shaders.get("obj_lit").and_then(|p| p.uniform("LightLevel")),
            Some(UniformValue::Float(0.5))
        );
    }

    #[test]
    fn test_texture_registration() {
        let mut backend = HeadlessBackend::new();
        let handle = TextureHandle::mint();

        backend
            .textures
            .register_image(handle, blank_image(3, 2))
            .unwrap();
        assert!(backend
            .textures
            .register_image(handle, blank_image(1, 1))
            .is_err());
        assert_eq!(backend.textures.size_of(handle), Some((3, 2)));

        backend.textures.destroy(handle);
        assert_eq!(backend.textures.live_count(), 0);
        assert_eq!(backend.textures.destroyed_count(), 1);
    }
}
