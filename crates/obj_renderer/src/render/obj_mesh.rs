//! Drawable OBJ mesh
//!
//! [`ObjMesh`] parses its OBJ and MTL files when opened, bakes GPU buffers on
//! the first draw and keeps them until [`ObjMesh::close`]. Every GPU resource
//! it creates is owned by the mesh and released exactly once.

use std::fmt;

use crate::assets::resource_provider::ResourceProvider;
use crate::assets::{GroupKey, MaterialGrouper, MaterialGroups, MaterialLibrary, ObjDocument, ObjLoader};
use crate::config::RendererConfig;
use crate::error::{MeshError, MeshResult};
use crate::foundation::math::{transform_direction, BlockPos, DVec3, Mat4, Vec3};
use crate::render::backend::{RenderContext, UniformValue, WorldOracle};
use crate::render::baker::{BakedMesh, Baker};
use crate::render::lighting::{LightState, LightingEstimator};
use crate::render::texture_cache::TextureCache;
use crate::render::RenderError;

/// Lifecycle state of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshState {
    /// Parsed, no GPU resources yet
    Unbaked,
    /// GPU buffers exist
    Baked,
    /// Released; every further operation fails
    Closed,
}

/// Counts describing a loaded mesh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Vertex positions
    pub positions: usize,
    /// Texture coordinates
    pub tex_coords: usize,
    /// Normals
    pub normals: usize,
    /// Triangles
    pub faces: usize,
    /// Material groups
    pub groups: usize,
    /// Materials defined by the loaded libraries
    pub materials: usize,
    /// Loaded textures
    pub textures: usize,
    /// Baked vertex buffers
    pub buffers: usize,
    /// Vertices across all baked buffers
    pub vertices: usize,
}

/// A Wavefront OBJ mesh that can be drawn through a [`RenderContext`]
pub struct ObjMesh {
    name: String,
    provider: Box<dyn ResourceProvider>,
    config: RendererConfig,
    document: ObjDocument,
    materials: MaterialLibrary,
    groups: MaterialGroups,
    textures: TextureCache,
    baked: Option<BakedMesh>,
    closed: bool,
}

impl ObjMesh {
    /// Load `name` and its material libraries from `provider` with the default configuration
    pub fn open(name: impl Into<String>, provider: impl ResourceProvider + 'static) -> MeshResult<Self> {
        Self::open_with(name, provider, RendererConfig::default())
    }

    /// Load `name` and its material libraries from `provider`
    pub fn open_with(
        name: impl Into<String>,
        provider: impl ResourceProvider + 'static,
        config: RendererConfig,
    ) -> MeshResult<Self> {
        let name = name.into();
        let provider: Box<dyn ResourceProvider> = Box::new(provider);

        let (document, materials) = ObjLoader::load(&name, provider.as_ref(), &config.parse)?;
        let groups = MaterialGrouper::split(&document);

        for group in &groups {
            if let GroupKey::Material(material) = &group.key {
                if materials.get(material).is_none() {
                    log::warn!(
                        "{}: material '{}' is not defined, its {} face(s) are drawn untextured",
                        name,
                        material,
                        group.len()
                    );
                }
            }
        }

        log::info!(
            "Opened mesh '{}' ({} faces in {} material groups)",
            name,
            document.faces.len(),
            groups.len()
        );

        Ok(Self {
            name,
            provider,
            config,
            document,
            materials,
            groups,
            textures: TextureCache::new(),
            baked: None,
            closed: false,
        })
    }

    /// Name the mesh was opened with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> MeshState {
        if self.closed {
            MeshState::Closed
        } else if self.baked.is_some() {
            MeshState::Baked
        } else {
            MeshState::Unbaked
        }
    }

    /// Renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Parsed geometry
    pub fn document(&self) -> &ObjDocument {
        &self.document
    }

    /// Materials of the loaded libraries; empty once closed
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Faces grouped by material, in draw order
    pub fn groups(&self) -> &MaterialGroups {
        &self.groups
    }

    /// Counts of parsed data and live GPU resources
    pub fn stats(&self) -> MeshStats {
        let baked = self.baked.as_ref();
        MeshStats {
            positions: self.document.positions.len(),
            tex_coords: self.document.tex_coords.len(),
            normals: self.document.normals.len(),
            faces: self.document.faces.len(),
            groups: self.groups.len(),
            materials: self.materials.len(),
            textures: self.textures.len(),
            buffers: baked.map_or(0, BakedMesh::len),
            vertices: baked.map_or(0, |b| b.groups().iter().map(|g| g.vertex_count).sum()),
        }
    }

    /// Create GPU buffers unless already baked
    ///
    /// A failed bake leaves no resources behind and is retried by the next draw.
    fn bake(&mut self, ctx: &mut RenderContext<'_>) -> MeshResult<()> {
        if self.closed {
            return Err(MeshError::InvalidState("cannot bake a closed mesh"));
        }
        if self.baked.is_some() {
            return Ok(());
        }

        let baker = Baker::new(&self.document, &self.materials, self.provider.as_ref());
        let baked = baker.bake(&self.groups, &mut self.textures, ctx.device, ctx.textures)?;

        log::debug!(
            "Baked mesh '{}': {} buffer(s), {} texture(s)",
            self.name,
            baked.len(),
            self.textures.len()
        );
        self.baked = Some(baked);
        Ok(())
    }

    /// Draw with a light level and sun direction computed from `world` at `origin`
    ///
    /// Without a world the mesh is drawn at the minimum light level with the
    /// sun direction of tick 0.
    pub fn draw_in_world(
        &mut self,
        ctx: &mut RenderContext<'_>,
        world: Option<&dyn WorldOracle>,
        transform: &Mat4,
        view: &Mat4,
        origin: DVec3,
    ) -> MeshResult<()> {
        let light = match world {
            Some(world) => LightingEstimator::estimate_world(world, BlockPos::floored(&origin)),
            None => LightState::fallback(),
        };
        self.draw(ctx, transform, view, origin, light.level, light.sun_direction)
    }

    /// Draw every material group
    ///
    /// `transform` is camera relative; the mesh is placed at `origin` in
    /// world space and `view` is applied last. Bakes first if needed.
    pub fn draw(
        &mut self,
        ctx: &mut RenderContext<'_>,
        transform: &Mat4,
        view: &Mat4,
        origin: DVec3,
        light_level: f32,
        sun_direction: Vec3,
    ) -> MeshResult<()> {
        if self.closed {
            return Err(MeshError::InvalidState("cannot draw a closed mesh"));
        }
        self.bake(ctx)?;
        let Some(baked) = &self.baked else {
            return Err(MeshError::InvalidState("mesh has no baked buffers"));
        };

        let offset = (origin - ctx.camera_position).cast::<f32>();
        let model_view = transform * Mat4::new_translation(&offset) * view;
        let light_direction = view_space_direction(view, sun_direction);

        ctx.device.begin_mesh_pass();
        let result = draw_groups(baked, &self.config, ctx, &model_view, light_level, light_direction);
        ctx.device.end_mesh_pass();
        result
    }

    /// Release every buffer and texture and mark the mesh closed
    pub fn close(&mut self, ctx: &mut RenderContext<'_>) -> MeshResult<()> {
        if self.closed {
            return Err(MeshError::InvalidState("mesh is already closed"));
        }

        let buffers = self.baked.as_ref().map_or(0, BakedMesh::len);
        if let Some(baked) = self.baked.take() {
            baked.release(ctx.device);
        }
        let textures = self.textures.release_all(ctx.textures);
        self.materials.clear();
        self.closed = true;

        log::debug!(
            "Closed mesh '{}': released {} buffer(s), {} texture(s)",
            self.name,
            buffers,
            textures
        );
        Ok(())
    }
}

/// Sun direction in view space
///
/// An identity view leaves the direction as is; otherwise it is moved by the
/// inverse view rotation. A singular view also leaves it as is.
fn view_space_direction(view: &Mat4, sun_direction: Vec3) -> Vec3 {
    if *view == Mat4::identity() {
        return sun_direction;
    }
    match view.try_inverse() {
        Some(inverse) => transform_direction(&inverse, &sun_direction),
        None => {
            log::warn!("View matrix is not invertible, light direction left in world space");
            sun_direction
        }
    }
}

fn draw_groups(
    baked: &BakedMesh,
    config: &RendererConfig,
    ctx: &mut RenderContext<'_>,
    model_view: &Mat4,
    light_level: f32,
    light_direction: Vec3,
) -> MeshResult<()> {
    for group in baked.groups() {
        if let Some(texture) = group.texture {
            ctx.device.bind_texture(config.texture_unit, texture);
        }

        let program_name = config.program_for(group.format);
        let program = ctx
            .shaders
            .program(program_name)
            .ok_or_else(|| RenderError::ShaderNotFound(program_name.to_string()))?;
        program.bind();

        if group.format.is_materialed() {
            let uniforms = [
                (&config.light_level_uniform, UniformValue::Float(light_level)),
                (&config.light_direction_uniform, UniformValue::Vec3(light_direction)),
            ];
            for (uniform, value) in uniforms {
                if !program.set_uniform(uniform, value) {
                    log::trace!("Program '{}' has no uniform '{}'", program_name, uniform);
                }
            }
        }

        ctx.device.draw(group.buffer, model_view, &ctx.projection)?;
    }
    Ok(())
}

impl fmt::Debug for ObjMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjMesh")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Drop for ObjMesh {
    fn drop(&mut self) {
        if !self.closed && (self.baked.is_some() || !self.textures.is_empty()) {
            log::warn!(
                "Mesh '{}' dropped without close(), {} buffer(s) and {} texture(s) leaked",
                self.name,
                self.baked.as_ref().map_or(0, BakedMesh::len),
                self.textures.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::InMemoryProvider;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_view_leaves_direction() {
        let sun = Vec3::new(0.6, 0.8, 0.0);
        assert_eq!(view_space_direction(&Mat4::identity(), sun), sun);
    }

    #[test]
    fn test_rotated_view_uses_inverse() {
        let view = Mat4::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2);
        let direction = view_space_direction(&view, Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(direction, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_scaled_view_divides() {
        let view = Mat4::new_scaling(2.0);
        let direction = view_space_direction(&view, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(direction, Vec3::new(0.5, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_singular_view_leaves_direction() {
        let view = Mat4::zeros();
        let sun = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(view_space_direction(&view, sun), sun);
    }

    #[test]
    fn test_open_failure_reports_missing_file() {
        let result = ObjMesh::open("missing.obj", InMemoryProvider::new());
        assert!(matches!(result, Err(MeshError::ResourceIo { ref name, .. }) if name == "missing.obj"));
    }

    #[test]
    fn test_open_missing_library() {
        let provider = InMemoryProvider::new().with("m.obj", b"mtllib gone.mtl\nv 0 0 0\n".to_vec());
        let result = ObjMesh::open("m.obj", provider);
        assert!(matches!(result, Err(MeshError::ResourceIo { ref name, .. }) if name == "gone.mtl"));
    }

    #[test]
    fn test_fresh_mesh_is_unbaked() {
        let provider = InMemoryProvider::new().with("m.obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());
        let mesh = ObjMesh::open("m.obj", provider).unwrap();

        assert_eq!(mesh.name(), "m.obj");
        assert_eq!(mesh.state(), MeshState::Unbaked);
        assert_eq!(
            mesh.stats(),
            MeshStats {
                positions: 3,
                faces: 1,
                groups: 1,
                ..MeshStats::default()
            }
        );
    }
}
