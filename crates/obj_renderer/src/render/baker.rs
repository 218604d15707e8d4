//! Bakes material groups into static GPU vertex buffers
//!
//! One buffer per group, in the layout the group's material calls for.
//! Baking either completes for every group or leaves nothing behind: on
//! failure the buffers and textures created by that attempt are destroyed.

use crate::assets::resource_provider::ResourceProvider;
use crate::assets::{GroupKey, Material, MaterialGroup, MaterialGroups, MaterialLibrary, ObjDocument};
use crate::error::{MeshError, MeshResult, MissingAttribute};
use crate::foundation::math::Vec2;
use crate::render::backend::{BufferHandle, GpuDevice, TextureHandle, TextureRegistry};
use crate::render::texture_cache::TextureCache;
use crate::render::vertex::{VertexData, VertexFormat};

/// GPU buffer of one material group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakedGroup {
    /// Group key
    pub key: GroupKey,
    /// Vertex layout of the buffer
    pub format: VertexFormat,
    /// Vertex buffer
    pub buffer: BufferHandle,
    /// Diffuse texture, for textured layouts
    pub texture: Option<TextureHandle>,
    /// Number of vertices uploaded
    pub vertex_count: usize,
}

/// All buffers of a mesh, in group order
#[derive(Debug, Default)]
pub struct BakedMesh {
    groups: Vec<BakedGroup>,
}

impl BakedMesh {
    /// Baked groups in draw order
    pub fn groups(&self) -> &[BakedGroup] {
        &self.groups
    }

    /// Number of buffers
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether nothing was baked
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Destroy every buffer
    pub fn release(self, device: &mut dyn GpuDevice) {
        for group in self.groups {
            device.destroy_buffer(group.buffer);
        }
    }
}

/// Converts a parsed document into GPU buffers
pub struct Baker<'a> {
    document: &'a ObjDocument,
    materials: &'a MaterialLibrary,
    provider: &'a dyn ResourceProvider,
}

impl<'a> Baker<'a> {
    /// Create a baker over a document, its materials and the provider textures are read from
    pub fn new(
        document: &'a ObjDocument,
        materials: &'a MaterialLibrary,
        provider: &'a dyn ResourceProvider,
    ) -> Self {
        Self {
            document,
            materials,
            provider,
        }
    }

    /// Bake every group
    ///
    /// Textures are loaded through `cache`. On error everything created by
    /// this call is destroyed again and the cache is left as it was.
    pub fn bake(
        &self,
        groups: &MaterialGroups,
        cache: &mut TextureCache,
        device: &mut dyn GpuDevice,
        registry: &mut dyn TextureRegistry,
    ) -> MeshResult<BakedMesh> {
        let mut baked = BakedMesh::default();
        let mut loaded_textures = Vec::new();

        for group in groups {
            match self.bake_group(group, cache, device, registry, &mut loaded_textures) {
                Ok(baked_group) => baked.groups.push(baked_group),
                Err(err) => {
                    log::debug!(
                        "Bake failed at group '{}', rolling back {} buffer(s) and {} texture(s)",
                        group.key,
                        baked.len(),
                        loaded_textures.len()
                    );
                    baked.release(device);
                    for file in &loaded_textures {
                        cache.evict(file, registry);
                    }
                    return Err(err);
                }
            }
        }

        Ok(baked)
    }

    fn bake_group(
        &self,
        group: &MaterialGroup,
        cache: &mut TextureCache,
        device: &mut dyn GpuDevice,
        registry: &mut dyn TextureRegistry,
        loaded_textures: &mut Vec<String>,
    ) -> MeshResult<BakedGroup> {
        let material = group.key.material_name().and_then(|name| self.materials.get(name));
        let format = VertexFormat::for_material(material);

        let texture = match material.and_then(|m| m.diffuse_map.as_deref()) {
            Some(file) if cache.get(file).is_none() => {
                let handle = cache.get_or_load(file, self.provider, registry)?;
                loaded_textures.push(file.to_string());
                Some(handle)
            }
            Some(file) => cache.get(file),
            None => None,
        };

        let vertices = self.vertices(group, material, format)?;
        let buffer = device.create_static_buffer(&vertices)?;

        Ok(BakedGroup {
            key: group.key.clone(),
            format,
            buffer,
            texture,
            vertex_count: vertices.vertex_count(),
        })
    }

    /// Build the vertex stream of a group
    fn vertices(
        &self,
        group: &MaterialGroup,
        material: Option<&Material>,
        format: VertexFormat,
    ) -> MeshResult<VertexData> {
        let doc = self.document;
        let color = material.map_or([1.0; 4], Material::vertex_color);
        let mut data = VertexData::with_capacity(format, group.len() * 3);

        let corrupt = |face: usize, missing| MeshError::CorruptGeometry {
            material: group.key.to_string(),
            face,
            missing,
        };

        for (face, &face_index) in group.faces.iter().zip(&group.face_indices) {
            for vertex in &face.vertices {
                let position = doc.positions[vertex.position];

                match format {
                    VertexFormat::Position => data.push_position(position),
                    VertexFormat::PositionColor => data.push_position_color(position, color),
                    VertexFormat::PositionTextureColorNormal => {
                        let uv = vertex
                            .tex_coord
                            .ok_or_else(|| corrupt(face_index, MissingAttribute::TexCoord))?;
                        let normal = vertex
                            .normal
                            .ok_or_else(|| corrupt(face_index, MissingAttribute::Normal))?;

                        let uv = doc.tex_coords[uv];
                        // Image rows run top-down, OBJ V runs bottom-up
                        let flipped = Vec2::new(uv.x, 1.0 - uv.y);
                        data.push_textured(position, flipped, color, doc.normals[normal]);
                    }
                }
            }
        }

        Ok(data)
    }
}
