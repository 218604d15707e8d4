//! Baked vertex layouts
//!
//! Vertices are interleaved `f32` attributes in the order
//! position, texture coordinate, color, normal; attributes a layout does
//! not carry are simply absent.

use bitflags::bitflags;

use crate::assets::Material;
use crate::foundation::math::{Vec2, Vec3};

bitflags! {
    /// Attributes present in a vertex layout
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexAttributes: u8 {
        /// `vec3` position
        const POSITION = 1;
        /// `vec2` texture coordinate
        const TEX_COORD = 1 << 1;
        /// `vec4` RGBA color
        const COLOR = 1 << 2;
        /// `vec3` normal
        const NORMAL = 1 << 3;
    }
}

/// Vertex layout chosen per material group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Position only, for groups without a resolvable material
    Position,
    /// Position and color, for materials with only a diffuse color
    PositionColor,
    /// Position, texture coordinate, color and normal, for textured materials
    PositionTextureColorNormal,
}

impl VertexFormat {
    /// Layout for a group with the given (resolved) material
    pub fn for_material(material: Option<&Material>) -> Self {
        match material {
            Some(m) if m.has_texture() => Self::PositionTextureColorNormal,
            Some(_) => Self::PositionColor,
            None => Self::Position,
        }
    }

    /// Attributes stored by this layout
    pub const fn attributes(self) -> VertexAttributes {
        match self {
            Self::Position => VertexAttributes::POSITION,
            Self::PositionColor => VertexAttributes::POSITION.union(VertexAttributes::COLOR),
            Self::PositionTextureColorNormal => VertexAttributes::all(),
        }
    }

    /// Number of floats per vertex
    pub const fn floats_per_vertex(self) -> usize {
        match self {
            Self::Position => 3,
            Self::PositionColor => 7,
            Self::PositionTextureColorNormal => 12,
        }
    }

    /// Size of one vertex in bytes
    pub const fn stride(self) -> usize {
        self.floats_per_vertex() * std::mem::size_of::<f32>()
    }

    /// Whether this layout is drawn with a material (and therefore lit)
    pub const fn is_materialed(self) -> bool {
        !matches!(self, Self::Position)
    }
}

/// Interleaved vertex stream of a single layout
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    format: VertexFormat,
    data: Vec<f32>,
}

impl VertexData {
    /// Create an empty stream with room for `vertices` vertices
    pub fn with_capacity(format: VertexFormat, vertices: usize) -> Self {
        Self {
            format,
            data: Vec::with_capacity(vertices * format.floats_per_vertex()),
        }
    }

    /// Append a [`VertexFormat::Position`] vertex
    pub fn push_position(&mut self, position: Vec3) {
        debug_assert_eq!(self.format, VertexFormat::Position);
        self.data.extend_from_slice(position.as_slice());
    }

    /// Append a [`VertexFormat::PositionColor`] vertex
    pub fn push_position_color(&mut self, position: Vec3, color: [f32; 4]) {
        debug_assert_eq!(self.format, VertexFormat::PositionColor);
        self.data.extend_from_slice(position.as_slice());
        self.data.extend_from_slice(&color);
    }

    /// Append a [`VertexFormat::PositionTextureColorNormal`] vertex
    pub fn push_textured(&mut self, position: Vec3, tex_coord: Vec2, color: [f32; 4], normal: Vec3) {
        debug_assert_eq!(self.format, VertexFormat::PositionTextureColorNormal);
        self.data.extend_from_slice(position.as_slice());
        self.data.extend_from_slice(tex_coord.as_slice());
        self.data.extend_from_slice(&color);
        self.data.extend_from_slice(normal.as_slice());
    }

    /// Layout of this stream
    pub const fn format(&self) -> VertexFormat {
        self.format
    }

    /// Number of complete vertices
    pub fn vertex_count(&self) -> usize {
        self.data.len() / self.format.floats_per_vertex()
    }

    /// Interleaved floats as bytes, for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Floats of vertex `index`
    pub fn vertex(&self, index: usize) -> Option<&[f32]> {
        let stride = self.format.floats_per_vertex();
        self.data.get(index * stride..(index + 1) * stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection() {
        let plain = Material::new("plain");
        let textured = Material {
            diffuse_map: Some("wood.png".to_string()),
            ..Material::new("wood")
        };

        assert_eq!(VertexFormat::for_material(None), VertexFormat::Position);
        assert_eq!(VertexFormat::for_material(Some(&plain)), VertexFormat::PositionColor);
        assert_eq!(
            VertexFormat::for_material(Some(&textured)),
            VertexFormat::PositionTextureColorNormal
        );
    }

    #[test]
    fn test_layout_sizes_match_attributes() {
        for format in [
            VertexFormat::Position,
            VertexFormat::PositionColor,
            VertexFormat::PositionTextureColorNormal,
        ] {
            let attributes = format.attributes();
            let mut floats = 0;
            for (flag, size) in [
                (VertexAttributes::POSITION, 3),
                (VertexAttributes::TEX_COORD, 2),
                (VertexAttributes::COLOR, 4),
                (VertexAttributes::NORMAL, 3),
            ] {
                if attributes.contains(flag) {
                    floats += size;
                }
            }
            assert_eq!(floats, format.floats_per_vertex(), "{format:?}");
        }
        assert_eq!(VertexFormat::PositionTextureColorNormal.stride(), 48);
    }

    #[test]
    fn test_interleaving() {
        let mut data = VertexData::with_capacity(VertexFormat::PositionTextureColorNormal, 1);
        data.push_textured(
            Vec3::new(1.0, 2.0, 3.0),
            Vec2::new(0.25, 0.75),
            [0.5, 0.5, 0.5, 1.0],
            Vec3::new(0.0, 0.0, 1.0),
        );

        assert_eq!(data.vertex_count(), 1);
        assert_eq!(
            data.vertex(0).unwrap(),
            &[1.0, 2.0, 3.0, 0.25, 0.75, 0.5, 0.5, 0.5, 1.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(data.as_bytes().len(), 48);
        assert!(data.vertex(1).is_none());
    }
}
