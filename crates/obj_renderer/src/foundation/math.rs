//! Math utilities and types
//!
//! Provides the vector and matrix aliases used by the mesh loader, the
//! lighting estimator and the draw path.

pub use nalgebra::{Matrix3, Matrix4, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Double precision 3D vector, used for world and camera positions
pub type DVec3 = Vector3<f64>;

/// Integer position of the world cell (block) containing a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
    /// Z coordinate
    pub z: i32,
}

impl BlockPos {
    /// Create a block position
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Block containing `point`, flooring each coordinate
    #[allow(clippy::cast_possible_truncation)]
    pub fn floored(point: &DVec3) -> Self {
        Self {
            x: point.x.floor() as i32,
            y: point.y.floor() as i32,
            z: point.z.floor() as i32,
        }
    }
}

/// Transform a direction by the upper-left 3x3 (rotation/scale) part of `matrix`
pub fn transform_direction(matrix: &Mat4, direction: &Vec3) -> Vec3 {
    let linear: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    linear * direction
}
