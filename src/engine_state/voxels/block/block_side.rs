//! # Block Side Module
//!
//! This module defines the six faces of a voxel block. The mesher sweeps each
//! side once, so every side knows its sweep axis, its direction along that
//! axis, and its outward normal.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// Each variant is assigned a unique integer value; the order is
/// `[FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]`.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Index of the axis this face is perpendicular to (0 = X, 1 = Y, 2 = Z).
    pub fn axis(self) -> usize {
        match self {
            BlockSide::LEFT | BlockSide::RIGHT => 0,
            BlockSide::BOTTOM | BlockSide::TOP => 1,
            BlockSide::FRONT | BlockSide::BACK => 2,
        }
    }

    /// `true` when the face points towards the positive end of its axis.
    pub fn is_positive(self) -> bool {
        matches!(self, BlockSide::FRONT | BlockSide::TOP | BlockSide::RIGHT)
    }

    /// Step along the sweep axis from a voxel to the neighbor this face touches.
    pub fn step(self) -> i32 {
        if self.is_positive() {
            1
        } else {
            -1
        }
    }

    /// Unit vector pointing out of the face.
    pub fn normal(self) -> Vector3<f32> {
        let mut normal = [0.0f32; 3];
        normal[self.axis()] = self.step() as f32;
        Vector3::new(normal[0], normal[1], normal[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normals_point_along_their_axis() {
        for side in BlockSide::all() {
            let normal = side.normal();
            let components = [normal.x, normal.y, normal.z];
            for (axis, value) in components.iter().enumerate() {
                if axis == side.axis() {
                    assert_eq!(*value, side.step() as f32);
                } else {
                    assert_eq!(*value, 0.0);
                }
            }
        }
    }
}
