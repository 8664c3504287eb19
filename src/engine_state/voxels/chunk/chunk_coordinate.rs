//! # Chunk Coordinate Module
//!
//! Chunks tile the horizontal plane only; height is not chunked. A chunk is
//! addressed by its integer column (`x`) and row (`z`) in the chunk grid.

use cgmath::Point3;

use crate::config::ChunkDimensions;

/// Position of a chunk in the horizontal chunk grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoordinate {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoordinate {
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkCoordinate { x, z }
    }

    /// Chunk containing the world-space position.
    pub fn from_world(position: Point3<f32>, dimensions: ChunkDimensions) -> Self {
        Self::from_block(
            Point3::new(
                position.x.floor() as i32,
                position.y.floor() as i32,
                position.z.floor() as i32,
            ),
            dimensions,
        )
    }

    /// Chunk containing the world-space voxel.
    pub fn from_block(block: Point3<i32>, dimensions: ChunkDimensions) -> Self {
        ChunkCoordinate {
            x: block.x.div_euclid(dimensions.x),
            z: block.z.div_euclid(dimensions.z),
        }
    }

    /// World-space voxel at the chunk's local `(0, 0, 0)`.
    pub fn world_origin(&self, dimensions: ChunkDimensions) -> Point3<i32> {
        Point3::new(self.x * dimensions.x, 0, self.z * dimensions.z)
    }

    /// L∞ distance in chunk-grid units.
    pub fn chebyshev_distance(&self, other: ChunkCoordinate) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Squared Euclidean distance in chunk-grid units.
    pub fn squared_distance(&self, other: ChunkCoordinate) -> i32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }
}
