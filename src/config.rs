//! # World Configuration
//!
//! Every tunable of the voxel world lives in [`WorldConfig`]. The struct can be
//! built in code (`WorldConfig::default()` plus field updates) or deserialized
//! from JSON; missing fields fall back to their defaults.
//!
//! ```json
//! {
//!     "view_radius": 6,
//!     "chunk_dimensions": { "x": 16, "y": 64, "z": 16 },
//!     "loading_shape": "circular",
//!     "terrain": { "perlin": { "seed": 7, "scale": 0.02, "base_height": 24, "amplitude": 12.0 } }
//! }
//! ```

use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error::VoxelError;

/// Default chunk width along X.
pub const DEFAULT_CHUNK_WIDTH: i32 = 16;
/// Default chunk height; the world is not chunked vertically.
pub const DEFAULT_CHUNK_HEIGHT: i32 = 64;
/// Default chunk depth along Z.
pub const DEFAULT_CHUNK_DEPTH: i32 = 16;

/// Size of one chunk in voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChunkDimensions {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkDimensions {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        ChunkDimensions { x, y, z }
    }

    /// Returns `true` when every axis is strictly positive.
    pub fn is_valid(&self) -> bool {
        self.x > 0 && self.y > 0 && self.z > 0
    }

    /// Number of voxels held by one chunk.
    pub fn volume(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    /// Returns `true` when the local position lies inside the chunk.
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        (0..self.x).contains(&x) && (0..self.y).contains(&y) && (0..self.z).contains(&z)
    }

    /// Flat index of an in-bounds local position.
    ///
    /// Voxels are stored in horizontal layers: X varies fastest, then Z, then Y.
    pub fn index(&self, x: i32, y: i32, z: i32) -> usize {
        (x + self.x * (z + self.z * y)) as usize
    }

    /// Extent along axis `0` (X), `1` (Y) or `2` (Z).
    pub fn axis(&self, axis: usize) -> i32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl Default for ChunkDimensions {
    fn default() -> Self {
        ChunkDimensions::new(DEFAULT_CHUNK_WIDTH, DEFAULT_CHUNK_HEIGHT, DEFAULT_CHUNK_DEPTH)
    }
}

/// Shape of the region kept loaded around the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadingShape {
    /// Every coordinate within Chebyshev distance `view_radius`.
    #[default]
    Square,
    /// Square minus the corners whose squared distance exceeds
    /// `view_radius² + view_radius`.
    Circular,
}

/// Which implementation resolves block targets for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RaycastMode {
    /// Incremental voxel traversal.
    #[default]
    Traversal,
    /// Scene-level ray/box intersection.
    Scene,
}

/// Terrain height source used when a chunk is generated.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainConfig {
    /// Perlin-noise heightmap.
    Perlin {
        seed: u32,
        scale: f64,
        base_height: i32,
        amplitude: f64,
    },
    /// Same height for every column.
    Flat { height: i32 },
    /// Column heights drawn from a seeded generator, reproducible per column.
    Random { seed: u64, max_height: i32 },
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig::Perlin {
            seed: 0,
            scale: 0.02,
            base_height: 24,
            amplitude: 12.0,
        }
    }
}

/// Runtime configuration of the voxel world.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Chunks kept loaded around the observer, in chunk-grid units.
    pub view_radius: i32,
    pub chunk_dimensions: ChunkDimensions,
    /// Chunk creations processed per tick.
    pub max_creations_per_tick: usize,
    /// Chunk destructions processed per tick.
    pub max_destructions_per_tick: usize,
    /// Maximum number of inactive chunk objects kept for reuse.
    pub chunk_pool_capacity: usize,
    /// Maximum number of idle mesh buffers kept for reuse.
    pub mesh_buffer_pool_capacity: usize,
    /// Mesh builds allowed to run at the same time, across all chunks.
    pub build_concurrency: usize,
    /// Chunks within this radius get a collision mesh. `None` gives every chunk one.
    pub collision_radius: Option<i32>,
    pub loading_shape: LoadingShape,
    pub raycast_mode: RaycastMode,
    /// Safety bound on traversal steps for one cast.
    pub raycast_max_steps: usize,
    pub terrain: TerrainConfig,
    /// Number of cells per row and column of the texture atlas.
    pub atlas_grid: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            view_radius: 4,
            chunk_dimensions: ChunkDimensions::default(),
            max_creations_per_tick: 4,
            max_destructions_per_tick: 8,
            chunk_pool_capacity: 32,
            mesh_buffer_pool_capacity: 8,
            build_concurrency: 4,
            collision_radius: Some(2),
            loading_shape: LoadingShape::Square,
            raycast_mode: RaycastMode::Traversal,
            raycast_max_steps: 512,
            terrain: TerrainConfig::default(),
            atlas_grid: 16,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, VoxelError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VoxelError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks the configuration before the world is built.
    ///
    /// Non-positive chunk dimensions are reported and replaced by the defaults;
    /// every other out-of-range value is an error.
    ///
    /// # Returns
    /// The configuration to use, or `VoxelError::InvalidConfig`.
    pub fn validate(mut self) -> Result<Self, VoxelError> {
        if !self.chunk_dimensions.is_valid() {
            warn!(
                "Chunk dimensions {:?} must be positive, falling back to {:?}",
                self.chunk_dimensions,
                ChunkDimensions::default()
            );
            self.chunk_dimensions = ChunkDimensions::default();
        }
        if self.view_radius < 0 {
            return Err(VoxelError::InvalidConfig(format!(
                "view_radius must not be negative (got {})",
                self.view_radius
            )));
        }
        if self.build_concurrency == 0 {
            return Err(VoxelError::InvalidConfig(
                "build_concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_creations_per_tick == 0 || self.max_destructions_per_tick == 0 {
            return Err(VoxelError::InvalidConfig(
                "per-tick creation and destruction budgets must be at least 1".to_string(),
            ));
        }
        if self.raycast_max_steps == 0 {
            return Err(VoxelError::InvalidConfig(
                "raycast_max_steps must be at least 1".to_string(),
            ));
        }
        if self.atlas_grid == 0 {
            return Err(VoxelError::InvalidConfig(
                "atlas_grid must be at least 1".to_string(),
            ));
        }
        if let Some(radius) = self.collision_radius {
            if radius < 0 {
                return Err(VoxelError::InvalidConfig(format!(
                    "collision_radius must not be negative (got {})",
                    radius
                )));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = WorldConfig::from_json_str(
            r#"{ "view_radius": 7, "loading_shape": "circular", "terrain": { "flat": { "height": 3 } } }"#,
        )
        .unwrap();

        assert_eq!(config.view_radius, 7);
        assert_eq!(config.loading_shape, LoadingShape::Circular);
        assert_eq!(config.terrain, TerrainConfig::Flat { height: 3 });
        assert_eq!(config.chunk_dimensions, ChunkDimensions::default());
        assert_eq!(config.build_concurrency, WorldConfig::default().build_concurrency);
    }

    #[test]
    fn non_positive_dimensions_fall_back_to_default() {
        let config = WorldConfig {
            chunk_dimensions: ChunkDimensions::new(0, 32, -4),
            ..WorldConfig::default()
        };

        let config = config.validate().unwrap();
        assert_eq!(config.chunk_dimensions, ChunkDimensions::default());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = WorldConfig {
            build_concurrency: 0,
            ..WorldConfig::default()
        };

        assert!(matches!(config.validate(), Err(VoxelError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            WorldConfig::from_json_str("{ view_radius: }"),
            Err(VoxelError::ConfigParse(_))
        ));
    }
}
