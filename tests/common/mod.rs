#![allow(dead_code)]

use std::time::Duration;

use voxel_streaming::{
    config::{ChunkDimensions, TerrainConfig},
    BlockRegistry, VoxelWorld, WorldConfig,
};

pub const BUILD_TIMEOUT: Duration = Duration::from_secs(10);

/// Small world over flat terrain, so every column reads
/// stone below `height / 2`, dirt below `height`, grass at `height`.
pub fn flat_config(view_radius: i32, height: i32) -> WorldConfig {
    WorldConfig {
        view_radius,
        chunk_dimensions: ChunkDimensions::new(8, 16, 8),
        max_creations_per_tick: 3,
        max_destructions_per_tick: 2,
        chunk_pool_capacity: 8,
        mesh_buffer_pool_capacity: 4,
        build_concurrency: 2,
        terrain: TerrainConfig::Flat { height },
        ..WorldConfig::default()
    }
}

pub fn world(config: WorldConfig) -> VoxelWorld {
    let registry = BlockRegistry::with_default_palette(config.atlas_grid).unwrap();
    VoxelWorld::new(config, registry).unwrap()
}
