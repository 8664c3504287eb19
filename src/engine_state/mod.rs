//! # Engine State Module
//!
//! The voxel world as seen by its host application.
//!
//! ## Key Components
//!
//! * `VoxelWorld` - Owns every subsystem and exposes the world-level API
//! * `rendering` - Greedy meshing and the background build pipeline
//! * `task_management` - Worker pool and per-tick work queues
//! * `voxels` - Blocks, chunks, streaming and raycasting
//!
//! ## Scheduling
//!
//! The host calls [`VoxelWorld::tick`] once per frame from the thread that
//! owns the world. A tick applies finished mesh builds, hands queued builds
//! to free workers and runs the streamer's budgeted creation and destruction
//! work. Only the greedy mesher itself runs on worker threads.
//!
//! ## Example
//!
//! ```
//! use cgmath::{Point3, Vector3};
//! use voxel_streaming::{config::WorldConfig, BlockRegistry, VoxelWorld};
//!
//! let registry = BlockRegistry::with_default_palette(16).unwrap();
//! let mut world = VoxelWorld::new(WorldConfig::default(), registry).unwrap();
//!
//! world.set_observer_position(Point3::new(8.0, 40.0, 8.0));
//! for _ in 0..32 {
//!     world.tick().unwrap();
//! }
//!
//! if let Some(hit) = world.cast(Point3::new(8.5, 60.0, 8.5), Vector3::new(0.0, -1.0, 0.0), 64.0) {
//!     world.set_block_at_world(hit.break_target, 0);
//! }
//! ```

pub mod rendering;
pub mod task_management;
pub mod voxels;

use std::{sync::Arc, time::Duration};

use cgmath::{Point3, Vector3};
use log::{info, warn};
use web_time::Instant;

use crate::{config::WorldConfig, error::VoxelError};

use rendering::tasks::{BuildPipeline, BuildResult};
use voxels::{
    block::{registry::BlockRegistry, BlockId},
    chunk::{chunk_coordinate::ChunkCoordinate, terrain, ApplyStatus, Chunk},
    raycast::{RaycastHit, Raycaster, SceneIntersector, VoxelQuery},
    streamer::{ChunkStreamer, StreamerTick},
};

/// Work performed by one [`VoxelWorld::tick`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Builds applied to their chunk.
    pub applied: usize,
    /// Builds discarded as superseded.
    pub stale: usize,
    /// Builds that panicked.
    pub failed: usize,
    /// Builds handed to workers from the queue.
    pub dispatched: usize,
    pub streamer: StreamerTick,
}

/// Snapshot of the world's bookkeeping, for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorldStats {
    pub loaded_chunks: usize,
    pub pending_creations: usize,
    pub pending_destructions: usize,
    pub pooled_chunks: usize,
    pub builds_in_flight: usize,
    pub builds_queued: usize,
    pub builds_applied: u64,
    pub builds_discarded: u64,
    pub builds_failed: u64,
    pub idle_mesh_buffers: usize,
}

/// The streaming voxel world.
///
/// Built once from a configuration and a block registry; the registry is
/// frozen from then on and shared read-only with the build workers.
pub struct VoxelWorld {
    config: WorldConfig,
    registry: Arc<BlockRegistry>,
    streamer: ChunkStreamer,
    pipeline: BuildPipeline,
    raycaster: Raycaster,
    builds_applied: u64,
    builds_discarded: u64,
    builds_failed: u64,
}

impl VoxelWorld {
    /// Creates the world and starts its build workers.
    ///
    /// # Arguments
    /// * `config` - World configuration; validated here
    /// * `registry` - Block registry with its generation palette set
    ///
    /// # Returns
    /// The world, or the configuration or registry error that prevents it
    /// from starting.
    pub fn new(config: WorldConfig, registry: BlockRegistry) -> Result<Self, VoxelError> {
        let config = config.validate()?;
        registry.palette()?;
        let registry = Arc::new(registry);

        let pipeline = BuildPipeline::new(
            config.build_concurrency,
            config.mesh_buffer_pool_capacity,
            registry.uv_table(),
        )?;
        let streamer = ChunkStreamer::new(
            &config,
            registry.clone(),
            terrain::from_config(&config.terrain),
        )?;
        let raycaster = Raycaster::new(
            config.raycast_mode,
            config.raycast_max_steps,
            config.chunk_dimensions,
        );

        info!(
            "Voxel world created: {:?} chunks, view radius {}, {} block types",
            config.chunk_dimensions,
            config.view_radius,
            registry.len()
        );

        Ok(VoxelWorld {
            config,
            registry,
            streamer,
            pipeline,
            raycaster,
            builds_applied: 0,
            builds_discarded: 0,
            builds_failed: 0,
        })
    }

    /// Replaces the intersector used in scene raycast mode.
    pub fn with_scene_intersector(mut self, scene: Box<dyn SceneIntersector>) -> Self {
        self.raycaster = self.raycaster.with_scene_intersector(scene);
        self
    }

    /// Moves the observer; loading work happens in the following ticks.
    pub fn set_observer_position(&mut self, position: Point3<f32>) -> bool {
        self.streamer.set_observer_position(position)
    }

    /// Runs one scheduler step.
    pub fn tick(&mut self) -> Result<TickReport, VoxelError> {
        let mut report = TickReport::default();

        for result in self.pipeline.drain_completed() {
            match self.apply(result) {
                ApplyStatus::Applied => report.applied += 1,
                ApplyStatus::Stale => report.stale += 1,
                ApplyStatus::Failed => report.failed += 1,
            }
        }
        report.dispatched = self.pipeline.dispatch_queued();
        report.streamer = self.streamer.update(&mut self.pipeline)?;

        Ok(report)
    }

    fn apply(&mut self, result: BuildResult) -> ApplyStatus {
        let status = match self.streamer.chunk_mut(result.ticket.coordinate) {
            Some(chunk) => chunk.apply_build(&result),
            None => ApplyStatus::Stale,
        };
        match status {
            ApplyStatus::Applied => self.builds_applied += 1,
            ApplyStatus::Stale => self.builds_discarded += 1,
            ApplyStatus::Failed => self.builds_failed += 1,
        }
        self.pipeline.recycle(result);
        status
    }

    /// Blocks until every submitted build has been applied or discarded.
    ///
    /// # Returns
    /// `false` if no build finished within `timeout` while some were pending.
    pub fn wait_for_builds(&mut self, timeout: Duration) -> bool {
        while !self.pipeline.is_idle() {
            match self.pipeline.wait_for_result(timeout) {
                Some(result) => {
                    self.apply(result);
                }
                None => {
                    warn!(
                        "No mesh build finished within {:?} ({} in flight, {} queued)",
                        timeout,
                        self.pipeline.in_flight(),
                        self.pipeline.queued()
                    );
                    return false;
                }
            }
        }
        true
    }

    /// Ticks until streaming and building have both settled.
    ///
    /// # Returns
    /// The number of ticks run, or `None` if the world did not settle within
    /// `max_ticks`.
    pub fn settle(
        &mut self,
        max_ticks: usize,
        build_timeout: Duration,
    ) -> Result<Option<usize>, VoxelError> {
        let start = Instant::now();
        for ticks in 1..=max_ticks {
            self.tick()?;
            if self.streamer.is_settled() {
                if !self.wait_for_builds(build_timeout) {
                    return Ok(None);
                }
                info!("World settled after {} ticks in {:?}", ticks, start.elapsed());
                return Ok(Some(ticks));
            }
        }
        Ok(None)
    }

    /// Loaded chunk containing the world position.
    pub fn chunk_at(&self, position: Point3<f32>) -> Option<&Chunk> {
        self.streamer.chunk_at(position)
    }

    pub fn chunk_at_mut(&mut self, position: Point3<f32>) -> Option<&mut Chunk> {
        self.streamer.chunk_at_mut(position)
    }

    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<&Chunk> {
        self.streamer.chunk(coordinate)
    }

    /// Local voxel position of a world position inside the chunk at `coordinate`.
    pub fn world_to_local_block(
        &self,
        position: Point3<f32>,
        coordinate: ChunkCoordinate,
    ) -> Point3<i32> {
        self.streamer.world_to_local_block(position, coordinate)
    }

    /// Block at a world voxel; unloaded chunks read as air.
    pub fn get_block_at_world(&self, block: Point3<i32>) -> BlockId {
        self.streamer.block_at(block)
    }

    /// Writes a block at a world voxel and rebuilds the chunk holding it.
    ///
    /// # Returns
    /// `false` if the chunk is not loaded or the voxel is above or below the
    /// world.
    pub fn set_block_at_world(&mut self, block: Point3<i32>, id: BlockId) -> bool {
        let (coordinate, local) = self.streamer.locate_block(block);
        let Some(chunk) = self.streamer.chunk_mut(coordinate) else {
            return false;
        };
        if !chunk.set_local(local.x, local.y, local.z, id) {
            return false;
        }
        chunk.request_rebuild(&mut self.pipeline);
        true
    }

    /// Requests a rebuild of a loaded chunk after direct edits through
    /// [`VoxelWorld::chunk_at_mut`].
    ///
    /// # Returns
    /// The version of the requested build, or `None` if the chunk is not loaded.
    pub fn request_rebuild(&mut self, coordinate: ChunkCoordinate) -> Option<u64> {
        let chunk = self.streamer.chunk_mut(coordinate)?;
        Some(chunk.request_rebuild(&mut self.pipeline))
    }

    /// Finds the block a ray points at, using the configured raycast mode.
    pub fn cast(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        self.raycaster
            .cast(&self.streamer, origin, direction, max_distance)
    }

    pub fn stats(&self) -> WorldStats {
        let pipeline = self.pipeline.stats();
        WorldStats {
            loaded_chunks: self.streamer.loaded_count(),
            pending_creations: self.streamer.pending_creations(),
            pending_destructions: self.streamer.pending_destructions(),
            pooled_chunks: self.streamer.pooled_count(),
            builds_in_flight: pipeline.in_flight,
            builds_queued: pipeline.queued,
            builds_applied: self.builds_applied,
            builds_discarded: self.builds_discarded,
            builds_failed: self.builds_failed,
            idle_mesh_buffers: pipeline.idle_buffers,
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn streamer(&self) -> &ChunkStreamer {
        &self.streamer
    }

    pub fn raycaster_mut(&mut self) -> &mut Raycaster {
        &mut self.raycaster
    }
}
