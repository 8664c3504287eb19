//! # Chunk Streamer
//!
//! Keeps the chunks around an observer loaded and unloads the rest.
//!
//! ## Coordinate lifecycle
//!
//! ```text
//! NotLoaded ─▶ QueuedForCreation ─▶ Loaded ─▶ QueuedForDestruction ─▶ NotLoaded
//! ```
//!
//! Moving the observer into another chunk recomputes the desired set. New
//! coordinates are queued for creation nearest first; loaded coordinates
//! beyond the view radius (Chebyshev distance) are queued for destruction.
//! A pending creation that falls out of range is dropped, and a pending
//! destruction that comes back into range is cancelled.
//!
//! [`ChunkStreamer::update`] then processes at most `max_creations_per_tick`
//! creations and `max_destructions_per_tick` destructions. Destroyed chunks are
//! deactivated and kept in a [`ChunkPool`] while it has room; creations reuse
//! pooled chunks before allocating.
//!
//! ## Collision tiering
//!
//! With a `collision_radius`, only chunks within that Chebyshev distance of
//! the observer build a collision mesh. When the observer moves, every loaded
//! chunk whose tier changed is rebuilt.

use std::{collections::HashMap, sync::Arc};

use cgmath::Point3;
use log::{debug, info};

use crate::{
    config::{ChunkDimensions, LoadingShape, WorldConfig},
    engine_state::{
        rendering::tasks::BuildPipeline,
        task_management::BudgetedQueue,
    },
    error::VoxelError,
};

use super::{
    block::{registry::BlockRegistry, BlockId, AIR},
    chunk::{
        chunk_coordinate::ChunkCoordinate, terrain::HeightFunction, Chunk, ChunkId, ChunkState,
    },
    chunk_pool::ChunkPool,
    raycast::VoxelQuery,
};

/// Where a chunk coordinate is in the streaming lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateState {
    NotLoaded,
    QueuedForCreation,
    Loaded,
    /// Still loaded, waiting for its destruction slot.
    QueuedForDestruction,
}

/// Work performed by one [`ChunkStreamer::update`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamerTick {
    /// Chunks allocated fresh.
    pub created: usize,
    /// Chunks taken from the pool.
    pub recycled: usize,
    /// Queued creations skipped because the coordinate was already loaded.
    pub duplicates: usize,
    /// Chunks deactivated and pooled.
    pub pooled: usize,
    /// Chunks dropped because the pool was full.
    pub dropped: usize,
    /// Rebuilds requested because a chunk changed collision tier.
    pub retiered: usize,
}

/// Loads, unloads and recycles chunks around a moving observer.
pub struct ChunkStreamer {
    dimensions: ChunkDimensions,
    view_radius: i32,
    shape: LoadingShape,
    collision_radius: Option<i32>,
    registry: Arc<BlockRegistry>,
    heights: Box<dyn HeightFunction>,
    loaded: HashMap<ChunkCoordinate, Chunk>,
    creation_queue: BudgetedQueue<ChunkCoordinate>,
    destruction_queue: BudgetedQueue<ChunkCoordinate>,
    pool: ChunkPool,
    observer_chunk: Option<ChunkCoordinate>,
    tiers_dirty: bool,
    next_chunk_id: ChunkId,
}

impl ChunkStreamer {
    /// Creates a streamer with nothing loaded.
    ///
    /// # Returns
    /// The streamer, or `RegistryUninitialized` if the registry has no
    /// generation palette.
    pub fn new(
        config: &WorldConfig,
        registry: Arc<BlockRegistry>,
        heights: Box<dyn HeightFunction>,
    ) -> Result<Self, VoxelError> {
        registry.palette()?;

        Ok(ChunkStreamer {
            dimensions: config.chunk_dimensions,
            view_radius: config.view_radius,
            shape: config.loading_shape,
            collision_radius: config.collision_radius,
            registry,
            heights,
            loaded: HashMap::new(),
            creation_queue: BudgetedQueue::new(config.max_creations_per_tick),
            destruction_queue: BudgetedQueue::new(config.max_destructions_per_tick),
            pool: ChunkPool::new(config.chunk_pool_capacity),
            observer_chunk: None,
            tiers_dirty: false,
            next_chunk_id: 0,
        })
    }

    /// Moves the observer.
    ///
    /// The desired set is only recomputed when the observer enters another
    /// chunk, or on the first call.
    ///
    /// # Returns
    /// `true` if the observer changed chunk.
    pub fn set_observer_position(&mut self, position: Point3<f32>) -> bool {
        let center = ChunkCoordinate::from_world(position, self.dimensions);
        if self.observer_chunk == Some(center) {
            return false;
        }
        info!("Observer entered chunk ({}, {})", center.x, center.z);
        self.observer_chunk = Some(center);
        self.tiers_dirty = true;
        self.schedule_around(center);
        true
    }

    fn schedule_around(&mut self, center: ChunkCoordinate) {
        let r = self.view_radius;
        let mut wanted = Vec::new();
        for dz in -r..=r {
            for dx in -r..=r {
                let coordinate = ChunkCoordinate::new(center.x + dx, center.z + dz);
                if !self.is_desired(coordinate, center) {
                    continue;
                }
                if self.loaded.contains_key(&coordinate)
                    || self.creation_queue.contains(&coordinate)
                {
                    continue;
                }
                wanted.push(coordinate);
            }
        }
        wanted.sort_by_key(|coordinate| (coordinate.squared_distance(center), *coordinate));

        let shape = self.shape;
        self.creation_queue
            .retain(|&coordinate| Self::in_shape(shape, r, coordinate, center));
        self.destruction_queue
            .retain(|coordinate| coordinate.chebyshev_distance(center) > r);

        let queued = wanted.len();
        for coordinate in wanted {
            self.creation_queue.push_unique(coordinate);
        }

        let leaving: Vec<ChunkCoordinate> = self
            .loaded
            .keys()
            .filter(|coordinate| coordinate.chebyshev_distance(center) > r)
            .copied()
            .collect();
        for coordinate in leaving {
            self.destruction_queue.push_unique(coordinate);
        }

        debug!(
            "Scheduled {} creations ({} pending) and {} destructions around ({}, {})",
            queued,
            self.creation_queue.len(),
            self.destruction_queue.len(),
            center.x,
            center.z
        );
    }

    /// Whether `coordinate` belongs to the loaded region around `center`.
    ///
    /// The circular shape drops corners whose squared distance exceeds
    /// `r² + r`, which admits slightly more than a true circle of radius `r`.
    fn is_desired(&self, coordinate: ChunkCoordinate, center: ChunkCoordinate) -> bool {
        Self::in_shape(self.shape, self.view_radius, coordinate, center)
    }

    fn in_shape(
        shape: LoadingShape,
        r: i32,
        coordinate: ChunkCoordinate,
        center: ChunkCoordinate,
    ) -> bool {
        if coordinate.chebyshev_distance(center) > r {
            return false;
        }
        match shape {
            LoadingShape::Square => true,
            LoadingShape::Circular => coordinate.squared_distance(center) <= r * r + r,
        }
    }

    fn collision_wanted(&self, coordinate: ChunkCoordinate) -> bool {
        match (self.collision_radius, self.observer_chunk) {
            (None, _) => true,
            (Some(radius), Some(center)) => coordinate.chebyshev_distance(center) <= radius,
            (Some(_), None) => false,
        }
    }

    /// Runs one tick of streaming work.
    ///
    /// Rebuilds chunks whose collision tier changed, then processes this
    /// tick's share of creations and destructions. Created chunks are
    /// generated and their first build is submitted to `pipeline`.
    pub fn update(&mut self, pipeline: &mut BuildPipeline) -> Result<StreamerTick, VoxelError> {
        let mut tick = StreamerTick::default();

        if self.tiers_dirty {
            tick.retiered = self.retier(pipeline);
            self.tiers_dirty = false;
        }

        for coordinate in self.creation_queue.take_budgeted() {
            if self.loaded.contains_key(&coordinate) {
                debug!("Chunk {:?} is already loaded, skipping creation", coordinate);
                tick.duplicates += 1;
                continue;
            }

            let mut chunk = match self.pool.pop() {
                Some(mut chunk) => {
                    chunk.reset_for(coordinate);
                    tick.recycled += 1;
                    chunk
                }
                None => {
                    let id = self.next_chunk_id;
                    self.next_chunk_id += 1;
                    tick.created += 1;
                    Chunk::new(id, coordinate, self.dimensions, &self.registry)?
                }
            };

            chunk.generate(self.heights.as_ref());
            chunk.set_collision_enabled(self.collision_wanted(coordinate));
            chunk.request_rebuild(pipeline);
            self.loaded.insert(coordinate, chunk);
        }

        for coordinate in self.destruction_queue.take_budgeted() {
            let Some(mut chunk) = self.loaded.remove(&coordinate) else {
                continue;
            };
            chunk.deactivate();
            if self.pool.push(chunk) {
                tick.pooled += 1;
            } else {
                tick.dropped += 1;
            }
        }

        if tick != StreamerTick::default() {
            debug!(
                "Streamer tick: {:?}, {} loaded, {} pooled",
                tick,
                self.loaded.len(),
                self.pool.len()
            );
        }
        Ok(tick)
    }

    fn retier(&mut self, pipeline: &mut BuildPipeline) -> usize {
        let changed: Vec<ChunkCoordinate> = self
            .loaded
            .keys()
            .copied()
            .filter(|&coordinate| {
                self.loaded[&coordinate].collision_enabled() != self.collision_wanted(coordinate)
            })
            .collect();

        for coordinate in &changed {
            let wanted = self.collision_wanted(*coordinate);
            if let Some(chunk) = self.loaded.get_mut(coordinate) {
                chunk.set_collision_enabled(wanted);
                if chunk.state() != ChunkState::Uninitialized {
                    chunk.request_rebuild(pipeline);
                }
            }
        }
        changed.len()
    }

    /// Loaded chunk containing the world position.
    pub fn chunk_at(&self, position: Point3<f32>) -> Option<&Chunk> {
        self.loaded
            .get(&ChunkCoordinate::from_world(position, self.dimensions))
    }

    pub fn chunk_at_mut(&mut self, position: Point3<f32>) -> Option<&mut Chunk> {
        self.loaded
            .get_mut(&ChunkCoordinate::from_world(position, self.dimensions))
    }

    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<&Chunk> {
        self.loaded.get(&coordinate)
    }

    pub fn chunk_mut(&mut self, coordinate: ChunkCoordinate) -> Option<&mut Chunk> {
        self.loaded.get_mut(&coordinate)
    }

    /// Local voxel position of a world position inside the chunk at `coordinate`.
    ///
    /// The result lies outside the chunk's grid when the position does not
    /// belong to that chunk.
    pub fn world_to_local_block(
        &self,
        position: Point3<f32>,
        coordinate: ChunkCoordinate,
    ) -> Point3<i32> {
        let origin = coordinate.world_origin(self.dimensions);
        Point3::new(
            position.x.floor() as i32 - origin.x,
            position.y.floor() as i32 - origin.y,
            position.z.floor() as i32 - origin.z,
        )
    }

    /// Chunk coordinate and local position of a world voxel.
    pub fn locate_block(&self, block: Point3<i32>) -> (ChunkCoordinate, Point3<i32>) {
        let coordinate = ChunkCoordinate::from_block(block, self.dimensions);
        let origin = coordinate.world_origin(self.dimensions);
        (
            coordinate,
            Point3::new(block.x - origin.x, block.y, block.z - origin.z),
        )
    }

    pub fn coordinate_state(&self, coordinate: ChunkCoordinate) -> CoordinateState {
        if self.loaded.contains_key(&coordinate) {
            if self.destruction_queue.contains(&coordinate) {
                CoordinateState::QueuedForDestruction
            } else {
                CoordinateState::Loaded
            }
        } else if self.creation_queue.contains(&coordinate) {
            CoordinateState::QueuedForCreation
        } else {
            CoordinateState::NotLoaded
        }
    }

    pub fn loaded_coordinates(&self) -> impl Iterator<Item = ChunkCoordinate> + '_ {
        self.loaded.keys().copied()
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.loaded.values()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn pending_creations(&self) -> usize {
        self.creation_queue.len()
    }

    pub fn pending_destructions(&self) -> usize {
        self.destruction_queue.len()
    }

    pub fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    /// `true` once both queues are empty.
    pub fn is_settled(&self) -> bool {
        self.creation_queue.is_empty() && self.destruction_queue.is_empty()
    }

    pub fn observer_chunk(&self) -> Option<ChunkCoordinate> {
        self.observer_chunk
    }

    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }
}

impl VoxelQuery for ChunkStreamer {
    /// Unloaded chunks and positions above or below the world read as air.
    fn block_at(&self, block: Point3<i32>) -> BlockId {
        let (coordinate, local) = self.locate_block(block);
        self.loaded
            .get(&coordinate)
            .and_then(|chunk| chunk.get_local(local.x, local.y, local.z))
            .unwrap_or(AIR)
    }
}
