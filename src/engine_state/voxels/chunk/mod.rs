//! # Chunk Module
//!
//! A chunk owns one fixed-size voxel grid, stored as a flat array of one-byte
//! block IDs (see [`ChunkDimensions::index`] for the layout), together with
//! the meshes most recently applied to it.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──generate──▶ Generated ──request_rebuild──▶ MeshPending
//!                                                  ▲              │
//!                                   request_rebuild│              │apply_build
//!                                                  │              ▼
//!                                                  └──────── MeshReady
//! any state ──deactivate──▶ Pooled ──reset_for──▶ Uninitialized
//! ```
//!
//! ## Build versions
//!
//! Every rebuild request increments the chunk's version and tags the build
//! with it. A result is only applied when its version and chunk ID still
//! match, so a superseded build, or one started before the chunk object was
//! recycled for another coordinate, is discarded. Versions are never reset.

pub mod chunk_coordinate;
pub mod terrain;

use cgmath::Point3;
use log::{debug, error};

use crate::{
    config::ChunkDimensions,
    engine_state::rendering::{
        meshing::{ChunkMesh, CollisionMesh},
        tasks::{BuildPipeline, BuildRequest, BuildResult, BuildTicket},
    },
    error::VoxelError,
};

use super::block::{registry::BlockRegistry, registry::GenerationPalette, BlockId, AIR};
use chunk_coordinate::ChunkCoordinate;
use terrain::HeightFunction;

/// Identity of a chunk object, stable across recycling.
pub type ChunkId = u64;

/// Where a chunk is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// Freshly created or re-stamped; the grid content is meaningless.
    Uninitialized,
    /// The grid is populated, no build has been requested yet.
    Generated,
    /// A build has been requested and not yet applied.
    MeshPending,
    /// The latest requested build has been applied.
    MeshReady,
    /// Deactivated and waiting in the chunk pool.
    Pooled,
}

/// What happened to a build result handed to [`Chunk::apply_build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    /// Superseded by a newer request or meant for another chunk object.
    Stale,
    /// The build panicked; the previous mesh is kept.
    Failed,
}

/// One column of voxels.
pub struct Chunk {
    id: ChunkId,
    coordinate: ChunkCoordinate,
    dimensions: ChunkDimensions,
    blocks: Vec<BlockId>,
    palette: GenerationPalette,
    state: ChunkState,
    version: u64,
    collision_enabled: bool,
    active: bool,
    mesh: Option<ChunkMesh>,
    collision: Option<CollisionMesh>,
}

impl Chunk {
    /// Creates an empty, uninitialized chunk.
    ///
    /// # Arguments
    /// * `id` - Identity of the chunk object, unique per world
    /// * `coordinate` - Position in the chunk grid
    /// * `dimensions` - Grid size; every axis must be positive
    /// * `registry` - Block registry; its generation palette must be set
    ///
    /// # Returns
    /// The chunk, `RegistryUninitialized` if the registry has no palette yet,
    /// or `InvalidConfig` for non-positive dimensions.
    pub fn new(
        id: ChunkId,
        coordinate: ChunkCoordinate,
        dimensions: ChunkDimensions,
        registry: &BlockRegistry,
    ) -> Result<Self, VoxelError> {
        let palette = registry.palette()?;
        if !dimensions.is_valid() {
            return Err(VoxelError::InvalidConfig(format!(
                "chunk dimensions must be positive (got {:?})",
                dimensions
            )));
        }

        Ok(Chunk {
            id,
            coordinate,
            dimensions,
            blocks: vec![AIR; dimensions.volume()],
            palette,
            state: ChunkState::Uninitialized,
            version: 0,
            collision_enabled: false,
            active: true,
            mesh: None,
            collision: None,
        })
    }

    /// Fills the grid from a height function.
    ///
    /// For every column the ground height `h` (clamped to the grid) yields
    /// stone below `h / 2`, dirt below `h`, grass at `h` and air above.
    /// The result depends only on the coordinate and the height function.
    pub fn generate(&mut self, heights: &dyn HeightFunction) {
        let origin = self.world_origin();
        let ChunkDimensions { x: sx, y: sy, z: sz } = self.dimensions;

        for z in 0..sz {
            for x in 0..sx {
                let height = heights
                    .height_at(origin.x + x, origin.z + z)
                    .clamp(0, sy - 1);
                for y in 0..sy {
                    let block = if y < height / 2 {
                        self.palette.stone
                    } else if y < height {
                        self.palette.dirt
                    } else if y == height {
                        self.palette.grass
                    } else {
                        AIR
                    };
                    self.blocks[self.dimensions.index(x, y, z)] = block;
                }
            }
        }
        self.state = ChunkState::Generated;
    }

    /// Sets every voxel to `block`.
    pub fn fill(&mut self, block: BlockId) {
        self.blocks.fill(block);
        if self.state == ChunkState::Uninitialized {
            self.state = ChunkState::Generated;
        }
    }

    /// Block at a local position, or `None` outside the grid.
    pub fn get_local(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        self.dimensions
            .contains(x, y, z)
            .then(|| self.blocks[self.dimensions.index(x, y, z)])
    }

    /// Writes a block at a local position.
    ///
    /// Does not rebuild the mesh; call [`Chunk::request_rebuild`] afterwards.
    ///
    /// # Returns
    /// `false` if the position lies outside the grid.
    pub fn set_local(&mut self, x: i32, y: i32, z: i32, block: BlockId) -> bool {
        if !self.dimensions.contains(x, y, z) {
            return false;
        }
        let index = self.dimensions.index(x, y, z);
        self.blocks[index] = block;
        true
    }

    /// Schedules a mesh build of the current grid.
    ///
    /// Increments the version and submits a copy of the grid, so the chunk
    /// can keep being edited while the build runs. Never blocks.
    ///
    /// # Returns
    /// The version the build is tagged with.
    pub fn request_rebuild(&mut self, pipeline: &mut BuildPipeline) -> u64 {
        self.version += 1;
        self.state = ChunkState::MeshPending;
        pipeline.submit(BuildRequest {
            ticket: self.ticket(),
            dimensions: self.dimensions,
            blocks: self.blocks.clone(),
        });
        self.version
    }

    /// Ticket identifying a build of the chunk's current version.
    pub fn ticket(&self) -> BuildTicket {
        BuildTicket {
            chunk_id: self.id,
            coordinate: self.coordinate,
            version: self.version,
            collision: self.collision_enabled,
        }
    }

    /// Applies a finished build if it is still the latest one.
    ///
    /// A successful build replaces the render mesh and, when the build was
    /// requested with collision, the collision mesh. A failed build leaves
    /// the previous meshes in place.
    pub fn apply_build(&mut self, result: &BuildResult) -> ApplyStatus {
        let ticket = &result.ticket;
        if ticket.chunk_id != self.id
            || ticket.version != self.version
            || self.state != ChunkState::MeshPending
        {
            debug!(
                "Discarding stale build v{} for chunk {:?} (current v{})",
                ticket.version, ticket.coordinate, self.version
            );
            return ApplyStatus::Stale;
        }

        match &result.output {
            Ok(output) => {
                self.mesh = Some(ChunkMesh::from_buffer(&output.buffer, self.world_origin()));
                self.collision = ticket
                    .collision
                    .then(|| CollisionMesh::from_buffer(&output.buffer));
                self.state = ChunkState::MeshReady;
                ApplyStatus::Applied
            }
            Err(message) => {
                error!(
                    "Mesh build v{} for chunk {:?} failed: {}",
                    ticket.version, self.coordinate, message
                );
                self.state = if self.mesh.is_some() {
                    ChunkState::MeshReady
                } else {
                    ChunkState::Generated
                };
                ApplyStatus::Failed
            }
        }
    }

    /// Enables or disables the collision mesh for future builds.
    ///
    /// Disabling drops the current collision mesh at once.
    ///
    /// # Returns
    /// `true` if the setting changed.
    pub fn set_collision_enabled(&mut self, enabled: bool) -> bool {
        if self.collision_enabled == enabled {
            return false;
        }
        self.collision_enabled = enabled;
        if !enabled {
            self.collision = None;
        }
        true
    }

    /// Hides the chunk and drops its meshes before it goes back to the pool.
    ///
    /// The version is kept so that builds still in flight stay stale.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.mesh = None;
        self.collision = None;
        self.collision_enabled = false;
        self.state = ChunkState::Pooled;
    }

    /// Re-stamps a pooled chunk for a new coordinate.
    pub fn reset_for(&mut self, coordinate: ChunkCoordinate) {
        self.coordinate = coordinate;
        self.active = true;
        self.mesh = None;
        self.collision = None;
        self.state = ChunkState::Uninitialized;
    }

    /// World position of the chunk's minimum corner.
    pub fn world_origin(&self) -> Point3<i32> {
        self.coordinate.world_origin(self.dimensions)
    }

    pub fn id(&self) -> ChunkId {
        self.id
    }

    pub fn coordinate(&self) -> ChunkCoordinate {
        self.coordinate
    }

    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Version of the most recently requested build.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    pub fn mesh(&self) -> Option<&ChunkMesh> {
        self.mesh.as_ref()
    }

    pub fn collision_mesh(&self) -> Option<&CollisionMesh> {
        self.collision.as_ref()
    }

    /// Raw voxel grid.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        rendering::{
            meshing::{MeshBuffer, MeshReport},
            tasks::BuildOutput,
        },
        voxels::chunk::terrain::FlatTerrain,
    };

    fn registry() -> BlockRegistry {
        BlockRegistry::with_default_palette(16).unwrap()
    }

    fn chunk(dims: ChunkDimensions) -> Chunk {
        Chunk::new(7, ChunkCoordinate::new(1, -2), dims, &registry()).unwrap()
    }

    fn result_for(chunk: &Chunk, output: Result<BuildOutput, String>) -> BuildResult {
        BuildResult {
            ticket: chunk.ticket(),
            output,
        }
    }

    fn one_quad_output() -> BuildOutput {
        let mut buffer = MeshBuffer::new();
        buffer.positions = vec![[0.0; 3]; 4];
        buffer.normals = vec![[0.0, 1.0, 0.0]; 4];
        buffer.uvs = vec![[0.0; 2]; 4];
        buffer.indices = vec![0, 1, 2, 0, 2, 3];
        BuildOutput {
            buffer,
            report: MeshReport::default(),
        }
    }

    fn pending(chunk: &mut Chunk) {
        chunk.version += 1;
        chunk.state = ChunkState::MeshPending;
    }

    #[test]
    fn creation_requires_palette_and_valid_dimensions() {
        let empty = BlockRegistry::new(16);
        assert!(matches!(
            Chunk::new(0, ChunkCoordinate::new(0, 0), ChunkDimensions::default(), &empty),
            Err(VoxelError::RegistryUninitialized)
        ));
        assert!(matches!(
            Chunk::new(0, ChunkCoordinate::new(0, 0), ChunkDimensions::new(4, 0, 4), &registry()),
            Err(VoxelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn set_then_get_round_trips() {
        let dims = ChunkDimensions::new(5, 7, 3);
        let mut chunk = chunk(dims);
        let mut rng = fastrand::Rng::with_seed(0x5EED);

        for _ in 0..500 {
            let (x, y, z) = (rng.i32(0..dims.x), rng.i32(0..dims.y), rng.i32(0..dims.z));
            let block = rng.u8(..);
            assert!(chunk.set_local(x, y, z, block));
            assert_eq!(chunk.get_local(x, y, z), Some(block));
        }
    }

    #[test]
    fn out_of_bounds_access_is_reported() {
        let dims = ChunkDimensions::new(4, 4, 4);
        let mut chunk = chunk(dims);

        for (x, y, z) in [(-1, 0, 0), (4, 0, 0), (0, -1, 0), (0, 4, 0), (0, 0, -1), (0, 0, 4)] {
            assert_eq!(chunk.get_local(x, y, z), None);
            assert!(!chunk.set_local(x, y, z, 1));
        }
        assert!(chunk.blocks().iter().all(|&b| b == AIR));
    }

    #[test]
    fn generation_layers_columns() {
        let registry = registry();
        let palette = registry.palette().unwrap();
        let dims = ChunkDimensions::new(2, 10, 2);
        let mut chunk = Chunk::new(0, ChunkCoordinate::new(0, 0), dims, &registry).unwrap();

        chunk.generate(&FlatTerrain { height: 6 });

        assert_eq!(chunk.state(), ChunkState::Generated);
        let column: Vec<BlockId> = (0..10).map(|y| chunk.get_local(1, y, 1).unwrap()).collect();
        let s = palette.stone;
        let d = palette.dirt;
        let g = palette.grass;
        assert_eq!(column, vec![s, s, s, d, d, d, g, AIR, AIR, AIR]);
    }

    #[test]
    fn generation_is_deterministic_and_clamped() {
        let dims = ChunkDimensions::new(8, 8, 8);
        let heights = terrain::RandomTerrain::new(42, 100);

        let mut first = chunk(dims);
        first.generate(&heights);
        let mut second = chunk(dims);
        second.fill(3);
        second.generate(&heights);

        assert_eq!(first.blocks(), second.blocks());
    }

    #[test]
    fn heights_above_the_grid_put_grass_on_the_top_layer() {
        let registry = registry();
        let palette = registry.palette().unwrap();
        let dims = ChunkDimensions::new(1, 8, 1);
        let mut chunk = Chunk::new(0, ChunkCoordinate::new(0, 0), dims, &registry).unwrap();

        chunk.generate(&FlatTerrain { height: 100 });

        assert_eq!(chunk.get_local(0, 7, 0), Some(palette.grass));
        assert_eq!(chunk.get_local(0, 6, 0), Some(palette.dirt));
        assert_eq!(chunk.get_local(0, 2, 0), Some(palette.stone));
    }

    #[test]
    fn only_the_latest_version_is_applied() {
        let mut chunk = chunk(ChunkDimensions::new(2, 2, 2));
        chunk.fill(1);

        pending(&mut chunk);
        let older = result_for(&chunk, Ok(one_quad_output()));
        pending(&mut chunk);
        let newer = result_for(&chunk, Ok(one_quad_output()));

        assert_eq!(chunk.apply_build(&newer), ApplyStatus::Applied);
        assert_eq!(chunk.apply_build(&older), ApplyStatus::Stale);
        assert_eq!(chunk.state(), ChunkState::MeshReady);
        assert_eq!(chunk.mesh().unwrap().triangle_count(), 2);
    }

    #[test]
    fn results_for_a_previous_life_are_stale() {
        let mut chunk = chunk(ChunkDimensions::new(2, 2, 2));
        chunk.fill(1);
        pending(&mut chunk);
        let before_recycle = result_for(&chunk, Ok(one_quad_output()));

        chunk.deactivate();
        chunk.reset_for(ChunkCoordinate::new(9, 9));
        chunk.fill(1);
        assert_eq!(chunk.apply_build(&before_recycle), ApplyStatus::Stale);
        assert!(chunk.mesh().is_none());
    }

    #[test]
    fn failed_build_keeps_previous_mesh() {
        let mut chunk = chunk(ChunkDimensions::new(2, 2, 2));
        chunk.fill(1);
        assert!(chunk.set_collision_enabled(true));

        pending(&mut chunk);
        let good = result_for(&chunk, Ok(one_quad_output()));
        assert_eq!(chunk.apply_build(&good), ApplyStatus::Applied);
        assert!(chunk.collision_mesh().is_some());

        pending(&mut chunk);
        let bad = result_for(&chunk, Err("mesher panicked".to_string()));
        assert_eq!(chunk.apply_build(&bad), ApplyStatus::Failed);
        assert_eq!(chunk.state(), ChunkState::MeshReady);
        assert!(chunk.mesh().is_some());
        assert!(chunk.collision_mesh().is_some());
    }

    #[test]
    fn failed_first_build_returns_to_generated() {
        let mut chunk = chunk(ChunkDimensions::new(2, 2, 2));
        chunk.fill(1);
        pending(&mut chunk);
        let bad = result_for(&chunk, Err("boom".to_string()));

        assert_eq!(chunk.apply_build(&bad), ApplyStatus::Failed);
        assert_eq!(chunk.state(), ChunkState::Generated);
    }

    #[test]
    fn render_only_builds_have_no_collision() {
        let mut chunk = chunk(ChunkDimensions::new(2, 2, 2));
        chunk.fill(1);
        pending(&mut chunk);
        let result = result_for(&chunk, Ok(one_quad_output()));

        assert_eq!(chunk.apply_build(&result), ApplyStatus::Applied);
        assert!(chunk.mesh().is_some());
        assert!(chunk.collision_mesh().is_none());
    }
}
