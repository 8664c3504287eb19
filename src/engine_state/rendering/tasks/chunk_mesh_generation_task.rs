//! Task for generating mesh data for chunks in a background thread.
//!
//! The task owns a copy of the chunk's voxel grid taken when the rebuild was
//! requested, so the chunk stays editable while the build runs.

use std::sync::Arc;

use crate::{
    config::ChunkDimensions,
    engine_state::{
        rendering::meshing::{greedy_mesh, MeshBuffer, MeshBufferPool, MeshReport},
        task_management::task::Task,
        voxels::{
            block::{registry::UvTable, BlockId},
            chunk::{chunk_coordinate::ChunkCoordinate, ChunkId},
        },
    },
};

/// Identifies one requested build of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTicket {
    pub chunk_id: ChunkId,
    pub coordinate: ChunkCoordinate,
    /// Build version of the chunk when the rebuild was requested.
    pub version: u64,
    /// Whether the apply step also builds a collision mesh.
    pub collision: bool,
}

/// Everything a worker needs to mesh one chunk.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub ticket: BuildTicket,
    pub dimensions: ChunkDimensions,
    pub blocks: Vec<BlockId>,
}

/// A filled mesh buffer and the mesher's report.
#[derive(Debug)]
pub struct BuildOutput {
    pub buffer: MeshBuffer,
    pub report: MeshReport,
}

/// Meshes one chunk snapshot on a worker thread.
pub struct ChunkMeshGenerationTask {
    request: BuildRequest,
    uvs: Arc<UvTable>,
    buffers: MeshBufferPool,
}

impl ChunkMeshGenerationTask {
    /// # Arguments
    /// * `request` - The chunk snapshot to mesh
    /// * `uvs` - Read-only UV table snapshot of the block registry
    /// * `buffers` - Pool the output buffer is taken from
    pub fn new(request: BuildRequest, uvs: Arc<UvTable>, buffers: MeshBufferPool) -> Self {
        ChunkMeshGenerationTask {
            request,
            uvs,
            buffers,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    type Id = BuildTicket;
    type Output = BuildOutput;

    fn id(&self) -> BuildTicket {
        self.request.ticket
    }

    fn process(self) -> BuildOutput {
        let mut buffer = self.buffers.lease();
        let report = greedy_mesh(
            &self.request.blocks,
            self.request.dimensions,
            &self.uvs,
            &mut buffer,
        );
        BuildOutput {
            buffer: buffer.detach(),
            report,
        }
    }
}
