//! # Build Pipeline
//!
//! Runs chunk mesh builds on a bounded worker pool and hands the results back
//! to the primary thread.
//!
//! ## Flow
//! 1. `Chunk::request_rebuild` bumps the chunk's version and calls
//!    [`BuildPipeline::submit`] with a copy of the grid
//! 2. The build runs on a worker once a slot is free; at most
//!    `build_concurrency` builds run at the same time across all chunks
//! 3. The owner calls [`BuildPipeline::drain_completed`] once per tick and
//!    applies each [`BuildResult`] to the chunk it was built for
//! 4. The owner returns every result, applied or not, through
//!    [`BuildPipeline::recycle`] so its buffer goes back to the pool
//!
//! In-flight builds are never cancelled. A superseded build runs to the end
//! and is discarded by the version check when it is applied.

use std::{sync::Arc, time::Duration};

use log::{debug, info};

use crate::{
    engine_state::{
        rendering::meshing::MeshBufferPool,
        task_management::{task::TaskOutcome, TaskManager},
        voxels::block::registry::UvTable,
    },
    error::VoxelError,
};

use super::chunk_mesh_generation_task::{
    BuildOutput, BuildRequest, BuildTicket, ChunkMeshGenerationTask,
};

/// A finished build, successful or not.
#[derive(Debug)]
pub struct BuildResult {
    pub ticket: BuildTicket,
    /// The mesher output, or the panic message of a failed build.
    pub output: Result<BuildOutput, String>,
}

impl From<TaskOutcome<BuildTicket, BuildOutput>> for BuildResult {
    fn from(outcome: TaskOutcome<BuildTicket, BuildOutput>) -> Self {
        BuildResult {
            ticket: outcome.id,
            output: outcome.result,
        }
    }
}

/// Counters describing the pipeline's activity since creation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub in_flight: usize,
    pub queued: usize,
    pub idle_buffers: usize,
}

/// Bounded background executor for chunk mesh builds.
pub struct BuildPipeline {
    manager: TaskManager<ChunkMeshGenerationTask>,
    buffers: MeshBufferPool,
    uvs: Arc<UvTable>,
    submitted: u64,
    completed: u64,
    failed: u64,
}

impl BuildPipeline {
    /// Starts the worker pool.
    ///
    /// # Arguments
    /// * `concurrency` - Maximum number of builds running at the same time
    /// * `buffer_pool_capacity` - Maximum number of idle mesh buffers kept
    /// * `uvs` - UV table snapshot taken from the block registry
    pub fn new(
        concurrency: usize,
        buffer_pool_capacity: usize,
        uvs: UvTable,
    ) -> Result<Self, VoxelError> {
        if concurrency == 0 {
            return Err(VoxelError::InvalidConfig(
                "build_concurrency must be at least 1".to_string(),
            ));
        }
        let manager = TaskManager::new(concurrency, "mesh-build")?;
        info!(
            "Build pipeline ready: {} workers, {} pooled buffers max",
            concurrency, buffer_pool_capacity
        );

        Ok(BuildPipeline {
            manager,
            buffers: MeshBufferPool::new(buffer_pool_capacity),
            uvs: Arc::new(uvs),
            submitted: 0,
            completed: 0,
            failed: 0,
        })
    }

    /// Schedules a build. Never blocks; the build waits in a queue when every
    /// worker is busy.
    pub fn submit(&mut self, request: BuildRequest) {
        self.submitted += 1;
        let ticket = request.ticket;
        let task = ChunkMeshGenerationTask::new(request, self.uvs.clone(), self.buffers.clone());
        if !self.manager.publish_task(task) {
            debug!(
                "Build of chunk {:?} v{} queued, {} waiting",
                ticket.coordinate,
                ticket.version,
                self.manager.queued()
            );
        }
    }

    /// Hands queued builds to free workers.
    pub fn dispatch_queued(&mut self) -> usize {
        self.manager.process_queued_tasks()
    }

    /// Collects every finished build without blocking.
    pub fn drain_completed(&mut self) -> Vec<BuildResult> {
        let results: Vec<BuildResult> = self
            .manager
            .process_completed_tasks()
            .into_iter()
            .map(BuildResult::from)
            .collect();
        for result in &results {
            self.count(result);
        }
        results
    }

    /// Blocks until one build finishes or `timeout` elapses.
    ///
    /// Queued builds are dispatched first so that waiting always makes progress.
    pub fn wait_for_result(&mut self, timeout: Duration) -> Option<BuildResult> {
        self.manager.process_queued_tasks();
        let result = BuildResult::from(self.manager.wait_for_completed(timeout)?);
        self.count(&result);
        Some(result)
    }

    fn count(&mut self, result: &BuildResult) {
        self.completed += 1;
        if result.output.is_err() {
            self.failed += 1;
        }
    }

    /// Returns the buffer of a handled result to the pool.
    pub fn recycle(&self, result: BuildResult) {
        if let Ok(output) = result.output {
            self.buffers.give_back(output.buffer);
        }
    }

    /// Builds handed to workers whose result has not been drained yet.
    pub fn in_flight(&self) -> usize {
        self.manager.in_flight()
    }

    pub fn queued(&self) -> usize {
        self.manager.queued()
    }

    /// `true` when nothing is running or waiting.
    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0 && self.queued() == 0
    }

    pub fn concurrency(&self) -> usize {
        self.manager.num_workers()
    }

    pub fn buffer_pool(&self) -> &MeshBufferPool {
        &self.buffers
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            submitted: self.submitted,
            completed: self.completed,
            failed: self.failed,
            in_flight: self.in_flight(),
            queued: self.queued(),
            idle_buffers: self.buffers.idle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ChunkDimensions,
        engine_state::voxels::{
            block::registry::BlockRegistry, chunk::chunk_coordinate::ChunkCoordinate,
        },
    };

    fn request(version: u64, dims: ChunkDimensions, block: u8) -> BuildRequest {
        BuildRequest {
            ticket: BuildTicket {
                chunk_id: 1,
                coordinate: ChunkCoordinate::new(0, 0),
                version,
                collision: false,
            },
            dimensions: dims,
            blocks: vec![block; dims.volume()],
        }
    }

    #[test]
    fn builds_complete_and_buffers_return_to_the_pool() {
        let registry = BlockRegistry::with_default_palette(16).unwrap();
        let stone = registry.id_of(Some("stone"));
        let mut pipeline = BuildPipeline::new(2, 4, registry.uv_table()).unwrap();
        let dims = ChunkDimensions::new(4, 4, 4);

        for version in 1..=5 {
            pipeline.submit(request(version, dims, stone));
        }
        assert!(pipeline.in_flight() <= 2);

        let mut versions = Vec::new();
        while let Some(result) = pipeline.wait_for_result(Duration::from_secs(5)) {
            let output = result.output.as_ref().unwrap();
            assert_eq!(output.report.quads, 6);
            versions.push(result.ticket.version);
            pipeline.recycle(result);
        }

        versions.sort_unstable();
        assert_eq!(versions, vec![1, 2, 3, 4, 5]);
        assert!(pipeline.is_idle());

        let stats = pipeline.stats();
        assert_eq!(stats.submitted, 5);
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.failed, 0);
        assert!(stats.idle_buffers >= 1 && stats.idle_buffers <= 4);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let registry = BlockRegistry::with_default_palette(16).unwrap();
        assert!(matches!(
            BuildPipeline::new(0, 4, registry.uv_table()),
            Err(VoxelError::InvalidConfig(_))
        ));
    }
}
