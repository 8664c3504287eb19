//! Background mesh builds.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: runs the greedy mesher over a chunk snapshot
//!
//! [`BuildPipeline`] owns the worker pool that runs these tasks and hands the
//! results back to the primary thread.

pub mod build_pipeline;
pub mod chunk_mesh_generation_task;

pub use build_pipeline::{BuildPipeline, BuildResult};
pub use chunk_mesh_generation_task::{BuildOutput, BuildRequest, BuildTicket};
