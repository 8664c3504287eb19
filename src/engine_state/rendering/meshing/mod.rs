//! Mesh generation for voxel chunks.
//!
//! # Architecture
//! - [`greedy_mesh`]: merges coplanar visible faces into quads and writes them
//!   into a [`MeshBuffer`]
//! - [`MeshBufferPool`]: shared pool of cleared buffers reused across builds
//! - [`ChunkMesh`]: render mesh built from a buffer on the primary thread
//! - [`CollisionMesh`]: triangle soup for physics, built only for chunks near
//!   the observer

mod buffer_pool;
mod chunk_mesh;
mod collision;
pub mod mesh;

pub use buffer_pool::{LeasedBuffer, MeshBufferPool};
pub use chunk_mesh::ChunkMesh;
pub use collision::CollisionMesh;
pub use mesh::{greedy_mesh, MeshBuffer, MeshReport, Quad};
