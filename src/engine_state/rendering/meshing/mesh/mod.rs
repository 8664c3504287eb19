//! Greedy meshing of a chunk's voxel grid.
//!
//! # Architecture
//! - [`Quad`]: one merged rectangle on a face plane
//! - [`MeshBuffer`]: reusable vertex/index storage the mesher writes into
//! - [`greedy_mesh`]: the mesher itself
//!
//! # Usage
//! ```
//! use voxel_streaming::config::ChunkDimensions;
//! use voxel_streaming::engine_state::rendering::meshing::{greedy_mesh, MeshBuffer};
//! use voxel_streaming::engine_state::voxels::block::registry::BlockRegistry;
//!
//! let registry = BlockRegistry::with_default_palette(16).unwrap();
//! let stone = registry.id_of(Some("stone"));
//! let dims = ChunkDimensions::new(2, 2, 2);
//! let blocks = vec![stone; dims.volume()];
//!
//! let mut buffer = MeshBuffer::new();
//! let report = greedy_mesh(&blocks, dims, &registry.uv_table(), &mut buffer);
//! assert_eq!(report.quads, 6);
//! ```

mod face;
mod greedy;
mod mesh;

pub use face::Quad;
pub use greedy::{greedy_mesh, MeshReport};
pub use mesh::MeshBuffer;
