//! # Rendering Data
//!
//! Everything between voxel data and the renderer: the greedy mesher, the
//! buffers it writes into, the render and collision meshes produced from
//! those buffers, and the background build pipeline that runs the mesher.
//!
//! No GPU work happens here. A chunk's [`meshing::ChunkMesh`] holds plain
//! [`Vertex`] data that a renderer can upload as-is.

pub mod meshing;
pub mod tasks;
mod vertex;

pub use vertex::Vertex;
