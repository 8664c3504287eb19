//! # Voxel World Data
//!
//! ## Architecture
//!
//! * **Block**: block IDs, block type definitions and the registry mapping
//!   between them
//! * **Chunk**: one voxel column of fixed size, its generation and its
//!   build-version state machine
//! * **Streamer**: loads and unloads chunks around the observer and recycles
//!   them through the chunk pool
//! * **Raycast**: resolves the voxel a ray points at for editing
//!
//! ## Data Flow
//!
//! 1. The streamer decides which chunk coordinates must exist
//! 2. Chunks are created or taken from the pool and generated
//! 3. Each generated or edited chunk requests a mesh build
//! 4. Finished builds are applied back to the chunk on the primary thread
//!
//! ## Thread Safety
//!
//! Everything here is owned and mutated by the primary thread. Build workers
//! only ever see copies of a chunk's grid and a read-only UV table.

pub mod block;
pub mod chunk;
pub mod chunk_pool;
pub mod raycast;
pub mod streamer;
