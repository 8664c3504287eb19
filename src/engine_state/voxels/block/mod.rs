//! # Block Module
//!
//! This module provides the block-related functionality of the voxel world:
//! face enumeration, block type definitions and the registry that compacts
//! block types into one-byte IDs for flat chunk storage.

pub mod block_side;
pub mod block_type;
pub mod registry;

/// The underlying integer type used to store a block in a chunk.
///
/// Chunks hold one `BlockId` per voxel; ID `0` is always the empty ("air") type.
pub type BlockId = u8;

/// ID of the empty block type.
pub const AIR: BlockId = 0;

/// Highest ID the registry can hand out.
pub const MAX_BLOCK_ID: BlockId = BlockId::MAX;
