//! # Chunk Pool
//!
//! Inactive chunk objects kept for reuse by the streamer.

use log::debug;

use super::chunk::{Chunk, ChunkState};

/// Bounded stack of deactivated chunks.
///
/// Owned by the streamer and only touched on the primary thread. Push and pop
/// are O(1).
pub struct ChunkPool {
    chunks: Vec<Chunk>,
    capacity: usize,
}

impl ChunkPool {
    pub fn new(capacity: usize) -> Self {
        ChunkPool {
            chunks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Takes a pooled chunk, most recently pooled first.
    pub fn pop(&mut self) -> Option<Chunk> {
        self.chunks.pop()
    }

    /// Stores a deactivated chunk.
    ///
    /// # Returns
    /// `false` if the pool was full and the chunk was dropped.
    pub fn push(&mut self, chunk: Chunk) -> bool {
        debug_assert_eq!(chunk.state(), ChunkState::Pooled);
        if self.chunks.len() >= self.capacity {
            debug!("Chunk pool full, dropping chunk {}", chunk.id());
            return false;
        }
        self.chunks.push(chunk);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
