use std::ops::{Deref, DerefMut};

use log::trace;

use crate::core::MtResource;

use super::mesh::MeshBuffer;

/// Pool of cleared mesh buffers shared between the primary thread and the
/// build workers.
///
/// Taking from an empty pool allocates a fresh buffer. Returning a buffer to
/// a full pool drops it, so the pool never holds more than `capacity` idle
/// buffers.
#[derive(Clone)]
pub struct MeshBufferPool {
    buffers: MtResource<Vec<MeshBuffer>>,
    capacity: usize,
}

impl MeshBufferPool {
    pub fn new(capacity: usize) -> Self {
        MeshBufferPool {
            buffers: MtResource::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Leases an empty buffer, reusing an idle one when available.
    ///
    /// The buffer goes back to the pool when the lease is dropped, including
    /// during unwinding, unless it is [detached](LeasedBuffer::detach).
    pub fn lease(&self) -> LeasedBuffer {
        let buffer = self.buffers.with_mut(|buffers| buffers.pop()).unwrap_or_default();
        LeasedBuffer {
            pool: self.clone(),
            buffer,
            attached: true,
        }
    }

    /// Clears `buffer` and keeps it for a later build if there is room.
    pub fn give_back(&self, mut buffer: MeshBuffer) {
        buffer.clear();
        let kept = self.buffers.with_mut(|buffers| {
            if buffers.len() < self.capacity {
                buffers.push(buffer);
                true
            } else {
                false
            }
        });
        if !kept {
            trace!("Mesh buffer pool is full, dropping buffer");
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.buffers.get().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A pooled buffer that returns itself to its pool on drop.
pub struct LeasedBuffer {
    pool: MeshBufferPool,
    buffer: MeshBuffer,
    attached: bool,
}

impl LeasedBuffer {
    /// Takes the buffer out of the lease. The caller becomes responsible for
    /// handing it back with [`MeshBufferPool::give_back`].
    pub fn detach(mut self) -> MeshBuffer {
        self.attached = false;
        std::mem::take(&mut self.buffer)
    }
}

impl Deref for LeasedBuffer {
    type Target = MeshBuffer;

    fn deref(&self) -> &MeshBuffer {
        &self.buffer
    }
}

impl DerefMut for LeasedBuffer {
    fn deref_mut(&mut self) -> &mut MeshBuffer {
        &mut self.buffer
    }
}

impl Drop for LeasedBuffer {
    fn drop(&mut self) {
        if self.attached {
            self.pool.give_back(std::mem::take(&mut self.buffer));
        }
    }
}
