//! Reusable storage for the output of the greedy mesher.

use super::face::Quad;

/// Vertex and index data produced by one mesh build.
///
/// Buffers are cleared and recycled through the
/// [`MeshBufferPool`](crate::engine_state::rendering::meshing::MeshBufferPool),
/// so their allocations outlive a single build.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshBuffer {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties every list while keeping the allocations.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.uvs.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends a quad as four vertices and two triangles.
    ///
    /// # Arguments
    /// * `quad` - The merged face rectangle
    /// * `uv` - Atlas cell origin shared by all four vertices
    pub fn push_quad(&mut self, quad: &Quad, uv: [f32; 2]) {
        let start = self.positions.len() as u32;
        let normal: [f32; 3] = quad.side.normal().into();

        for corner in quad.corners() {
            self.positions.push(corner);
            self.normals.push(normal);
            self.uvs.push(uv);
        }

        self.indices.extend_from_slice(&[
            start,
            start + 1,
            start + 2,
            start,
            start + 2,
            start + 3,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_side::BlockSide;
    use cgmath::Point3;

    #[test]
    fn clear_keeps_capacity() {
        let mut buffer = MeshBuffer::new();
        let quad = Quad {
            origin: Point3::new(0, 0, 0),
            width: 1,
            height: 1,
            block: 1,
            side: BlockSide::FRONT,
        };
        buffer.push_quad(&quad, [0.25, 0.0]);
        buffer.push_quad(&quad, [0.25, 0.0]);

        assert_eq!(buffer.vertex_count(), 8);
        assert_eq!(buffer.indices[6..], [4, 5, 6, 4, 6, 7]);

        let capacity = buffer.positions.capacity();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.vertex_count(), 0);
        assert_eq!(buffer.positions.capacity(), capacity);
    }
}
