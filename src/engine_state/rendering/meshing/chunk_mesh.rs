use cgmath::Point3;

use crate::engine_state::rendering::Vertex;

use super::mesh::MeshBuffer;

/// Render mesh of one chunk.
///
/// Vertex positions are chunk-local; `origin` is the world position of the
/// chunk's minimum corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMesh {
    pub origin: Point3<i32>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    /// Copies the content of a filled build buffer into a render mesh.
    pub fn from_buffer(buffer: &MeshBuffer, origin: Point3<i32>) -> Self {
        let vertices = buffer
            .positions
            .iter()
            .zip(&buffer.normals)
            .zip(&buffer.uvs)
            .map(|((&position, &normal), &uv)| Vertex::new(position, normal, uv))
            .collect();

        ChunkMesh {
            origin,
            vertices,
            indices: buffer.indices.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
