use super::mesh::MeshBuffer;

/// Triangle mesh used for physics queries.
///
/// Shares the geometry of the render mesh but drops normals and UVs.
/// Positions are chunk-local like the render mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMesh {
    pub positions: Vec<[f32; 3]>,
    pub triangles: Vec<[u32; 3]>,
    /// Axis-aligned bounds of `positions`, `None` for an empty mesh.
    pub bounds: Option<([f32; 3], [f32; 3])>,
}

impl CollisionMesh {
    pub fn from_buffer(buffer: &MeshBuffer) -> Self {
        let triangles = buffer
            .indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        let bounds = buffer.positions.split_first().map(|(first, rest)| {
            rest.iter().fold((*first, *first), |(mut min, mut max), p| {
                for axis in 0..3 {
                    min[axis] = min[axis].min(p[axis]);
                    max[axis] = max[axis].max(p[axis]);
                }
                (min, max)
            })
        });

        CollisionMesh {
            positions: buffer.positions.clone(),
            triangles,
            bounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}
