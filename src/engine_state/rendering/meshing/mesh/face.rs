use cgmath::Point3;

use crate::engine_state::voxels::block::{block_side::BlockSide, BlockId};

/// A merged rectangle of coplanar faces sharing one block ID.
///
/// The quad lies on the plane perpendicular to `side.axis()` passing through
/// `origin`. It spans `width` voxels along the first tangent axis
/// (`(axis + 1) % 3`) and `height` voxels along the second (`(axis + 2) % 3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad {
    /// Minimum corner of the quad in chunk-local voxel coordinates.
    pub origin: Point3<i32>,
    pub width: i32,
    pub height: i32,
    pub block: BlockId,
    pub side: BlockSide,
}

impl Quad {
    /// Returns the four corners, counter-clockwise when seen from the side
    /// the quad faces.
    ///
    /// # Returns
    /// `[origin, origin + w·u, origin + w·u + h·v, origin + h·v]` for faces
    /// pointing along a positive axis, and the reverse winding otherwise.
    pub fn corners(&self) -> [[f32; 3]; 4] {
        let axis = self.side.axis();
        let u = (axis + 1) % 3;
        let v = (axis + 2) % 3;

        let base = [
            self.origin.x as f32,
            self.origin.y as f32,
            self.origin.z as f32,
        ];
        let mut along_u = base;
        along_u[u] += self.width as f32;
        let mut along_v = base;
        along_v[v] += self.height as f32;
        let mut far = along_u;
        far[v] += self.height as f32;

        if self.side.is_positive() {
            [base, along_u, far, along_v]
        } else {
            [base, along_v, far, along_u]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn winding_normal(corners: &[[f32; 3]; 4]) -> Vector3<f32> {
        let a = Vector3::from(corners[0]);
        let b = Vector3::from(corners[1]);
        let c = Vector3::from(corners[2]);
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn winding_matches_face_normal_on_every_side() {
        for side in BlockSide::all() {
            let quad = Quad {
                origin: Point3::new(1, 2, 3),
                width: 2,
                height: 3,
                block: 1,
                side,
            };
            assert_eq!(winding_normal(&quad.corners()), side.normal(), "{:?}", side);
        }
    }

    #[test]
    fn top_quad_spans_z_then_x() {
        let quad = Quad {
            origin: Point3::new(0, 1, 0),
            width: 4,
            height: 2,
            block: 1,
            side: BlockSide::TOP,
        };
        let corners = quad.corners();

        assert_eq!(corners[0], [0.0, 1.0, 0.0]);
        assert_eq!(corners[1], [0.0, 1.0, 4.0]);
        assert_eq!(corners[2], [2.0, 1.0, 4.0]);
        assert_eq!(corners[3], [2.0, 1.0, 0.0]);
    }
}
