//! # Voxel Raycaster
//!
//! Resolves the block a ray points at, for breaking, and the empty voxel in
//! front of it, for placing.
//!
//! Two implementations share one contract:
//! - [`RaycastMode::Traversal`]: incremental grid traversal. Starting from the
//!   voxel holding the origin, the ray steps into whichever neighbouring voxel
//!   it reaches first until it enters a solid one. The origin voxel itself is
//!   never reported.
//! - [`RaycastMode::Scene`]: a [`SceneIntersector`] returns the hit point and
//!   surface normal, and the targets are derived from them. The default
//!   intersector slab-tests the box of every solid voxel the ray passes
//!   through.
//!
//! Both yield the same targets for the same ray and voxel data. A voxel the
//! ray only touches at an edge or corner is not hit, and both modes visit at
//! most `max_steps` voxels per cast.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::config::{ChunkDimensions, RaycastMode};

use super::{
    block::{BlockId, AIR},
    chunk::chunk_coordinate::ChunkCoordinate,
};

/// Read access to world voxels.
pub trait VoxelQuery {
    /// Block at a world voxel position; unknown positions are air.
    fn block_at(&self, block: Point3<i32>) -> BlockId;
}

/// Surface hit reported by a scene intersector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    pub point: Point3<f32>,
    /// Outward normal of the surface that was hit, axis-aligned.
    pub normal: Vector3<i32>,
    pub distance: f32,
}

/// Scene-level ray intersection service.
pub trait SceneIntersector: Send + Sync {
    /// First surface hit along the ray within `max_distance`.
    ///
    /// `direction` is normalized. Surfaces at distance `0` or behind the
    /// origin are ignored.
    fn intersect(
        &self,
        world: &dyn VoxelQuery,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<SceneHit>;
}

/// Rays that cross a voxel over no more than this distance only touch one of
/// its edges or corners and do not hit it.
const GRAZE_EPSILON: f32 = 1e-5;

/// Offset along the ray used to pick the voxel behind a hit point lying on a
/// grid line.
const RESOLVE_NUDGE: f32 = 1e-4;

/// Walks the voxels a ray passes through, in order, starting with the
/// neighbour of the voxel holding the origin.
///
/// When the ray crosses several grid planes at the same distance, Z is
/// stepped before Y and Y before X.
struct VoxelWalk {
    voxel: [i32; 3],
    step: [i32; 3],
    t_delta: [f32; 3],
    t_max: [f32; 3],
}

/// One voxel entered by a [`VoxelWalk`].
struct Crossing {
    voxel: Point3<i32>,
    previous: Point3<i32>,
    /// Axis of the grid plane crossed to enter the voxel.
    axis: usize,
    /// Distance at which the ray enters the voxel.
    entry: f32,
    /// Distance at which the ray leaves it.
    exit: f32,
}

impl Crossing {
    /// `true` if the ray only touches the voxel at an edge or corner.
    fn grazes(&self) -> bool {
        self.exit - self.entry <= GRAZE_EPSILON
    }
}

impl VoxelWalk {
    /// `direction` must be normalized so that distances are in world units.
    fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        let origin = [origin.x, origin.y, origin.z];
        let direction = [direction.x, direction.y, direction.z];

        let mut walk = VoxelWalk {
            voxel: [0; 3],
            step: [0; 3],
            t_delta: [f32::INFINITY; 3],
            t_max: [f32::INFINITY; 3],
        };
        for axis in 0..3 {
            walk.voxel[axis] = origin[axis].floor() as i32;
            if direction[axis] > 0.0 {
                walk.step[axis] = 1;
                walk.t_delta[axis] = 1.0 / direction[axis];
                walk.t_max[axis] =
                    (walk.voxel[axis] as f32 + 1.0 - origin[axis]) * walk.t_delta[axis];
            } else if direction[axis] < 0.0 {
                walk.step[axis] = -1;
                walk.t_delta[axis] = -1.0 / direction[axis];
                walk.t_max[axis] = (origin[axis] - walk.voxel[axis] as f32) * walk.t_delta[axis];
            }
        }
        walk
    }

    fn next_axis(&self) -> usize {
        let t = self.t_max;
        if t[0] < t[1] {
            if t[0] < t[2] {
                0
            } else {
                2
            }
        } else if t[1] < t[2] {
            1
        } else {
            2
        }
    }

    fn advance(&mut self) -> Crossing {
        let axis = self.next_axis();
        let previous = Point3::from(self.voxel);
        let entry = self.t_max[axis];

        self.voxel[axis] += self.step[axis];
        self.t_max[axis] += self.t_delta[axis];

        Crossing {
            voxel: Point3::from(self.voxel),
            previous,
            axis,
            entry,
            exit: self.t_max[self.next_axis()],
        }
    }

    fn normal(&self, axis: usize) -> Vector3<i32> {
        let mut normal = Vector3::new(0, 0, 0);
        normal[axis] = -self.step[axis];
        normal
    }
}

/// Slab-tests the unit box of every solid voxel the ray passes through and
/// reports the first one it enters.
#[derive(Debug, Clone, Copy)]
pub struct VoxelBoxIntersector {
    max_steps: usize,
}

impl VoxelBoxIntersector {
    /// # Arguments
    /// * `max_steps` - Number of voxels visited before giving up
    pub fn new(max_steps: usize) -> Self {
        VoxelBoxIntersector { max_steps }
    }
}

impl SceneIntersector for VoxelBoxIntersector {
    fn intersect(
        &self,
        world: &dyn VoxelQuery,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<SceneHit> {
        let mut walk = VoxelWalk::new(origin, direction);
        for _ in 0..self.max_steps {
            let crossing = walk.advance();
            if crossing.entry > max_distance {
                return None;
            }
            if world.block_at(crossing.voxel) == AIR {
                continue;
            }
            let Some((distance, normal)) = ray_box_entry(origin, direction, crossing.voxel) else {
                continue;
            };
            if distance > 0.0 && distance <= max_distance {
                return Some(SceneHit {
                    point: origin + direction * distance,
                    normal,
                    distance,
                });
            }
        }
        None
    }
}

/// Slab test against the unit box of `voxel`.
///
/// A ray lying in a face plane counts as inside the voxel above that plane,
/// matching the floor convention of the traversal. When the ray enters
/// through an edge or corner, the lowest axis among the tied entry planes
/// gives the normal.
///
/// # Returns
/// The entry distance and the outward normal of the entry face, or `None`
/// if the ray misses the box, only touches its boundary, or the box lies
/// behind the origin.
fn ray_box_entry(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    voxel: Point3<i32>,
) -> Option<(f32, Vector3<i32>)> {
    let origin = [origin.x, origin.y, origin.z];
    let direction = [direction.x, direction.y, direction.z];
    let min = [voxel.x as f32, voxel.y as f32, voxel.z as f32];

    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vector3::new(0, 0, 0);

    for axis in 0..3 {
        let max = min[axis] + 1.0;
        if direction[axis] == 0.0 {
            if origin[axis] < min[axis] || origin[axis] >= max {
                return None;
            }
            continue;
        }
        let t1 = (min[axis] - origin[axis]) / direction[axis];
        let t2 = (max - origin[axis]) / direction[axis];
        let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };

        if near > t_enter {
            t_enter = near;
            normal = Vector3::new(0, 0, 0);
            normal[axis] = if direction[axis] > 0.0 { -1 } else { 1 };
        }
        t_exit = t_exit.min(far);
    }

    (t_exit - t_enter > GRAZE_EPSILON && t_exit > 0.0).then_some((t_enter, normal))
}

/// Targets resolved by a cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The solid voxel hit by the ray.
    pub break_target: Point3<i32>,
    /// The empty voxel in front of the hit face.
    pub place_target: Point3<i32>,
    /// Chunk containing `break_target`.
    pub hit_chunk: ChunkCoordinate,
    pub block: BlockId,
    /// Outward normal of the face the ray entered through.
    pub normal: Vector3<i32>,
    pub distance: f32,
}

/// Casts rays through the voxel world.
pub struct Raycaster {
    mode: RaycastMode,
    max_steps: usize,
    dimensions: ChunkDimensions,
    scene: Box<dyn SceneIntersector>,
}

impl Raycaster {
    /// Creates a raycaster using [`VoxelBoxIntersector`] for scene mode.
    ///
    /// # Arguments
    /// * `mode` - Which implementation `cast` uses
    /// * `max_steps` - Number of voxels either mode visits before giving up
    /// * `dimensions` - Chunk size, used to report the hit chunk
    pub fn new(mode: RaycastMode, max_steps: usize, dimensions: ChunkDimensions) -> Self {
        Raycaster {
            mode,
            max_steps,
            dimensions,
            scene: Box::new(VoxelBoxIntersector::new(max_steps)),
        }
    }

    /// Replaces the scene intersector, e.g. with a physics engine query.
    pub fn with_scene_intersector(mut self, scene: Box<dyn SceneIntersector>) -> Self {
        self.scene = scene;
        self
    }

    pub fn mode(&self) -> RaycastMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RaycastMode) {
        self.mode = mode;
    }

    /// Finds the first solid voxel along the ray.
    ///
    /// A voxel the ray only touches at an edge or corner is not hit.
    ///
    /// # Arguments
    /// * `world` - Voxel source
    /// * `origin` - Ray origin in world space
    /// * `direction` - Ray direction; need not be normalized
    /// * `max_distance` - Reach along the ray; must be finite
    ///
    /// # Returns
    /// The break and place targets, or `None` if nothing solid is within
    /// reach, `direction` is zero or the inputs are not finite.
    pub fn cast(
        &self,
        world: &dyn VoxelQuery,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        let finite = max_distance.is_finite()
            && [origin.x, origin.y, origin.z, direction.x, direction.y, direction.z]
                .iter()
                .all(|c| c.is_finite());
        if !finite || max_distance <= 0.0 || direction.magnitude2() <= f32::EPSILON {
            return None;
        }
        let direction = direction.normalize();

        match self.mode {
            RaycastMode::Traversal => self.traverse(world, origin, direction, max_distance),
            RaycastMode::Scene => {
                let hit = self.scene.intersect(world, origin, direction, max_distance)?;
                self.resolve_scene_hit(world, hit, direction)
            }
        }
    }

    fn traverse(
        &self,
        world: &dyn VoxelQuery,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        let mut walk = VoxelWalk::new(origin, direction);
        for _ in 0..self.max_steps {
            let crossing = walk.advance();
            if crossing.entry > max_distance {
                return None;
            }
            if crossing.grazes() {
                continue;
            }
            let block = world.block_at(crossing.voxel);
            if block != AIR {
                return Some(self.hit(
                    crossing.voxel,
                    crossing.previous,
                    block,
                    walk.normal(crossing.axis),
                    crossing.entry,
                ));
            }
        }
        None
    }

    /// Turns a hit point and normal into targets.
    ///
    /// Along the normal the break voxel lies half a voxel behind the point;
    /// along the other axes the point is moved slightly forward along the ray,
    /// so points on a grid line resolve to the voxel the ray enters.
    fn resolve_scene_hit(
        &self,
        world: &dyn VoxelQuery,
        hit: SceneHit,
        direction: Vector3<f32>,
    ) -> Option<RaycastHit> {
        let axis = (0..3).find(|&axis| hit.normal[axis] != 0)?;
        let mut break_target = Point3::new(0, 0, 0);
        for a in 0..3 {
            let coordinate = if a == axis {
                hit.point[a] - hit.normal[a] as f32 * 0.5
            } else if direction[a] > 0.0 {
                hit.point[a] + RESOLVE_NUDGE
            } else if direction[a] < 0.0 {
                hit.point[a] - RESOLVE_NUDGE
            } else {
                hit.point[a]
            };
            break_target[a] = coordinate.floor() as i32;
        }

        let block = world.block_at(break_target);
        if block == AIR {
            return None;
        }
        let place_target = break_target + hit.normal;
        Some(self.hit(break_target, place_target, block, hit.normal, hit.distance))
    }

    fn hit(
        &self,
        break_target: Point3<i32>,
        place_target: Point3<i32>,
        block: BlockId,
        normal: Vector3<i32>,
        distance: f32,
    ) -> RaycastHit {
        RaycastHit {
            break_target,
            place_target,
            hit_chunk: ChunkCoordinate::from_block(break_target, self.dimensions),
            block,
            normal,
            distance,
        }
    }
}
