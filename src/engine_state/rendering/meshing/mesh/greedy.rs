//! Greedy meshing implementation for voxel rendering.
//!
//! For each of the six face directions the chunk is swept layer by layer
//! along the face axis. Every layer produces a mask holding, per cell, the
//! block ID whose face is visible there (the voxel is solid and its neighbour
//! in the face direction is air or outside the chunk) or air otherwise.
//! The mask is then scanned row by row; each unconsumed cell grows a rectangle
//! first along the row, then across rows while the whole row segment matches,
//! and the rectangle becomes one quad.

use bitvec::prelude::*;
use cgmath::Point3;
use log::{trace, warn};
use web_time::Instant;

use crate::{
    config::ChunkDimensions,
    engine_state::voxels::block::{block_side::BlockSide, registry::UvTable, BlockId, AIR},
};

use super::{face::Quad, mesh::MeshBuffer};

/// Summary of one mesher run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MeshReport {
    /// Quads written to the buffer.
    pub quads: usize,
    /// Quads dropped because their block ID had no UV metadata.
    pub skipped_quads: usize,
    /// Block IDs that had no UV metadata, each listed once.
    pub missing_uvs: Vec<BlockId>,
}

/// Meshes a chunk's voxel grid into `out`.
///
/// Faces are only culled against voxels of the same grid: anything outside the
/// chunk counts as air, so border faces are always emitted.
///
/// # Arguments
/// * `blocks` - Flat voxel grid laid out as described by [`ChunkDimensions::index`]
/// * `dims` - Grid size
/// * `uvs` - Per-ID atlas origins; IDs without an entry are skipped with a warning
/// * `out` - Buffer to append to; expected to be empty
///
/// # Returns
/// The number of emitted and skipped quads.
pub fn greedy_mesh(
    blocks: &[BlockId],
    dims: ChunkDimensions,
    uvs: &UvTable,
    out: &mut MeshBuffer,
) -> MeshReport {
    let start = Instant::now();
    let mut report = MeshReport::default();

    if blocks.len() != dims.volume() {
        warn!(
            "Voxel grid holds {} entries but {:?} needs {}, skipping mesh",
            blocks.len(),
            dims,
            dims.volume()
        );
        return report;
    }

    let mut warned: BitArr!(for 256) = BitArray::ZERO;
    let block_at = |p: [i32; 3]| -> BlockId {
        if dims.contains(p[0], p[1], p[2]) {
            blocks[dims.index(p[0], p[1], p[2])]
        } else {
            AIR
        }
    };

    for side in BlockSide::all() {
        let d = side.axis();
        let u = (d + 1) % 3;
        let v = (d + 2) % 3;
        let size_d = dims.axis(d);
        let size_u = dims.axis(u);
        let size_v = dims.axis(v);
        let cells = (size_u * size_v) as usize;

        let mut mask = vec![AIR; cells];
        let mut used = bitvec![0; cells];

        for layer in 0..size_d {
            for j in 0..size_v {
                for i in 0..size_u {
                    let mut p = [0; 3];
                    p[d] = layer;
                    p[u] = i;
                    p[v] = j;
                    let block = block_at(p);

                    let mut neighbour = p;
                    neighbour[d] += side.step();

                    let visible = block != AIR && block_at(neighbour) == AIR;
                    mask[(i + j * size_u) as usize] = if visible { block } else { AIR };
                }
            }
            used.fill(false);

            for j in 0..size_v {
                for i in 0..size_u {
                    let cell = (i + j * size_u) as usize;
                    let id = mask[cell];
                    if id == AIR || used[cell] {
                        continue;
                    }

                    let mut width = 1;
                    while i + width < size_u {
                        let next = cell + width as usize;
                        if mask[next] != id || used[next] {
                            break;
                        }
                        width += 1;
                    }

                    let mut height = 1;
                    'grow: while j + height < size_v {
                        for k in 0..width {
                            let next = (i + k + (j + height) * size_u) as usize;
                            if mask[next] != id || used[next] {
                                break 'grow;
                            }
                        }
                        height += 1;
                    }

                    for dj in 0..height {
                        for di in 0..width {
                            used.set((i + di + (j + dj) * size_u) as usize, true);
                        }
                    }

                    let mut origin = [0; 3];
                    origin[d] = if side.is_positive() { layer + 1 } else { layer };
                    origin[u] = i;
                    origin[v] = j;

                    match uvs.get(id) {
                        Some(face_uvs) => {
                            let quad = Quad {
                                origin: Point3::new(origin[0], origin[1], origin[2]),
                                width,
                                height,
                                block: id,
                                side,
                            };
                            out.push_quad(&quad, face_uvs.for_side(side));
                            report.quads += 1;
                        }
                        None => {
                            report.skipped_quads += 1;
                            if !warned[id as usize] {
                                warned.set(id as usize, true);
                                report.missing_uvs.push(id);
                                warn!("Block ID {} has no UV metadata, its faces are skipped", id);
                            }
                        }
                    }
                }
            }
        }
    }

    trace!(
        "Greedy mesh of {:?}: {} quads ({} skipped) in {:?}",
        dims,
        report.quads,
        report.skipped_quads,
        start.elapsed()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::registry::BlockRegistry;

    fn stone_registry() -> (BlockRegistry, BlockId) {
        let registry = BlockRegistry::with_default_palette(16).unwrap();
        let stone = registry.id_of(Some("stone"));
        (registry, stone)
    }

    #[test]
    fn single_voxel_yields_six_quads() {
        let (registry, stone) = stone_registry();
        let dims = ChunkDimensions::new(3, 3, 3);
        let mut blocks = vec![AIR; dims.volume()];
        blocks[dims.index(1, 1, 1)] = stone;

        let mut buffer = MeshBuffer::new();
        let report = greedy_mesh(&blocks, dims, &registry.uv_table(), &mut buffer);

        assert_eq!(report.quads, 6);
        assert_eq!(buffer.vertex_count(), 24);
        assert_eq!(buffer.indices.len(), 36);
        assert!(buffer
            .positions
            .iter()
            .all(|p| p.iter().all(|&c| (1.0..=2.0).contains(&c))));
    }

    #[test]
    fn flat_slab_merges_into_one_quad_per_side() {
        let (registry, stone) = stone_registry();
        let dims = ChunkDimensions::new(8, 1, 8);
        let blocks = vec![stone; dims.volume()];

        let mut buffer = MeshBuffer::new();
        let report = greedy_mesh(&blocks, dims, &registry.uv_table(), &mut buffer);

        assert_eq!(report.quads, 6);
        assert_eq!(buffer.vertex_count(), 24);
    }

    #[test]
    fn shared_faces_between_solids_are_culled() {
        let (registry, stone) = stone_registry();
        let dims = ChunkDimensions::new(2, 1, 1);
        let blocks = vec![stone; dims.volume()];

        let mut buffer = MeshBuffer::new();
        greedy_mesh(&blocks, dims, &registry.uv_table(), &mut buffer);

        // No face may sit on the internal plane x = 1 facing along X.
        let internal = buffer
            .positions
            .chunks(4)
            .zip(buffer.normals.chunks(4))
            .filter(|(quad, normal)| normal[0][0] != 0.0 && quad.iter().all(|p| p[0] == 1.0))
            .count();
        assert_eq!(internal, 0);
        assert_eq!(buffer.vertex_count(), 24);
    }

    #[test]
    fn different_blocks_are_not_merged() {
        let registry = BlockRegistry::with_default_palette(16).unwrap();
        let stone = registry.id_of(Some("stone"));
        let dirt = registry.id_of(Some("dirt"));
        let dims = ChunkDimensions::new(2, 1, 1);
        let blocks = vec![stone, dirt];

        let mut buffer = MeshBuffer::new();
        let report = greedy_mesh(&blocks, dims, &registry.uv_table(), &mut buffer);

        // Two separate ends plus two quads on each of the four long sides.
        assert_eq!(report.quads, 10);
    }

    #[test]
    fn empty_grid_produces_nothing() {
        let (registry, _) = stone_registry();
        let dims = ChunkDimensions::new(4, 4, 4);
        let blocks = vec![AIR; dims.volume()];

        let mut buffer = MeshBuffer::new();
        let report = greedy_mesh(&blocks, dims, &registry.uv_table(), &mut buffer);

        assert_eq!(report, MeshReport::default());
        assert!(buffer.is_empty());
    }

    #[test]
    fn ids_without_uvs_are_skipped_and_reported_once() {
        let (registry, stone) = stone_registry();
        let dims = ChunkDimensions::new(3, 1, 1);
        let blocks = vec![stone, AIR, 200];

        let mut buffer = MeshBuffer::new();
        let report = greedy_mesh(&blocks, dims, &registry.uv_table(), &mut buffer);

        assert_eq!(report.quads, 6);
        assert_eq!(report.skipped_quads, 6);
        assert_eq!(report.missing_uvs, vec![200]);
    }

    #[test]
    fn top_faces_use_the_top_atlas_cell() {
        let registry = BlockRegistry::with_default_palette(4).unwrap();
        let grass = registry.id_of(Some("grass"));
        let dims = ChunkDimensions::new(1, 1, 1);

        let mut buffer = MeshBuffer::new();
        greedy_mesh(&[grass], dims, &registry.uv_table(), &mut buffer);

        for (normal, uv) in buffer.normals.iter().zip(&buffer.uvs) {
            let expected = match normal[1] {
                n if n > 0.0 => [0.0, 0.0],
                n if n < 0.0 => [0.5, 0.0],
                _ => [0.75, 0.0],
            };
            assert_eq!(*uv, expected);
        }
    }
}
