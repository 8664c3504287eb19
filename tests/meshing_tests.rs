/// Integration tests for meshing correctness
/// These tests validate the geometry produced by the greedy mesher
use cgmath::{InnerSpace, Vector3};
use voxel_streaming::{
    config::ChunkDimensions,
    engine_state::rendering::meshing::{greedy_mesh, ChunkMesh, CollisionMesh, MeshBuffer},
    BlockId, BlockRegistry, AIR,
};

fn mesh(blocks: &[BlockId], dims: ChunkDimensions) -> MeshBuffer {
    let registry = BlockRegistry::with_default_palette(16).unwrap();
    let mut buffer = MeshBuffer::new();
    greedy_mesh(blocks, dims, &registry.uv_table(), &mut buffer);
    buffer
}

fn ids() -> (BlockId, BlockId, BlockId) {
    let registry = BlockRegistry::with_default_palette(16).unwrap();
    (
        registry.id_of(Some("stone")),
        registry.id_of(Some("dirt")),
        registry.id_of(Some("grass")),
    )
}

#[test]
fn unit_cube_has_six_quads() {
    let (stone, _, _) = ids();
    let buffer = mesh(&[stone], ChunkDimensions::new(1, 1, 1));

    assert_eq!(buffer.vertex_count(), 24);
    assert_eq!(buffer.triangle_count(), 12);
    assert_eq!(buffer.indices.len(), 36);
}

#[test]
fn slab_collapses_to_six_quads() {
    let (stone, _, _) = ids();
    let dims = ChunkDimensions::new(8, 1, 8);
    let buffer = mesh(&vec![stone; dims.volume()], dims);

    assert_eq!(buffer.vertex_count(), 24);

    // The top quad covers the whole 8x8 face.
    let top: Vec<&[f32; 3]> = buffer
        .positions
        .iter()
        .zip(&buffer.normals)
        .filter(|(_, n)| n[1] > 0.0)
        .map(|(p, _)| p)
        .collect();
    assert_eq!(top.len(), 4);
    assert!(top.iter().all(|p| p[1] == 1.0));
    assert!(top.iter().any(|p| p[0] == 8.0 && p[2] == 8.0));
    assert!(top.iter().any(|p| p[0] == 0.0 && p[2] == 0.0));
}

#[test]
fn interior_faces_are_culled_for_any_block_pair() {
    let (stone, dirt, grass) = ids();
    let dims = ChunkDimensions::new(3, 1, 1);
    let buffer = mesh(&[stone, dirt, grass], dims);

    for (quad, normals) in buffer.positions.chunks(4).zip(buffer.normals.chunks(4)) {
        if normals[0][0] != 0.0 {
            assert!(quad.iter().all(|p| p[0] == 0.0 || p[0] == 3.0), "{:?}", quad);
        }
    }
    // Two end caps plus three unmergeable quads on each of four long sides.
    assert_eq!(buffer.vertex_count(), (2 + 4 * 3) * 4);
}

#[test]
fn triangles_wind_counter_clockwise_from_outside() {
    let (stone, _, _) = ids();
    let dims = ChunkDimensions::new(3, 2, 2);
    let mut blocks = vec![stone; dims.volume()];
    blocks[dims.index(1, 1, 0)] = AIR;
    let buffer = mesh(&blocks, dims);

    for triangle in buffer.indices.chunks(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
            .map(|i| Vector3::from(buffer.positions[i as usize]));
        let winding = (b - a).cross(c - a).normalize();
        let normal = Vector3::from(buffer.normals[triangle[0] as usize]);
        assert!((winding - normal).magnitude() < 1e-5, "{:?} vs {:?}", winding, normal);
    }
}

#[test]
fn quads_share_one_uv_per_face() {
    let (_, _, grass) = ids();
    let buffer = mesh(&[grass], ChunkDimensions::new(1, 1, 1));

    for uvs in buffer.uvs.chunks(4) {
        assert!(uvs.iter().all(|uv| *uv == uvs[0]));
    }
}

#[test]
fn empty_chunk_has_empty_mesh() {
    let dims = ChunkDimensions::new(16, 16, 16);
    let buffer = mesh(&vec![AIR; dims.volume()], dims);

    assert!(buffer.is_empty());
    assert!(ChunkMesh::from_buffer(&buffer, cgmath::Point3::new(0, 0, 0)).is_empty());
    assert!(CollisionMesh::from_buffer(&buffer).is_empty());
}

#[test]
fn checkerboard_cannot_merge() {
    let (stone, _, _) = ids();
    let dims = ChunkDimensions::new(4, 1, 4);
    let blocks: Vec<BlockId> = (0..dims.volume())
        .map(|i| {
            let (x, z) = (i % 4, i / 4);
            if (x + z) % 2 == 0 {
                stone
            } else {
                AIR
            }
        })
        .collect();
    let buffer = mesh(&blocks, dims);

    // Eight isolated cubes.
    assert_eq!(buffer.vertex_count(), 8 * 24);
}
