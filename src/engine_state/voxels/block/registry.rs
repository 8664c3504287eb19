//! # Block Registry
//!
//! The registry owns the bidirectional table between block types and their
//! compact one-byte IDs. ID `0` is reserved for air; registered types receive
//! `1..=255` in registration order and keep their ID for the lifetime of the
//! registry.
//!
//! After world start the registry is only read. It is shared behind an `Arc`
//! and the mesh build pipeline takes a [`UvTable`] snapshot from it on the
//! primary thread, so worker threads never touch the registry itself.

use std::collections::HashMap;

use log::{info, warn};

use crate::error::VoxelError;

use super::{
    block_side::BlockSide,
    block_type::{AtlasCell, BlockType},
    BlockId, AIR, MAX_BLOCK_ID,
};

/// UV origins of the three distinct faces of a block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FaceUvs {
    pub side: [f32; 2],
    pub top: [f32; 2],
    pub bottom: [f32; 2],
}

impl FaceUvs {
    /// UV origin used for quads facing `side`.
    pub fn for_side(&self, side: BlockSide) -> [f32; 2] {
        match side {
            BlockSide::TOP => self.top,
            BlockSide::BOTTOM => self.bottom,
            _ => self.side,
        }
    }
}

/// Snapshot of the UV metadata of every block ID.
///
/// Indexed directly by `BlockId`; IDs without textures map to `None`.
#[derive(Clone, Debug)]
pub struct UvTable {
    entries: Vec<Option<FaceUvs>>,
}

impl UvTable {
    /// A table without any entry.
    pub fn empty() -> Self {
        UvTable {
            entries: vec![None; MAX_BLOCK_ID as usize + 1],
        }
    }

    /// Sets the entry for one ID.
    pub fn insert(&mut self, id: BlockId, uvs: FaceUvs) {
        self.entries[id as usize] = Some(uvs);
    }

    pub fn get(&self, id: BlockId) -> Option<&FaceUvs> {
        self.entries[id as usize].as_ref()
    }
}

/// Block IDs used by terrain generation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GenerationPalette {
    /// Fills the lower half of each column.
    pub stone: BlockId,
    /// Fills the column between the stone and the surface.
    pub dirt: BlockId,
    /// The surface voxel.
    pub grass: BlockId,
}

/// Maps block types to compact IDs and back.
pub struct BlockRegistry {
    types: Vec<BlockType>,
    ids_by_name: HashMap<String, BlockId>,
    palette: Option<GenerationPalette>,
    atlas_grid: u32,
}

impl BlockRegistry {
    /// Creates a registry holding only the air type.
    ///
    /// # Arguments
    /// * `atlas_grid` - Number of cells per row and column of the texture atlas
    pub fn new(atlas_grid: u32) -> Self {
        let air = BlockType::air();
        let mut ids_by_name = HashMap::new();
        ids_by_name.insert(air.name().to_string(), AIR);

        BlockRegistry {
            types: vec![air],
            ids_by_name,
            palette: None,
            atlas_grid: atlas_grid.max(1),
        }
    }

    /// Creates a registry with stone, dirt and grass registered and selected
    /// as the generation palette.
    ///
    /// Atlas layout: grass top at `(0, 0)`, stone at `(1, 0)`, dirt at
    /// `(2, 0)`, grass side at `(3, 0)`.
    pub fn with_default_palette(atlas_grid: u32) -> Result<Self, VoxelError> {
        let mut registry = BlockRegistry::new(atlas_grid);
        registry.register(BlockType::new("stone", AtlasCell::new(1, 0)))?;
        registry.register(BlockType::new("dirt", AtlasCell::new(2, 0)))?;
        registry.register(
            BlockType::new("grass", AtlasCell::new(3, 0))
                .with_top(AtlasCell::new(0, 0))
                .with_bottom(AtlasCell::new(2, 0)),
        )?;
        registry.initialize_palette("stone", "dirt", "grass")?;
        Ok(registry)
    }

    /// Registers a block type and returns its ID.
    ///
    /// Registering a name that is already known returns the existing ID and
    /// leaves the stored definition untouched.
    ///
    /// # Returns
    /// The ID of the block type, or `VoxelError::RegistryFull` once all 255
    /// non-empty IDs are taken.
    pub fn register(&mut self, block_type: BlockType) -> Result<BlockId, VoxelError> {
        if let Some(&id) = self.ids_by_name.get(block_type.name()) {
            if self.types[id as usize] != block_type {
                warn!(
                    "Block type `{}` is already registered with different textures; keeping the original",
                    block_type.name()
                );
            }
            return Ok(id);
        }

        if self.types.len() > MAX_BLOCK_ID as usize {
            warn!("Block registry is full, rejecting `{}`", block_type.name());
            return Err(VoxelError::RegistryFull(block_type.name().to_string()));
        }

        let id = self.types.len() as BlockId;
        self.ids_by_name.insert(block_type.name().to_string(), id);
        self.types.push(block_type);
        Ok(id)
    }

    /// Selects the block types used by terrain generation.
    ///
    /// Chunks can only be created once a palette is set.
    pub fn initialize_palette(
        &mut self,
        stone: &str,
        dirt: &str,
        grass: &str,
    ) -> Result<GenerationPalette, VoxelError> {
        let lookup = |name: &str| {
            self.ids_by_name
                .get(name)
                .copied()
                .filter(|&id| id != AIR)
                .ok_or_else(|| VoxelError::UnknownBlockType(name.to_string()))
        };
        let palette = GenerationPalette {
            stone: lookup(stone)?,
            dirt: lookup(dirt)?,
            grass: lookup(grass)?,
        };
        info!(
            "Block registry initialized with {} types, palette {:?}",
            self.types.len(),
            palette
        );
        self.palette = Some(palette);
        Ok(palette)
    }

    /// The generation palette, or `RegistryUninitialized` if none was set.
    pub fn palette(&self) -> Result<GenerationPalette, VoxelError> {
        self.palette.ok_or(VoxelError::RegistryUninitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.palette.is_some()
    }

    /// ID of the named block type; `None` or an unknown name yields air.
    pub fn id_of(&self, name: Option<&str>) -> BlockId {
        name.and_then(|name| self.ids_by_name.get(name).copied())
            .unwrap_or(AIR)
    }

    /// Block type stored under `id`. Unassigned IDs resolve to air.
    pub fn type_of(&self, id: BlockId) -> &BlockType {
        self.types.get(id as usize).unwrap_or(&self.types[AIR as usize])
    }

    /// Number of registered types, air included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always `false`: air is registered on construction.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// UV origins of the faces of `id`, or `None` for air and unassigned IDs.
    pub fn face_uvs(&self, id: BlockId) -> Option<FaceUvs> {
        let block_type = self.types.get(id as usize)?;
        Some(FaceUvs {
            side: block_type
                .texture_for(BlockSide::LEFT)?
                .uv_origin(self.atlas_grid),
            top: block_type
                .texture_for(BlockSide::TOP)?
                .uv_origin(self.atlas_grid),
            bottom: block_type
                .texture_for(BlockSide::BOTTOM)?
                .uv_origin(self.atlas_grid),
        })
    }

    /// Builds a snapshot of the UV metadata of every registered ID.
    pub fn uv_table(&self) -> UvTable {
        let mut table = UvTable::empty();
        for id in 0..self.types.len() {
            if let Some(uvs) = self.face_uvs(id as BlockId) {
                table.insert(id as BlockId, uvs);
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let mut registry = BlockRegistry::new(16);
        let sand = BlockType::new("sand", AtlasCell::new(5, 0));

        let first = registry.register(sand.clone()).unwrap();
        let second = registry.register(sand).unwrap();

        assert_eq!(first, 1);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.type_of(first).name(), "sand");
    }

    #[test]
    fn registry_rejects_the_256th_type() {
        let mut registry = BlockRegistry::new(16);
        for i in 0..255u16 {
            let id = registry
                .register(BlockType::new(format!("block_{}", i), AtlasCell::new(i, 0)))
                .unwrap();
            assert_eq!(id as u16, i + 1);
        }

        let overflow = registry.register(BlockType::new("one_too_many", AtlasCell::new(0, 1)));
        assert!(matches!(overflow, Err(VoxelError::RegistryFull(_))));
        assert_eq!(registry.id_of(Some("block_254")), 255);
    }

    #[test]
    fn lookups_default_to_air() {
        let registry = BlockRegistry::with_default_palette(16).unwrap();

        assert_eq!(registry.id_of(None), AIR);
        assert_eq!(registry.id_of(Some("obsidian")), AIR);
        assert!(registry.type_of(200).is_empty());
        assert_eq!(registry.face_uvs(AIR), None);
        assert_eq!(registry.face_uvs(200), None);
    }

    #[test]
    fn palette_requires_registered_types() {
        let mut registry = BlockRegistry::new(16);
        assert!(!registry.is_initialized());
        assert!(matches!(
            registry.palette(),
            Err(VoxelError::RegistryUninitialized)
        ));
        assert!(matches!(
            registry.initialize_palette("stone", "dirt", "grass"),
            Err(VoxelError::UnknownBlockType(_))
        ));
    }

    #[test]
    fn uv_table_uses_face_specific_cells() {
        let registry = BlockRegistry::with_default_palette(4).unwrap();
        let grass = registry.id_of(Some("grass"));
        let table = registry.uv_table();
        let uvs = table.get(grass).unwrap();

        assert_eq!(uvs.for_side(BlockSide::TOP), [0.0, 0.0]);
        assert_eq!(uvs.for_side(BlockSide::BOTTOM), [0.5, 0.0]);
        assert_eq!(uvs.for_side(BlockSide::FRONT), [0.75, 0.0]);
        assert!(table.get(AIR).is_none());
    }
}
