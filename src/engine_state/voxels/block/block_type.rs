//! # Block Type Module
//!
//! A block type is a named, immutable description of how a unit cube looks:
//! one atlas cell for its sides and optional dedicated cells for its top and
//! bottom faces.

use super::block_side::BlockSide;

/// Position of one cell in the texture atlas grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtlasCell {
    pub column: u16,
    pub row: u16,
}

impl AtlasCell {
    pub const fn new(column: u16, row: u16) -> Self {
        AtlasCell { column, row }
    }

    /// UV of the cell's origin texel for an atlas of `grid` × `grid` cells.
    pub fn uv_origin(&self, grid: u32) -> [f32; 2] {
        let grid = grid.max(1) as f32;
        [self.column as f32 / grid, self.row as f32 / grid]
    }
}

/// Identity and face textures of one kind of block.
///
/// The name is the identity: two definitions with the same name are the same
/// block type as far as the registry is concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockType {
    name: String,
    side: Option<AtlasCell>,
    top: Option<AtlasCell>,
    bottom: Option<AtlasCell>,
}

impl BlockType {
    /// Creates a block type that uses `side` on every face.
    pub fn new(name: impl Into<String>, side: AtlasCell) -> Self {
        BlockType {
            name: name.into(),
            side: Some(side),
            top: None,
            bottom: None,
        }
    }

    /// The empty type. It has no textures and is never meshed.
    pub fn air() -> Self {
        BlockType {
            name: "air".to_string(),
            side: None,
            top: None,
            bottom: None,
        }
    }

    /// Sets a dedicated texture for the top face.
    pub fn with_top(mut self, top: AtlasCell) -> Self {
        self.top = Some(top);
        self
    }

    /// Sets a dedicated texture for the bottom face.
    pub fn with_bottom(mut self, bottom: AtlasCell) -> Self {
        self.bottom = Some(bottom);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for a type without textures (the empty type).
    pub fn is_empty(&self) -> bool {
        self.side.is_none()
    }

    /// Texture used on the given face; top and bottom default to the side texture.
    pub fn texture_for(&self, side: BlockSide) -> Option<AtlasCell> {
        match side {
            BlockSide::TOP => self.top.or(self.side),
            BlockSide::BOTTOM => self.bottom.or(self.side),
            _ => self.side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_and_bottom_default_to_side() {
        let stone = BlockType::new("stone", AtlasCell::new(1, 0));
        for side in BlockSide::all() {
            assert_eq!(stone.texture_for(side), Some(AtlasCell::new(1, 0)));
        }

        let grass = BlockType::new("grass", AtlasCell::new(3, 0))
            .with_top(AtlasCell::new(0, 0))
            .with_bottom(AtlasCell::new(2, 0));
        assert_eq!(grass.texture_for(BlockSide::TOP), Some(AtlasCell::new(0, 0)));
        assert_eq!(grass.texture_for(BlockSide::BOTTOM), Some(AtlasCell::new(2, 0)));
        assert_eq!(grass.texture_for(BlockSide::LEFT), Some(AtlasCell::new(3, 0)));
    }

    #[test]
    fn air_has_no_texture() {
        assert!(BlockType::air().is_empty());
        assert_eq!(BlockType::air().texture_for(BlockSide::TOP), None);
    }

    #[test]
    fn uv_origin_scales_by_grid() {
        assert_eq!(AtlasCell::new(4, 2).uv_origin(16), [0.25, 0.125]);
    }
}
