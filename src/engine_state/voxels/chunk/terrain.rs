//! # Terrain Module
//!
//! Height functions used to fill chunk columns. Each one is a pure function of
//! the world column, so regenerating a recycled chunk at a coordinate always
//! reproduces the same voxels.

use noise::{NoiseFn, Perlin};

use crate::config::TerrainConfig;

/// Ground height of a world column.
pub trait HeightFunction: Send + Sync {
    /// Height of the surface voxel of the column at `(world_x, world_z)`.
    fn height_at(&self, world_x: i32, world_z: i32) -> i32;
}

/// Heightmap sampled from 2D Perlin noise.
pub struct PerlinTerrain {
    perlin: Perlin,
    scale: f64,
    base_height: i32,
    amplitude: f64,
}

impl PerlinTerrain {
    pub fn new(seed: u32, scale: f64, base_height: i32, amplitude: f64) -> Self {
        PerlinTerrain {
            perlin: Perlin::new(seed),
            scale,
            base_height,
            amplitude,
        }
    }
}

impl HeightFunction for PerlinTerrain {
    fn height_at(&self, world_x: i32, world_z: i32) -> i32 {
        let sample = self
            .perlin
            .get([world_x as f64 * self.scale, world_z as f64 * self.scale]);
        self.base_height + (sample * self.amplitude).round() as i32
    }
}

/// Every column has the same height.
pub struct FlatTerrain {
    pub height: i32,
}

impl HeightFunction for FlatTerrain {
    fn height_at(&self, _world_x: i32, _world_z: i32) -> i32 {
        self.height
    }
}

/// Column heights drawn from a generator seeded by the world seed and the column.
pub struct RandomTerrain {
    seed: u64,
    max_height: i32,
}

impl RandomTerrain {
    pub fn new(seed: u64, max_height: i32) -> Self {
        RandomTerrain {
            seed,
            max_height: max_height.max(0),
        }
    }
}

impl HeightFunction for RandomTerrain {
    fn height_at(&self, world_x: i32, world_z: i32) -> i32 {
        let column = ((world_x as u32 as u64) << 32) | world_z as u32 as u64;
        let mut rng =
            fastrand::Rng::with_seed(self.seed ^ column.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        rng.i32(0..=self.max_height)
    }
}

/// Builds the height function selected by the configuration.
pub fn from_config(config: &TerrainConfig) -> Box<dyn HeightFunction> {
    match *config {
        TerrainConfig::Perlin {
            seed,
            scale,
            base_height,
            amplitude,
        } => Box::new(PerlinTerrain::new(seed, scale, base_height, amplitude)),
        TerrainConfig::Flat { height } => Box::new(FlatTerrain { height }),
        TerrainConfig::Random { seed, max_height } => {
            Box::new(RandomTerrain::new(seed, max_height))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_functions_are_deterministic() {
        let perlin = PerlinTerrain::new(3, 0.05, 20, 8.0);
        let random = RandomTerrain::new(11, 30);
        for (x, z) in [(0, 0), (-17, 4), (250, -1000)] {
            assert_eq!(perlin.height_at(x, z), perlin.height_at(x, z));
            assert_eq!(random.height_at(x, z), random.height_at(x, z));
            let h = random.height_at(x, z);
            assert!((0..=30).contains(&h));
            let p = perlin.height_at(x, z);
            assert!((12..=28).contains(&p));
        }
    }

    #[test]
    fn flat_terrain_ignores_position() {
        let flat = FlatTerrain { height: 5 };
        assert_eq!(flat.height_at(-3, 99), 5);
    }
}
