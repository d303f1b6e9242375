//! Procedural chunk synthesis.
//!
//! Generation runs in fixed passes over one chunk:
//! 1. Surface height field per column
//! 2. Ground fill (air / surface / shallow / deep)
//! 3. Cave carving below the surface
//! 4. Flora passes (forest only), see [`crate::flora`]
//!
//! Every pass is a pure function of the chunk coordinate, the biome and the
//! world seed, so regenerating a chunk yields bit-identical grids.

use serde::{Deserialize, Serialize};
use verdant_common::{Biome, ChunkCoord, ChunkDims, TileId};

use crate::chunk::{ChunkData, TileGrid};
use crate::flora::{FloraNoise, FloraParams, FloraPlanter, Placement};
use crate::noise::NoiseSource;

/// Default chunk width in tiles.
pub const DEFAULT_CHUNK_WIDTH: u32 = 32;

/// Default chunk height in tiles.
pub const DEFAULT_CHUNK_HEIGHT: u32 = 60;

/// Noise channel indices, offset from the world seed.
mod channels {
    pub const SURFACE: u32 = 0;
    pub const CAVE: u32 = 1;
}

/// Parameters controlling terrain generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Global tile row the surface oscillates around.
    pub base_surface_level: f64,
    /// Maximum surface deviation in tiles.
    pub surface_amplitude: f64,
    /// Horizontal noise scale (larger = smoother hills).
    pub surface_noise_scale: f64,
    /// Fixed Y input for the surface noise.
    pub surface_noise_y_offset: f64,
    /// Rows of shallow underground below the surface row.
    pub surface_depth: i64,
    /// Cave noise scale (larger = bigger caverns).
    pub cave_noise_scale: f64,
    /// Caves open where remapped cave noise exceeds this (0.0-1.0).
    pub cave_threshold: f64,
    /// Flora placement parameters.
    pub flora: FloraParams,
}

impl GenerationParams {
    /// Default parameters for a chunk of the given height.
    #[must_use]
    pub fn for_chunk_height(chunk_height: u32) -> Self {
        let height = f64::from(chunk_height);
        Self {
            base_surface_level: height * 5.0 + f64::from(chunk_height / 2),
            surface_amplitude: height * 0.3,
            surface_noise_scale: 60.0,
            surface_noise_y_offset: 50.5,
            surface_depth: 5,
            cave_noise_scale: 24.0,
            cave_threshold: 0.72,
            flora: FloraParams::default(),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::for_chunk_height(DEFAULT_CHUNK_HEIGHT)
    }
}

/// Deterministic layered chunk generator.
#[derive(Debug, Clone)]
pub struct TerrainSynthesizer {
    /// World seed
    seed: u32,
    /// Chunk size in tiles
    dims: ChunkDims,
    /// Generation parameters
    params: GenerationParams,
    /// Surface height noise
    surface_noise: NoiseSource,
    /// Cave noise
    cave_noise: NoiseSource,
    /// Flora gate and shape noise
    flora_noise: FloraNoise,
}

impl TerrainSynthesizer {
    /// Creates a synthesizer.
    #[must_use]
    pub fn new(seed: u32, dims: ChunkDims, params: GenerationParams) -> Self {
        Self {
            seed,
            dims,
            params,
            surface_noise: NoiseSource::channel(seed, channels::SURFACE),
            cave_noise: NoiseSource::channel(seed, channels::CAVE),
            flora_noise: FloraNoise::new(seed),
        }
    }

    /// Creates a synthesizer with default chunk size and parameters.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self::new(
            seed,
            ChunkDims::new(DEFAULT_CHUNK_WIDTH, DEFAULT_CHUNK_HEIGHT),
            GenerationParams::default(),
        )
    }

    /// Returns the world seed.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Returns the chunk dimensions.
    #[must_use]
    pub const fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// Returns the generation parameters.
    #[must_use]
    pub const fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Global tile row of the surface in global column `gx`.
    ///
    /// This is the only place surface height is computed; spawn queries and
    /// chunk generation both go through it.
    #[must_use]
    pub fn surface_height(&self, gx: i64) -> i64 {
        let noise = self.surface_noise.sample(
            gx as f64 / self.params.surface_noise_scale,
            self.params.surface_noise_y_offset,
        );
        (self.params.base_surface_level + self.params.surface_amplitude * noise).round() as i64
    }

    /// Generates a chunk.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord, biome: Biome) -> ChunkData {
        self.generate_with_log(coord, biome).0
    }

    /// Generates a chunk and returns the ordered flora placement log.
    #[must_use]
    pub fn generate_with_log(&self, coord: ChunkCoord, biome: Biome) -> (ChunkData, Vec<Placement>) {
        let origin = coord.to_tile_coord(self.dims);
        let surface: Vec<i64> = (0..i64::from(self.dims.width))
            .map(|x| self.surface_height(origin.x + x))
            .collect();

        let mut ground = TileGrid::new(self.dims.width, self.dims.height);
        self.fill_ground(&mut ground, origin.y, &surface, biome);
        self.carve_caves(&mut ground, origin.x, origin.y, &surface);

        let mut chunk = ChunkData::from_layers(
            coord,
            ground,
            TileGrid::new(self.dims.width, self.dims.height),
            TileGrid::new(self.dims.width, self.dims.height),
        );
        if !biome.has_flora() {
            return (chunk, Vec::new());
        }

        // Surface rows relative to this chunk's top row; may lie outside it.
        let local_surface: Vec<i64> = surface.iter().map(|s| s - origin.y).collect();
        let planter = FloraPlanter {
            noise: &self.flora_noise,
            params: &self.params.flora,
            coord,
            origin_x: origin.x,
            local_surface: &local_surface,
        };
        let log = planter.plant(&mut chunk, chunk_rng_seed(self.seed, coord));

        (chunk, log)
    }

    /// Classifies every tile against the column's surface row.
    fn fill_ground(&self, ground: &mut TileGrid, origin_y: i64, surface: &[i64], biome: Biome) {
        for ly in 0..self.dims.height {
            let gy = origin_y + i64::from(ly);
            for (lx, &surface_y) in surface.iter().enumerate() {
                let tile = self.classify(gy, surface_y, biome);
                ground.set(lx as u32, ly, tile);
            }
        }
    }

    /// Ground tile at global row `gy` in a column whose surface is `surface_y`.
    #[must_use]
    pub fn classify(&self, gy: i64, surface_y: i64, biome: Biome) -> TileId {
        if gy < surface_y {
            TileId::Air
        } else if gy == surface_y {
            biome.surface_tile()
        } else if gy - surface_y <= self.params.surface_depth {
            biome.shallow_tile()
        } else {
            biome.deep_tile()
        }
    }

    /// Removes solid material where cave noise is high. Never adds material.
    fn carve_caves(&self, ground: &mut TileGrid, origin_x: i64, origin_y: i64, surface: &[i64]) {
        let scale = self.params.cave_noise_scale;
        for ly in 0..self.dims.height {
            let gy = origin_y + i64::from(ly);
            for (lx, &surface_y) in surface.iter().enumerate() {
                if gy <= surface_y + 2 {
                    continue;
                }
                let lx = lx as u32;
                if ground.get(lx, ly).map_or(true, TileId::is_air) {
                    continue;
                }
                let gx = origin_x + i64::from(lx);
                let value = self.cave_noise.sample01(gx as f64 / scale, gy as f64 / scale);
                if value > self.params.cave_threshold {
                    ground.set(lx, ly, TileId::Air);
                }
            }
        }
    }
}

/// Mixes the world seed and chunk coordinate into a per-chunk RNG seed.
fn chunk_rng_seed(seed: u32, coord: ChunkCoord) -> u64 {
    let packed = (u64::from(coord.x as u32) << 32) | u64::from(coord.y as u32);
    let mut z = packed ^ u64::from(seed).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    // splitmix64 finalizer
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
