//! Forest flora placement.
//!
//! Passes run in a fixed order: trees, bushes, single flowers, ferns,
//! mushrooms, tall grass. Each pass only writes cells that are still `Air`
//! in its target layer, so a later pass sees everything earlier passes
//! placed and backs off without explicit conflict resolution.
//!
//! A feature whose footprint would leave the chunk is dropped entirely; no
//! pass reads or writes across a chunk boundary.

use serde::{Deserialize, Serialize};
use verdant_common::{ChunkCoord, Layer, TileId};

use crate::chunk::ChunkData;
use crate::noise::NoiseSource;

/// Noise channel indices, offset from the world seed.
mod channels {
    pub const TREE: u32 = 2;
    pub const TREE_SHAPE: u32 = 3;
    pub const BUSH: u32 = 4;
    pub const BUSH_SHAPE: u32 = 5;
    pub const FLOWER: u32 = 6;
    pub const FERN: u32 = 7;
    pub const MUSHROOM: u32 = 8;
    pub const TALL_GRASS: u32 = 9;
}

/// Where a flora channel is sampled: `(gx * frequency, chunk_y + offset)`.
///
/// Offsets are non-integer so samples never land on Perlin lattice points.
#[derive(Debug, Clone, Copy)]
struct Probe {
    frequency: f64,
    offset: f64,
}

impl Probe {
    const fn new(frequency: f64, offset: f64) -> Self {
        Self { frequency, offset }
    }
}

const TREE_GATE: Probe = Probe::new(0.37, 0.37);
const TREE_HEIGHT: Probe = Probe::new(0.91, 0.71);
const BUSH_GATE: Probe = Probe::new(0.43, 0.53);
const BUSH_WIDTH: Probe = Probe::new(0.83, 0.19);
const BUSH_HEIGHT: Probe = Probe::new(0.83, 0.61);
const BUSH_VARIANT: Probe = Probe::new(1.27, 0.29);
const FLOWER_GATE: Probe = Probe::new(0.59, 0.41);
const FLOWER_VARIANT: Probe = Probe::new(1.31, 0.77);
const FERN_GATE: Probe = Probe::new(0.67, 0.23);
const FERN_VARIANT: Probe = Probe::new(1.19, 0.89);
const MUSHROOM_GATE: Probe = Probe::new(0.71, 0.47);
const MUSHROOM_VARIANT: Probe = Probe::new(1.37, 0.13);
const TALL_GRASS_GATE: Probe = Probe::new(0.53, 0.31);

/// Flora placement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloraParams {
    /// Tree gate threshold (-1.0 to 1.0, higher = fewer trees).
    pub tree_threshold: f64,
    /// Shortest trunk in tiles.
    pub tree_min_height: u32,
    /// Tallest trunk in tiles.
    pub tree_max_height: u32,
    /// Bush gate threshold.
    pub bush_threshold: f64,
    /// Chance of a side branch per bush row and side (0.0-1.0).
    pub bush_branch_chance: f64,
    /// Chance a bush core cell becomes a flower accent (0.0-1.0).
    pub bush_flower_chance: f64,
    /// Single flower gate threshold.
    pub flower_threshold: f64,
    /// Fern gate threshold.
    pub fern_threshold: f64,
    /// Mushroom gate threshold.
    pub mushroom_threshold: f64,
    /// Tall grass gate threshold.
    pub tall_grass_threshold: f64,
    /// Tall grass grows two tiles when the gate exceeds the threshold by this much.
    pub tall_grass_double_margin: f64,
}

impl Default for FloraParams {
    fn default() -> Self {
        Self {
            tree_threshold: 0.35,
            tree_min_height: 4,
            tree_max_height: 7,
            bush_threshold: 0.3,
            bush_branch_chance: 0.35,
            bush_flower_chance: 0.2,
            flower_threshold: 0.25,
            fern_threshold: 0.3,
            mushroom_threshold: 0.4,
            tall_grass_threshold: 0.1,
            tall_grass_double_margin: 0.15,
        }
    }
}

/// Flora pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FloraPass {
    /// Trunks in ground plus a 3×3 foliage blob in canopy
    Tree,
    /// Multi-cell bushes with branches and flower accents
    Bush,
    /// Single red or yellow flowers
    Flower,
    /// Fern base with a frond on top
    Fern,
    /// Mushroom stem with a cap on top
    Mushroom,
    /// One or two tiles of tall grass
    TallGrass,
}

/// One tile written by a flora pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Pass that wrote the tile
    pub pass: FloraPass,
    /// Layer written
    pub layer: Layer,
    /// Local X
    pub x: u32,
    /// Local Y
    pub y: u32,
    /// Tile written
    pub tile: TileId,
}

/// Gate and shape noise for every flora pass.
#[derive(Debug, Clone)]
pub(crate) struct FloraNoise {
    tree: NoiseSource,
    tree_shape: NoiseSource,
    bush: NoiseSource,
    bush_shape: NoiseSource,
    flower: NoiseSource,
    fern: NoiseSource,
    mushroom: NoiseSource,
    tall_grass: NoiseSource,
}

impl FloraNoise {
    pub(crate) fn new(seed: u32) -> Self {
        Self {
            tree: NoiseSource::channel(seed, channels::TREE),
            tree_shape: NoiseSource::channel(seed, channels::TREE_SHAPE),
            bush: NoiseSource::channel(seed, channels::BUSH),
            bush_shape: NoiseSource::channel(seed, channels::BUSH_SHAPE),
            flower: NoiseSource::channel(seed, channels::FLOWER),
            fern: NoiseSource::channel(seed, channels::FERN),
            mushroom: NoiseSource::channel(seed, channels::MUSHROOM),
            tall_grass: NoiseSource::channel(seed, channels::TALL_GRASS),
        }
    }
}

/// Runs the flora passes over one freshly generated chunk.
pub(crate) struct FloraPlanter<'a> {
    pub(crate) noise: &'a FloraNoise,
    pub(crate) params: &'a FloraParams,
    pub(crate) coord: ChunkCoord,
    /// Global X of the chunk's first column
    pub(crate) origin_x: i64,
    /// Surface row of each column relative to the chunk's top row
    pub(crate) local_surface: &'a [i64],
}

impl FloraPlanter<'_> {
    /// Plants every pass in order and returns the placement log.
    pub(crate) fn plant(&self, chunk: &mut ChunkData, rng_seed: u64) -> Vec<Placement> {
        let mut canvas = Canvas {
            chunk,
            log: Vec::new(),
        };
        let mut rng = fastrand::Rng::with_seed(rng_seed);

        self.plant_trees(&mut canvas);
        self.plant_bushes(&mut canvas, &mut rng);
        self.plant_flowers(&mut canvas);
        self.plant_ferns(&mut canvas);
        self.plant_mushrooms(&mut canvas);
        self.plant_tall_grass(&mut canvas);

        canvas.log
    }

    fn sample(&self, source: &NoiseSource, gx: i64, probe: Probe) -> f64 {
        source.sample(
            gx as f64 * probe.frequency,
            f64::from(self.coord.y) + probe.offset,
        )
    }

    fn sample01(&self, source: &NoiseSource, gx: i64, probe: Probe) -> f64 {
        source.sample01(
            gx as f64 * probe.frequency,
            f64::from(self.coord.y) + probe.offset,
        )
    }

    /// Columns whose surface row lies inside this chunk, with that row.
    fn surface_columns(&self, height: u32) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.local_surface
            .iter()
            .enumerate()
            .filter(move |&(_, &row)| row >= 0 && row < i64::from(height))
            .map(|(x, &row)| (x as i64, row))
    }

    fn plant_trees(&self, canvas: &mut Canvas<'_>) {
        let params = self.params;
        let span = params.tree_max_height.saturating_sub(params.tree_min_height) + 1;
        for (x, surface) in self.surface_columns(canvas.height()) {
            let gx = self.origin_x + x;
            if self.sample(&self.noise.tree, gx, TREE_GATE) <= params.tree_threshold {
                continue;
            }

            let roll = self.sample01(&self.noise.tree_shape, gx, TREE_HEIGHT);
            let height = (params.tree_min_height + (roll * f64::from(span)).floor() as u32)
                .min(params.tree_max_height);
            let top = surface - i64::from(height);
            let crown_y = top - 2;

            if !canvas.in_bounds(x - 1, crown_y - 1) || !canvas.in_bounds(x + 1, crown_y + 1) {
                continue;
            }
            if !(top..surface).all(|y| canvas.is_air(Layer::Ground, x, y)) {
                continue;
            }

            for y in (top..surface).rev() {
                canvas.place(FloraPass::Tree, Layer::Ground, x, y, TileId::TreeTrunk);
            }
            for y in crown_y - 1..=crown_y + 1 {
                for fx in x - 1..=x + 1 {
                    if canvas.is_air(Layer::Canopy, fx, y) {
                        canvas.place(FloraPass::Tree, Layer::Canopy, fx, y, TileId::TreeFoliage);
                    }
                }
            }
        }
    }

    fn plant_bushes(&self, canvas: &mut Canvas<'_>, rng: &mut fastrand::Rng) {
        let params = self.params;
        for (x, surface) in self.surface_columns(canvas.height()) {
            let gx = self.origin_x + x;
            if self.sample(&self.noise.bush, gx, BUSH_GATE) <= params.bush_threshold {
                continue;
            }

            let width = 1 + ((self.sample01(&self.noise.bush_shape, gx, BUSH_WIDTH) * 3.0).floor()
                as i64)
                .min(2);
            let height = 1 + ((self.sample01(&self.noise.bush_shape, gx, BUSH_HEIGHT) * 2.0)
                .floor() as i64)
                .min(1);
            let rows = surface - height..surface;
            let columns = x..x + width;

            let footprint_clear = rows
                .clone()
                .all(|y| columns.clone().all(|cx| canvas.fits_low_flora(cx, y)));
            if !footprint_clear {
                continue;
            }

            let core = if self.sample(&self.noise.bush_shape, gx, BUSH_VARIANT) >= 0.0 {
                TileId::BushCoreGreen
            } else {
                TileId::BushCoreLightGreen
            };

            let mut plan = Vec::new();
            for y in rows.clone() {
                if rng.f64() < params.bush_branch_chance && canvas.fits_low_flora(x - 1, y) {
                    plan.push((x - 1, y, TileId::BushBranchLeft));
                }
                if rng.f64() < params.bush_branch_chance && canvas.fits_low_flora(x + width, y) {
                    plan.push((x + width, y, TileId::BushBranchRight));
                }
            }
            for y in rows {
                for cx in columns.clone() {
                    let tile = if rng.f64() < params.bush_flower_chance {
                        if rng.bool() {
                            TileId::BushFlowerRed
                        } else {
                            TileId::BushFlowerYellow
                        }
                    } else {
                        core
                    };
                    plan.push((cx, y, tile));
                }
            }

            for (px, py, tile) in plan {
                canvas.place(FloraPass::Bush, Layer::LowFlora, px, py, tile);
            }
        }
    }

    fn plant_flowers(&self, canvas: &mut Canvas<'_>) {
        for (x, surface) in self.surface_columns(canvas.height()) {
            let gx = self.origin_x + x;
            if self.sample(&self.noise.flower, gx, FLOWER_GATE) <= self.params.flower_threshold {
                continue;
            }
            let tile = if self.sample(&self.noise.flower, gx, FLOWER_VARIANT) >= 0.0 {
                TileId::FlowerRed
            } else {
                TileId::FlowerYellow
            };
            canvas.place_stack(FloraPass::Flower, x, surface, &[tile]);
        }
    }

    fn plant_ferns(&self, canvas: &mut Canvas<'_>) {
        for (x, surface) in self.surface_columns(canvas.height()) {
            let gx = self.origin_x + x;
            if self.sample(&self.noise.fern, gx, FERN_GATE) <= self.params.fern_threshold {
                continue;
            }
            let frond = if self.sample(&self.noise.fern, gx, FERN_VARIANT) >= 0.0 {
                TileId::FernFrondLeft
            } else {
                TileId::FernFrondRight
            };
            canvas.place_stack(FloraPass::Fern, x, surface, &[TileId::FernBase, frond]);
        }
    }

    fn plant_mushrooms(&self, canvas: &mut Canvas<'_>) {
        for (x, surface) in self.surface_columns(canvas.height()) {
            let gx = self.origin_x + x;
            if self.sample(&self.noise.mushroom, gx, MUSHROOM_GATE)
                <= self.params.mushroom_threshold
            {
                continue;
            }
            let cap = if self.sample(&self.noise.mushroom, gx, MUSHROOM_VARIANT) >= 0.0 {
                TileId::MushroomRedCap
            } else {
                TileId::MushroomBrownCap
            };
            canvas.place_stack(
                FloraPass::Mushroom,
                x,
                surface,
                &[TileId::MushroomStem, cap],
            );
        }
    }

    fn plant_tall_grass(&self, canvas: &mut Canvas<'_>) {
        let threshold = self.params.tall_grass_threshold;
        for (x, surface) in self.surface_columns(canvas.height()) {
            let gx = self.origin_x + x;
            let gate = self.sample(&self.noise.tall_grass, gx, TALL_GRASS_GATE);
            if gate <= threshold {
                continue;
            }
            if gate > threshold + self.params.tall_grass_double_margin {
                canvas.place_stack(
                    FloraPass::TallGrass,
                    x,
                    surface,
                    &[TileId::TallGrassBase, TileId::TallGrassTop],
                );
            } else {
                canvas.place_stack(FloraPass::TallGrass, x, surface, &[TileId::TallGrassBase]);
            }
        }
    }
}

/// Chunk being decorated plus the log of every write.
struct Canvas<'a> {
    chunk: &'a mut ChunkData,
    log: Vec<Placement>,
}

impl Canvas<'_> {
    fn height(&self) -> u32 {
        self.chunk.layer(Layer::Ground).height()
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        self.chunk.layer(Layer::Ground).in_bounds(x, y)
    }

    /// False outside the chunk.
    fn is_air(&self, layer: Layer, x: i64, y: i64) -> bool {
        self.chunk
            .layer(layer)
            .get_signed(x, y)
            .is_some_and(TileId::is_air)
    }

    /// Low flora may go here: inside the chunk, empty, on walkable ground.
    fn fits_low_flora(&self, x: i64, y: i64) -> bool {
        self.is_air(Layer::LowFlora, x, y)
            && self
                .chunk
                .layer(Layer::Ground)
                .get_signed(x, y)
                .is_some_and(TileId::is_walkable)
    }

    /// Places `tiles` bottom-up in column `x` directly on the surface row.
    /// Places nothing unless every cell fits.
    fn place_stack(&mut self, pass: FloraPass, x: i64, surface: i64, tiles: &[TileId]) {
        let on_surface = self
            .chunk
            .layer(Layer::Ground)
            .get_signed(x, surface)
            .is_some_and(TileId::is_surface);
        if !on_surface {
            return;
        }
        let rows = (1..=tiles.len() as i64).map(|i| surface - i);
        if !rows.clone().all(|y| self.fits_low_flora(x, y)) {
            return;
        }
        for (y, &tile) in rows.zip(tiles) {
            self.place(pass, Layer::LowFlora, x, y, tile);
        }
    }

    fn place(&mut self, pass: FloraPass, layer: Layer, x: i64, y: i64, tile: TileId) {
        debug_assert!(self.is_air(layer, x, y), "flora overwrite at ({x}, {y})");
        let (x, y) = (x as u32, y as u32);
        if self.chunk.layer_mut(layer).set(x, y, tile) {
            self.log.push(Placement {
                pass,
                layer,
                x,
                y,
                tile,
            });
        }
    }
}
