//! Tile mining.
//!
//! What a tile yields is a table lookup on `(layer, tile)`; there is no
//! per-layer special casing beyond the order layers are tried in.

use tracing::debug;
use verdant_common::{Layer, ResourceKind, TileCoord, TileId, WorldResult};

use crate::streaming::ChunkStreamer;

/// What mining one tile produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningRule {
    /// Resource credited, if any
    pub resource: Option<ResourceKind>,
    /// Particle colour as `0xRRGGBB`
    pub particle_color: u32,
}

impl MiningRule {
    const fn yields(resource: ResourceKind, particle_color: u32) -> Option<Self> {
        Some(Self {
            resource: Some(resource),
            particle_color,
        })
    }
}

/// Looks up the mining rule for a tile found in a layer.
///
/// Returns `None` when the tile cannot be mined from that layer: `Air`
/// anywhere, anything but foliage in the canopy, and ground kinds stored in
/// the low flora grid.
#[must_use]
pub const fn mining_rule(layer: Layer, tile: TileId) -> Option<MiningRule> {
    use ResourceKind as R;
    use TileId as T;

    match (layer, tile) {
        (Layer::Canopy, T::TreeFoliage) => MiningRule::yields(R::Leaves, 0x00_6400),

        (Layer::LowFlora, T::BushCoreGreen | T::BushCoreLightGreen) => {
            MiningRule::yields(R::Leaves, 0x32_CD32)
        },
        (Layer::LowFlora, T::BushBranchLeft | T::BushBranchRight) => {
            MiningRule::yields(R::Leaves, 0x32_CD32)
        },
        (Layer::LowFlora, T::BushFlowerRed) => MiningRule::yields(R::RedPetals, 0xFF_4500),
        (Layer::LowFlora, T::BushFlowerYellow) => MiningRule::yields(R::YellowPetals, 0xFF_D700),
        (Layer::LowFlora, T::FlowerRed) => MiningRule::yields(R::RedPetals, 0xFF_0000),
        (Layer::LowFlora, T::FlowerYellow) => MiningRule::yields(R::YellowPetals, 0xFF_FF00),
        (Layer::LowFlora, T::FernBase | T::FernFrondLeft | T::FernFrondRight) => {
            MiningRule::yields(R::PlantFibers, 0x2E_8B57)
        },
        (Layer::LowFlora, T::MushroomRedCap) => MiningRule::yields(R::RedMushroom, 0xFF_0000),
        (Layer::LowFlora, T::MushroomBrownCap) => MiningRule::yields(R::BrownMushroom, 0x8B_4513),
        (Layer::LowFlora, T::MushroomStem) => MiningRule::yields(R::PlantFibers, 0xD2_B48C),
        (Layer::LowFlora, T::TallGrassBase | T::TallGrassTop) => {
            MiningRule::yields(R::GrassBlades, 0x22_8B22)
        },

        (Layer::Ground, T::SurfaceForest) => MiningRule::yields(R::Wood, 0x22_8B22),
        (Layer::Ground, T::UndergroundForest) => MiningRule::yields(R::Dirt, 0x8B_4513),
        (Layer::Ground, T::SurfaceDesert) => MiningRule::yields(R::Sand, 0xF4_A460),
        (Layer::Ground, T::UndergroundDesert) => MiningRule::yields(R::Stone, 0x80_8080),
        (Layer::Ground, T::DeepStone) => MiningRule::yields(R::Stone, 0x70_7070),
        (Layer::Ground, T::TreeTrunk) => MiningRule::yields(R::Wood, 0x65_4321),
        // Any other solid ground is removable but yields nothing.
        (Layer::Ground, tile) if !tile.is_air() => Some(MiningRule {
            resource: None,
            particle_color: 0x80_8080,
        }),

        _ => None,
    }
}

/// A tile removed by mining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedTile {
    /// Tile that was removed
    pub tile: TileId,
    /// Layer it was removed from
    pub layer: Layer,
    /// Resource credited, if any
    pub resource: Option<ResourceKind>,
    /// Particle colour as `0xRRGGBB`
    pub particle_color: u32,
}

/// Result of a mining attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineOutcome {
    /// A tile was removed and replaced with `Air`.
    Removed(MinedTile),
    /// Nothing minable at the target.
    Nothing,
    /// Target farther than the interaction reach.
    OutOfReach,
}

impl MineOutcome {
    /// Whether the ground layer was edited.
    #[must_use]
    pub const fn ground_changed(&self) -> bool {
        matches!(self, Self::Removed(MinedTile { layer: Layer::Ground, .. }))
    }
}

impl ChunkStreamer {
    /// Mines the tile at `target` on behalf of an observer standing at
    /// `observer`.
    ///
    /// Without a hint, canopy is tried first, then low flora, then ground.
    /// With a hint only that layer is consulted. A removed tile becomes `Air`
    /// in both the cache and the buffer.
    ///
    /// # Errors
    ///
    /// Propagates cache errors from writing the mutation.
    pub fn mine(
        &mut self,
        observer: TileCoord,
        target: TileCoord,
        hint: Option<Layer>,
    ) -> WorldResult<MineOutcome> {
        if observer.distance(target) > self.settings().max_interaction_distance {
            return Ok(MineOutcome::OutOfReach);
        }

        let candidates: &[Layer] = match hint {
            Some(ref layer) => std::slice::from_ref(layer),
            None => &Layer::MINING_PRIORITY,
        };

        let found = candidates.iter().find_map(|&layer| {
            let tile = self.tile_at(layer, target)?;
            mining_rule(layer, tile).map(|rule| MinedTile {
                tile,
                layer,
                resource: rule.resource,
                particle_color: rule.particle_color,
            })
        });
        let Some(mined) = found else {
            return Ok(MineOutcome::Nothing);
        };

        self.report_mutation(target, mined.layer, TileId::Air)?;
        debug!(
            "Mined {:?} from {} at ({}, {})",
            mined.tile, mined.layer, target.x, target.y
        );
        Ok(MineOutcome::Removed(mined))
    }
}

#[cfg(test)]
mod tests {
    use verdant_common::{Biome, ChunkCoord};

    use super::*;
    use crate::cache::ChunkCache;
    use crate::config::WorldConfig;
    use crate::generation::TerrainSynthesizer;
    use crate::streaming::StreamSettings;

    fn streamer(biome: Biome) -> ChunkStreamer {
        let mut streamer = ChunkStreamer::new(
            ChunkCache::new(TerrainSynthesizer::with_seed(42)),
            biome,
            StreamSettings::default(),
        );
        streamer
            .on_observer_moved(ChunkCoord::new(50, 5))
            .expect("initial load");
        streamer
    }

    /// First column of chunk 50 with bare forest surface and nothing above it.
    fn bare_surface(streamer: &ChunkStreamer) -> TileCoord {
        let synth = streamer.cache().synthesizer();
        (50 * 32..51 * 32)
            .map(|gx| TileCoord::new(gx, synth.surface_height(gx)))
            .find(|t| {
                streamer.tile_at(Layer::Canopy, *t) == Some(TileId::Air)
                    && streamer.tile_at(Layer::LowFlora, *t) == Some(TileId::Air)
            })
            .expect("some column without flora on the surface row")
    }

    #[test]
    fn test_every_flora_tile_has_a_rule() {
        for tile in [
            TileId::BushCoreGreen,
            TileId::BushBranchRight,
            TileId::BushFlowerYellow,
            TileId::FlowerRed,
            TileId::FernFrondLeft,
            TileId::MushroomBrownCap,
            TileId::MushroomStem,
            TileId::TallGrassTop,
        ] {
            let rule = mining_rule(Layer::LowFlora, tile).expect("flora is minable");
            assert!(rule.resource.is_some());
        }
        assert!(mining_rule(Layer::Canopy, TileId::TreeFoliage).is_some());
        assert!(mining_rule(Layer::Canopy, TileId::TreeTrunk).is_none());
        assert!(mining_rule(Layer::LowFlora, TileId::SurfaceForest).is_none());
        for layer in Layer::ALL {
            assert!(mining_rule(layer, TileId::Air).is_none());
        }
    }

    #[test]
    fn test_mining_forest_surface_yields_wood() {
        let mut streamer = streamer(Biome::Forest);
        let target = bare_surface(&streamer);
        let (chunk, local) = target.decompose(streamer.dims());
        let observer = TileCoord::new(target.x, target.y - 2);

        let outcome = streamer.mine(observer, target, None).expect("mine");
        let MineOutcome::Removed(mined) = outcome else {
            panic!("expected a removal, got {outcome:?}");
        };
        assert_eq!(mined.tile, TileId::SurfaceForest);
        assert_eq!(mined.resource, Some(ResourceKind::Wood));
        assert_eq!(mined.particle_color, 0x22_8B22);
        assert!(outcome.ground_changed());

        assert_eq!(streamer.tile_at(Layer::Ground, target), Some(TileId::Air));
        let cached = streamer.cache().get(chunk).expect("loaded chunk is cached");
        assert_eq!(cached.get(Layer::Ground, local), Some(TileId::Air));
    }

    #[test]
    fn test_mining_empty_cell_is_nothing() {
        let mut streamer = streamer(Biome::Desert);
        let target = bare_surface(&streamer);
        let above = TileCoord::new(target.x, target.y - 1);
        assert_eq!(
            streamer.mine(above, above, None).expect("mine"),
            MineOutcome::Nothing
        );

        let stats = streamer.cache().stats();
        assert_eq!(
            streamer.mine(target, target, Some(Layer::Canopy)).expect("mine"),
            MineOutcome::Nothing
        );
        assert_eq!(streamer.cache().stats(), stats);
    }

    #[test]
    fn test_reach_is_enforced() {
        let mut streamer = streamer(Biome::Desert);
        let target = bare_surface(&streamer);
        let far = TileCoord::new(target.x + 6, target.y);
        assert_eq!(
            streamer.mine(far, target, None).expect("mine"),
            MineOutcome::OutOfReach
        );
        assert_eq!(
            streamer.tile_at(Layer::Ground, target),
            Some(TileId::SurfaceDesert)
        );
    }

    #[test]
    fn test_canopy_wins_over_ground() {
        let mut streamer = streamer(Biome::Forest);
        let dims = streamer.dims();
        let foliage = streamer
            .loaded_chunks()
            .into_iter()
            .flat_map(|coord| {
                let origin = coord.to_tile_coord(dims);
                (0..i64::from(dims.height)).flat_map(move |y| {
                    (0..i64::from(dims.width)).map(move |x| TileCoord::new(origin.x + x, origin.y + y))
                })
            })
            .find(|t| streamer.tile_at(Layer::Canopy, *t) == Some(TileId::TreeFoliage))
            .expect("a forest window has trees");

        let outcome = streamer.mine(foliage, foliage, None).expect("mine");
        assert!(matches!(
            outcome,
            MineOutcome::Removed(MinedTile {
                layer: Layer::Canopy,
                resource: Some(ResourceKind::Leaves),
                ..
            })
        ));
        assert!(!outcome.ground_changed());
        assert_eq!(streamer.tile_at(Layer::Canopy, foliage), Some(TileId::Air));
    }

    #[test]
    fn test_hint_restricts_layer() {
        let mut streamer = streamer(Biome::Desert);
        let target = bare_surface(&streamer);
        let outcome = streamer
            .mine(target, target, Some(Layer::Ground))
            .expect("mine");
        assert!(matches!(
            outcome,
            MineOutcome::Removed(MinedTile {
                tile: TileId::SurfaceDesert,
                resource: Some(ResourceKind::Sand),
                ..
            })
        ));
    }

    #[test]
    fn test_config_reach_is_used() {
        let config = WorldConfig {
            max_interaction_distance: 10.0,
            biome: Biome::Desert,
            ..WorldConfig::default()
        };
        let mut streamer = ChunkStreamer::from_config(&config);
        streamer
            .on_observer_moved(ChunkCoord::new(0, 5))
            .expect("initial load");
        let gx = 3;
        let target = TileCoord::new(gx, streamer.cache().synthesizer().surface_height(gx));
        let observer = TileCoord::new(gx + 8, target.y);
        assert!(matches!(
            streamer.mine(observer, target, None).expect("mine"),
            MineOutcome::Removed(_)
        ));
    }
}
