//! Headless play session: an observer that walks the surface and digs.
//!
//! Stands in for the presentation layer. It feeds observer positions to the
//! streamer, forwards dig requests, and keeps a tally of mined resources.

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::{debug, info};
use verdant_common::{Layer, ResourceKind, TileCoord};
use verdant_world::{ChunkStreamer, MineOutcome, StreamUpdate, WorldConfig};

/// Mined resource counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLedger {
    counts: BTreeMap<ResourceKind, u32>,
}

impl ResourceLedger {
    /// Credits one unit.
    pub fn add(&mut self, resource: ResourceKind) {
        *self.counts.entry(resource).or_insert(0) += 1;
    }

    /// Units of one resource.
    #[cfg(test)]
    #[must_use]
    pub fn count(&self, resource: ResourceKind) -> u32 {
        self.counts.get(&resource).copied().unwrap_or(0)
    }

    /// Units of every resource.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Resources in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u32)> + '_ {
        self.counts.iter().map(|(kind, count)| (*kind, *count))
    }
}

/// One observer in one world.
#[derive(Debug)]
pub struct Session {
    streamer: ChunkStreamer,
    ledger: ResourceLedger,
    /// Observer pixel position
    position: (f64, f64),
    /// Updates after which collision data would be rebuilt
    collision_rebuilds: u32,
}

impl Session {
    /// Spawns the observer above the surface of the start chunk and streams
    /// the initial window.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load fails.
    pub fn start(config: &WorldConfig) -> Result<Self> {
        let mut streamer = ChunkStreamer::from_config(config);
        let position = streamer.spawn_point(config.start_chunk_x);
        info!(
            "Spawning at ({:.1}, {:.1}) in chunk column {}",
            position.0, position.1, config.start_chunk_x
        );

        let update = streamer.update_observer_position(position.0, position.1)?;
        let mut session = Self {
            streamer,
            ledger: ResourceLedger::default(),
            position,
            collision_rebuilds: 0,
        };
        session.absorb(&update);
        Ok(session)
    }

    /// Walks horizontally one tile per step to column `target_x`, hovering
    /// three tiles above the surface.
    ///
    /// # Errors
    ///
    /// Returns an error if streaming fails along the way.
    pub fn walk_to(&mut self, target_x: i64) -> Result<()> {
        let tile_size = f64::from(self.streamer.settings().tile_size);
        let mut x = self.observer_tile().x;
        while x != target_x {
            x += (target_x - x).signum();
            let surface = self.streamer.cache().synthesizer().surface_height(x);
            self.position = (
                (x as f64 + 0.5) * tile_size,
                (surface - 3) as f64 * tile_size,
            );
            let update = self
                .streamer
                .update_observer_position(self.position.0, self.position.1)?;
            self.absorb(&update);
        }
        debug!("Walked to column {}", target_x);
        Ok(())
    }

    /// Mines straight down from the observer, `depth` tiles deep. Returns how
    /// many tiles were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a mutation is rejected.
    pub fn dig_down(&mut self, depth: i64) -> Result<u32> {
        let observer = self.observer_tile();
        let mut removed = 0;
        for dy in 1..=depth {
            let target = TileCoord::new(observer.x, observer.y + dy);
            // Clear every layer at this cell before moving deeper.
            while let MineOutcome::Removed(mined) = self.streamer.mine(observer, target, None)? {
                if let Some(resource) = mined.resource {
                    self.ledger.add(resource);
                }
                if mined.layer == Layer::Ground {
                    self.collision_rebuilds += 1;
                }
                removed += 1;
            }
        }
        info!(
            "Dug {} tiles below ({}, {})",
            removed, observer.x, observer.y
        );
        Ok(removed)
    }

    /// Tile the observer occupies.
    #[must_use]
    pub fn observer_tile(&self) -> TileCoord {
        TileCoord::from_pixels(
            self.position.0,
            self.position.1,
            self.streamer.settings().tile_size,
        )
    }

    /// Returns the streamer.
    #[must_use]
    pub const fn streamer(&self) -> &ChunkStreamer {
        &self.streamer
    }

    /// Returns the resource tally.
    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Number of updates that changed the ground layer.
    #[must_use]
    pub const fn collision_rebuilds(&self) -> u32 {
        self.collision_rebuilds
    }

    fn absorb(&mut self, update: &StreamUpdate) {
        if update.ground_changed {
            self.collision_rebuilds += 1;
        }
        if update.full_reload {
            debug!("Buffer fully reloaded ({} chunks)", update.loaded.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use verdant_common::{Biome, TileId};

    use super::*;

    fn config(biome: Biome) -> WorldConfig {
        let mut config = WorldConfig {
            seed: 2024,
            biome,
            ..WorldConfig::default()
        };
        config.validate();
        config
    }

    #[test]
    fn test_start_loads_window() {
        let session = Session::start(&config(Biome::Forest)).expect("start");
        assert_eq!(session.streamer().loaded_chunks().len(), 25);
        assert_eq!(session.collision_rebuilds(), 1);
        let observer = session.observer_tile();
        assert_eq!(observer.x.div_euclid(32), 50);
    }

    #[test]
    fn test_walk_keeps_observer_centred() {
        let mut session = Session::start(&config(Biome::Forest)).expect("start");
        let start = session.observer_tile().x;
        session.walk_to(start + 100).expect("walk");

        let observer = session.observer_tile();
        assert_eq!(observer.x, start + 100);
        let chunk = observer.to_chunk_coord(session.streamer().dims());
        assert_eq!(session.streamer().window().center(), chunk);
        assert_eq!(session.streamer().loaded_chunks().len(), 25);
    }

    #[test]
    fn test_dig_in_desert_yields_sand_then_stone() {
        let mut session = Session::start(&config(Biome::Desert)).expect("start");
        let removed = session.dig_down(5).expect("dig");

        // Two air rows, the sand surface, then two rows of sandstone.
        assert_eq!(removed, 3);
        assert_eq!(session.ledger().count(ResourceKind::Sand), 1);
        assert_eq!(session.ledger().count(ResourceKind::Stone), 2);
        assert_eq!(session.ledger().total(), 3);
    }

    #[test]
    fn test_dig_persists_after_walking_away() {
        let mut session = Session::start(&config(Biome::Forest)).expect("start");
        let observer = session.observer_tile();
        session.dig_down(4).expect("dig");
        let surface = TileCoord::new(observer.x, observer.y + 3);
        assert_eq!(
            session.streamer().tile_at(Layer::Ground, surface),
            Some(TileId::Air)
        );

        session.walk_to(observer.x + 32 * 4).expect("walk away");
        assert_eq!(session.streamer().tile_at(Layer::Ground, surface), None);
        session.walk_to(observer.x).expect("walk back");
        assert_eq!(
            session.streamer().tile_at(Layer::Ground, surface),
            Some(TileId::Air)
        );
    }
}
