//! Windowed chunk streaming.
//!
//! The streamer keeps a `(2R+1)`×`(2R+1)` window of chunks centred on the
//! observer materialized in a [`WindowBuffer`]. When the observer crosses a
//! chunk boundary the window origin moves with it, and the buffer is brought
//! up to date with one of two strategies:
//!
//! - [`ReloadStrategy::FullReload`]: clear everything, reload the whole disk.
//! - [`ReloadStrategy::Shift`]: move surviving chunk regions to their new
//!   offsets, then load only the chunks that entered the window.
//!
//! Both leave the buffer and the loaded set in the same state.
//!
//! Mutations go through [`ChunkStreamer::report_mutation`], which writes the
//! cache and the live buffer so the two never diverge.

use ahash::AHashSet;
use tracing::{debug, info, warn};
use verdant_common::{Biome, ChunkCoord, ChunkDims, Layer, TileCoord, TileId, WorldResult};

use crate::cache::ChunkCache;
use crate::chunk::TileGrid;
use crate::config::{ReloadStrategy, WorldConfig};
use crate::generation::TerrainSynthesizer;
use crate::window::{ActiveWindow, WindowBuffer};

/// Streamer tuning taken from [`WorldConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSettings {
    /// Chunk radius R
    pub load_radius: u32,
    /// Tile size in pixels
    pub tile_size: u32,
    /// Buffer update on origin shift
    pub reload_strategy: ReloadStrategy,
    /// Pristine cache retention radius, `None` keeps everything
    pub cache_retention_radius: Option<u32>,
    /// Mining reach in tiles
    pub max_interaction_distance: f64,
}

impl StreamSettings {
    /// Extracts streamer settings from a world configuration.
    #[must_use]
    pub const fn from_config(config: &WorldConfig) -> Self {
        Self {
            load_radius: config.load_radius,
            tile_size: config.tile_size,
            reload_strategy: config.reload_strategy,
            cache_retention_radius: config.cache_retention_radius,
            max_interaction_distance: config.max_interaction_distance,
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from_config(&WorldConfig::default())
    }
}

/// What a streamer operation changed in the buffer.
///
/// Consumers rebuild collision data when `ground_changed` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamUpdate {
    /// Chunks blitted into the buffer
    pub loaded: Vec<ChunkCoord>,
    /// Chunks removed from the buffer
    pub unloaded: Vec<ChunkCoord>,
    /// The whole buffer was cleared before loading
    pub full_reload: bool,
    /// Ground layer contents changed
    pub ground_changed: bool,
}

impl StreamUpdate {
    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty() && !self.ground_changed
    }
}

/// Owns the cache, the active window and its buffer.
#[derive(Debug)]
pub struct ChunkStreamer {
    cache: ChunkCache,
    biome: Biome,
    settings: StreamSettings,
    window: ActiveWindow,
    buffer: WindowBuffer,
    /// Current observer chunk, `None` before the first move
    observer: Option<ChunkCoord>,
    loaded: AHashSet<ChunkCoord>,
}

impl ChunkStreamer {
    /// Creates a streamer with an empty window. Nothing is loaded until the
    /// first [`on_observer_moved`](Self::on_observer_moved).
    #[must_use]
    pub fn new(cache: ChunkCache, biome: Biome, settings: StreamSettings) -> Self {
        let dims = cache.synthesizer().dims();
        let window = ActiveWindow::centered_on(
            ChunkCoord::new(0, 0),
            settings.load_radius,
            dims,
            settings.tile_size,
        );
        let buffer = WindowBuffer::new(&window);
        Self {
            cache,
            biome,
            settings,
            window,
            buffer,
            observer: None,
            loaded: AHashSet::new(),
        }
    }

    /// Builds the synthesizer, cache and streamer described by a configuration.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        let synthesizer =
            TerrainSynthesizer::new(config.seed, config.dims(), config.generation.clone());
        Self::new(
            ChunkCache::new(synthesizer),
            config.biome,
            StreamSettings::from_config(config),
        )
    }

    /// Handles the observer entering a chunk. Repeated calls with the same
    /// chunk do nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a chunk fails validation while loading.
    pub fn on_observer_moved(&mut self, observer: ChunkCoord) -> WorldResult<StreamUpdate> {
        if self.observer == Some(observer) {
            return Ok(StreamUpdate::default());
        }
        self.observer = Some(observer);

        let new_origin = ActiveWindow::origin_for(observer, self.window.radius());
        let mut update = if new_origin == self.window.origin() {
            self.incremental_update()?
        } else {
            match self.settings.reload_strategy {
                ReloadStrategy::FullReload => self.full_reload(observer)?,
                ReloadStrategy::Shift => self.shift_window(observer)?,
            }
        };
        update.ground_changed = !update.loaded.is_empty() || !update.unloaded.is_empty();

        if let Some(radius) = self.settings.cache_retention_radius {
            self.cache
                .evict_pristine_beyond(observer, radius, &self.loaded);
        }

        debug!(
            "Observer at {}: +{} -{} chunks, {} loaded",
            observer,
            update.loaded.len(),
            update.unloaded.len(),
            self.loaded.len()
        );
        Ok(update)
    }

    /// Converts an observer pixel position to its chunk and streams around it.
    ///
    /// # Errors
    ///
    /// See [`on_observer_moved`](Self::on_observer_moved).
    pub fn update_observer_position(&mut self, px: f64, py: f64) -> WorldResult<StreamUpdate> {
        let chunk = ChunkCoord::from_pixels(px, py, self.dims(), self.settings.tile_size);
        self.on_observer_moved(chunk)
    }

    /// Loads newly required chunks and unloads chunks no longer required,
    /// keeping the current origin.
    fn incremental_update(&mut self) -> WorldResult<StreamUpdate> {
        let required = self.window.required();
        let required_set: AHashSet<ChunkCoord> = required.iter().copied().collect();

        let mut update = StreamUpdate::default();
        let mut stale: Vec<ChunkCoord> = self
            .loaded
            .iter()
            .filter(|coord| !required_set.contains(*coord))
            .copied()
            .collect();
        stale.sort_unstable();
        for coord in stale {
            if self.unload_chunk(coord) {
                update.unloaded.push(coord);
            }
        }

        for coord in required {
            if !self.loaded.contains(&coord) && self.load_chunk(coord)? {
                update.loaded.push(coord);
            }
        }
        Ok(update)
    }

    /// Clears the buffer and loads the whole disk around `observer`.
    fn full_reload(&mut self, observer: ChunkCoord) -> WorldResult<StreamUpdate> {
        info!(
            "Full reload: window origin {} -> {}",
            self.window.origin(),
            ActiveWindow::origin_for(observer, self.window.radius())
        );
        let mut unloaded: Vec<ChunkCoord> = self.loaded.drain().collect();
        unloaded.sort_unstable();
        self.buffer.clear();
        self.window.recenter(observer);

        let mut update = self.incremental_update()?;
        update.unloaded = unloaded;
        update.full_reload = true;
        Ok(update)
    }

    /// Moves surviving chunk regions to their offsets under the new origin,
    /// drops chunks that left the window, then loads what entered.
    fn shift_window(&mut self, observer: ChunkCoord) -> WorldResult<StreamUpdate> {
        let old_origin = self.window.origin();
        self.window.recenter(observer);
        let new_origin = self.window.origin();
        info!("Window shift: origin {} -> {}", old_origin, new_origin);

        let dims = self.dims();
        let dx = (i64::from(old_origin.x) - i64::from(new_origin.x)) * i64::from(dims.width);
        let dy = (i64::from(old_origin.y) - i64::from(new_origin.y)) * i64::from(dims.height);
        self.buffer.translate(dx, dy);

        let window = self.window;
        let mut dropped: Vec<ChunkCoord> = self
            .loaded
            .iter()
            .filter(|coord| !window.contains(**coord))
            .copied()
            .collect();
        dropped.sort_unstable();
        for coord in &dropped {
            self.loaded.remove(coord);
        }
        let full_clear = self.loaded.is_empty();

        let mut update = self.incremental_update()?;
        dropped.append(&mut update.unloaded);
        update.unloaded = dropped;
        update.full_reload = full_clear;
        Ok(update)
    }

    /// Fetches a chunk from the cache (generating it if needed) and blits it
    /// into the buffer. Returns `Ok(false)` for chunks outside the window,
    /// which are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`verdant_common::WorldError::MalformedChunk`] if the cached
    /// grids do not match the chunk dimensions. Nothing is written in that case.
    pub fn load_chunk(&mut self, coord: ChunkCoord) -> WorldResult<bool> {
        let Some((x, y)) = self.window.buffer_offset(coord) else {
            warn!(
                "Ignoring load of chunk {} outside window at origin {}",
                coord,
                self.window.origin()
            );
            return Ok(false);
        };

        let dims = self.dims();
        let chunk = self.cache.get_or_generate(coord, self.biome);
        chunk.validate(dims)?;
        self.buffer.blit_chunk(chunk, x, y);
        self.loaded.insert(coord);
        debug!("Loaded chunk {} at buffer ({}, {})", coord, x, y);
        Ok(true)
    }

    /// Clears a chunk's buffer region and forgets it. Returns false if the
    /// chunk was not loaded.
    pub fn unload_chunk(&mut self, coord: ChunkCoord) -> bool {
        if !self.loaded.remove(&coord) {
            return false;
        }
        if let Some((x, y)) = self.window.buffer_offset(coord) {
            let dims = self.dims();
            self.buffer.clear_rect(x, y, dims.width, dims.height);
        }
        debug!("Unloaded chunk {}", coord);
        true
    }

    /// Writes one tile to the cache and, if its chunk is loaded, the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`verdant_common::WorldError::ChunkNotGenerated`] if the tile's
    /// chunk was never generated. The buffer is left untouched.
    pub fn report_mutation(
        &mut self,
        tile: TileCoord,
        layer: Layer,
        tile_id: TileId,
    ) -> WorldResult<StreamUpdate> {
        let (chunk, local) = tile.decompose(self.dims());
        self.cache.apply_mutation(chunk, local, layer, tile_id)?;

        if self.loaded.contains(&chunk) {
            if let Some((bx, by)) = self.window.world_tile_to_buffer(tile) {
                self.buffer.layer_mut(layer).set(bx, by, tile_id);
            }
        }

        Ok(StreamUpdate {
            ground_changed: layer == Layer::Ground,
            ..StreamUpdate::default()
        })
    }

    /// Read-only view of one buffer layer.
    #[must_use]
    pub fn layer(&self, layer: Layer) -> &TileGrid {
        self.buffer.layer(layer)
    }

    /// Tile at a world position, or `None` outside the window.
    #[must_use]
    pub fn tile_at(&self, layer: Layer, tile: TileCoord) -> Option<TileId> {
        let (bx, by) = self.window.world_tile_to_buffer(tile)?;
        self.buffer.layer(layer).get(bx, by)
    }

    /// Whether the ground tile at a world position blocks movement.
    #[must_use]
    pub fn collides_at(&self, tile: TileCoord) -> bool {
        self.tile_at(Layer::Ground, tile).is_some_and(TileId::collides)
    }

    /// Observer pixel position three tiles above the surface at the centre
    /// column of chunk `chunk_x`.
    #[must_use]
    pub fn spawn_point(&self, chunk_x: i32) -> (f64, f64) {
        let dims = self.dims();
        let tile_size = f64::from(self.settings.tile_size);
        let gx = i64::from(chunk_x) * i64::from(dims.width) + i64::from(dims.width / 2);
        let surface = self.cache.synthesizer().surface_height(gx);
        let px = f64::from(chunk_x) * f64::from(dims.width) * tile_size
            + f64::from(dims.width) * tile_size / 2.0;
        let py = (surface - 3) as f64 * tile_size;
        (px, py)
    }

    /// Returns the active window.
    #[must_use]
    pub const fn window(&self) -> &ActiveWindow {
        &self.window
    }

    /// Returns the current observer chunk.
    #[must_use]
    pub const fn observer(&self) -> Option<ChunkCoord> {
        self.observer
    }

    /// Returns true if `coord` is materialized in the buffer.
    #[must_use]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.loaded.contains(&coord)
    }

    /// Loaded chunks, sorted.
    #[must_use]
    pub fn loaded_chunks(&self) -> Vec<ChunkCoord> {
        let mut chunks: Vec<ChunkCoord> = self.loaded.iter().copied().collect();
        chunks.sort_unstable();
        chunks
    }

    /// Returns the backing cache.
    #[must_use]
    pub const fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    /// Returns the streamer settings.
    #[must_use]
    pub const fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Returns the chunk dimensions.
    #[must_use]
    pub const fn dims(&self) -> ChunkDims {
        self.window.dims()
    }

    /// Returns the biome.
    #[must_use]
    pub const fn biome(&self) -> Biome {
        self.biome
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use verdant_common::LocalCoord;

    use super::*;

    fn streamer(strategy: ReloadStrategy) -> ChunkStreamer {
        let settings = StreamSettings {
            reload_strategy: strategy,
            ..StreamSettings::default()
        };
        ChunkStreamer::new(
            ChunkCache::new(TerrainSynthesizer::with_seed(42)),
            Biome::Forest,
            settings,
        )
    }

    /// Every loaded chunk is within R of the observer, every chunk within R
    /// is loaded, and nothing outside loaded regions is non-air.
    fn assert_window_invariant(streamer: &ChunkStreamer) {
        let observer = streamer.observer().expect("observer set");
        let radius = streamer.window().radius();
        let expected: AHashSet<ChunkCoord> = crate::window::spiral(observer, radius)
            .into_iter()
            .collect();
        let loaded: AHashSet<ChunkCoord> = streamer.loaded_chunks().into_iter().collect();
        assert_eq!(loaded, expected);

        let window = streamer.window();
        let dims = streamer.dims();
        for layer in Layer::ALL {
            let grid = streamer.layer(layer);
            for by in 0..grid.height() {
                for bx in 0..grid.width() {
                    let coord = window
                        .origin()
                        .offset((bx / dims.width) as i32, (by / dims.height) as i32);
                    if !streamer.is_loaded(coord) {
                        assert_eq!(grid.get(bx, by), Some(TileId::Air));
                    }
                }
            }
        }
    }

    #[test]
    fn test_initial_load() {
        let mut streamer = streamer(ReloadStrategy::Shift);
        let update = streamer
            .on_observer_moved(ChunkCoord::new(50, 0))
            .expect("initial load");
        assert_eq!(update.loaded.len(), 25);
        assert!(update.unloaded.is_empty());
        assert!(update.ground_changed);
        assert_eq!(streamer.window().origin(), ChunkCoord::new(48, -2));
        assert_window_invariant(&streamer);
    }

    #[test]
    fn test_same_chunk_is_noop() {
        let mut streamer = streamer(ReloadStrategy::Shift);
        streamer
            .on_observer_moved(ChunkCoord::new(50, 0))
            .expect("initial load");
        let misses = streamer.cache().stats().misses;
        let update = streamer
            .on_observer_moved(ChunkCoord::new(50, 0))
            .expect("no-op");
        assert!(update.is_empty());
        assert_eq!(streamer.cache().stats().misses, misses);
    }

    #[test]
    fn test_step_right_shifts_one_column() {
        let mut streamer = streamer(ReloadStrategy::Shift);
        streamer
            .on_observer_moved(ChunkCoord::new(50, 0))
            .expect("initial load");

        let update = streamer
            .on_observer_moved(ChunkCoord::new(51, 0))
            .expect("step right");
        assert_eq!(streamer.window().origin(), ChunkCoord::new(49, -2));
        assert!(!update.full_reload);
        assert_eq!(update.unloaded.len(), 5);
        assert!(update.unloaded.iter().all(|c| c.x == 48));
        assert_eq!(update.loaded.len(), 5);
        assert!(update.loaded.iter().all(|c| c.x == 53));
        assert_eq!(streamer.loaded_chunks().len(), 25);
        assert_window_invariant(&streamer);
    }

    #[test]
    fn test_full_reload_reports_everything() {
        let mut streamer = streamer(ReloadStrategy::FullReload);
        streamer
            .on_observer_moved(ChunkCoord::new(50, 0))
            .expect("initial load");
        let update = streamer
            .on_observer_moved(ChunkCoord::new(51, 0))
            .expect("step right");
        assert!(update.full_reload);
        assert_eq!(update.unloaded.len(), 25);
        assert_eq!(update.loaded.len(), 25);
        assert_window_invariant(&streamer);
    }

    #[test]
    fn test_strategies_agree() {
        let path = [
            ChunkCoord::new(50, 0),
            ChunkCoord::new(51, 0),
            ChunkCoord::new(51, 1),
            ChunkCoord::new(49, 2),
            ChunkCoord::new(60, -4),
            ChunkCoord::new(59, -5),
        ];
        let mut shift = streamer(ReloadStrategy::Shift);
        let mut full = streamer(ReloadStrategy::FullReload);
        for step in path {
            shift.on_observer_moved(step).expect("shift");
            full.on_observer_moved(step).expect("full");
            for layer in Layer::ALL {
                assert_eq!(shift.layer(layer), full.layer(layer), "{layer} at {step}");
            }
            assert_eq!(shift.loaded_chunks(), full.loaded_chunks());
        }
    }

    #[test]
    fn test_mutation_survives_unload() {
        let mut streamer = streamer(ReloadStrategy::Shift);
        streamer
            .on_observer_moved(ChunkCoord::new(0, 5))
            .expect("initial load");

        let dims = streamer.dims();
        let coord = ChunkCoord::new(-2, 5);
        let tile = coord.tile_at(LocalCoord::new(3, 40), dims);
        streamer
            .report_mutation(tile, Layer::Ground, TileId::FernBase)
            .expect("chunk is generated");
        assert_eq!(streamer.tile_at(Layer::Ground, tile), Some(TileId::FernBase));

        // Walk far enough right that the chunk leaves the window, then back.
        streamer
            .on_observer_moved(ChunkCoord::new(3, 5))
            .expect("walk away");
        assert!(!streamer.is_loaded(coord));
        assert_eq!(streamer.tile_at(Layer::Ground, tile), None);

        streamer
            .on_observer_moved(ChunkCoord::new(0, 5))
            .expect("walk back");
        assert!(streamer.is_loaded(coord));
        assert_eq!(streamer.tile_at(Layer::Ground, tile), Some(TileId::FernBase));
    }

    #[test]
    fn test_mutation_before_generation_is_an_error() {
        let mut streamer = streamer(ReloadStrategy::Shift);
        assert!(streamer
            .report_mutation(TileCoord::new(10, 10), Layer::Canopy, TileId::Air)
            .is_err());
    }

    #[test]
    fn test_load_outside_window_is_ignored() {
        let mut streamer = streamer(ReloadStrategy::Shift);
        streamer
            .on_observer_moved(ChunkCoord::new(0, 0))
            .expect("initial load");
        let before = streamer.layer(Layer::Ground).clone();
        assert!(!streamer
            .load_chunk(ChunkCoord::new(10, 0))
            .expect("ignored, not an error"));
        assert!(!streamer.is_loaded(ChunkCoord::new(10, 0)));
        assert_eq!(streamer.layer(Layer::Ground), &before);
        assert!(!streamer.unload_chunk(ChunkCoord::new(10, 0)));
    }

    #[test]
    fn test_buffer_matches_cache() {
        let mut streamer = streamer(ReloadStrategy::Shift);
        streamer
            .on_observer_moved(ChunkCoord::new(7, 5))
            .expect("initial load");
        streamer
            .on_observer_moved(ChunkCoord::new(8, 6))
            .expect("diagonal step");

        let dims = streamer.dims();
        for coord in streamer.loaded_chunks() {
            let chunk = streamer.cache().get(coord).expect("loaded chunks are cached");
            for (lx, ly) in [(0, 0), (5, 17), (31, 59), (16, 30)] {
                let tile = coord.tile_at(LocalCoord::new(lx, ly), dims);
                for layer in Layer::ALL {
                    assert_eq!(
                        streamer.tile_at(layer, tile),
                        chunk.get(layer, LocalCoord::new(lx, ly))
                    );
                }
            }
        }
    }

    #[test]
    fn test_retention_evicts_only_pristine() {
        let settings = StreamSettings {
            cache_retention_radius: Some(3),
            ..StreamSettings::default()
        };
        let mut streamer = ChunkStreamer::new(
            ChunkCache::new(TerrainSynthesizer::with_seed(3)),
            Biome::Forest,
            settings,
        );
        streamer
            .on_observer_moved(ChunkCoord::new(0, 5))
            .expect("initial load");
        let edited = ChunkCoord::new(-2, 5);
        let tile = edited.tile_at(LocalCoord::new(0, 59), streamer.dims());
        streamer
            .report_mutation(tile, Layer::Ground, TileId::Air)
            .expect("generated");

        streamer
            .on_observer_moved(ChunkCoord::new(10, 5))
            .expect("jump");
        assert!(streamer.cache().contains(edited));
        assert!(!streamer.cache().contains(ChunkCoord::new(-2, 6)));
        assert_window_invariant(&streamer);
    }

    #[test]
    fn test_retention_never_drops_loaded_chunks() {
        let settings = StreamSettings {
            cache_retention_radius: Some(1),
            ..StreamSettings::default()
        };
        let mut streamer = ChunkStreamer::new(
            ChunkCache::new(TerrainSynthesizer::with_seed(3)),
            Biome::Forest,
            settings,
        );
        streamer
            .on_observer_moved(ChunkCoord::new(0, 5))
            .expect("initial load");
        streamer
            .on_observer_moved(ChunkCoord::new(1, 5))
            .expect("step");

        for coord in streamer.loaded_chunks() {
            assert!(streamer.cache().contains(coord), "{coord} was evicted");
        }
        assert!(!streamer.cache().contains(ChunkCoord::new(-2, 5)));

        let edge = ChunkCoord::new(3, 5);
        let tile = edge.tile_at(LocalCoord::new(0, 59), streamer.dims());
        streamer
            .report_mutation(tile, Layer::Ground, TileId::Air)
            .expect("loaded chunk accepts mutations");
        assert_eq!(streamer.tile_at(Layer::Ground, tile), Some(TileId::Air));
    }

    #[test]
    fn test_update_observer_position() {
        let mut streamer = streamer(ReloadStrategy::Shift);
        let (px, py) = streamer.spawn_point(50);
        streamer
            .update_observer_position(px, py)
            .expect("initial load");
        assert_eq!(streamer.observer().map(|c| c.x), Some(50));

        let spawn_tile = TileCoord::from_pixels(px, py, 32);
        assert!(matches!(
            streamer.tile_at(Layer::Ground, spawn_tile),
            Some(TileId::Air | TileId::TreeTrunk)
        ));
        let below_surface = TileCoord::new(spawn_tile.x, spawn_tile.y + 3);
        assert!(streamer.collides_at(below_surface));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_window_invariant_on_random_walk(
            steps in prop::collection::vec((-2i32..=2, -2i32..=2), 1..8)
        ) {
            let mut streamer = streamer(ReloadStrategy::Shift);
            let mut observer = ChunkCoord::new(0, 5);
            streamer.on_observer_moved(observer).expect("initial load");
            for (dx, dy) in steps {
                observer = observer.offset(dx, dy);
                streamer.on_observer_moved(observer).expect("step");
                assert_window_invariant(&streamer);
            }
        }
    }
}
