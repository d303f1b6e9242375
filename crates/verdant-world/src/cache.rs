//! Memoized chunk storage.
//!
//! The cache is the authoritative record of every chunk generated this
//! session. Entries are created on first request and edited in place by
//! mutations, so a chunk that leaves and re-enters the active window comes
//! back with its edits.

use std::collections::hash_map::Entry;

use ahash::{AHashMap, AHashSet};
use tracing::{debug, error, trace};
use verdant_common::{Biome, ChunkCoord, Layer, LocalCoord, TileId, WorldError, WorldResult};

use crate::chunk::ChunkData;
use crate::generation::TerrainSynthesizer;

/// A cached chunk plus its edit state.
#[derive(Debug, Clone)]
struct CachedChunk {
    data: ChunkData,
    /// Set once any mutation has been applied
    dirty: bool,
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from memory
    pub hits: u64,
    /// Requests that ran the synthesizer
    pub misses: u64,
    /// Pristine entries dropped by retention
    pub evictions: u64,
}

/// Chunk coordinate to generated (and possibly mutated) chunk data.
#[derive(Debug)]
pub struct ChunkCache {
    synthesizer: TerrainSynthesizer,
    entries: AHashMap<ChunkCoord, CachedChunk>,
    stats: CacheStats,
}

impl ChunkCache {
    /// Creates an empty cache backed by a synthesizer.
    #[must_use]
    pub fn new(synthesizer: TerrainSynthesizer) -> Self {
        Self {
            synthesizer,
            entries: AHashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Returns the synthesizer used on misses.
    #[must_use]
    pub const fn synthesizer(&self) -> &TerrainSynthesizer {
        &self.synthesizer
    }

    /// Returns the memoized chunk, generating and storing it on first request.
    pub fn get_or_generate(&mut self, coord: ChunkCoord, biome: Biome) -> &ChunkData {
        match self.entries.entry(coord) {
            Entry::Occupied(entry) => {
                self.stats.hits += 1;
                trace!("Cache hit for chunk {}", coord);
                &entry.into_mut().data
            }
            Entry::Vacant(slot) => {
                self.stats.misses += 1;
                debug!("Cache miss for chunk {}, generating", coord);
                let data = self.synthesizer.generate(coord, biome);
                &slot.insert(CachedChunk { data, dirty: false }).data
            }
        }
    }

    /// Returns a cached chunk without generating.
    #[must_use]
    pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkData> {
        self.entries.get(&coord).map(|entry| &entry.data)
    }

    /// Returns true if the chunk has been generated.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.entries.contains_key(&coord)
    }

    /// Returns true if the chunk has been mutated since generation.
    #[must_use]
    pub fn is_dirty(&self, coord: ChunkCoord) -> bool {
        self.entries.get(&coord).is_some_and(|entry| entry.dirty)
    }

    /// Overwrites one cell of a cached chunk.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ChunkNotGenerated`] if the chunk was never
    /// generated and [`WorldError::LocalOutOfBounds`] if `local` lies outside
    /// the chunk.
    pub fn apply_mutation(
        &mut self,
        coord: ChunkCoord,
        local: LocalCoord,
        layer: Layer,
        tile: TileId,
    ) -> WorldResult<()> {
        let Some(entry) = self.entries.get_mut(&coord) else {
            error!(
                "Mutation at {:?} on {} targets ungenerated chunk {}",
                local, layer, coord
            );
            return Err(WorldError::ChunkNotGenerated {
                x: coord.x,
                y: coord.y,
            });
        };
        entry.data.set(layer, local, tile).map_err(|e| {
            error!("Mutation rejected for chunk {}: {}", coord, e);
            e
        })?;
        entry.dirty = true;
        trace!("Chunk {} {} {:?} -> {:?}", coord, layer, local, tile);
        Ok(())
    }

    /// Drops never-mutated entries farther than `radius` chunks (Chebyshev)
    /// from `center`. Entries in `pinned` are always kept. Returns how many
    /// were dropped.
    pub fn evict_pristine_beyond(
        &mut self,
        center: ChunkCoord,
        radius: u32,
        pinned: &AHashSet<ChunkCoord>,
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|coord, entry| {
            entry.dirty || pinned.contains(coord) || coord.chebyshev_distance(center) <= radius
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            self.stats.evictions += evicted as u64;
            debug!(
                "Evicted {} pristine chunks beyond radius {} of {}",
                evicted, radius, center
            );
        }
        evicted
    }

    /// Returns the number of cached chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been generated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns hit/miss counters.
    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }
}
