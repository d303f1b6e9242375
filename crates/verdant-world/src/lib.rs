//! # Verdant World
//!
//! Procedural tile world for Verdant.
//!
//! This crate handles:
//! - Deterministic layered chunk synthesis (terrain, caves, flora)
//! - Memoized, mutable chunk storage
//! - Streaming a window of chunks around the observer
//! - Mining tiles with mutations that persist across reloads

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod cache;
pub mod chunk;
pub mod config;
pub mod flora;
pub mod generation;
pub mod mining;
pub mod noise;
pub mod streaming;
pub mod window;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cache::*;
    pub use crate::chunk::*;
    pub use crate::config::*;
    pub use crate::flora::{FloraParams, FloraPass, Placement};
    pub use crate::generation::*;
    pub use crate::mining::*;
    pub use crate::noise::*;
    pub use crate::streaming::*;
    pub use crate::window::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_common::{Biome, ChunkCoord, Layer, TileId};

    #[test]
    fn test_streamer_from_default_config() {
        let mut config = WorldConfig::default();
        config.validate();
        let mut streamer = ChunkStreamer::from_config(&config);
        let (px, py) = streamer.spawn_point(config.start_chunk_x);
        let update = streamer
            .update_observer_position(px, py)
            .expect("initial load");
        assert_eq!(update.loaded.len(), 25);
        assert_eq!(streamer.cache().len(), 25);
    }

    #[test]
    fn test_regenerated_chunk_matches_streamed_chunk() {
        let config = WorldConfig::default();
        let mut streamer = ChunkStreamer::from_config(&config);
        let coord = ChunkCoord::new(1, 5);
        streamer.on_observer_moved(coord).expect("initial load");

        let fresh = TerrainSynthesizer::new(config.seed, config.dims(), config.generation.clone())
            .generate(coord, Biome::Forest);
        let cached = streamer.cache().get(coord).expect("loaded");
        assert_eq!(cached, &fresh);
        assert!(fresh.layer(Layer::Ground).tiles().contains(&TileId::SurfaceForest));
    }
}
