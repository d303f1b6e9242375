//! World configuration.
//!
//! Loaded from `verdant.toml` when present; every field has a default so a
//! partial file is fine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use verdant_common::{Biome, ChunkCoord, ChunkDims, ConfigError};

use crate::generation::{GenerationParams, DEFAULT_CHUNK_HEIGHT, DEFAULT_CHUNK_WIDTH};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "verdant.toml";

/// How the window buffer follows an origin shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadStrategy {
    /// Clear the buffer and reload every chunk of the new window.
    FullReload,
    /// Move surviving chunk regions, then load only newly exposed chunks.
    #[default]
    Shift,
}

/// World and streaming configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed.
    pub seed: u32,
    /// Biome used for every chunk.
    pub biome: Biome,
    /// Chunk width in tiles.
    pub chunk_width: u32,
    /// Chunk height in tiles.
    pub chunk_height: u32,
    /// Tile size in pixels.
    pub tile_size: u32,
    /// Chunks kept loaded on each side of the observer.
    pub load_radius: u32,
    /// Buffer update strategy on origin shift.
    pub reload_strategy: ReloadStrategy,
    /// Pristine cache entries beyond this chunk radius are dropped.
    /// `None` keeps everything.
    pub cache_retention_radius: Option<u32>,
    /// Mining reach in tiles.
    pub max_interaction_distance: f64,
    /// Chunk column the observer starts in.
    pub start_chunk_x: i32,
    /// Terrain generation parameters.
    pub generation: GenerationParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            biome: Biome::Forest,
            chunk_width: DEFAULT_CHUNK_WIDTH,
            chunk_height: DEFAULT_CHUNK_HEIGHT,
            tile_size: 32,
            load_radius: 2,
            reload_strategy: ReloadStrategy::Shift,
            cache_retention_radius: None,
            max_interaction_distance: 5.0,
            start_chunk_x: 50,
            generation: GenerationParams::default(),
        }
    }
}

impl WorldConfig {
    /// Loads configuration from a file, falling back to defaults when the
    /// file is missing or unreadable.
    #[must_use]
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Writes the configuration as pretty TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialized.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamps values to workable ranges.
    pub fn validate(&mut self) {
        self.chunk_width = self.chunk_width.clamp(4, 256);
        self.chunk_height = self.chunk_height.clamp(16, 256);
        self.tile_size = self.tile_size.clamp(1, 256);
        self.load_radius = self.load_radius.clamp(1, 8);
        self.max_interaction_distance = self.max_interaction_distance.clamp(1.0, 64.0);

        if let Some(radius) = self.cache_retention_radius {
            if radius <= self.load_radius {
                warn!(
                    "cache_retention_radius {} must exceed load_radius {}, using {}",
                    radius,
                    self.load_radius,
                    self.load_radius + 1
                );
                self.cache_retention_radius = Some(self.load_radius + 1);
            }
        }

        let flora = &mut self.generation.flora;
        flora.tree_min_height = flora.tree_min_height.clamp(1, 16);
        flora.tree_max_height = flora.tree_max_height.clamp(flora.tree_min_height, 16);
        flora.bush_branch_chance = flora.bush_branch_chance.clamp(0.0, 1.0);
        flora.bush_flower_chance = flora.bush_flower_chance.clamp(0.0, 1.0);

        self.generation.surface_noise_scale = self.generation.surface_noise_scale.max(1.0);
        self.generation.cave_noise_scale = self.generation.cave_noise_scale.max(1.0);
        self.generation.surface_depth = self.generation.surface_depth.max(0);
    }

    /// Chunk dimensions.
    #[must_use]
    pub const fn dims(&self) -> ChunkDims {
        ChunkDims::new(self.chunk_width, self.chunk_height)
    }

    /// The chunk the observer starts in.
    #[must_use]
    pub const fn start_chunk(&self) -> ChunkCoord {
        ChunkCoord::new(self.start_chunk_x, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.dims(), ChunkDims::new(32, 60));
        assert_eq!(config.load_radius, 2);
        assert_eq!(config.tile_size, 32);
        assert_eq!(config.start_chunk(), ChunkCoord::new(50, 0));
        assert_eq!(config.reload_strategy, ReloadStrategy::Shift);
        assert!(config.cache_retention_radius.is_none());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = WorldConfig {
            seed: 9,
            biome: Biome::Desert,
            reload_strategy: ReloadStrategy::FullReload,
            cache_retention_radius: Some(6),
            ..WorldConfig::default()
        };
        config.save_to(&path).expect("save config");

        assert_eq!(WorldConfig::load_from(&path), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "seed = 77\nreload_strategy = \"full_reload\"\n").expect("write");

        let config = WorldConfig::load_from(&path);
        assert_eq!(config.seed, 77);
        assert_eq!(config.reload_strategy, ReloadStrategy::FullReload);
        assert_eq!(config.load_radius, 2);
        assert_eq!(config.generation, GenerationParams::default());
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "seed = \"not a number\"").expect("write");
        assert_eq!(WorldConfig::load_from(&path), WorldConfig::default());

        let missing = dir.path().join("missing.toml");
        assert_eq!(WorldConfig::load_from(missing), WorldConfig::default());
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = WorldConfig {
            load_radius: 0,
            cache_retention_radius: Some(1),
            max_interaction_distance: 0.0,
            ..WorldConfig::default()
        };
        config.generation.flora.tree_min_height = 9;
        config.generation.flora.tree_max_height = 3;
        config.validate();

        assert_eq!(config.load_radius, 1);
        assert_eq!(config.cache_retention_radius, Some(2));
        assert!((config.max_interaction_distance - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.generation.flora.tree_max_height, 9);
    }
}
