//! Error types for Verdant.

use thiserror::Error;

/// World, chunk and cache errors.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A mutation targeted a chunk that was never generated.
    ///
    /// The presentation layer and the cache have desynchronized.
    #[error("Chunk ({x}, {y}) has not been generated")]
    ChunkNotGenerated {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },

    /// A local tile coordinate fell outside the chunk.
    #[error("Local tile ({x}, {y}) is outside a {width}x{height} chunk")]
    LocalOutOfBounds {
        /// Local X coordinate
        x: u32,
        /// Local Y coordinate
        y: u32,
        /// Chunk width in tiles
        width: u32,
        /// Chunk height in tiles
        height: u32,
    },

    /// Chunk grids do not have the configured dimensions.
    #[error(
        "Malformed chunk data: expected {expected_width}x{expected_height}, got {width}x{height}"
    )]
    MalformedChunk {
        /// Configured chunk width
        expected_width: u32,
        /// Configured chunk height
        expected_height: u32,
        /// Actual grid width
        width: u32,
        /// Actual grid height
        height: u32,
    },

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse errors
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type alias for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
