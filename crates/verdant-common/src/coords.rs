//! Coordinate types for chunk, world tile, and local tile positions.
//!
//! Chunks are rectangular (`ChunkDims`), so every conversion takes the
//! chunk dimensions explicitly. Y grows downward.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Size of a chunk in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkDims {
    /// Chunk width in tiles
    pub width: u32,
    /// Chunk height in tiles
    pub height: u32,
}

impl ChunkDims {
    /// Creates new chunk dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of tiles in one chunk layer.
    #[must_use]
    pub const fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Returns true if the local coordinate lies inside a chunk.
    #[must_use]
    pub const fn contains(self, local: LocalCoord) -> bool {
        (local.x as u32) < self.width && (local.y as u32) < self.height
    }
}

/// World coordinate in tiles (global tile position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct TileCoord {
    /// X coordinate in tile space
    pub x: i64,
    /// Y coordinate in tile space
    pub y: i64,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Converts a pixel position to the tile containing it.
    #[must_use]
    pub fn from_pixels(px: f64, py: f64, tile_size: u32) -> Self {
        let size = f64::from(tile_size);
        Self {
            x: (px / size).floor() as i64,
            y: (py / size).floor() as i64,
        }
    }

    /// Converts to the chunk that owns this tile.
    #[must_use]
    pub const fn to_chunk_coord(self, dims: ChunkDims) -> ChunkCoord {
        ChunkCoord {
            x: self.x.div_euclid(dims.width as i64) as i32,
            y: self.y.div_euclid(dims.height as i64) as i32,
        }
    }

    /// Converts to the local coordinate within the owning chunk.
    #[must_use]
    pub const fn to_local_coord(self, dims: ChunkDims) -> LocalCoord {
        LocalCoord {
            x: self.x.rem_euclid(dims.width as i64) as u16,
            y: self.y.rem_euclid(dims.height as i64) as u16,
        }
    }

    /// Splits into owning chunk and local offset.
    #[must_use]
    pub const fn decompose(self, dims: ChunkDims) -> (ChunkCoord, LocalCoord) {
        (self.to_chunk_coord(dims), self.to_local_coord(dims))
    }

    /// Euclidean distance to another tile, in tiles.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Pod,
    Zeroable,
)]
#[repr(C)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a pixel position to the chunk containing it.
    #[must_use]
    pub fn from_pixels(px: f64, py: f64, dims: ChunkDims, tile_size: u32) -> Self {
        TileCoord::from_pixels(px, py, tile_size).to_chunk_coord(dims)
    }

    /// Returns the global tile coordinate of the chunk's top-left tile.
    #[must_use]
    pub const fn to_tile_coord(self, dims: ChunkDims) -> TileCoord {
        TileCoord {
            x: (self.x as i64) * (dims.width as i64),
            y: (self.y as i64) * (dims.height as i64),
        }
    }

    /// Recombines a local offset within this chunk into a global tile coordinate.
    #[must_use]
    pub const fn tile_at(self, local: LocalCoord, dims: ChunkDims) -> TileCoord {
        let origin = self.to_tile_coord(dims);
        TileCoord {
            x: origin.x + local.x as i64,
            y: origin.y + local.y as i64,
        }
    }

    /// Component-wise offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev (king-move) distance to another chunk.
    #[must_use]
    pub const fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy {
            dx
        } else {
            dy
        }
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Local coordinate within a chunk (0 to width-1, 0 to height-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct LocalCoord {
    /// X coordinate within chunk
    pub x: u16,
    /// Y coordinate within chunk
    pub y: u16,
}

impl LocalCoord {
    /// Creates a new local coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Converts to linear index for row-major array access.
    #[must_use]
    pub const fn to_index(self, dims: ChunkDims) -> usize {
        (self.y as usize) * (dims.width as usize) + (self.x as usize)
    }

    /// Creates from linear index.
    #[must_use]
    pub const fn from_index(index: usize, dims: ChunkDims) -> Self {
        let width = dims.width as usize;
        Self {
            x: (index % width) as u16,
            y: (index / width) as u16,
        }
    }
}
