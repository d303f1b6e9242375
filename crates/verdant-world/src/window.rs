//! The active window: a square of chunks around the observer and the
//! presentation buffer that holds their tiles.
//!
//! World chunk coordinates map onto the buffer affinely:
//!
//! ```text
//! buffer_offset(C) = ((C.x - O.x) * W, (C.y - O.y) * H)
//! ```
//!
//! where `O` is the window origin (top-left chunk) and `W`×`H` the chunk size.

use verdant_common::{ChunkCoord, ChunkDims, Layer, TileCoord, TileId};

use crate::chunk::{ChunkData, TileGrid};

/// Square window of `2R+1` chunks per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    /// Top-left chunk
    origin: ChunkCoord,
    /// Chunk radius R
    radius: u32,
    /// Chunk size in tiles
    dims: ChunkDims,
    /// Tile size in pixels
    tile_size: u32,
}

impl ActiveWindow {
    /// Creates a window centred on `observer`.
    #[must_use]
    pub const fn centered_on(
        observer: ChunkCoord,
        radius: u32,
        dims: ChunkDims,
        tile_size: u32,
    ) -> Self {
        Self {
            origin: Self::origin_for(observer, radius),
            radius,
            dims,
            tile_size,
        }
    }

    /// Origin of a window of radius `radius` centred on `observer`.
    #[must_use]
    pub const fn origin_for(observer: ChunkCoord, radius: u32) -> ChunkCoord {
        let r = radius as i32;
        observer.offset(-r, -r)
    }

    /// Returns the window origin (top-left chunk).
    #[must_use]
    pub const fn origin(&self) -> ChunkCoord {
        self.origin
    }

    /// Returns the chunk radius.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Returns the chunk dimensions.
    #[must_use]
    pub const fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// Returns the tile size in pixels.
    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Window side length in chunks.
    #[must_use]
    pub const fn side(&self) -> u32 {
        2 * self.radius + 1
    }

    /// Buffer width in tiles.
    #[must_use]
    pub const fn buffer_width(&self) -> u32 {
        self.side() * self.dims.width
    }

    /// Buffer height in tiles.
    #[must_use]
    pub const fn buffer_height(&self) -> u32 {
        self.side() * self.dims.height
    }

    /// Centre chunk of the window.
    #[must_use]
    pub const fn center(&self) -> ChunkCoord {
        let r = self.radius as i32;
        self.origin.offset(r, r)
    }

    /// Moves the origin so the window is centred on `observer`.
    pub fn recenter(&mut self, observer: ChunkCoord) {
        self.origin = Self::origin_for(observer, self.radius);
    }

    /// Returns true if `coord` lies inside the window.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.relative(coord).is_some()
    }

    /// Buffer tile offset of the chunk's top-left tile, if it is inside the window.
    #[must_use]
    pub fn buffer_offset(&self, coord: ChunkCoord) -> Option<(u32, u32)> {
        self.relative(coord)
            .map(|(rx, ry)| (rx * self.dims.width, ry * self.dims.height))
    }

    /// Buffer cell holding a world tile, if its chunk is inside the window.
    #[must_use]
    pub fn world_tile_to_buffer(&self, tile: TileCoord) -> Option<(u32, u32)> {
        let start = self.origin.to_tile_coord(self.dims);
        let bx = tile.x - start.x;
        let by = tile.y - start.y;
        let in_x = (0..i64::from(self.buffer_width())).contains(&bx);
        let in_y = (0..i64::from(self.buffer_height())).contains(&by);
        (in_x && in_y).then_some((bx as u32, by as u32))
    }

    /// World pixel position of the buffer's top-left corner.
    #[must_use]
    pub fn origin_pixels(&self) -> (i64, i64) {
        let start = self.origin.to_tile_coord(self.dims);
        let size = i64::from(self.tile_size);
        (start.x * size, start.y * size)
    }

    /// Every chunk within Chebyshev distance R of the window centre, centre
    /// first then ring by ring.
    #[must_use]
    pub fn required(&self) -> Vec<ChunkCoord> {
        spiral(self.center(), self.radius)
    }

    fn relative(&self, coord: ChunkCoord) -> Option<(u32, u32)> {
        let dx = i64::from(coord.x) - i64::from(self.origin.x);
        let dy = i64::from(coord.y) - i64::from(self.origin.y);
        let side = i64::from(self.side());
        ((0..side).contains(&dx) && (0..side).contains(&dy)).then_some((dx as u32, dy as u32))
    }
}

/// Chunks of a Chebyshev disk in spiral order from the centre outward.
#[must_use]
pub fn spiral(center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
    let side = 2 * radius as usize + 1;
    let mut result = Vec::with_capacity(side * side);
    result.push(center);

    for ring in 1..=radius as i32 {
        // Top edge (left to right, excluding right corner)
        for x in -ring..ring {
            result.push(center.offset(x, -ring));
        }
        // Right edge (top to bottom, excluding bottom corner)
        for y in -ring..ring {
            result.push(center.offset(ring, y));
        }
        // Bottom edge (right to left, excluding left corner)
        for x in (-ring + 1..=ring).rev() {
            result.push(center.offset(x, ring));
        }
        // Left edge (bottom to top, excluding top corner)
        for y in (-ring + 1..=ring).rev() {
            result.push(center.offset(-ring, y));
        }
    }

    result
}

/// One presentation grid per layer, sized to the whole window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowBuffer {
    layers: [TileGrid; 3],
}

impl WindowBuffer {
    /// Creates an all-`Air` buffer covering `window`.
    #[must_use]
    pub fn new(window: &ActiveWindow) -> Self {
        let (width, height) = (window.buffer_width(), window.buffer_height());
        Self {
            layers: [
                TileGrid::new(width, height),
                TileGrid::new(width, height),
                TileGrid::new(width, height),
            ],
        }
    }

    /// Returns one layer.
    #[must_use]
    pub fn layer(&self, layer: Layer) -> &TileGrid {
        &self.layers[layer.index()]
    }

    /// Returns one layer mutably.
    pub fn layer_mut(&mut self, layer: Layer) -> &mut TileGrid {
        &mut self.layers[layer.index()]
    }

    /// Copies all three layers of a chunk with their top-left at (`x`, `y`).
    pub fn blit_chunk(&mut self, chunk: &ChunkData, x: u32, y: u32) {
        for layer in Layer::ALL {
            self.layer_mut(layer).blit(chunk.layer(layer), x, y);
        }
    }

    /// Sets a rectangle to `Air` in every layer.
    pub fn clear_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        for grid in &mut self.layers {
            grid.fill_rect(x, y, width, height, TileId::Air);
        }
    }

    /// Sets every cell of every layer to `Air`.
    pub fn clear(&mut self) {
        for grid in &mut self.layers {
            grid.fill(TileId::Air);
        }
    }

    /// Moves every layer by (`dx`, `dy`) tiles, exposing `Air`.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        for grid in &mut self.layers {
            grid.translate(dx, dy);
        }
    }
}
