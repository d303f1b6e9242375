//! Tile grids and per-chunk layered data.

use verdant_common::{ChunkCoord, ChunkDims, Layer, LocalCoord, TileId, WorldError, WorldResult};

/// A row-major 2D grid of tiles, always fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    /// Grid width in tiles
    width: u32,
    /// Grid height in tiles
    height: u32,
    /// Tile data (width × height tiles)
    tiles: Vec<TileId>,
}

impl TileGrid {
    /// Creates a grid filled with `Air`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TileId::Air)
    }

    /// Creates a grid filled with one tile.
    #[must_use]
    pub fn filled(width: u32, height: u32, tile: TileId) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; (width as usize) * (height as usize)],
        }
    }

    /// Returns the grid width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the grid height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns a slice of all tiles.
    #[must_use]
    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    /// Returns true if the signed position lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Gets a tile, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<TileId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get(self.index(x, y)).copied()
    }

    /// Gets a tile at a signed position, or `None` outside the grid.
    #[must_use]
    pub fn get_signed(&self, x: i64, y: i64) -> Option<TileId> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.get(x as u32, y as u32)
    }

    /// Sets a tile. Returns false if the position is outside the grid.
    pub fn set(&mut self, x: u32, y: u32, tile: TileId) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = self.index(x, y);
        if let Some(slot) = self.tiles.get_mut(index) {
            *slot = tile;
            return true;
        }
        false
    }

    /// Overwrites every tile.
    pub fn fill(&mut self, tile: TileId) {
        self.tiles.fill(tile);
    }

    /// Fills a rectangle, clipped to the grid.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, tile: TileId) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        if x >= x_end {
            return;
        }
        for row in y..y_end {
            let start = self.index(x, row);
            let end = start + (x_end - x) as usize;
            self.tiles[start..end].fill(tile);
        }
    }

    /// Copies all of `src` into this grid with its top-left at (`x`, `y`),
    /// clipped to the grid.
    pub fn blit(&mut self, src: &Self, x: u32, y: u32) {
        let x_end = x.saturating_add(src.width).min(self.width);
        let y_end = y.saturating_add(src.height).min(self.height);
        if x >= x_end {
            return;
        }
        let run = (x_end - x) as usize;
        for row in y..y_end {
            let src_start = src.index(0, row - y);
            let dst_start = self.index(x, row);
            self.tiles[dst_start..dst_start + run]
                .copy_from_slice(&src.tiles[src_start..src_start + run]);
        }
    }

    /// Copies a `width`×`height` rectangle from `src_x, src_y` to
    /// `dst_x, dst_y` within this grid. Both rectangles must lie inside the
    /// grid; overlapping rectangles are handled.
    pub fn copy_rect_within(
        &mut self,
        src_x: u32,
        src_y: u32,
        dst_x: u32,
        dst_y: u32,
        width: u32,
        height: u32,
    ) {
        debug_assert!(src_x + width <= self.width && dst_x + width <= self.width);
        debug_assert!(src_y + height <= self.height && dst_y + height <= self.height);
        // Walk rows away from the destination so overlapping copies never
        // read a row that was already overwritten.
        if dst_y > src_y {
            for row in (0..height).rev() {
                self.copy_row(src_x, src_y + row, dst_x, dst_y + row, width);
            }
        } else {
            for row in 0..height {
                self.copy_row(src_x, src_y + row, dst_x, dst_y + row, width);
            }
        }
    }

    /// Moves every tile by (`dx`, `dy`). Tiles pushed past an edge are
    /// dropped; cells uncovered on the opposite edge become `Air`.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        let (width, height) = (i64::from(self.width), i64::from(self.height));
        if dx.abs() >= width || dy.abs() >= height {
            self.fill(TileId::Air);
            return;
        }
        let run_w = (width - dx.abs()) as u32;
        let run_h = (height - dy.abs()) as u32;
        let (src_x, dst_x) = if dx >= 0 { (0, dx as u32) } else { ((-dx) as u32, 0) };
        let (src_y, dst_y) = if dy >= 0 { (0, dy as u32) } else { ((-dy) as u32, 0) };
        self.copy_rect_within(src_x, src_y, dst_x, dst_y, run_w, run_h);

        let (exposed_w, exposed_h) = (dx.unsigned_abs() as u32, dy.unsigned_abs() as u32);
        let exposed_x = if dx >= 0 { 0 } else { run_w };
        let exposed_y = if dy >= 0 { 0 } else { run_h };
        self.fill_rect(exposed_x, 0, exposed_w, self.height, TileId::Air);
        self.fill_rect(0, exposed_y, self.width, exposed_h, TileId::Air);
    }

    fn copy_row(&mut self, src_x: u32, src_y: u32, dst_x: u32, dst_y: u32, width: u32) {
        let src_start = self.index(src_x, src_y);
        let dst_start = self.index(dst_x, dst_y);
        self.tiles
            .copy_within(src_start..src_start + width as usize, dst_start);
    }

    /// Returns the number of non-air tiles.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_air()).count()
    }

    const fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

/// The three generated grids of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkData {
    /// Chunk coordinate
    coord: ChunkCoord,
    /// Ground, underground and tree trunks
    ground: TileGrid,
    /// Low flora at ground level
    low_flora: TileGrid,
    /// Tree canopy
    canopy: TileGrid,
}

impl ChunkData {
    /// Creates a chunk with every layer filled with `Air`.
    #[must_use]
    pub fn new(coord: ChunkCoord, dims: ChunkDims) -> Self {
        Self {
            coord,
            ground: TileGrid::new(dims.width, dims.height),
            low_flora: TileGrid::new(dims.width, dims.height),
            canopy: TileGrid::new(dims.width, dims.height),
        }
    }

    /// Assembles a chunk from prebuilt grids.
    #[must_use]
    pub fn from_layers(
        coord: ChunkCoord,
        ground: TileGrid,
        low_flora: TileGrid,
        canopy: TileGrid,
    ) -> Self {
        Self {
            coord,
            ground,
            low_flora,
            canopy,
        }
    }

    /// Returns the chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Returns one layer.
    #[must_use]
    pub const fn layer(&self, layer: Layer) -> &TileGrid {
        match layer {
            Layer::Ground => &self.ground,
            Layer::LowFlora => &self.low_flora,
            Layer::Canopy => &self.canopy,
        }
    }

    /// Returns one layer mutably.
    pub fn layer_mut(&mut self, layer: Layer) -> &mut TileGrid {
        match layer {
            Layer::Ground => &mut self.ground,
            Layer::LowFlora => &mut self.low_flora,
            Layer::Canopy => &mut self.canopy,
        }
    }

    /// Gets a tile at local coordinates.
    #[must_use]
    pub fn get(&self, layer: Layer, local: LocalCoord) -> Option<TileId> {
        self.layer(layer).get(u32::from(local.x), u32::from(local.y))
    }

    /// Sets a tile at local coordinates.
    pub fn set(&mut self, layer: Layer, local: LocalCoord, tile: TileId) -> WorldResult<()> {
        let grid = self.layer_mut(layer);
        let (width, height) = (grid.width(), grid.height());
        if grid.set(u32::from(local.x), u32::from(local.y), tile) {
            Ok(())
        } else {
            Err(WorldError::LocalOutOfBounds {
                x: u32::from(local.x),
                y: u32::from(local.y),
                width,
                height,
            })
        }
    }

    /// Checks that all three grids have the expected dimensions.
    pub fn validate(&self, dims: ChunkDims) -> WorldResult<()> {
        for layer in Layer::ALL {
            let grid = self.layer(layer);
            if grid.width() != dims.width
                || grid.height() != dims.height
                || grid.tiles().len() != dims.area()
            {
                return Err(WorldError::MalformedChunk {
                    expected_width: dims.width,
                    expected_height: dims.height,
                    width: grid.width(),
                    height: grid.height(),
                });
            }
        }
        Ok(())
    }
}
