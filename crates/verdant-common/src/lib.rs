//! # Verdant Common
//!
//! Common types shared across Verdant crates:
//! - Coordinate types (chunk, world tile, local tile)
//! - Tile, layer, biome and resource enumerations
//! - Common error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod tile;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::tile::*;
}

pub use prelude::*;
