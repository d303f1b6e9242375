//! Tile kinds, layers, biomes and resource kinds.

use serde::{Deserialize, Serialize};

/// Which of the three per-chunk grids a tile lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Rock, soil, surface and tree trunks
    Ground,
    /// Grasses, mushrooms, bushes and ferns sitting at ground level
    LowFlora,
    /// Tree foliage above the ground
    Canopy,
}

impl Layer {
    /// All layers, in storage order.
    pub const ALL: [Self; 3] = [Self::Ground, Self::LowFlora, Self::Canopy];

    /// Resolution order used when mining without a layer hint.
    pub const MINING_PRIORITY: [Self; 3] = [Self::Canopy, Self::LowFlora, Self::Ground];

    /// Stable index of this layer.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Ground => 0,
            Self::LowFlora => 1,
            Self::Canopy => 2,
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ground => "ground",
            Self::LowFlora => "low_flora",
            Self::Canopy => "canopy",
        };
        f.write_str(name)
    }
}

/// A terrain, flora or structure kind.
///
/// `Air` is the reserved empty value; every grid cell that holds nothing
/// holds `Air`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileId {
    /// Empty, passable
    #[default]
    Air = 0,
    /// Forest surface (grass topsoil)
    SurfaceForest,
    /// Forest shallow underground (dirt)
    UndergroundForest,
    /// Desert surface (sand)
    SurfaceDesert,
    /// Desert shallow underground (sandstone)
    UndergroundDesert,
    /// Deep stone below every biome
    DeepStone,
    /// Tree trunk segment
    TreeTrunk,
    /// Tree foliage
    TreeFoliage,
    /// Dark green bush body
    BushCoreGreen,
    /// Light green bush body
    BushCoreLightGreen,
    /// Bush branch poking out to the left
    BushBranchLeft,
    /// Bush branch poking out to the right
    BushBranchRight,
    /// Red flower accent on a bush
    BushFlowerRed,
    /// Yellow flower accent on a bush
    BushFlowerYellow,
    /// Standalone red flower
    FlowerRed,
    /// Standalone yellow flower
    FlowerYellow,
    /// Fern base
    FernBase,
    /// Fern frond leaning left
    FernFrondLeft,
    /// Fern frond leaning right
    FernFrondRight,
    /// Red mushroom cap
    MushroomRedCap,
    /// Brown mushroom cap
    MushroomBrownCap,
    /// Mushroom stem
    MushroomStem,
    /// Tall grass base
    TallGrassBase,
    /// Tall grass top
    TallGrassTop,
}

impl TileId {
    /// Returns true for the empty tile.
    #[must_use]
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Air)
    }

    /// The layer this kind of tile is stored in. `Air` reports `Ground`.
    #[must_use]
    pub const fn layer(self) -> Layer {
        match self {
            Self::Air
            | Self::SurfaceForest
            | Self::UndergroundForest
            | Self::SurfaceDesert
            | Self::UndergroundDesert
            | Self::DeepStone
            | Self::TreeTrunk => Layer::Ground,
            Self::TreeFoliage => Layer::Canopy,
            Self::BushCoreGreen
            | Self::BushCoreLightGreen
            | Self::BushBranchLeft
            | Self::BushBranchRight
            | Self::BushFlowerRed
            | Self::BushFlowerYellow
            | Self::FlowerRed
            | Self::FlowerYellow
            | Self::FernBase
            | Self::FernFrondLeft
            | Self::FernFrondRight
            | Self::MushroomRedCap
            | Self::MushroomBrownCap
            | Self::MushroomStem
            | Self::TallGrassBase
            | Self::TallGrassTop => Layer::LowFlora,
        }
    }

    /// Returns true for biome surface tiles.
    #[must_use]
    pub const fn is_surface(self) -> bool {
        matches!(self, Self::SurfaceForest | Self::SurfaceDesert)
    }

    /// Ground tiles flora may sit on or overlap: air, trunks and surface.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Air | Self::TreeTrunk) || self.is_surface()
    }

    /// Returns true if a ground tile of this kind blocks movement.
    #[must_use]
    pub const fn collides(self) -> bool {
        !matches!(self, Self::Air | Self::TreeFoliage)
    }
}

/// A generation profile selecting tile kinds and flora rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    /// Grass surface, dirt, trees and undergrowth
    #[default]
    Forest,
    /// Sand surface, sandstone, no flora
    Desert,
}

impl Biome {
    /// Tile placed on the surface row.
    #[must_use]
    pub const fn surface_tile(self) -> TileId {
        match self {
            Self::Forest => TileId::SurfaceForest,
            Self::Desert => TileId::SurfaceDesert,
        }
    }

    /// Tile placed in the shallow band below the surface.
    #[must_use]
    pub const fn shallow_tile(self) -> TileId {
        match self {
            Self::Forest => TileId::UndergroundForest,
            Self::Desert => TileId::UndergroundDesert,
        }
    }

    /// Tile placed below the shallow band.
    #[must_use]
    pub const fn deep_tile(self) -> TileId {
        TileId::DeepStone
    }

    /// Whether the flora passes run for this biome.
    #[must_use]
    pub const fn has_flora(self) -> bool {
        matches!(self, Self::Forest)
    }
}

/// Resource category produced by mining a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Wood
    Wood,
    /// Stone
    Stone,
    /// Dirt
    Dirt,
    /// Sand
    Sand,
    /// Leaves
    Leaves,
    /// Red petals
    RedPetals,
    /// Yellow petals
    YellowPetals,
    /// Plant fibres
    PlantFibers,
    /// Red mushroom
    RedMushroom,
    /// Brown mushroom
    BrownMushroom,
    /// Grass blades
    GrassBlades,
}
