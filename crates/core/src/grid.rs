//! Terrain oracle interface and terrain-crossing policy.
//!
//! The dungeon layout, the pursuit **cost** field, and the **scent** recency
//! field are owned by an external floor collaborator; this crate only reads
//! them through [`GridOracle`]. Agent occupancy is deliberately *not* part of
//! the oracle; the population structure is the single writer for that.

use crate::geometry::Position;
use crate::race::RaceTemplate;

/// Canonical terrain classes for dungeon tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feature {
    Floor,
    Rubble,
    Tree,
    Wall,
    /// Closed door. `jam` is the stuck strength; zero means simply closed.
    ClosedDoor { jam: u8 },
    OpenDoor,
    ShallowWater,
    DeepWater,
    Lava,
    /// Protection rune on floor; blocks hostile agents until broken.
    Glyph,
    /// Explosive rune on floor; detonates against intruding agents.
    ExplosiveRune,
}

impl Feature {
    /// Whether the tile blocks line of sight and projection.
    pub fn is_opaque(self) -> bool {
        matches!(self, Feature::Wall | Feature::ClosedDoor { .. } | Feature::Tree)
    }

    /// Whether the tile is solid rock for movement purposes.
    pub fn is_wall(self) -> bool {
        matches!(self, Feature::Wall)
    }

    pub fn is_closed_door(self) -> bool {
        matches!(self, Feature::ClosedDoor { .. })
    }

    pub fn is_water(self) -> bool {
        matches!(self, Feature::ShallowWater | Feature::DeepWater)
    }
}

/// Opaque handle to an item lying on a tile. Item semantics live entirely in
/// the host; the engine only decides whether to invoke the item hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemHandle(pub u32);

/// Read-only view of one dungeon tile.
///
/// `cost` approximates the path distance to the player respecting closed
/// doors; `dist` is the same field ignoring doors (used by door-capable
/// agents and the flee scoring). Both use 0 for "unset/unreachable". `when`
/// is the monotonically increasing scent timestamp of player presence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub feature: Feature,
    pub cost: u16,
    pub dist: u16,
    pub when: u16,
    /// Whether the tile belongs to a lit room (affects group hiding).
    pub in_room: bool,
    pub item: Option<ItemHandle>,
}

impl Tile {
    pub fn floor() -> Self {
        Self {
            feature: Feature::Floor,
            cost: 0,
            dist: 0,
            when: 0,
            in_room: false,
            item: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridDimensions {
    pub height: u32,
    pub width: u32,
}

impl GridDimensions {
    pub const fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.y >= 0
            && position.x >= 0
            && position.y < self.height as i32
            && position.x < self.width as i32
    }
}

/// Static floor oracle exposing terrain and the pursuit/scent fields.
///
/// The fields are recomputed by the external floor-update collaborator and
/// are read-only to the engine.
pub trait GridOracle {
    fn dimensions(&self) -> GridDimensions;

    /// Returns the tile at `position`, or `None` outside the map.
    fn tile(&self, position: Position) -> Option<Tile>;

    fn contains(&self, position: Position) -> bool {
        self.dimensions().contains(position)
    }
}

/// Whether a race can legally occupy the given terrain.
///
/// `riding` marks the player's mount: a ridden agent loses its wall powers
/// unless the rider shares them (`rider_passes_walls`).
pub fn can_cross_terrain(
    feature: Feature,
    race: &RaceTemplate,
    riding: bool,
    rider_passes_walls: bool,
) -> bool {
    let wall_powers = !riding || rider_passes_walls;
    match feature {
        Feature::Wall => wall_powers && (race.can_pass_walls() || race.can_kill_walls()),
        Feature::ClosedDoor { .. } => false,
        Feature::DeepWater => race.is_aquatic() || race.can_fly(),
        Feature::Lava => race.can_fly(),
        Feature::ShallowWater => true,
        Feature::Floor
        | Feature::Rubble
        | Feature::Tree
        | Feature::OpenDoor
        | Feature::Glyph
        | Feature::ExplosiveRune => {
            // Strictly aquatic races cannot leave the water.
            !race.is_aquatic() || race.can_fly()
        }
    }
}
