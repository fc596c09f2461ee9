//! Grid coordinates and the keypad direction encoding.
//!
//! Directions use the classic numeric-keypad encoding: 8 is north (toward
//! smaller `y`), 2 is south, 4 west, 6 east, with the diagonals on the
//! corners. Code 5 is special: it means "pick a uniformly random step" and
//! is resolved by the movement executor, not here.

use core::fmt;

/// Discrete grid position expressed in tile coordinates.
///
/// `y` grows southward (down the map), `x` grows eastward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub y: i32,
    pub x: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { y: 0, x: 0 };

    pub const fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }

    /// Position one step away in the given direction.
    pub fn step(self, dir: Dir) -> Self {
        let (dy, dx) = dir.delta();
        Self::new(self.y + dy, self.x + dx)
    }

    /// Position displaced by a raw `(dy, dx)` offset.
    pub fn offset(self, dy: i32, dx: i32) -> Self {
        Self::new(self.y + dy, self.x + dx)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.y, self.x)
    }
}

/// A movement direction in keypad encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Dir {
    SouthWest = 1,
    South = 2,
    SouthEast = 3,
    West = 4,
    /// "Pick one of the eight at random"; resolved at execution time.
    Random = 5,
    East = 6,
    NorthWest = 7,
    North = 8,
    NorthEast = 9,
}

impl Dir {
    /// Decodes a keypad code (1..=9, excluding nonsensical 0).
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Dir::SouthWest,
            2 => Dir::South,
            3 => Dir::SouthEast,
            4 => Dir::West,
            5 => Dir::Random,
            6 => Dir::East,
            7 => Dir::NorthWest,
            8 => Dir::North,
            9 => Dir::NorthEast,
            _ => return None,
        })
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The `(dy, dx)` displacement of one step. [`Dir::Random`] is zero.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Dir::SouthWest => (1, -1),
            Dir::South => (1, 0),
            Dir::SouthEast => (1, 1),
            Dir::West => (0, -1),
            Dir::Random => (0, 0),
            Dir::East => (0, 1),
            Dir::NorthWest => (-1, -1),
            Dir::North => (-1, 0),
            Dir::NorthEast => (-1, 1),
        }
    }
}

/// The eight concrete step directions in the fixed scan order used by every
/// neighbor sweep: S, N, E, W, SE, SW, NE, NW.
///
/// Several scans iterate this table from index 7 down to 0 and keep the last
/// equal-best candidate, which gives ties a fixed directional bias. That
/// bias is inherited behavior and is preserved deliberately.
pub const SCAN_DIRS: [Dir; 8] = [
    Dir::South,
    Dir::North,
    Dir::East,
    Dir::West,
    Dir::SouthEast,
    Dir::SouthWest,
    Dir::NorthEast,
    Dir::NorthWest,
];

/// Approximate grid distance: the longer axis delta plus half the shorter.
///
/// This is the simulation's canonical distance metric; it deliberately
/// over-weights straight lines the same way the pursuit cost field does.
pub fn distance(a: Position, b: Position) -> i32 {
    let dy = (a.y - b.y).abs();
    let dx = (a.x - b.x).abs();
    if dy > dx { dy + (dx >> 1) } else { dx + (dy >> 1) }
}
