//! Hex coordinates and facings.
//!
//! The map uses flat-topped hexes addressed by `(x, y)` offset coordinates,
//! with odd columns sitting half a hex lower than even ones. Arithmetic is done
//! in axial space (`glam::IVec2`), and direction estimates between distant hexes
//! use hex-centre positions (`glam::Vec2`).

use std::fmt;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// One of the six hexside directions, clockwise from north.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Direction {
    /// Straight up the map
    #[default]
    North = 0,
    /// Upper right hexside
    NorthEast = 1,
    /// Lower right hexside
    SouthEast = 2,
    /// Straight down the map
    South = 3,
    /// Lower left hexside
    SouthWest = 4,
    /// Upper left hexside
    NorthWest = 5,
}

impl Direction {
    /// All directions in clockwise order.
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Index of this direction (0-5).
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Direction for an arbitrary index, wrapping modulo 6.
    #[must_use]
    pub fn from_index(index: i32) -> Self {
        // rem_euclid keeps the index in 0..6
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let i = index.rem_euclid(6) as usize;
        Self::ALL[i]
    }

    /// Rotate clockwise by `steps` hexsides (negative steps rotate counter-clockwise).
    #[must_use]
    pub fn rotate(self, steps: i32) -> Self {
        Self::from_index(i32::from(self.index()) + steps)
    }

    /// The direction pointing the other way.
    #[must_use]
    pub fn opposite(self) -> Self {
        self.rotate(3)
    }

    /// Clockwise hexside count from `self` to `other` (0-5).
    #[must_use]
    pub fn relative_to(self, other: Direction) -> u8 {
        // Always in 0..6
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let rel = (i32::from(other.index()) - i32::from(self.index())).rem_euclid(6) as u8;
        rel
    }

    /// Axial offset of the neighbouring hex in this direction.
    const fn axial_delta(self) -> IVec2 {
        match self {
            Direction::North => IVec2::new(0, -1),
            Direction::NorthEast => IVec2::new(1, -1),
            Direction::SouthEast => IVec2::new(1, 0),
            Direction::South => IVec2::new(0, 1),
            Direction::SouthWest => IVec2::new(-1, 1),
            Direction::NorthWest => IVec2::new(-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "N",
            Direction::NorthEast => "NE",
            Direction::SouthEast => "SE",
            Direction::South => "S",
            Direction::SouthWest => "SW",
            Direction::NorthWest => "NW",
        };
        write!(f, "{name}")
    }
}

/// Offset hex coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Coords {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Coords {
    /// Create coordinates from column and row.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert to axial `(q, r)` coordinates.
    #[must_use]
    pub fn to_axial(self) -> IVec2 {
        IVec2::new(self.x, self.y - (self.x - (self.x & 1)) / 2)
    }

    /// Convert from axial `(q, r)` coordinates.
    #[must_use]
    pub fn from_axial(axial: IVec2) -> Self {
        let x = axial.x;
        Self::new(x, axial.y + (x - (x & 1)) / 2)
    }

    /// The neighbouring hex in the given direction.
    #[must_use]
    pub fn translated(self, dir: Direction) -> Self {
        Self::from_axial(self.to_axial() + dir.axial_delta())
    }

    /// All six neighbours in clockwise order starting north.
    #[must_use]
    pub fn neighbors(self) -> [Coords; 6] {
        Direction::ALL.map(|d| self.translated(d))
    }

    /// Hex distance between two coordinates.
    #[must_use]
    pub fn distance(self, other: Coords) -> u32 {
        let d = self.to_axial() - other.to_axial();
        let s = -d.x - d.y;
        d.x.unsigned_abs().max(d.y.unsigned_abs()).max(s.unsigned_abs())
    }

    /// Whether two hexes share a hexside.
    #[must_use]
    pub fn is_adjacent(self, other: Coords) -> bool {
        self.distance(other) == 1
    }

    /// Centre of this hex in map space (unit hex radius, y grows southward).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(self) -> Vec2 {
        let a = self.to_axial();
        let q = a.x as f32;
        let r = a.y as f32;
        Vec2::new(1.5 * q, 3f32.sqrt() * (r + q / 2.0))
    }

    /// Nearest hexside direction from this hex towards `other`.
    ///
    /// Returns `None` when both coordinates are the same hex.
    #[must_use]
    pub fn direction_to(self, other: Coords) -> Option<Direction> {
        if self == other {
            return None;
        }
        if let Some(dir) = Direction::ALL.iter().find(|d| self.translated(**d) == other) {
            return Some(*dir);
        }
        let v = other.center() - self.center();
        // Clockwise bearing from north; map y grows southward
        let bearing = v.x.atan2(-v.y).to_degrees().rem_euclid(360.0);
        #[allow(clippy::cast_possible_truncation)]
        let sector = ((bearing + 30.0) / 60.0).floor() as i32;
        Some(Direction::from_index(sector))
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Board labels are 1-based, column then row
        write!(f, "{:02}{:02}", self.x + 1, self.y + 1)
    }
}
