//! # Hexfield
//!
//! Hex-grid battlefield substrate for Hexbrawl's physical combat resolution.
//!
//! Hexfield represents the map as a sparse set of hexes with terrain features,
//! plus the buildings and fuel tanks standing on them. This enables:
//!
//! - **Hex arithmetic**: Offset coordinates, neighbours, distances, directions
//! - **Efficient memory**: Sparse storage means clear level-0 ground costs nothing
//! - **Terrain rules**: Movement-mode prohibitions and wreckage mutation
//! - **Structures**: Construction factor, absorption and collapse per building hex
//!
//! ## Quick Start
//!
//! ```
//! use hexfield::{Board, BuildingClass, Coords, Direction, TerrainKind};
//!
//! let mut board = Board::new(16, 17);
//!
//! // A two-hex medium building
//! let bldg = board.add_building(
//!     "Depot",
//!     BuildingClass::Medium,
//!     &[(Coords::new(4, 4), 2), (Coords::new(5, 4), 2)],
//! );
//!
//! assert_eq!(board.building_at(Coords::new(5, 4)), Some(bldg));
//! assert!(board.hex(Coords::new(4, 4)).contains(TerrainKind::Building));
//!
//! // Neighbour arithmetic
//! let north = Coords::new(4, 4).translated(Direction::North);
//! assert_eq!(north, Coords::new(4, 3));
//! assert_eq!(Coords::new(4, 4).distance(north), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod board;
pub mod building;
pub mod coord_map;
pub mod coords;
pub mod error;
pub mod hash;
pub mod terrain;

// Re-exports for convenience
pub use board::Board;
pub use building::{Building, BuildingClass, BuildingDamage, BuildingHex, BuildingId};
pub use coords::{Coords, Direction};
pub use error::HexfieldError;
pub use hash::hash_board;
pub use terrain::{Hex, MovementMode, TerrainKind};
