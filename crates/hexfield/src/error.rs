//! Board errors.

use thiserror::Error;

use crate::building::BuildingId;
use crate::coords::Coords;

/// Errors from board mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexfieldError {
    /// Coordinates lie outside the board.
    #[error("coordinates {0} are off the board")]
    OffBoard(Coords),

    /// No building with this id.
    #[error("unknown building {0}")]
    UnknownBuilding(BuildingId),

    /// Building does not occupy the hex.
    #[error("building {building} does not occupy hex {coords}")]
    NotInBuilding {
        /// The building
        building: BuildingId,
        /// The hex
        coords: Coords,
    },
}
