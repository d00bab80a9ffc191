//! State hashing for determinism verification.
//!
//! Two boards that went through the same mutations must produce identical
//! hashes. Replays use this to check that terrain damage was reproduced.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::building::Building;
use crate::Board;

/// Compute a deterministic hash of board state.
///
/// This hash includes:
/// - Board dimensions
/// - Every stored hex with its features
/// - Every building hex's CF and collapse state, plus laid explosives
#[must_use]
pub fn hash_board(board: &Board) -> u64 {
    let mut hasher = DefaultHasher::new();

    board.width().hash(&mut hasher);
    board.height().hash(&mut hasher);

    // BTreeMap iteration is sorted, so traversal order is stable
    for (coords, hex) in board.stored_hexes() {
        coords.hash(&mut hasher);
        hex.level.hash(&mut hasher);
        for (kind, level) in hex.features() {
            kind.hash(&mut hasher);
            level.hash(&mut hasher);
        }
    }

    for building in board.buildings() {
        hash_building(building, &mut hasher);
    }

    hasher.finish()
}

fn hash_building<H: Hasher>(building: &Building, hasher: &mut H) {
    building.id.hash(hasher);
    building.explosives.hash(hasher);
    for coords in building.coords() {
        coords.hash(hasher);
        if let Some(hex) = building.hex(coords) {
            hex.cf.hash(hasher);
            hex.collapsed.hash(hasher);
        }
    }
}
