//! Board: top-level map container for Hexfield.
//!
//! The Board stores only hexes that differ from clear level-0 ground, plus the
//! buildings standing on it, and offers the terrain mutations physical combat
//! needs (building damage and collapse, wreckage).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::building::{Building, BuildingClass, BuildingDamage, BuildingId};
use crate::coords::Coords;
use crate::error::HexfieldError;
use crate::terrain::{Hex, TerrainKind, MAX_ROUGHNESS};

static CLEAR: Hex = Hex::clear();

/// The map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Width in hexes
    width: i32,
    /// Height in hexes
    height: i32,
    /// Non-clear hexes
    #[serde(with = "crate::coord_map")]
    hexes: BTreeMap<Coords, Hex>,
    /// Buildings and fuel tanks
    buildings: BTreeMap<BuildingId, Building>,
    /// Next building id
    next_building_id: u32,
}

impl Board {
    /// Create a clear board.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            hexes: BTreeMap::new(),
            buildings: BTreeMap::new(),
            next_building_id: 1,
        }
    }

    /// Board width.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Board height.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Check if coordinates are on the board.
    #[must_use]
    pub fn contains(&self, coords: Coords) -> bool {
        coords.x >= 0 && coords.y >= 0 && coords.x < self.width && coords.y < self.height
    }

    /// Hex at `coords`; clear ground if nothing was stored.
    #[must_use]
    pub fn hex(&self, coords: Coords) -> &Hex {
        self.hexes.get(&coords).unwrap_or(&CLEAR)
    }

    /// Mutable hex at `coords`, materialising clear ground if needed.
    pub fn hex_mut(&mut self, coords: Coords) -> &mut Hex {
        self.hexes.entry(coords).or_default()
    }

    /// Replace the hex at `coords`.
    pub fn set_hex(&mut self, coords: Coords, hex: Hex) {
        self.hexes.insert(coords, hex);
    }

    /// Stored (non-clear) hexes in sorted order.
    pub fn stored_hexes(&self) -> impl Iterator<Item = (Coords, &Hex)> + '_ {
        self.hexes.iter().map(|(c, h)| (*c, h))
    }

    /// On-board hexes within `radius` of `center`, sorted.
    #[must_use]
    pub fn hexes_within(&self, center: Coords, radius: u32) -> Vec<Coords> {
        // radius is a small hex count
        #[allow(clippy::cast_possible_wrap)]
        let r = radius as i32;
        let mut out = Vec::new();
        for x in (center.x - r)..=(center.x + r) {
            for y in (center.y - r - 1)..=(center.y + r + 1) {
                let c = Coords::new(x, y);
                if self.contains(c) && center.distance(c) <= radius {
                    out.push(c);
                }
            }
        }
        out.sort();
        out
    }

    /// Add a building occupying the given `(coords, height)` hexes.
    pub fn add_building(
        &mut self,
        name: &str,
        class: BuildingClass,
        hexes: &[(Coords, i32)],
    ) -> BuildingId {
        let id = BuildingId::new(self.next_building_id);
        self.next_building_id += 1;

        let feature = if class == BuildingClass::FuelTank {
            TerrainKind::FuelTank
        } else {
            TerrainKind::Building
        };

        let mut building = Building::new(id, name, class);
        for &(coords, height) in hexes {
            building.add_hex(coords, height);
            self.hex_mut(coords).set_feature(feature, height);
        }
        self.buildings.insert(id, building);
        id
    }

    /// Add a fuel tank with the given explosion magnitude.
    pub fn add_fuel_tank(&mut self, name: &str, coords: Coords, height: i32, magnitude: u32) -> BuildingId {
        let id = self.add_building(name, BuildingClass::FuelTank, &[(coords, height)]);
        if let Some(tank) = self.buildings.get_mut(&id) {
            tank.magnitude = magnitude;
        }
        id
    }

    /// Building by id.
    #[must_use]
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Mutable building by id.
    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.get_mut(&id)
    }

    /// All buildings in id order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> + '_ {
        self.buildings.values()
    }

    /// Standing building at `coords`, if any.
    #[must_use]
    pub fn building_at(&self, coords: Coords) -> Option<BuildingId> {
        self.buildings
            .values()
            .find(|b| b.is_standing(coords))
            .map(|b| b.id)
    }

    /// Damage one hex of a building, collapsing it to rubble at zero CF.
    ///
    /// # Errors
    ///
    /// Returns an error if the building is unknown or does not occupy `coords`.
    pub fn damage_building(
        &mut self,
        id: BuildingId,
        coords: Coords,
        amount: u32,
    ) -> Result<BuildingDamage, HexfieldError> {
        let building = self
            .buildings
            .get_mut(&id)
            .ok_or(HexfieldError::UnknownBuilding(id))?;
        let result = building
            .apply_damage(coords, amount)
            .ok_or(HexfieldError::NotInBuilding { building: id, coords })?;

        if result.collapsed {
            debug!(target: "hexfield::board", building = %id, hex = %coords, "building hex collapsed");
            let hex = self.hex_mut(coords);
            hex.remove_feature(TerrainKind::Building);
            hex.remove_feature(TerrainKind::FuelTank);
            hex.set_feature(TerrainKind::Rubble, 1);
        }
        Ok(result)
    }

    /// Pile wreckage into a hex, raising its rough grade by `levels`.
    ///
    /// Returns `true` if the terrain changed. Water, building, fuel tank and
    /// magma hexes are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if `coords` is off the board.
    pub fn add_wreckage(&mut self, coords: Coords, levels: i32) -> Result<bool, HexfieldError> {
        if !self.contains(coords) {
            return Err(HexfieldError::OffBoard(coords));
        }
        if levels <= 0 || !self.hex(coords).accepts_wreckage() {
            return Ok(false);
        }
        let hex = self.hex_mut(coords);
        let before = hex.roughness();
        let after = (before + levels).min(MAX_ROUGHNESS);
        if after == before {
            return Ok(false);
        }
        hex.set_feature(TerrainKind::Rough, after);
        debug!(target: "hexfield::board", hex = %coords, before, after, "wreckage added");
        Ok(true)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(16, 17)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_by_default() {
        let board = Board::new(10, 10);
        assert_eq!(board.hex(Coords::new(3, 3)), &Hex::clear());
        assert!(board.contains(Coords::new(9, 9)));
        assert!(!board.contains(Coords::new(10, 0)));
        assert!(!board.contains(Coords::new(0, -1)));
    }

    #[test]
    fn test_building_lookup() {
        let mut board = Board::new(10, 10);
        let id = board.add_building("Hall", BuildingClass::Light, &[(Coords::new(1, 1), 1)]);
        assert_eq!(board.building_at(Coords::new(1, 1)), Some(id));
        assert_eq!(board.building_at(Coords::new(2, 1)), None);
        assert_eq!(board.hex(Coords::new(1, 1)).feature(TerrainKind::Building), Some(1));
    }

    #[test]
    fn test_collapse_leaves_rubble() {
        let mut board = Board::new(10, 10);
        let c = Coords::new(1, 1);
        let id = board.add_building("Hall", BuildingClass::Light, &[(c, 1)]);
        let dmg = board.damage_building(id, c, 50).unwrap();
        assert!(dmg.collapsed);
        assert!(!board.hex(c).contains(TerrainKind::Building));
        assert!(board.hex(c).contains(TerrainKind::Rubble));
        assert_eq!(board.building_at(c), None);
    }

    #[test]
    fn test_damage_unknown_building() {
        let mut board = Board::new(10, 10);
        let err = board.damage_building(BuildingId::new(99), Coords::new(0, 0), 5);
        assert_eq!(err, Err(HexfieldError::UnknownBuilding(BuildingId::new(99))));
    }

    #[test]
    fn test_wreckage_caps_at_ultra_rough() {
        let mut board = Board::new(10, 10);
        let c = Coords::new(4, 4);
        assert_eq!(board.add_wreckage(c, 1), Ok(true));
        assert_eq!(board.hex(c).roughness(), 1);
        assert_eq!(board.add_wreckage(c, 2), Ok(true));
        assert_eq!(board.hex(c).roughness(), 2);
        assert_eq!(board.add_wreckage(c, 1), Ok(false));
    }

    #[test]
    fn test_wreckage_skips_water() {
        let mut board = Board::new(10, 10);
        let c = Coords::new(4, 4);
        board.set_hex(c, Hex::clear().with_feature(TerrainKind::Water, 1));
        assert_eq!(board.add_wreckage(c, 2), Ok(false));
        assert_eq!(board.add_wreckage(Coords::new(40, 4), 1), Err(HexfieldError::OffBoard(Coords::new(40, 4))));
    }

    #[test]
    fn test_hexes_within() {
        let board = Board::new(10, 10);
        let ring = board.hexes_within(Coords::new(5, 5), 1);
        assert_eq!(ring.len(), 7);
        let corner = board.hexes_within(Coords::new(0, 0), 1);
        assert_eq!(corner.len(), 3);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut board = Board::new(8, 8);
        board.set_hex(Coords::new(2, 2), Hex::with_level(1).with_feature(TerrainKind::Woods, 1));
        board.add_building("Hall", BuildingClass::Heavy, &[(Coords::new(3, 3), 2)]);

        let json = serde_json::to_string(&board).unwrap();
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }
}
