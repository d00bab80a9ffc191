//! Buildings and fuel tanks.
//!
//! A building spans one or more hexes. Each hex tracks its own construction
//! factor (CF); when it reaches zero that hex collapses.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coords::Coords;

/// Building identifier, unique within a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Create an id from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Construction class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingClass {
    /// Light construction
    Light,
    /// Medium construction
    Medium,
    /// Heavy construction
    Heavy,
    /// Hardened bunker
    Hardened,
    /// Fuel storage tank
    FuelTank,
}

impl BuildingClass {
    /// Starting CF for a hex of this class.
    #[must_use]
    pub const fn default_cf(self) -> u32 {
        match self {
            BuildingClass::Light => 15,
            BuildingClass::Medium => 40,
            BuildingClass::Heavy => 90,
            BuildingClass::Hardened => 120,
            BuildingClass::FuelTank => 10,
        }
    }
}

/// Per-hex building state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingHex {
    /// Current construction factor
    pub cf: u32,
    /// Construction factor at scenario start
    pub initial_cf: u32,
    /// Height in levels above the hex
    pub height: i32,
    /// Whether this hex has collapsed
    pub collapsed: bool,
}

/// Outcome of damaging one building hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingDamage {
    /// CF before the damage
    pub old_cf: u32,
    /// CF after the damage
    pub new_cf: u32,
    /// The hex collapsed as a result of this damage
    pub collapsed: bool,
}

/// A building on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Identifier
    pub id: BuildingId,
    /// Display name
    pub name: String,
    /// Construction class
    pub class: BuildingClass,
    /// Occupied hexes
    #[serde(with = "crate::coord_map")]
    hexes: BTreeMap<Coords, BuildingHex>,
    /// Explosion damage for fuel tanks
    pub magnitude: u32,
    /// Demolition charges laid by infantry
    pub explosives: u32,
}

impl Building {
    /// Create an empty building.
    #[must_use]
    pub fn new(id: BuildingId, name: impl Into<String>, class: BuildingClass) -> Self {
        Self {
            id,
            name: name.into(),
            class,
            hexes: BTreeMap::new(),
            magnitude: 0,
            explosives: 0,
        }
    }

    /// Add a hex at the class's default CF.
    pub fn add_hex(&mut self, coords: Coords, height: i32) {
        let cf = self.class.default_cf();
        self.hexes.insert(
            coords,
            BuildingHex {
                cf,
                initial_cf: cf,
                height,
                collapsed: false,
            },
        );
    }

    /// Hex state at `coords`.
    #[must_use]
    pub fn hex(&self, coords: Coords) -> Option<&BuildingHex> {
        self.hexes.get(&coords)
    }

    /// Occupied coordinates in sorted order.
    pub fn coords(&self) -> impl Iterator<Item = Coords> + '_ {
        self.hexes.keys().copied()
    }

    /// Current CF at `coords` (0 if not part of this building).
    #[must_use]
    pub fn cf(&self, coords: Coords) -> u32 {
        self.hex(coords).map_or(0, |h| h.cf)
    }

    /// Whether the hex at `coords` is still standing.
    #[must_use]
    pub fn is_standing(&self, coords: Coords) -> bool {
        self.hex(coords).is_some_and(|h| !h.collapsed)
    }

    /// Whether every hex has collapsed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.hexes.values().all(|h| h.collapsed)
    }

    /// Damage the building can soak for its occupants at `coords`.
    #[must_use]
    pub fn absorption(&self, coords: Coords) -> u32 {
        self.cf(coords).div_ceil(10)
    }

    /// Scale applied to damage that passes through the building.
    #[must_use]
    pub fn damage_scale(&self) -> f32 {
        match self.class {
            BuildingClass::Hardened => 0.5,
            _ => 1.0,
        }
    }

    /// Whether this is a fuel tank.
    #[must_use]
    pub fn is_fuel_tank(&self) -> bool {
        self.class == BuildingClass::FuelTank
    }

    /// Reduce CF at `coords`, returning `None` if the hex is not part of the building.
    pub fn apply_damage(&mut self, coords: Coords, amount: u32) -> Option<BuildingDamage> {
        let hex = self.hexes.get_mut(&coords)?;
        let old_cf = hex.cf;
        hex.cf = hex.cf.saturating_sub(amount);
        let collapsed = !hex.collapsed && hex.cf == 0 && old_cf > 0;
        if collapsed {
            hex.collapsed = true;
        }
        Some(BuildingDamage {
            old_cf,
            new_cf: hex.cf,
            collapsed,
        })
    }
}
