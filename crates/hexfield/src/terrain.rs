//! Terrain features and hexes.
//!
//! A hex has a base level and a set of terrain features, each with its own
//! level (woods density, water depth, building height, rough grade).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Terrain feature identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TerrainKind {
    /// Woods; level 1 light, 2 heavy, 3 ultra-heavy
    Woods = 0,
    /// Rough ground; level 1 rough, 2 ultra-rough
    Rough = 1,
    /// Rubble from collapsed structures
    Rubble = 2,
    /// Water; level is depth
    Water = 3,
    /// Paved surface
    Pavement = 4,
    /// Road
    Road = 5,
    /// Standing building; level is height above the hex
    Building = 6,
    /// Fuel tank; level is height above the hex
    FuelTank = 7,
    /// Magma crust or liquid
    Magma = 8,
}

/// Maximum rough grade (ultra-rough).
pub const MAX_ROUGHNESS: i32 = 2;

/// How a unit moves across terrain.
///
/// Used both for terrain prohibition checks and for transport escape odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementMode {
    /// Two-legged mech
    #[default]
    Biped,
    /// Four-legged mech
    Quad,
    /// Tracked vehicle
    Tracked,
    /// Wheeled vehicle
    Wheeled,
    /// Hovercraft
    Hover,
    /// Rotorcraft
    Vtol,
    /// Surface naval vessel
    Naval,
    /// Foot infantry
    Leg,
    /// Jump infantry or battle armor
    Jump,
    /// Winged aerospace craft
    Aerodyne,
    /// Spheroid aerospace craft
    Spheroid,
}

impl MovementMode {
    /// Whether this mode belongs to a walking mech.
    #[must_use]
    pub fn is_mech(self) -> bool {
        matches!(self, MovementMode::Biped | MovementMode::Quad)
    }

    /// Whether this mode belongs to an aerospace craft.
    #[must_use]
    pub fn is_aerospace(self) -> bool {
        matches!(self, MovementMode::Aerodyne | MovementMode::Spheroid)
    }
}

/// A single map hex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    /// Ground level of the hex
    pub level: i32,
    /// Terrain features present, with their levels
    features: BTreeMap<TerrainKind, i32>,
}

impl Hex {
    /// Clear ground at level 0.
    #[must_use]
    pub const fn clear() -> Self {
        Self {
            level: 0,
            features: BTreeMap::new(),
        }
    }

    /// Create a hex at the given ground level.
    #[must_use]
    pub const fn with_level(level: i32) -> Self {
        Self {
            level,
            features: BTreeMap::new(),
        }
    }

    /// Builder: add a feature.
    #[must_use]
    pub fn with_feature(mut self, kind: TerrainKind, level: i32) -> Self {
        self.features.insert(kind, level);
        self
    }

    /// Level of a feature, if present.
    #[must_use]
    pub fn feature(&self, kind: TerrainKind) -> Option<i32> {
        self.features.get(&kind).copied()
    }

    /// Whether a feature is present.
    #[must_use]
    pub fn contains(&self, kind: TerrainKind) -> bool {
        self.features.contains_key(&kind)
    }

    /// Set or replace a feature.
    pub fn set_feature(&mut self, kind: TerrainKind, level: i32) {
        self.features.insert(kind, level);
    }

    /// Remove a feature, returning its level.
    pub fn remove_feature(&mut self, kind: TerrainKind) -> Option<i32> {
        self.features.remove(&kind)
    }

    /// Iterate features in a stable order.
    pub fn features(&self) -> impl Iterator<Item = (TerrainKind, i32)> + '_ {
        self.features.iter().map(|(k, v)| (*k, *v))
    }

    /// Water depth (0 when dry).
    #[must_use]
    pub fn depth(&self) -> i32 {
        self.feature(TerrainKind::Water).unwrap_or(0)
    }

    /// Rough grade (0 when smooth).
    #[must_use]
    pub fn roughness(&self) -> i32 {
        self.feature(TerrainKind::Rough).unwrap_or(0)
    }

    /// Whether wreckage can pile up here.
    #[must_use]
    pub fn accepts_wreckage(&self) -> bool {
        !(self.contains(TerrainKind::Water)
            || self.contains(TerrainKind::Building)
            || self.contains(TerrainKind::FuelTank)
            || self.contains(TerrainKind::Magma))
    }

    /// Whether a unit using `mode` may not occupy this hex.
    #[must_use]
    pub fn is_prohibited(&self, mode: MovementMode) -> bool {
        let standing = self.contains(TerrainKind::Building) || self.contains(TerrainKind::FuelTank);
        let woods = self.feature(TerrainKind::Woods).unwrap_or(0);
        match mode {
            MovementMode::Biped | MovementMode::Quad | MovementMode::Vtol => false,
            MovementMode::Tracked => {
                self.depth() > 0 || woods >= 3 || standing || self.contains(TerrainKind::Magma)
            }
            MovementMode::Wheeled => {
                self.depth() > 0
                    || woods > 0
                    || self.roughness() > 0
                    || self.contains(TerrainKind::Rubble)
                    || standing
                    || self.contains(TerrainKind::Magma)
            }
            MovementMode::Hover => woods > 0 || standing || self.contains(TerrainKind::Magma),
            MovementMode::Naval => self.depth() == 0,
            MovementMode::Leg | MovementMode::Jump => self.depth() > 0,
            MovementMode::Aerodyne | MovementMode::Spheroid => {
                woods > 0
                    || self.roughness() > 0
                    || self.contains(TerrainKind::Rubble)
                    || self.depth() > 0
                    || standing
            }
        }
    }
}
