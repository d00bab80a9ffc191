//! Collaborator traits the engine resolves through.
//!
//! The resolution engine decides *what* happens; collaborators carry it out
//! against the arena. Each concern sits behind an object-safe trait so a host
//! can swap in its own rules (a different damage model, a networked broadcast
//! sink) without touching the resolver:
//!
//! | Trait | Concern |
//! |-------|---------|
//! | [`DamageApplier`] | Armor and structure damage, criticals |
//! | [`Displacer`] | Moving units between hexes, piloting rolls, falls |
//! | [`BuildingDamager`] | Building construction factor, collapse, fuel tanks |
//! | [`TransportOps`] | Loading, unloading and tow links |
//! | [`VisibilityOracle`] | Which players can perceive a unit |
//! | [`BroadcastSink`] | Delivering packets to players |
//!
//! The `Standard*` implementations in the submodules are what the engine
//! uses by default.

mod broadcast;
mod buildings;
mod damage;
mod displacement;
mod sensors;
mod transport;

use std::collections::BTreeSet;

use hexfield::{Board, BuildingId, Coords, Direction};
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::dice::DiceRoller;
use crate::entity::{EntityId, Location, PlayerId};
use crate::error::EngineError;
use crate::hit_table::HitData;
use crate::report::Report;

pub use broadcast::{BroadcastSink, Packet, RecordingBroadcast};
pub use buildings::StandardBuildings;
pub use damage::StandardDamage;
pub use displacement::{roll_piloting, StandardDisplacement};
pub use sensors::{SensorVisibility, VisibilityCache};
pub use transport::StandardTransport;

// =============================================================================
// Outcomes
// =============================================================================

/// Why a unit must be destroyed, as reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyCause {
    /// Text for the destruction report
    pub reason: String,
    /// Passengers may try to escape
    pub survivable: bool,
    /// The wreck can be recovered
    pub salvageable: bool,
}

impl DestroyCause {
    /// Creates a cause.
    #[must_use]
    pub fn new(reason: impl Into<String>, survivable: bool, salvageable: bool) -> Self {
        Self {
            reason: reason.into(),
            survivable,
            salvageable,
        }
    }
}

/// Reports produced by damaging (or moving) one unit, and whether it died.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Reports in the order events happened
    pub reports: Vec<Report>,
    /// Set when the unit must now be destroyed
    pub destroyed: Option<DestroyCause>,
}

impl DamageOutcome {
    /// Appends another outcome for the same unit. The first cause wins.
    pub fn merge(&mut self, other: DamageOutcome) {
        self.reports.extend(other.reports);
        if self.destroyed.is_none() {
            self.destroyed = other.destroyed;
        }
    }
}

/// Result of damaging one building hex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildingOutcome {
    /// Reports in order
    pub reports: Vec<Report>,
    /// The hex collapsed
    pub collapsed: bool,
    /// Damage of a fuel-tank explosion to every unit in the hex
    pub exploded: Option<u32>,
}

/// Kind of critical effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CriticalKind {
    /// Location roll of 2: a possible critical through intact armor
    ThroughArmor,
    /// Rotorcraft rotor destroyed
    RotorDestroyed,
}

/// A piloting roll to make right after a displacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsrRequirement {
    /// Modifier on piloting skill
    pub modifier: i32,
    /// Why
    pub reason: String,
}

impl PsrRequirement {
    /// Creates a requirement.
    #[must_use]
    pub fn new(modifier: i32, reason: impl Into<String>) -> Self {
        Self {
            modifier,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Applies weapon-style damage to units.
pub trait DamageApplier: Send + Sync {
    /// Applies `damage` at `hit`.
    fn apply_damage(
        &self,
        arena: &mut Arena,
        target: EntityId,
        hit: HitData,
        damage: u32,
    ) -> DamageOutcome;

    /// Applies a critical effect at `location`.
    fn apply_critical(
        &self,
        arena: &mut Arena,
        target: EntityId,
        location: Location,
        kind: CriticalKind,
    ) -> DamageOutcome;
}

/// Moves units and makes them fall.
pub trait Displacer: Send + Sync {
    /// Moves `id` from `from` into `to`, then makes the piloting roll if one is
    /// required. The outcome's cause refers to `id`.
    fn displace(
        &self,
        arena: &mut Arena,
        id: EntityId,
        from: Coords,
        to: Coords,
        psr: Option<PsrRequirement>,
        dice: &mut dyn DiceRoller,
    ) -> DamageOutcome;

    /// `id` falls `levels` levels in its current hex.
    fn fall(
        &self,
        arena: &mut Arena,
        id: EntityId,
        levels: u32,
        dice: &mut dyn DiceRoller,
    ) -> DamageOutcome;
}

/// Damages buildings.
pub trait BuildingDamager: Send + Sync {
    /// Applies `damage` to one hex of `building`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingBuilding`] if the building or hex is gone.
    fn damage_building(
        &self,
        arena: &mut Arena,
        building: BuildingId,
        coords: Coords,
        damage: u32,
    ) -> Result<BuildingOutcome, EngineError>;

    /// Damage the hex soaks up before it reaches a unit inside.
    fn absorption(&self, board: &Board, building: BuildingId, coords: Coords) -> u32;

    /// Multiplier on damage that passes through to a unit inside.
    fn damage_scale(&self, board: &Board, building: BuildingId) -> f32;
}

/// Cargo and tow links.
pub trait TransportOps: Send + Sync {
    /// Puts `unit` aboard `carrier`. Returns `false` if either is missing.
    fn load(&self, arena: &mut Arena, carrier: EntityId, unit: EntityId) -> bool;

    /// Takes `unit` off `carrier` and places it. Returns `false` if `unit` is missing.
    fn unload(
        &self,
        arena: &mut Arena,
        carrier: EntityId,
        unit: EntityId,
        coords: Coords,
        facing: Direction,
        elevation: i32,
    ) -> bool;

    /// Severs the tow link between `tractor` and `trailer`.
    fn disconnect_tow(&self, arena: &mut Arena, tractor: EntityId, trailer: EntityId);
}

/// Decides which players perceive a unit.
pub trait VisibilityOracle: Send + Sync {
    /// Players who can perceive `id`. Empty for unknown ids.
    fn who_can_see(
        &self,
        arena: &Arena,
        id: EntityId,
        cache: Option<&mut VisibilityCache>,
    ) -> BTreeSet<PlayerId>;

    /// Whether `player` can perceive `id`.
    fn can_see(&self, arena: &Arena, player: PlayerId, id: EntityId) -> bool {
        self.who_can_see(arena, id, None).contains(&player)
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// The mutating collaborators the resolver calls.
pub struct Services {
    /// Damage model
    pub damage: Box<dyn DamageApplier>,
    /// Displacement and falls
    pub displacement: Box<dyn Displacer>,
    /// Building damage
    pub buildings: Box<dyn BuildingDamager>,
    /// Transport links
    pub transport: Box<dyn TransportOps>,
}

impl Services {
    /// The standard implementations.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            damage: Box::new(StandardDamage::new()),
            displacement: Box::new(StandardDisplacement::new()),
            buildings: Box::new(StandardBuildings::new()),
            transport: Box::new(StandardTransport::new()),
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
