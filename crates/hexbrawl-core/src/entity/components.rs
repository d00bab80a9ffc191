//! Component structs and shared state types for entities.
//!
//! Kind-specific data lives in one struct per [`super::EntityTag`]; state that
//! every unit carries (locations, status flags, relations) is defined here and
//! held directly on [`super::Entity`].

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

use super::EntityId;

// =============================================================================
// Status Flags
// =============================================================================

bitflags! {
    /// Lifecycle and per-round status bits.
    ///
    /// Destruction is monotonic: `DOOMED` is set first, `DESTROYED` when the
    /// phase ends, `REMOVED` when the unit leaves play. None are ever cleared.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u32 {
        /// Has acted this phase
        const DONE = 1 << 0;
        /// Will be destroyed at the end of the phase
        const DOOMED = 1 << 1;
        /// Destroyed
        const DESTROYED = 1 << 2;
        /// Removed from play
        const REMOVED = 1 << 3;
        /// Was the target of a resolved physical attack this phase
        const STRUCK = 1 << 4;
        /// Lying down
        const PRONE = 1 << 5;
        /// Cannot move or turn
        const IMMOBILE = 1 << 6;
        /// Was unloaded from a carrier this turn
        const UNLOADED_THIS_TURN = 1 << 7;
        /// Crew has ejected
        const CREW_EJECTED = 1 << 8;
        /// Lit by a searchlight
        const ILLUMINATED = 1 << 9;
        /// Carries a working searchlight
        const SEARCHLIGHT = 1 << 10;
        /// ECM suite is active
        const ECM_ACTIVE = 1 << 11;
    }
}

// =============================================================================
// Locations
// =============================================================================

/// Hit location on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Location {
    /// Mech head
    Head,
    /// Mech center torso
    CenterTorso,
    /// Mech left torso
    LeftTorso,
    /// Mech right torso
    RightTorso,
    /// Mech left arm
    LeftArm,
    /// Mech right arm
    RightArm,
    /// Mech left leg
    LeftLeg,
    /// Mech right leg
    RightLeg,
    /// Vehicle front
    Front,
    /// Vehicle left side
    Left,
    /// Vehicle right side
    Right,
    /// Vehicle rear
    Rear,
    /// Vehicle turret
    Turret,
    /// Rotorcraft rotor
    Rotor,
    /// Single-location units (infantry, battle armor, protomechs, missiles)
    Body,
    /// Aerospace nose
    Nose,
    /// Aerospace left wing
    LeftWing,
    /// Aerospace right wing
    RightWing,
    /// Aerospace aft
    Aft,
}

impl Location {
    /// Locations a mech has.
    pub const MECH: [Location; 8] = [
        Location::Head,
        Location::CenterTorso,
        Location::LeftTorso,
        Location::RightTorso,
        Location::LeftArm,
        Location::RightArm,
        Location::LeftLeg,
        Location::RightLeg,
    ];

    /// Locations an aerospace craft has.
    pub const AEROSPACE: [Location; 4] = [
        Location::Nose,
        Location::LeftWing,
        Location::RightWing,
        Location::Aft,
    ];

    /// Display name used in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Location::Head => "Head",
            Location::CenterTorso => "Center Torso",
            Location::LeftTorso => "Left Torso",
            Location::RightTorso => "Right Torso",
            Location::LeftArm => "Left Arm",
            Location::RightArm => "Right Arm",
            Location::LeftLeg => "Left Leg",
            Location::RightLeg => "Right Leg",
            Location::Front => "Front",
            Location::Left => "Left Side",
            Location::Right => "Right Side",
            Location::Rear => "Rear",
            Location::Turret => "Turret",
            Location::Rotor => "Rotor",
            Location::Body => "Body",
            Location::Nose => "Nose",
            Location::LeftWing => "Left Wing",
            Location::RightWing => "Right Wing",
            Location::Aft => "Aft",
        }
    }

    /// Location that receives damage left over once this one is destroyed.
    ///
    /// `None` means excess damage is lost (or, for lethal locations, the unit dies).
    #[must_use]
    pub const fn transfer(self) -> Option<Location> {
        match self {
            Location::LeftArm | Location::LeftLeg => Some(Location::LeftTorso),
            Location::RightArm | Location::RightLeg => Some(Location::RightTorso),
            Location::LeftTorso | Location::RightTorso => Some(Location::CenterTorso),
            Location::LeftWing | Location::RightWing => Some(Location::Nose),
            _ => None,
        }
    }

    /// Whether losing this location's structure kills the unit.
    #[must_use]
    pub const fn is_lethal(self) -> bool {
        matches!(
            self,
            Location::Head | Location::CenterTorso | Location::Body | Location::Nose
        )
    }

    /// Whether the location has separate rear armor.
    #[must_use]
    pub const fn has_rear(self) -> bool {
        matches!(
            self,
            Location::CenterTorso | Location::LeftTorso | Location::RightTorso
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Armor and internal structure of one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationState {
    /// Front armor points
    pub armor: u32,
    /// Rear armor points (torso locations only)
    pub rear_armor: u32,
    /// Internal structure points
    pub structure: u32,
    /// Location has been destroyed
    pub destroyed: bool,
}

impl LocationState {
    /// Creates a location with the given armor and structure.
    #[must_use]
    pub const fn new(armor: u32, structure: u32) -> Self {
        Self {
            armor,
            rear_armor: 0,
            structure,
            destroyed: false,
        }
    }

    /// Builder: set rear armor.
    #[must_use]
    pub const fn with_rear(mut self, rear_armor: u32) -> Self {
        self.rear_armor = rear_armor;
        self
    }
}

// =============================================================================
// Movement and Removal
// =============================================================================

/// How the unit moved this turn, for to-hit purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoveStep {
    /// Stood still
    #[default]
    None,
    /// Walked or cruised
    Walked,
    /// Ran or flanked
    Ran,
    /// Jumped
    Jumped,
}

/// Why a unit left play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RemovalCondition {
    /// Destroyed but recoverable after the battle
    Salvageable = 1,
    /// Destroyed beyond recovery
    Devastated = 2,
    /// Crew ejected
    Ejected = 3,
    /// Captured by the enemy
    Captured = 4,
    /// Left the board voluntarily
    Retreated = 5,
    /// Pushed or displaced off the board
    Pushed = 6,
    /// Never perceived by the observer; used for scoped removal notices
    NeverJoined = 7,
}

impl RemovalCondition {
    /// Wire code for this condition.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RemovalCondition {
    type Error = EngineError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Salvageable),
            2 => Ok(Self::Devastated),
            3 => Ok(Self::Ejected),
            4 => Ok(Self::Captured),
            5 => Ok(Self::Retreated),
            6 => Ok(Self::Pushed),
            7 => Ok(Self::NeverJoined),
            other => Err(EngineError::InvalidRemovalCondition(other)),
        }
    }
}

// =============================================================================
// Relations
// =============================================================================

/// Which arm(s) hold a grapple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrappleSide {
    /// Left arm only (chain whip entanglements use this)
    Left,
    /// Right arm only
    Right,
    /// Both arms
    Both,
}

/// Links to other entities, always by id.
///
/// Grapple and swarm links are symmetric: when `a.grappled == Some(b)` then
/// `b.grappled == Some(a)`, and likewise `swarm_target`/`swarm_attacker`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Relations {
    /// Carrier this unit rides in
    pub transported_by: Option<EntityId>,
    /// Units carried by this unit, in load order
    pub loaded: Vec<EntityId>,
    /// Trailer towed by this unit
    pub towing: Option<EntityId>,
    /// Tractor towing this unit
    pub towed_by: Option<EntityId>,
    /// Grapple partner
    pub grappled: Option<EntityId>,
    /// This unit initiated (holds) the grapple
    pub grapple_holder: bool,
    /// Arm(s) used by the holder
    pub grapple_side: Option<GrappleSide>,
    /// Unit this infantry is swarming
    pub swarm_target: Option<EntityId>,
    /// Infantry swarming this unit
    pub swarm_attacker: Option<EntityId>,
    /// Ejected crews this unit has picked up
    pub picked_up_crew: Vec<EntityId>,
    /// Unit guiding this one (telemissiles)
    pub controller: Option<EntityId>,
    /// Units this one guides
    pub controlled: Vec<EntityId>,
}

// =============================================================================
// Kind-Specific Components
// =============================================================================

/// Actuator state of one limb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimbActuators {
    /// Upper arm or upper leg actuator is damaged
    pub upper_damaged: bool,
    /// Lower arm or lower leg actuator is damaged
    pub lower_damaged: bool,
    /// Hand or foot actuator is present and working
    pub hand_or_foot: bool,
}

impl Default for LimbActuators {
    fn default() -> Self {
        Self {
            upper_damaged: false,
            lower_damaged: false,
            hand_or_foot: true,
        }
    }
}

impl LimbActuators {
    /// Number of damaged upper/lower actuators (each halves physical damage).
    #[must_use]
    pub fn damaged_count(&self) -> u32 {
        u32::from(self.upper_damaged) + u32::from(self.lower_damaged)
    }
}

/// Kind of carried club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClubKind {
    /// Tree trunk, girder or similar
    Improvised,
    /// Mech-scale hatchet
    Hatchet,
    /// Mech-scale sword
    Sword,
    /// Chain whip; entangles on a hit
    ChainWhip,
}

/// Components for mechs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MechComponents {
    /// Left arm actuators
    pub left_arm: LimbActuators,
    /// Right arm actuators
    pub right_arm: LimbActuators,
    /// Left leg actuators
    pub left_leg: LimbActuators,
    /// Right leg actuators
    pub right_leg: LimbActuators,
    /// Jump jets mounted in the left leg
    pub left_leg_jets: u32,
    /// Jump jets mounted in the right leg
    pub right_leg_jets: u32,
    /// Carried club, if any
    pub club: Option<ClubKind>,
    /// Land-air mech currently in AirMech mode
    pub airmech_mode: bool,
}

/// Components for ground and rotor vehicles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VehicleComponents {
    /// Has a turret location
    pub turret: bool,
    /// Rotor has been destroyed
    pub rotor_destroyed: bool,
}

/// Components for conventional infantry (including ejected crews).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InfantryComponents {
    /// Surviving troopers
    pub troopers: u32,
    /// Damage of the demolition charges this platoon carries
    pub explosive_damage: u32,
    /// This is an ejected vehicle crew rather than a combat unit
    pub ejected_crew: bool,
}

/// Components for battle armor squads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BattleArmorComponents {
    /// Surviving troopers
    pub troopers: u32,
    /// Vibroclaws per trooper
    pub vibroclaws: u32,
}

/// Components for protomechs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtoMechComponents {
    /// Carries a protomech melee weapon
    pub melee_weapon: bool,
}

/// Components for aerospace craft.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AerospaceComponents {
    /// Current velocity
    pub velocity: u32,
}

/// Components for fighter squadrons. Members are tracked as loaded units.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SquadronComponents {
    /// Maximum number of fighters
    pub capacity: u32,
}

/// Components for guided missiles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MissileComponents {
    /// Damage dealt on impact
    pub warhead: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_condition_codes_round_trip() {
        for code in 1..=7u8 {
            let condition = RemovalCondition::try_from(code).unwrap();
            assert_eq!(condition.code(), code);
        }
    }

    #[test]
    fn unknown_removal_code_is_rejected() {
        assert!(matches!(
            RemovalCondition::try_from(0),
            Err(EngineError::InvalidRemovalCondition(0))
        ));
        assert!(RemovalCondition::try_from(200).is_err());
    }

    #[test]
    fn damage_transfers_inward() {
        assert_eq!(Location::LeftArm.transfer(), Some(Location::LeftTorso));
        assert_eq!(Location::RightTorso.transfer(), Some(Location::CenterTorso));
        assert_eq!(Location::CenterTorso.transfer(), None);
        assert!(Location::Head.is_lethal());
        assert!(!Location::LeftArm.is_lethal());
    }

    #[test]
    fn damaged_actuators_counted() {
        let limb = LimbActuators {
            upper_damaged: true,
            lower_damaged: true,
            hand_or_foot: false,
        };
        assert_eq!(limb.damaged_count(), 2);
        assert_eq!(LimbActuators::default().damaged_count(), 0);
    }

    #[test]
    fn status_flags_are_serializable() {
        let flags = StatusFlags::DOOMED | StatusFlags::PRONE;
        let json = serde_json::to_string(&flags).unwrap();
        let back: StatusFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }
}
