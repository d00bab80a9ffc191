//! Declared physical attacks.
//!
//! An [`AttackAction`] is what a player declares: who attacks, what kind of
//! attack, and at what. Both [`AttackKind`] and [`Target`] are closed, so the
//! only place an unknown kind can show up is the JSON decode boundary.

use std::fmt;

use hexfield::{BuildingId, Coords};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityTag, GrappleSide};

/// Which arm (or both) a punch or brush-off uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmSide {
    /// Left arm
    Left,
    /// Right arm
    Right,
    /// Both arms, resolved as two sub-attacks
    Both,
}

impl ArmSide {
    /// The single arms this choice covers, left first.
    #[must_use]
    pub fn arms(self) -> &'static [Side] {
        match self {
            Self::Left => &[Side::Left],
            Self::Right => &[Side::Right],
            Self::Both => &[Side::Left, Side::Right],
        }
    }
}

/// Which leg kicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegSide {
    /// Left leg
    Left,
    /// Right leg
    Right,
}

/// Which legs' jump jets a jump-jet attack uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegPair {
    /// Left leg only
    Left,
    /// Right leg only
    Right,
    /// Both legs
    Both,
}

/// A single limb side. Index 0 of a result is always the left (or only) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Left
    Left,
    /// Right
    Right,
}

impl Side {
    /// Slot in a two-element result array.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// What an attack is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    /// A unit
    Entity {
        /// Target unit
        id: EntityId,
    },
    /// One hex of a building
    Building {
        /// Building
        building: BuildingId,
        /// Hex of the building
        coords: Coords,
    },
    /// A fuel tank
    FuelTank {
        /// Tank
        building: BuildingId,
        /// Hex of the tank
        coords: Coords,
    },
    /// A hex beyond the map edge
    OffBoard {
        /// Hex
        coords: Coords,
    },
}

impl Target {
    /// Target unit id, if this targets a unit.
    #[must_use]
    pub const fn entity(self) -> Option<EntityId> {
        match self {
            Self::Entity { id } => Some(id),
            _ => None,
        }
    }

    /// Building and hex, if this targets a building or fuel tank.
    #[must_use]
    pub const fn building(self) -> Option<(BuildingId, Coords)> {
        match self {
            Self::Building { building, coords } | Self::FuelTank { building, coords } => {
                Some((building, coords))
            }
            _ => None,
        }
    }
}

/// The kind of physical attack, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttackKind {
    /// Punch with one or both arms
    Punch {
        /// Arm(s)
        arm: ArmSide,
    },
    /// Kick with one leg
    Kick {
        /// Leg
        leg: LegSide,
    },
    /// Push the target one hex
    Push,
    /// Trip the target
    Trip,
    /// Club attack
    Club {
        /// Two-handed swing
        zweihander: bool,
    },
    /// Charge declared during movement
    Charge {
        /// Hexes moved before contact
        hexes_moved: u32,
    },
    /// Death from above
    DeathFromAbove,
    /// Grapple
    Grapple {
        /// Arm(s) used
        side: GrappleSide,
    },
    /// Break an existing grapple
    BreakGrapple,
    /// Prone thrash against infantry in the same hex
    Thrash,
    /// Brush swarming infantry off
    BrushOff {
        /// Arm(s)
        arm: ArmSide,
    },
    /// Ram by an aerospace unit or naval vessel
    Ram {
        /// Velocity at impact
        velocity: u32,
    },
    /// Guided missile impact
    Telemissile,
    /// Jump jet blast
    JumpJet {
        /// Legs whose jets fire
        legs: LegPair,
    },
    /// Battle armor vibroclaw
    Vibroclaw,
    /// ProtoMech physical
    ProtoMechPhysical,
    /// AirMech ram
    AirmechRam {
        /// Velocity at impact
        velocity: u32,
    },
    /// Infantry sets demolition charges
    LayExplosives,
    /// Searchlight; resolved during pretreatment
    Searchlight,
}

impl AttackKind {
    /// Wire names accepted in the `"kind"` field of an encoded action.
    pub const WIRE_NAMES: [&'static str; 19] = [
        "punch",
        "kick",
        "push",
        "trip",
        "club",
        "charge",
        "death_from_above",
        "grapple",
        "break_grapple",
        "thrash",
        "brush_off",
        "ram",
        "telemissile",
        "jump_jet",
        "vibroclaw",
        "proto_mech_physical",
        "airmech_ram",
        "lay_explosives",
        "searchlight",
    ];

    /// Name used in reports and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Punch { .. } => "punch",
            Self::Kick { .. } => "kick",
            Self::Push => "push",
            Self::Trip => "trip",
            Self::Club { .. } => "club",
            Self::Charge { .. } => "charge",
            Self::DeathFromAbove => "death from above",
            Self::Grapple { .. } => "grapple",
            Self::BreakGrapple => "break grapple",
            Self::Thrash => "thrash",
            Self::BrushOff { .. } => "brush off",
            Self::Ram { .. } => "ram",
            Self::Telemissile => "telemissile",
            Self::JumpJet { .. } => "jump jet",
            Self::Vibroclaw => "vibroclaw",
            Self::ProtoMechPhysical => "protomech physical",
            Self::AirmechRam { .. } => "airmech ram",
            Self::LayExplosives => "lay explosives",
            Self::Searchlight => "searchlight",
        }
    }

    /// Attacks declared during movement and carried into the physical phase.
    #[must_use]
    pub const fn is_carried_over(&self) -> bool {
        matches!(
            self,
            Self::Charge { .. } | Self::Ram { .. } | Self::AirmechRam { .. } | Self::Telemissile
        )
    }

    /// Unit type required to make this attack. `None` means any unit
    /// (searchlight) or a rule checked elsewhere (charge, ram).
    #[must_use]
    pub const fn required_tag(&self) -> Option<EntityTag> {
        match self {
            Self::Punch { .. }
            | Self::Kick { .. }
            | Self::Push
            | Self::Trip
            | Self::Club { .. }
            | Self::DeathFromAbove
            | Self::Grapple { .. }
            | Self::BreakGrapple
            | Self::Thrash
            | Self::BrushOff { .. }
            | Self::JumpJet { .. }
            | Self::AirmechRam { .. } => Some(EntityTag::Mech),
            Self::Vibroclaw => Some(EntityTag::BattleArmor),
            Self::ProtoMechPhysical => Some(EntityTag::ProtoMech),
            Self::Telemissile => Some(EntityTag::Missile),
            Self::LayExplosives => Some(EntityTag::Infantry),
            Self::Charge { .. } | Self::Ram { .. } | Self::Searchlight => None,
        }
    }

    /// Attacks resolved against a partner declaring the same kind back.
    #[must_use]
    pub const fn is_mutual(&self) -> bool {
        matches!(self, Self::Push | Self::Grapple { .. } | Self::BreakGrapple)
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A declared attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackAction {
    /// Attacking unit
    pub attacker: EntityId,
    /// What it attacks
    pub target: Target,
    /// How
    #[serde(flatten)]
    pub kind: AttackKind,
}

impl AttackAction {
    /// Creates an action against a unit.
    #[must_use]
    pub const fn new(attacker: EntityId, target: EntityId, kind: AttackKind) -> Self {
        Self {
            attacker,
            target: Target::Entity { id: target },
            kind,
        }
    }

    /// Creates an action against any target.
    #[must_use]
    pub const fn against(attacker: EntityId, target: Target, kind: AttackKind) -> Self {
        Self {
            attacker,
            target,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_json() {
        let json = r#"{
            "attacker": 3,
            "target": { "type": "entity", "id": 4 },
            "kind": "punch",
            "arm": "Both"
        }"#;
        let action: AttackAction = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            AttackAction::new(
                EntityId::new(3),
                EntityId::new(4),
                AttackKind::Punch { arm: ArmSide::Both }
            )
        );
    }

    #[test]
    fn unknown_kind_fails_to_decode() {
        let json = r#"{ "attacker": 1, "target": { "type": "entity", "id": 2 }, "kind": "headbutt" }"#;
        assert!(serde_json::from_str::<AttackAction>(json).is_err());
    }

    #[test]
    fn building_target_roundtrip() {
        let action = AttackAction::against(
            EntityId::new(1),
            Target::Building {
                building: BuildingId::new(2),
                coords: Coords::new(3, 4),
            },
            AttackKind::LayExplosives,
        );
        let json = serde_json::to_string(&action).unwrap();
        let back: AttackAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
        assert_eq!(back.target.building(), Some((BuildingId::new(2), Coords::new(3, 4))));
    }

    #[test]
    fn carried_over_kinds() {
        assert!(AttackKind::Charge { hexes_moved: 4 }.is_carried_over());
        assert!(AttackKind::Telemissile.is_carried_over());
        assert!(!AttackKind::Push.is_carried_over());
    }

    #[test]
    fn both_arms_split_left_first() {
        assert_eq!(ArmSide::Both.arms(), &[Side::Left, Side::Right]);
    }
}
