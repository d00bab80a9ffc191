//! To-hit numbers for physical attacks.
//!
//! [`compute`] evaluates one sub-attack against the arena as it stands. It
//! never mutates anything: pretreatment calls it for every queued action
//! before the first result resolves.

use std::fmt;

use hexfield::MovementMode;
use serde::{Deserialize, Serialize};

use crate::action::{ArmSide, AttackAction, AttackKind, LegPair, LegSide, Side, Target};
use crate::arena::Arena;
use crate::entity::{Entity, EntityTag, Location, MoveStep, StatusFlags};
use crate::error::EngineError;

/// One line of a to-hit calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    /// Amount added to the target number
    pub value: i32,
    /// What it is for
    pub reason: String,
}

/// Target number for an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToHit {
    /// Cannot succeed
    Impossible(String),
    /// Cannot fail
    AutomaticSuccess(String),
    /// Roll this or higher on 2d6
    Value {
        /// Final target number
        value: i32,
        /// Contributions in the order they were added
        modifiers: Vec<Modifier>,
    },
}

impl ToHit {
    /// A plain target number.
    #[must_use]
    pub fn fixed(value: i32) -> Self {
        Self::Value {
            value,
            modifiers: Vec::new(),
        }
    }

    /// Numeric target: `i32::MAX` when impossible, `i32::MIN` when automatic.
    #[must_use]
    pub fn value(&self) -> i32 {
        match self {
            Self::Impossible(_) => i32::MAX,
            Self::AutomaticSuccess(_) => i32::MIN,
            Self::Value { value, .. } => *value,
        }
    }

    /// True if the attack cannot succeed.
    #[must_use]
    pub fn is_impossible(&self) -> bool {
        matches!(self, Self::Impossible(_))
    }

    /// Whether `roll` hits this target number.
    #[must_use]
    pub fn hits(&self, roll: i32) -> bool {
        match self {
            Self::Impossible(_) => false,
            Self::AutomaticSuccess(_) => true,
            Self::Value { value, .. } => roll >= *value,
        }
    }
}

impl fmt::Display for ToHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Impossible(reason) | Self::AutomaticSuccess(reason) => f.write_str(reason),
            Self::Value { value, modifiers } => {
                write!(f, "{value}")?;
                for m in modifiers {
                    write!(f, " [{:+} {}]", m.value, m.reason)?;
                }
                Ok(())
            }
        }
    }
}

/// Kind-specific modifier on top of piloting skill.
fn kind_modifier(kind: &AttackKind) -> i32 {
    match kind {
        AttackKind::Kick { .. } => -2,
        AttackKind::Push | AttackKind::Trip => -1,
        AttackKind::Club { zweihander } => {
            if *zweihander {
                0
            } else {
                -1
            }
        }
        AttackKind::BrushOff { .. } => 4,
        AttackKind::JumpJet { .. } => 2,
        _ => 0,
    }
}

fn arm_location(side: Side) -> Location {
    match side {
        Side::Left => Location::LeftArm,
        Side::Right => Location::RightArm,
    }
}

/// Reason `attacker` may not make `kind` at all, if any.
fn eligibility(attacker: &Entity, kind: &AttackKind) -> Option<String> {
    if let Some(required) = kind.required_tag() {
        if attacker.tag() != required {
            let err = EngineError::IneligibleAttacker {
                attacker: attacker.id(),
                kind: kind.label(),
            };
            return Some(err.to_string());
        }
    }
    match kind {
        AttackKind::AirmechRam { .. } => {
            let airmech = attacker.as_mech().is_some_and(|m| m.airmech_mode);
            (!airmech).then(|| "only AirMechs can airmech ram".to_owned())
        }
        AttackKind::Ram { .. } => {
            let ok = matches!(attacker.tag(), EntityTag::Aerospace | EntityTag::FighterSquadron)
                || (attacker.tag() == EntityTag::Vehicle
                    && attacker.movement_mode == MovementMode::Naval);
            (!ok).then(|| "only aerospace units and naval vessels can ram".to_owned())
        }
        AttackKind::Charge { .. } => {
            let ok = matches!(
                attacker.tag(),
                EntityTag::Mech | EntityTag::Vehicle | EntityTag::ProtoMech
            );
            (!ok).then(|| format!("{} cannot charge", attacker.tag()))
        }
        _ => None,
    }
}

/// Reason the attacker's own state rules out this sub-attack, if any.
fn attacker_state(attacker: &Entity, kind: &AttackKind, side: Side) -> Option<String> {
    let prone = attacker.is_prone();
    match kind {
        AttackKind::Thrash if !prone => return Some("attacker is not prone".into()),
        AttackKind::Thrash => {}
        _ if prone => return Some("attacker is prone".into()),
        _ => {}
    }

    let links = &attacker.links;
    match kind {
        AttackKind::Punch { .. } | AttackKind::BrushOff { .. } => {
            let arm = arm_location(side);
            if attacker.is_location_destroyed(arm) {
                return Some(format!("{arm} destroyed"));
            }
            if matches!(kind, AttackKind::BrushOff { .. }) && links.swarm_attacker.is_none() {
                return Some("no swarming unit to brush off".into());
            }
        }
        AttackKind::Kick { leg } => {
            let loc = match leg {
                LegSide::Left => Location::LeftLeg,
                LegSide::Right => Location::RightLeg,
            };
            if attacker.is_location_destroyed(loc) {
                return Some(format!("{loc} destroyed"));
            }
        }
        AttackKind::Club { .. } => {
            if attacker.as_mech().and_then(|m| m.club).is_none() {
                return Some("no club".into());
            }
            if attacker.is_location_destroyed(Location::LeftArm)
                && attacker.is_location_destroyed(Location::RightArm)
            {
                return Some("both arms destroyed".into());
            }
        }
        AttackKind::JumpJet { legs } => {
            let mech = attacker.as_mech()?;
            let left = (Location::LeftLeg, mech.left_leg_jets);
            let right = (Location::RightLeg, mech.right_leg_jets);
            let needed = match legs {
                LegPair::Left => vec![left],
                LegPair::Right => vec![right],
                LegPair::Both => vec![left, right],
            };
            for (loc, jets) in needed {
                if attacker.is_location_destroyed(loc) {
                    return Some(format!("{loc} destroyed"));
                }
                if jets == 0 {
                    return Some(format!("no jump jets in {loc}"));
                }
            }
        }
        AttackKind::Grapple { .. } if links.grappled.is_some() => {
            return Some("already grappled".into());
        }
        AttackKind::BreakGrapple if links.grappled.is_none() => {
            return Some("not grappled".into());
        }
        AttackKind::Vibroclaw => {
            if attacker.as_battle_armor().is_some_and(|ba| ba.vibroclaws == 0) {
                return Some("no vibroclaws".into());
            }
        }
        _ => {}
    }
    None
}

/// Attacks that do not need an adjacent target.
fn exempt_from_adjacency(kind: &AttackKind) -> bool {
    matches!(
        kind,
        AttackKind::Thrash
            | AttackKind::LayExplosives
            | AttackKind::BrushOff { .. }
            | AttackKind::BreakGrapple
    )
}

/// Computes the to-hit number for one sub-attack of `action`.
///
/// `side` selects the arm for two-armed punches and brush-offs; other kinds
/// ignore it.
#[must_use]
pub fn compute(arena: &Arena, action: &AttackAction, side: Side) -> ToHit {
    let Some(attacker) = arena.get(action.attacker) else {
        return ToHit::Impossible("attacker not in play".into());
    };
    let kind = &action.kind;
    if let Some(reason) = eligibility(attacker, kind) {
        return ToHit::Impossible(reason);
    }
    if let Some(reason) = attacker_state(attacker, kind, side) {
        return ToHit::Impossible(reason);
    }

    let target = match action.target {
        Target::OffBoard { .. } => return ToHit::Impossible("target is off the board".into()),
        Target::Building { building, coords } | Target::FuelTank { building, coords } => {
            let standing = arena
                .board()
                .building(building)
                .is_some_and(|b| b.is_standing(coords));
            if !standing {
                return ToHit::Impossible("no standing structure there".into());
            }
            let Some(at) = attacker.position() else {
                return ToHit::Impossible("attacker is not on the board".into());
            };
            if matches!(kind, AttackKind::LayExplosives) {
                return if at == coords {
                    ToHit::AutomaticSuccess("inside the building".into())
                } else {
                    ToHit::Impossible("must be inside the building".into())
                };
            }
            if at.distance(coords) > 1 {
                return ToHit::Impossible("target not adjacent".into());
            }
            return ToHit::AutomaticSuccess("targeting a structure".into());
        }
        Target::Entity { id } => {
            if matches!(kind, AttackKind::LayExplosives) {
                return ToHit::Impossible("explosives can only be set in buildings".into());
            }
            match arena.get(id) {
                Some(t) if t.is_alive() => t,
                Some(_) => return ToHit::Impossible("target already destroyed".into()),
                None => return ToHit::Impossible("target not in play".into()),
            }
        }
    };

    let (Some(from), Some(to)) = (attacker.position(), target.position()) else {
        return ToHit::Impossible("attacker or target is not on the board".into());
    };
    let distance = from.distance(to);
    match kind {
        AttackKind::Thrash => {
            if distance != 0 {
                return ToHit::Impossible("thrash needs infantry in the same hex".into());
            }
            if !target.is_infantry() {
                return ToHit::Impossible("thrash only hits infantry".into());
            }
        }
        AttackKind::Telemissile if distance > 1 => {
            return ToHit::Impossible("target out of reach".into());
        }
        _ if !exempt_from_adjacency(kind) && !matches!(kind, AttackKind::Telemissile) && distance != 1 => {
            return ToHit::Impossible("target not adjacent".into());
        }
        _ => {}
    }

    if matches!(kind, AttackKind::Push | AttackKind::Trip) && !target.is_mech() {
        return ToHit::Impossible(format!("can only {kind} mechs"));
    }
    if matches!(kind, AttackKind::BrushOff { .. }) && attacker.links.swarm_attacker != Some(target.id()) {
        return ToHit::Impossible("target is not swarming the attacker".into());
    }
    if matches!(kind, AttackKind::BreakGrapple) {
        if attacker.links.grappled != Some(target.id()) {
            return ToHit::Impossible("not grappled with the target".into());
        }
        if attacker.links.grapple_holder {
            return ToHit::AutomaticSuccess("grapple holder lets go".into());
        }
    }
    if matches!(kind, AttackKind::Grapple { .. }) && target.links.grappled.is_some() {
        return ToHit::Impossible("target already grappled".into());
    }

    let mut modifiers = vec![Modifier {
        value: attacker.piloting,
        reason: "piloting skill".into(),
    }];
    let kind_mod = kind_modifier(kind);
    if kind_mod != 0 {
        modifiers.push(Modifier {
            value: kind_mod,
            reason: kind.label().into(),
        });
    }
    if target.target_movement_modifier != 0 {
        modifiers.push(Modifier {
            value: target.target_movement_modifier,
            reason: "target movement".into(),
        });
    }
    if attacker.attacker_movement == MoveStep::Jumped {
        modifiers.push(Modifier {
            value: 1,
            reason: "attacker jumped".into(),
        });
    }
    if target.is_prone() && distance == 1 {
        modifiers.push(Modifier {
            value: -2,
            reason: "target prone and adjacent".into(),
        });
    }
    if target.status.contains(StatusFlags::IMMOBILE) {
        modifiers.push(Modifier {
            value: -4,
            reason: "target immobile".into(),
        });
    }

    let value = modifiers.iter().map(|m| m.value).sum();
    ToHit::Value { value, modifiers }
}

/// Sub-attack sides an action resolves as, left first.
#[must_use]
pub fn sides(kind: &AttackKind) -> &'static [Side] {
    match kind {
        AttackKind::Punch { arm } | AttackKind::BrushOff { arm } => arm.arms(),
        _ => ArmSide::Left.arms(),
    }
}
