//! Damage formulas for physical attacks.
//!
//! Everything here is pure arithmetic on tonnage, velocity and component
//! state. [`base_damage`] picks the right formula for a declared action and
//! is what pretreatment stores in each result; the resolver then adjusts it
//! with [`apply_blow_rules`] and [`building_absorption`].

use crate::action::{AttackAction, AttackKind, LegPair, LegSide, Side};
use crate::arena::Arena;
use crate::entity::{Entity, LimbActuators};

/// Halves `damage` once per damaged actuator.
fn halve_per_actuator(damage: u32, limb: &LimbActuators) -> u32 {
    damage >> limb.damaged_count()
}

/// Punch damage for one arm.
#[must_use]
pub fn punch(tonnage: u32, arm: &LimbActuators) -> u32 {
    halve_per_actuator(tonnage.div_ceil(10), arm)
}

/// Kick damage for one leg.
#[must_use]
pub fn kick(tonnage: u32, leg: &LimbActuators) -> u32 {
    halve_per_actuator(tonnage / 5, leg)
}

/// Club damage.
#[must_use]
pub fn club(tonnage: u32, zweihander: bool) -> u32 {
    let base = tonnage.div_ceil(5);
    if zweihander {
        base + tonnage.div_ceil(10)
    } else {
        base
    }
}

/// Charge damage to the target.
#[must_use]
pub fn charge(tonnage: u32, hexes_moved: u32) -> u32 {
    if hexes_moved == 0 {
        return 0;
    }
    tonnage.saturating_mul(hexes_moved - 1).div_ceil(10).max(1)
}

/// Charge damage to the attacker.
#[must_use]
pub fn charge_self(target_tonnage: u32) -> u32 {
    target_tonnage.div_ceil(10)
}

/// Death-from-above damage to the target.
#[must_use]
pub fn death_from_above(tonnage: u32) -> u32 {
    tonnage.div_ceil(10).saturating_mul(3)
}

/// Death-from-above damage to the attacker's legs.
#[must_use]
pub fn death_from_above_self(tonnage: u32) -> u32 {
    tonnage.div_ceil(5)
}

/// Thrash damage.
#[must_use]
pub fn thrash(tonnage: u32) -> u32 {
    tonnage.div_ceil(3)
}

/// Ram damage to the target.
#[must_use]
pub fn ram(tonnage: u32, velocity: u32) -> u32 {
    tonnage.saturating_mul(velocity).div_ceil(10)
}

/// Ram damage to the attacker.
#[must_use]
pub fn ram_self(target_tonnage: u32, velocity: u32) -> u32 {
    target_tonnage.saturating_mul(velocity).div_ceil(20)
}

/// Jump-jet damage: 3 per jet.
#[must_use]
pub fn jump_jet(jets: u32) -> u32 {
    jets.saturating_mul(3)
}

/// Vibroclaw damage.
#[must_use]
pub fn vibroclaw(troopers: u32, claws: u32) -> u32 {
    troopers.saturating_mul(claws)
}

/// ProtoMech physical damage.
#[must_use]
pub fn protomech(tonnage: u32, melee_weapon: bool) -> u32 {
    tonnage.div_ceil(5) + u32::from(melee_weapon)
}

/// AirMech ram damage to the target.
#[must_use]
pub fn airmech_ram(tonnage: u32, velocity: u32) -> u32 {
    tonnage.saturating_mul(velocity).div_ceil(20)
}

/// AirMech ram damage to the attacker.
#[must_use]
pub fn airmech_ram_self(target_tonnage: u32) -> u32 {
    target_tonnage.div_ceil(10)
}

/// Damage from falling `levels` levels.
#[must_use]
pub fn fall(tonnage: u32, levels: u32) -> u32 {
    tonnage.div_ceil(10).saturating_mul(levels.saturating_add(1))
}

/// Damage the attacker deals for `action`, per sub-attack side.
///
/// Returns 0 for missing attackers and for attacks that deal no damage
/// (push, trip, grapple, searchlight, ...).
#[must_use]
pub fn base_damage(arena: &Arena, action: &AttackAction, side: Side) -> u32 {
    let Some(attacker) = arena.get(action.attacker) else {
        return 0;
    };
    let t = attacker.tonnage;

    match action.kind {
        AttackKind::Punch { .. } | AttackKind::BrushOff { .. } => {
            attacker.as_mech().map_or(0, |m| match side {
                Side::Left => punch(t, &m.left_arm),
                Side::Right => punch(t, &m.right_arm),
            })
        }
        AttackKind::Kick { leg } => attacker.as_mech().map_or(0, |m| match leg {
            LegSide::Left => kick(t, &m.left_leg),
            LegSide::Right => kick(t, &m.right_leg),
        }),
        AttackKind::Club { zweihander } => club(t, zweihander),
        AttackKind::Charge { hexes_moved } => charge(t, hexes_moved),
        AttackKind::DeathFromAbove => death_from_above(t),
        AttackKind::Thrash => thrash(t),
        AttackKind::Ram { velocity } => ram(t, velocity),
        AttackKind::Telemissile => attacker.as_missile().map_or(0, |m| m.warhead),
        AttackKind::JumpJet { legs } => attacker.as_mech().map_or(0, |m| {
            let jets = match legs {
                LegPair::Left => m.left_leg_jets,
                LegPair::Right => m.right_leg_jets,
                LegPair::Both => m.left_leg_jets.saturating_add(m.right_leg_jets),
            };
            jump_jet(jets)
        }),
        AttackKind::Vibroclaw => attacker
            .as_battle_armor()
            .map_or(0, |ba| vibroclaw(ba.troopers, ba.vibroclaws)),
        AttackKind::ProtoMechPhysical => attacker
            .as_protomech()
            .map_or(0, |p| protomech(t, p.melee_weapon)),
        AttackKind::AirmechRam { velocity } => airmech_ram(t, velocity),
        AttackKind::LayExplosives => attacker.as_infantry().map_or(0, |i| i.explosive_damage),
        AttackKind::Push
        | AttackKind::Trip
        | AttackKind::Grapple { .. }
        | AttackKind::BreakGrapple
        | AttackKind::Searchlight => 0,
    }
}

/// Damage the attacker takes from its own attack, for kinds that have it.
#[must_use]
pub fn self_damage(attacker: &Entity, target: Option<&Entity>, kind: &AttackKind) -> u32 {
    let target_tonnage = target.map_or(0, |t| t.tonnage);
    match *kind {
        AttackKind::Charge { .. } => charge_self(target_tonnage),
        AttackKind::DeathFromAbove => death_from_above_self(attacker.tonnage),
        AttackKind::Ram { velocity } => ram_self(target_tonnage, velocity),
        AttackKind::AirmechRam { .. } => airmech_ram_self(target_tonnage),
        _ => 0,
    }
}

/// Margin by which `roll` beat the to-hit `value`.
///
/// Values below 2 count as 2, so automatic successes measure from 2.
#[must_use]
pub fn margin_of_success(roll: i32, value: i32) -> i32 {
    roll - value.max(2)
}

/// Damage after the optional glancing and direct blow rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlowResult {
    /// Adjusted damage
    pub damage: u32,
    /// The blow was glancing (damage halved)
    pub glancing: bool,
    /// Extra damage from a direct blow
    pub direct_bonus: u32,
}

/// Applies the glancing-blow and direct-blow rules.
///
/// Glancing halves damage when the roll exactly equals the to-hit value;
/// direct adds `margin / 3`. Each is applied independently when enabled.
#[must_use]
pub fn apply_blow_rules(
    damage: u32,
    roll: i32,
    value: i32,
    glancing_blows: bool,
    direct_blows: bool,
) -> BlowResult {
    let glancing = glancing_blows && roll == value;
    let mut adjusted = if glancing { damage / 2 } else { damage };

    let mut direct_bonus = 0;
    if direct_blows {
        let third = margin_of_success(roll, value) / 3;
        if third >= 1 {
            direct_bonus = third.unsigned_abs();
            adjusted += direct_bonus;
        }
    }

    BlowResult {
        damage: adjusted,
        glancing,
        direct_bonus,
    }
}

/// Splits damage between a building and the unit inside it.
///
/// Returns `(to_building, residual)` where the building soaks up to
/// `absorption` points and the rest is scaled by the building's damage scale.
#[must_use]
pub fn building_absorption(damage: u32, absorption: u32, scale: f32) -> (u32, u32) {
    let to_building = absorption.min(damage);
    let rest = damage.saturating_sub(to_building);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let residual = (rest as f32 * scale.max(0.0)).floor() as u32;
    (to_building, residual)
}

/// Splits `damage` into groups of at most `size` points.
#[must_use]
pub fn clusters(damage: u32, size: u32) -> Vec<u32> {
    let size = size.max(1);
    let mut out = Vec::new();
    let mut left = damage;
    while left > 0 {
        let group = left.min(size);
        out.push(group);
        left -= group;
    }
    out
}
