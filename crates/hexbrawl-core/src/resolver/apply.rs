//! Getting damage from an attack onto units and buildings.

use hexfield::{BuildingId, Coords, MovementMode};
use tracing::{debug, warn};

use crate::context::RoundContext;
use crate::damage::{building_absorption, clusters};
use crate::entity::{EntityId, Location};
use crate::hit_table::{roll_location, side_of, AttackSide, HitTable};
use crate::lifecycle;
use crate::queue::PhysicalResult;
use crate::report::{codes, Report};
use crate::services::{CriticalKind, DamageOutcome};

use super::attack_roll;

/// How damage lands: which table, from which side, and whether it is split
/// into clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blow {
    /// Location table
    pub table: HitTable,
    /// Side of the target struck
    pub side: AttackSide,
    /// Split into `cluster_size` groups
    pub clustered: bool,
}

impl Blow {
    /// A single-cluster blow from the front.
    #[must_use]
    pub const fn front(table: HitTable) -> Self {
        Self {
            table,
            side: AttackSide::Front,
            clustered: false,
        }
    }

    /// A blow on `target` from wherever `attacker` stands.
    pub(crate) fn from_attacker(
        ctx: &RoundContext<'_>,
        table: HitTable,
        target: EntityId,
        attacker: EntityId,
    ) -> Self {
        let from = ctx.arena.get(attacker).and_then(|a| a.position());
        let side = match (ctx.arena.get(target), from) {
            (Some(target), Some(from)) => side_of(target, from),
            _ => AttackSide::Front,
        };
        Self {
            table,
            side,
            clustered: false,
        }
    }

    /// The same blow split into clusters.
    #[must_use]
    pub const fn clustered(self) -> Self {
        Self {
            clustered: true,
            ..self
        }
    }
}

/// Reports a damage outcome and destroys the unit if it asks for it.
pub(crate) fn settle(ctx: &mut RoundContext<'_>, id: EntityId, outcome: DamageOutcome) -> bool {
    ctx.report_all(outcome.reports);
    ctx.touch(id);
    match outcome.destroyed {
        Some(cause) => {
            let reports =
                lifecycle::destroy(ctx, id, &cause.reason, cause.survivable, cause.salvageable);
            ctx.report_all(reports);
            true
        }
        None => false,
    }
}

/// Building hex `id` stands in, below the roof, if any.
fn sheltering_building(ctx: &RoundContext<'_>, id: EntityId) -> Option<(BuildingId, Coords)> {
    let entity = ctx.arena.get(id)?;
    let at = entity.position()?;
    let board = ctx.arena.board();
    let building = board.building_at(at)?;
    let hex = board.building(building)?.hex(at)?;
    (!hex.collapsed && entity.elevation < hex.height).then_some((building, at))
}

/// Damages a unit: the building around it soaks its share first, the rest is
/// applied cluster by cluster.
pub(crate) fn deliver_damage(ctx: &mut RoundContext<'_>, target: EntityId, damage: u32, blow: Blow) {
    if damage == 0 {
        return;
    }
    let Some(entity) = ctx.arena.get(target) else {
        warn!(target: "hexbrawl::resolve", %target, "damage target missing");
        return;
    };
    if entity.is_doomed() {
        return;
    }
    let name = entity.name.clone();

    let mut residual = damage;
    if let Some((building, at)) = sheltering_building(ctx, target) {
        let board = ctx.arena.board();
        let absorption = ctx.services.buildings.absorption(board, building, at);
        let scale = ctx.services.buildings.damage_scale(board, building);
        let (to_building, rest) = building_absorption(damage, absorption, scale);
        residual = rest;
        if to_building > 0 {
            ctx.report(
                Report::visible(codes::BUILDING_ABSORBS, target)
                    .add(name)
                    .add(to_building)
                    .with_indent(2),
            );
            strike_building(ctx, building, at, to_building);
        }
    }
    apply_clusters(ctx, target, residual, blow);
}

/// Applies damage to a unit without building protection.
pub(crate) fn apply_clusters(ctx: &mut RoundContext<'_>, target: EntityId, damage: u32, blow: Blow) {
    let groups = if blow.clustered {
        clusters(damage, ctx.options.cluster_size)
    } else if damage > 0 {
        vec![damage]
    } else {
        Vec::new()
    };

    for group in groups {
        let Some(entity) = ctx.arena.get(target) else {
            return;
        };
        if entity.is_doomed() {
            return;
        }
        let hit = roll_location(blow.table, entity, blow.side, ctx.dice);
        let vtol = entity.movement_mode == MovementMode::Vtol;
        let name = entity.name.clone();
        ctx.report(
            Report::visible(codes::HIT_LOCATION, target)
                .add(name)
                .add(hit.location.name())
                .with_indent(2)
                .with_newlines(0),
        );

        let outcome = ctx.services.damage.apply_damage(ctx.arena, target, hit, group);
        if settle(ctx, target, outcome) {
            return;
        }
        if hit.through_armor_critical {
            let outcome = ctx.services.damage.apply_critical(
                ctx.arena,
                target,
                hit.location,
                CriticalKind::ThroughArmor,
            );
            if settle(ctx, target, outcome) {
                return;
            }
        }
        if vtol && hit.location == Location::Rotor && rotor_hit(ctx, target) {
            return;
        }
    }
}

/// Destroys a rotor; an airborne rotorcraft crashes. Returns true if the unit
/// was destroyed.
fn rotor_hit(ctx: &mut RoundContext<'_>, target: EntityId) -> bool {
    let outcome =
        ctx.services
            .damage
            .apply_critical(ctx.arena, target, Location::Rotor, CriticalKind::RotorDestroyed);
    if settle(ctx, target, outcome) {
        return true;
    }
    let Some(entity) = ctx.arena.get_mut(target) else {
        return false;
    };
    let Ok(levels) = u32::try_from(entity.elevation) else {
        return false;
    };
    if levels == 0 {
        return false;
    }
    entity.elevation = 0;
    let name = entity.name.clone();
    debug!(target: "hexbrawl::resolve", %target, levels, "rotorcraft crashes");
    ctx.report(Report::visible(codes::CRASH, target).add(name).with_indent(2));
    let outcome = ctx.services.displacement.fall(ctx.arena, target, levels, ctx.dice);
    settle(ctx, target, outcome)
}

/// Damages one hex of a building. A fuel tank that goes up hits every unit in
/// the hex for its magnitude.
pub(crate) fn strike_building(
    ctx: &mut RoundContext<'_>,
    building: BuildingId,
    coords: Coords,
    damage: u32,
) {
    if damage == 0 {
        return;
    }
    match ctx
        .services
        .buildings
        .damage_building(ctx.arena, building, coords, damage)
    {
        Ok(outcome) => {
            ctx.report_all(outcome.reports);
            let occupants = ctx.arena.entities_at(coords);
            for &id in &occupants {
                ctx.touch(id);
            }
            if let Some(magnitude) = outcome.exploded {
                for id in occupants {
                    apply_clusters(ctx, id, magnitude, Blow::front(HitTable::Standard).clustered());
                }
            }
        }
        Err(err) => {
            warn!(target: "hexbrawl::resolve", %building, hex = %coords, error = %err, "building damage skipped");
        }
    }
}

/// A missed attack on a unit inside a building hits the building instead.
pub(crate) fn miss_strikes_building(ctx: &mut RoundContext<'_>, target: EntityId, damage: u32) {
    if damage == 0 {
        return;
    }
    let Some((building, at)) = sheltering_building(ctx, target) else {
        return;
    };
    let name = ctx
        .arena
        .board()
        .building(building)
        .map(|b| b.name.clone())
        .unwrap_or_default();
    ctx.report(
        Report::public(codes::MISS_STRIKES_BUILDING)
            .add(name)
            .add(damage)
            .with_indent(2),
    );
    strike_building(ctx, building, at, damage);
}

/// An attack aimed at a structure: every sub-attack that connects damages the
/// hex directly.
pub(crate) fn structure_attack(
    ctx: &mut RoundContext<'_>,
    result: &PhysicalResult,
    building: BuildingId,
    coords: Coords,
) {
    for &side in result.sides() {
        let slot = side.index();
        if attack_roll(ctx, result, slot).hit {
            strike_building(ctx, building, coords, result.damage[slot]);
        }
    }
}

/// Damage to the attacker from its own attack.
pub(crate) fn self_inflicted(ctx: &mut RoundContext<'_>, attacker: EntityId, damage: u32, blow: Blow) {
    if damage == 0 {
        return;
    }
    let name = ctx.arena.get(attacker).map(|e| e.name.clone()).unwrap_or_default();
    ctx.report(
        Report::visible(codes::SELF_DAMAGE, attacker)
            .add(name)
            .add(damage)
            .with_indent(2),
    );
    deliver_damage(ctx, attacker, damage, blow);
}
