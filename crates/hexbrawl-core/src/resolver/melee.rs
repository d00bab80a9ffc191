//! Limb and weapon attacks: punch, kick, trip, club, thrash, brush-off, jump
//! jets and the battle armor and ProtoMech strikes.

use tracing::debug;

use crate::context::RoundContext;
use crate::entity::{ClubKind, EntityId, GrappleSide};
use crate::hit_table::HitTable;
use crate::queue::PhysicalResult;
use crate::report::{codes, Report};

use super::apply::{deliver_damage, miss_strikes_building, Blow};
use super::{attack_roll, blow_damage, name_of};

/// Rolls slot 0 and, on a hit, lands the (blow-adjusted) damage.
fn land(ctx: &mut RoundContext<'_>, result: &PhysicalResult, target: EntityId, table: HitTable) -> bool {
    let swing = attack_roll(ctx, result, 0);
    if swing.hit {
        let damage = blow_damage(ctx, &swing, result.damage[0], target);
        let blow = Blow::from_attacker(ctx, table, target, result.action.attacker);
        deliver_damage(ctx, target, damage, blow);
    }
    swing.hit
}

pub(super) fn punch(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    let Some(target) = result.action.target.entity() else {
        return;
    };
    for &side in result.sides() {
        let slot = side.index();
        let swing = attack_roll(ctx, result, slot);
        if swing.hit {
            let damage = blow_damage(ctx, &swing, result.damage[slot], target);
            let blow = Blow::from_attacker(ctx, HitTable::Punch, target, result.action.attacker);
            deliver_damage(ctx, target, damage, blow);
        } else {
            miss_strikes_building(ctx, target, result.damage[slot]);
        }
    }
}

pub(super) fn kick(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    let Some(target) = result.action.target.entity() else {
        return;
    };
    if land(ctx, result, target, HitTable::Kick) {
        ctx.arena.queue_psr(target, 0, "kicked");
    } else {
        ctx.arena.queue_psr(result.action.attacker, 0, "missed kick");
        miss_strikes_building(ctx, target, result.damage[0]);
    }
}

pub(super) fn trip(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    let Some(target) = result.action.target.entity() else {
        return;
    };
    if attack_roll(ctx, result, 0).hit {
        ctx.arena.queue_psr(target, 0, "tripped");
    } else {
        ctx.arena.queue_psr(result.action.attacker, 0, "missed trip");
    }
}

pub(super) fn club(ctx: &mut RoundContext<'_>, result: &PhysicalResult, zweihander: bool) {
    let Some(target) = result.action.target.entity() else {
        return;
    };
    let attacker = result.action.attacker;
    let table = if ctx.arena.get(target).is_some_and(|t| t.is_prone()) {
        HitTable::Kick
    } else {
        HitTable::Punch
    };
    if land(ctx, result, target, table) {
        let whip = ctx
            .arena
            .get(attacker)
            .and_then(|a| a.as_mech())
            .and_then(|m| m.club)
            == Some(ClubKind::ChainWhip);
        if whip {
            entangle(ctx, attacker, target);
        }
    } else if zweihander {
        ctx.arena.queue_psr(attacker, 0, "missed zweihander");
    }
}

/// A chain whip wraps the target: the attacker holds it on the left.
fn entangle(ctx: &mut RoundContext<'_>, attacker: EntityId, target: EntityId) {
    let free = |id: EntityId| {
        ctx.arena
            .get(id)
            .is_some_and(|e| e.is_alive() && e.links.grappled.is_none())
    };
    if !free(attacker) || !free(target) {
        debug!(target: "hexbrawl::resolve", %attacker, %target, "entanglement skipped");
        return;
    }
    if let Some(holder) = ctx.arena.get_mut(attacker) {
        holder.links.grappled = Some(target);
        holder.links.grapple_holder = true;
        holder.links.grapple_side = Some(GrappleSide::Left);
    }
    let Some(victim) = ctx.arena.get_mut(target) else {
        return;
    };
    victim.links.grappled = Some(attacker);
    victim.links.grapple_holder = false;
    victim.links.grapple_side = Some(GrappleSide::Left);
    let name = victim.name.clone();
    ctx.report(Report::visible(codes::ENTANGLED, target).add(name).with_indent(2));
    ctx.touch(attacker);
    ctx.touch(target);
}

pub(super) fn thrash(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    if let Some(target) = result.action.target.entity() {
        let swing = attack_roll(ctx, result, 0);
        if swing.hit {
            let damage = blow_damage(ctx, &swing, result.damage[0], target);
            deliver_damage(ctx, target, damage, Blow::front(HitTable::Standard));
        }
    }
    ctx.arena.queue_psr(result.action.attacker, 0, "thrashing");
}

pub(super) fn brush_off(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    let attacker = result.action.attacker;
    for &side in result.sides() {
        let Some(swarmer) = ctx.arena.get(attacker).and_then(|a| a.links.swarm_attacker) else {
            debug!(target: "hexbrawl::resolve", %attacker, "nothing left to brush off");
            return;
        };
        let slot = side.index();
        let swing = attack_roll(ctx, result, slot);
        let damage = result.damage[slot];
        if swing.hit {
            let damage = blow_damage(ctx, &swing, damage, swarmer);
            deliver_damage(ctx, swarmer, damage, Blow::front(HitTable::Standard));
            release_swarm(ctx, attacker, swarmer);
        } else {
            // the swing lands on the attacker's own arm
            deliver_damage(ctx, attacker, damage, Blow::front(HitTable::Punch));
        }
    }
}

fn release_swarm(ctx: &mut RoundContext<'_>, attacker: EntityId, swarmer: EntityId) {
    let mut released = false;
    if let Some(host) = ctx.arena.get_mut(attacker) {
        if host.links.swarm_attacker == Some(swarmer) {
            host.links.swarm_attacker = None;
            released = true;
        }
    }
    if let Some(infantry) = ctx.arena.get_mut(swarmer) {
        if infantry.links.swarm_target == Some(attacker) {
            infantry.links.swarm_target = None;
            released = true;
        }
    }
    if !released {
        return;
    }
    let swarmer_name = name_of(ctx, swarmer);
    let attacker_name = name_of(ctx, attacker);
    ctx.report(
        Report::visible(codes::BRUSHED_OFF, swarmer)
            .add(swarmer_name)
            .add(attacker_name)
            .with_indent(2),
    );
    ctx.touch(attacker);
    ctx.touch(swarmer);
}

pub(super) fn jump_jet(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    if let Some(target) = result.action.target.entity() {
        land(ctx, result, target, HitTable::Kick);
    }
}

/// Vibroclaw and ProtoMech physical: one strike on the full table.
pub(super) fn strike(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    if let Some(target) = result.action.target.entity() {
        land(ctx, result, target, HitTable::Standard);
    }
}
