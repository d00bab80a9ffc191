//! Whole-body impacts: charge, death from above, rams and telemissiles.
//!
//! Both sides of a collision take damage, applied in clusters on the
//! standard table unless noted.

use tracing::info;

use crate::context::RoundContext;
use crate::damage::self_damage;
use crate::entity::EntityId;
use crate::hit_table::HitTable;
use crate::lifecycle;
use crate::queue::PhysicalResult;
use crate::services::PsrRequirement;

use super::apply::{deliver_damage, self_inflicted, settle, Blow};
use super::{attack_roll, blow_damage, Swing};

/// Target and attacker both take damage on `tables` (target's, attacker's).
fn collide(
    ctx: &mut RoundContext<'_>,
    result: &PhysicalResult,
    swing: &Swing,
    target: EntityId,
    tables: (HitTable, HitTable),
) {
    let attacker = result.action.attacker;
    let recoil = match (ctx.arena.get(attacker), ctx.arena.get(target)) {
        (Some(a), t) => self_damage(a, t, &result.action.kind),
        (None, _) => 0,
    };

    let damage = blow_damage(ctx, swing, result.damage[0], target);
    let blow = Blow::from_attacker(ctx, tables.0, target, attacker).clustered();
    deliver_damage(ctx, target, damage, blow);

    let back = Blow::from_attacker(ctx, tables.1, attacker, target).clustered();
    self_inflicted(ctx, attacker, recoil, back);
}

pub(super) fn charge(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    let Some(target) = result.action.target.entity() else {
        return;
    };
    let swing = attack_roll(ctx, result, 0);
    if !swing.hit {
        return;
    }
    collide(ctx, result, &swing, target, (HitTable::Standard, HitTable::Standard));
    ctx.arena.queue_psr(target, 2, "charged");
    ctx.arena.queue_psr(result.action.attacker, 2, "charging");
}

pub(super) fn death_from_above(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    let Some(target) = result.action.target.entity() else {
        return;
    };
    let attacker = result.action.attacker;
    let swing = attack_roll(ctx, result, 0);
    let start = ctx.arena.get(attacker).and_then(|e| e.position());
    let landing = ctx.arena.get(target).and_then(|e| e.position());

    if swing.hit {
        collide(ctx, result, &swing, target, (HitTable::Punch, HitTable::Kick));
    }

    let (Some(start), Some(landing)) = (start, landing) else {
        return;
    };
    // the target is driven one hex on, away from the attacker
    let target_standing = ctx.arena.get(target).is_some_and(|e| !e.is_doomed());
    if let Some(direction) = start.direction_to(landing).filter(|_| target_standing) {
        let psr = swing.hit.then(|| PsrRequirement::new(2, "hit by death from above"));
        let outcome = ctx.services.displacement.displace(
            ctx.arena,
            target,
            landing,
            landing.translated(direction),
            psr,
            ctx.dice,
        );
        settle(ctx, target, outcome);
    }

    if ctx.arena.get(attacker).map_or(true, |e| e.is_doomed()) {
        return;
    }
    if swing.hit {
        let outcome = ctx.services.displacement.displace(
            ctx.arena,
            attacker,
            start,
            landing,
            Some(PsrRequirement::new(4, "death from above")),
            ctx.dice,
        );
        settle(ctx, attacker, outcome);
    } else {
        let outcome =
            ctx.services
                .displacement
                .displace(ctx.arena, attacker, start, landing, None, ctx.dice);
        if settle(ctx, attacker, outcome) {
            return;
        }
        if ctx.arena.get(attacker).is_some_and(|e| !e.is_prone()) {
            let outcome = ctx.services.displacement.fall(ctx.arena, attacker, 0, ctx.dice);
            settle(ctx, attacker, outcome);
        }
    }
}

pub(super) fn ram(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    let Some(target) = result.action.target.entity() else {
        return;
    };
    let swing = attack_roll(ctx, result, 0);
    if swing.hit {
        collide(ctx, result, &swing, target, (HitTable::Standard, HitTable::Standard));
    }
}

pub(super) fn airmech_ram(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    let Some(target) = result.action.target.entity() else {
        return;
    };
    let swing = attack_roll(ctx, result, 0);
    if swing.hit {
        collide(ctx, result, &swing, target, (HitTable::Standard, HitTable::Standard));
    } else {
        ctx.arena.queue_psr(result.action.attacker, 2, "missed airmech ram");
    }
}

pub(super) fn telemissile(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    if let Some(target) = result.action.target.entity() {
        let swing = attack_roll(ctx, result, 0);
        if swing.hit {
            let damage = blow_damage(ctx, &swing, result.damage[0], target);
            let blow = Blow::from_attacker(ctx, HitTable::Standard, target, result.action.attacker);
            deliver_damage(ctx, target, damage, blow);
        }
    }
    expend_missile(ctx, result.action.attacker);
}

/// A telemissile is spent whether it hit or not.
pub(super) fn expend_missile(ctx: &mut RoundContext<'_>, missile: EntityId) {
    info!(target: "hexbrawl::resolve", %missile, "telemissile expended");
    let reports = lifecycle::destroy(ctx, missile, "detonated", false, false);
    ctx.report_all(reports);
}
