//! Attacks that move or bind units rather than damage them: push, grapple,
//! break grapple, and laying explosives.
//!
//! Push, grapple and break grapple can be answered in kind by the target in
//! the same round. Whichever half of such a pair is reached first settles
//! both halves and marks the other one resolved.

use std::mem::discriminant;

use tracing::debug;

use crate::action::{AttackAction, AttackKind, Target};
use crate::context::RoundContext;
use crate::entity::{EntityId, GrappleSide};
use crate::queue::PhysicalResult;
use crate::report::{codes, Report};
use crate::services::PsrRequirement;

use super::apply::settle;
use super::{attack_roll, name_of, PhysicalResolver, Swing};

/// Index of the unsettled result in which `target` answers `index` in kind.
fn find_answer(results: &[PhysicalResult], index: usize, partner: EntityId) -> Option<usize> {
    let action = results[index].action;
    (0..results.len()).find(|&j| {
        let other = &results[j];
        j != index
            && !other.resolved
            && other.action.attacker == partner
            && discriminant(&other.action.kind) == discriminant(&action.kind)
            && match action.kind {
                AttackKind::BreakGrapple => true,
                _ => other.action.target == Target::Entity { id: action.attacker },
            }
    })
}

/// The answering half of a mutual pair: rolled, its outcome not yet applied.
struct Answer {
    action: AttackAction,
    swing: Swing,
    was_doomed: bool,
}

impl Answer {
    /// Rolls result `index` under its own header and marks it resolved.
    fn roll(
        resolver: &mut PhysicalResolver,
        ctx: &mut RoundContext<'_>,
        results: &mut [PhysicalResult],
        index: usize,
    ) -> Self {
        results[index].resolved = true;
        let other = results[index].clone();
        let was_doomed = other
            .action
            .target
            .entity()
            .and_then(|id| ctx.arena.get(id))
            .is_some_and(|e| e.is_doomed());
        resolver.announce(ctx, other.action.attacker);
        let swing = attack_roll(ctx, &other, 0);
        Self {
            action: other.action,
            swing,
            was_doomed,
        }
    }

    /// Flags the answer's target once the pair's outcome is applied.
    fn finish(&self, resolver: &PhysicalResolver, ctx: &mut RoundContext<'_>) {
        resolver.after_result(ctx, &self.action, self.was_doomed);
    }
}

pub(super) fn push(
    resolver: &mut PhysicalResolver,
    ctx: &mut RoundContext<'_>,
    results: &mut [PhysicalResult],
    index: usize,
) {
    let result = results[index].clone();
    let attacker = result.action.attacker;
    let Some(target) = result.action.target.entity() else {
        return;
    };
    let answer = find_answer(results, index, target);
    let swing = attack_roll(ctx, &result, 0);

    let Some(answer) = answer else {
        if swing.hit {
            shove(ctx, attacker, target);
        }
        return;
    };
    let other = Answer::roll(resolver, ctx, results, answer);
    match (swing.hit, other.swing.hit) {
        (true, true) => {
            debug!(target: "hexbrawl::resolve", %attacker, %target, "pushes cancel out");
            let a = name_of(ctx, attacker);
            let b = name_of(ctx, target);
            ctx.report(
                Report::visible(codes::MUTUAL_PUSH, attacker)
                    .add(a)
                    .add(b)
                    .with_indent(2),
            );
            ctx.arena.queue_psr(attacker, 0, "mutual push");
            ctx.arena.queue_psr(target, 0, "mutual push");
        }
        (true, false) => shove(ctx, attacker, target),
        (false, true) => shove(ctx, target, attacker),
        (false, false) => {}
    }
    other.finish(resolver, ctx);
}

/// Moves `victim` one hex directly away from `pusher`.
fn shove(ctx: &mut RoundContext<'_>, pusher: EntityId, victim: EntityId) {
    let from = ctx.arena.get(pusher).and_then(|e| e.position());
    let at = ctx.arena.get(victim).and_then(|e| e.position());
    let (Some(from), Some(at)) = (from, at) else {
        return;
    };
    let Some(direction) = from.direction_to(at) else {
        return;
    };
    let to = at.translated(direction);
    let outcome = ctx.services.displacement.displace(
        ctx.arena,
        victim,
        at,
        to,
        Some(PsrRequirement::new(0, "pushed")),
        ctx.dice,
    );
    settle(ctx, victim, outcome);
}

pub(super) fn grapple(
    resolver: &mut PhysicalResolver,
    ctx: &mut RoundContext<'_>,
    results: &mut [PhysicalResult],
    index: usize,
    side: GrappleSide,
) {
    let result = results[index].clone();
    let attacker = result.action.attacker;
    let Some(target) = result.action.target.entity() else {
        return;
    };
    let answer = find_answer(results, index, target);
    let swing = attack_roll(ctx, &result, 0);

    let Some(answer) = answer else {
        if swing.hit {
            bind(ctx, attacker, target, side);
        }
        return;
    };
    let answer_side = match results[answer].action.kind {
        AttackKind::Grapple { side } => side,
        _ => side,
    };
    let other = Answer::roll(resolver, ctx, results, answer);
    match (swing.hit, other.swing.hit) {
        (true, true) if other.swing.margin() > swing.margin() => {
            bind(ctx, target, attacker, answer_side);
        }
        (true, _) => bind(ctx, attacker, target, side),
        (false, true) => bind(ctx, target, attacker, answer_side),
        (false, false) => {}
    }
    other.finish(resolver, ctx);
}

/// Links `holder` and `held`; the holder grips with `side`.
fn bind(ctx: &mut RoundContext<'_>, holder: EntityId, held: EntityId, side: GrappleSide) {
    let free = |id: EntityId| {
        ctx.arena
            .get(id)
            .is_some_and(|e| e.is_alive() && e.links.grappled.is_none())
    };
    if !free(holder) || !free(held) {
        debug!(target: "hexbrawl::resolve", %holder, %held, "grapple skipped, a unit is already bound");
        return;
    }
    for (id, partner, is_holder) in [(holder, held, true), (held, holder, false)] {
        if let Some(entity) = ctx.arena.get_mut(id) {
            entity.links.grappled = Some(partner);
            entity.links.grapple_holder = is_holder;
            entity.links.grapple_side = Some(side);
        }
        ctx.touch(id);
    }
    let a = name_of(ctx, holder);
    let b = name_of(ctx, held);
    ctx.report(
        Report::visible(codes::GRAPPLED, holder)
            .add(a)
            .add(b)
            .with_indent(2),
    );
}

pub(super) fn break_grapple(
    resolver: &mut PhysicalResolver,
    ctx: &mut RoundContext<'_>,
    results: &mut [PhysicalResult],
    index: usize,
) {
    let result = results[index].clone();
    let attacker = result.action.attacker;
    let partner = ctx.arena.get(attacker).and_then(|e| e.links.grappled);
    let answer = partner.and_then(|p| find_answer(results, index, p));
    let mut freed = attack_roll(ctx, &result, 0).hit;
    let answer = answer.map(|index| Answer::roll(resolver, ctx, results, index));
    freed |= answer.as_ref().is_some_and(|a| a.swing.hit);
    if freed {
        if let Some(partner) = partner {
            release(ctx, attacker, partner);
        }
    }
    if let Some(answer) = answer {
        answer.finish(resolver, ctx);
    }
}

/// Unlinks a grappled pair.
fn release(ctx: &mut RoundContext<'_>, attacker: EntityId, partner: EntityId) {
    for (id, other) in [(attacker, partner), (partner, attacker)] {
        if let Some(entity) = ctx.arena.get_mut(id) {
            if entity.links.grappled == Some(other) {
                entity.links.grappled = None;
                entity.links.grapple_holder = false;
                entity.links.grapple_side = None;
            }
        }
        ctx.touch(id);
    }
    let a = name_of(ctx, attacker);
    let b = name_of(ctx, partner);
    ctx.report(
        Report::visible(codes::GRAPPLE_BROKEN, attacker)
            .add(a)
            .add(b)
            .with_indent(2),
    );
}

pub(super) fn lay_explosives(ctx: &mut RoundContext<'_>, result: &PhysicalResult) {
    let swing = attack_roll(ctx, result, 0);
    let Some((building, _)) = result.action.target.building() else {
        return;
    };
    if !swing.hit {
        return;
    }
    let attacker = result.action.attacker;
    let name = name_of(ctx, attacker);
    let Some(structure) = ctx.arena.board_mut().building_mut(building) else {
        debug!(target: "hexbrawl::resolve", %building, "explosives target gone");
        return;
    };
    structure.explosives += result.damage[0];
    let total = structure.explosives;
    let building_name = structure.name.clone();
    ctx.report(
        Report::visible(codes::EXPLOSIVES_SET, attacker)
            .add(name)
            .add(building_name)
            .add(total)
            .with_indent(2),
    );
}
