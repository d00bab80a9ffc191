//! Physical attack resolution.
//!
//! The [`PhysicalResolver`] walks the round's pretreated results strictly in
//! queue order and settles each one against the arena as it is at that
//! moment. Everything the attack needed to know at declaration time (to-hit,
//! base damage, the attack roll) was fixed during pretreatment; resolution
//! only decides what the outcome does.
//!
//! # Flow
//!
//! For each result:
//! 1. A header is written when the attacker differs from the previous one.
//! 2. The attack kind picks an algorithm (an exhaustive `match`).
//! 3. The algorithm rolls each sub-attack through [`attack_roll`], then
//!    applies damage, displacement, grapples and piloting rolls.
//! 4. The target is flagged STRUCK, and kill credit is granted if this result
//!    doomed it.
//!
//! Mutual pairs (push, grapple, break grapple) are settled by whichever half
//! comes first; the other half is marked resolved and skipped.
//!
//! # Invariants
//!
//! - A result is settled at most once.
//! - Missing attackers and targets skip the result with a warning and no
//!   report.
//! - Building and fuel-tank targets never roll hit locations.

mod apply;
mod contact;
mod impact;
mod melee;

use tracing::{debug, info, warn};

use crate::action::{AttackAction, AttackKind, Target};
use crate::context::RoundContext;
use crate::damage::{apply_blow_rules, margin_of_success};
use crate::entity::{EntityId, StatusFlags};
use crate::queue::PhysicalResult;
use crate::report::{codes, Report};
use crate::tohit::ToHit;

pub use apply::Blow;
pub(crate) use apply::settle;

/// How one sub-attack went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swing {
    /// The attack connected
    pub hit: bool,
    /// 2d6 total rolled at pretreatment
    pub roll: i32,
    /// Target number (`i32::MIN` for automatic, `i32::MAX` for impossible)
    pub value: i32,
    /// Hit without a roll
    pub automatic: bool,
}

impl Swing {
    /// Margin of success, measured from at least 2.
    #[must_use]
    pub fn margin(&self) -> i32 {
        if self.automatic {
            0
        } else {
            margin_of_success(self.roll, self.value)
        }
    }
}

/// Settles pretreated physical attacks.
#[derive(Debug, Clone, Default)]
pub struct PhysicalResolver {
    last_attacker: Option<EntityId>,
}

impl PhysicalResolver {
    /// A resolver that has not written any header yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attacker of the most recent header.
    #[must_use]
    pub fn last_attacker(&self) -> Option<EntityId> {
        self.last_attacker
    }

    /// Resolves every unsettled result in order.
    pub fn resolve_all(&mut self, ctx: &mut RoundContext<'_>, results: &mut [PhysicalResult]) {
        info!(target: "hexbrawl::resolve", count = results.len(), "resolving physical attacks");
        for index in 0..results.len() {
            if results[index].resolved {
                continue;
            }
            self.resolve_one(ctx, results, index);
        }
        self.last_attacker = None;
    }

    /// Writes the attacker header if `attacker` differs from the last one.
    pub(crate) fn announce(&mut self, ctx: &mut RoundContext<'_>, attacker: EntityId) {
        if self.last_attacker == Some(attacker) {
            return;
        }
        self.last_attacker = Some(attacker);
        let name = name_of(ctx, attacker);
        ctx.report(Report::visible(codes::ATTACK_HEADER, attacker).add(name));
    }

    fn resolve_one(
        &mut self,
        ctx: &mut RoundContext<'_>,
        results: &mut [PhysicalResult],
        index: usize,
    ) {
        let action = results[index].action;
        results[index].resolved = true;

        if ctx.arena.get(action.attacker).is_none() {
            warn!(target: "hexbrawl::resolve", attacker = %action.attacker, kind = ?action.kind, "attacker missing, skipping");
            return;
        }
        let was_doomed = match action.target {
            Target::Entity { id } => match ctx.arena.get(id) {
                Some(target) => target.is_doomed(),
                None => {
                    warn!(target: "hexbrawl::resolve", attacker = %action.attacker, target = %id, "target missing, skipping");
                    return;
                }
            },
            _ => false,
        };

        self.announce(ctx, action.attacker);
        debug!(target: "hexbrawl::resolve", attacker = %action.attacker, kind = ?action.kind, target = ?action.target, "resolving");

        match action.target {
            Target::Building { building, coords } | Target::FuelTank { building, coords }
                if !matches!(action.kind, AttackKind::LayExplosives) =>
            {
                apply::structure_attack(ctx, &results[index], building, coords);
                if matches!(action.kind, AttackKind::Telemissile) {
                    impact::expend_missile(ctx, action.attacker);
                }
            }
            Target::OffBoard { .. } => {
                attack_roll(ctx, &results[index], 0);
                if matches!(action.kind, AttackKind::Telemissile) {
                    impact::expend_missile(ctx, action.attacker);
                }
            }
            _ => self.dispatch(ctx, results, index),
        }

        self.after_result(ctx, &action, was_doomed);
    }

    fn dispatch(&mut self, ctx: &mut RoundContext<'_>, results: &mut [PhysicalResult], index: usize) {
        let result = results[index].clone();
        match result.action.kind {
            AttackKind::Punch { .. } => melee::punch(ctx, &result),
            AttackKind::Kick { .. } => melee::kick(ctx, &result),
            AttackKind::Trip => melee::trip(ctx, &result),
            AttackKind::Club { zweihander } => melee::club(ctx, &result, zweihander),
            AttackKind::Thrash => melee::thrash(ctx, &result),
            AttackKind::BrushOff { .. } => melee::brush_off(ctx, &result),
            AttackKind::JumpJet { .. } => melee::jump_jet(ctx, &result),
            AttackKind::Vibroclaw | AttackKind::ProtoMechPhysical => melee::strike(ctx, &result),
            AttackKind::Push => contact::push(self, ctx, results, index),
            AttackKind::Grapple { side } => contact::grapple(self, ctx, results, index, side),
            AttackKind::BreakGrapple => contact::break_grapple(self, ctx, results, index),
            AttackKind::LayExplosives => contact::lay_explosives(ctx, &result),
            AttackKind::Charge { .. } => impact::charge(ctx, &result),
            AttackKind::DeathFromAbove => impact::death_from_above(ctx, &result),
            AttackKind::Ram { .. } => impact::ram(ctx, &result),
            AttackKind::AirmechRam { .. } => impact::airmech_ram(ctx, &result),
            AttackKind::Telemissile => impact::telemissile(ctx, &result),
            AttackKind::Searchlight => {
                debug!(target: "hexbrawl::resolve", attacker = %result.action.attacker, "searchlight already resolved at pretreatment");
            }
        }
    }

    /// STRUCK flag and kill credit.
    pub(super) fn after_result(&self, ctx: &mut RoundContext<'_>, action: &AttackAction, was_doomed: bool) {
        let Some(target_id) = action.target.entity() else {
            return;
        };
        let attacker_name = name_of(ctx, action.attacker);
        let Some(target) = ctx.arena.get_mut(target_id) else {
            return;
        };
        target.status.insert(StatusFlags::STRUCK);
        if !was_doomed && target.is_doomed() && !target.gave_kill_credit {
            target.kill_credit = Some(action.attacker);
            target.gave_kill_credit = true;
            let victim = target.name.clone();
            info!(target: "hexbrawl::resolve", attacker = %action.attacker, victim = %target_id, "kill credited");
            ctx.report(
                Report::visible(codes::KILL_CREDIT, target_id)
                    .add(attacker_name)
                    .add(victim)
                    .with_indent(1),
            );
        }
        ctx.touch(target_id);
    }
}

/// Display name of a unit, empty if it is gone.
pub(crate) fn name_of(ctx: &RoundContext<'_>, id: EntityId) -> String {
    ctx.arena.get(id).map(|e| e.name.clone()).unwrap_or_default()
}

/// Name of whatever `target` points at, for report lines.
fn target_label(ctx: &RoundContext<'_>, target: Target) -> String {
    match target {
        Target::Entity { id } => ctx.arena.get(id).map(|e| e.name.clone()).unwrap_or_default(),
        Target::Building { building, coords } | Target::FuelTank { building, coords } => ctx
            .arena
            .board()
            .building(building)
            .map_or_else(|| coords.to_string(), |b| format!("{} ({coords})", b.name)),
        Target::OffBoard { coords } => coords.to_string(),
    }
}

/// Reports and judges one sub-attack from its pretreated roll.
pub(crate) fn attack_roll(ctx: &mut RoundContext<'_>, result: &PhysicalResult, slot: usize) -> Swing {
    let action = &result.action;
    let mut label = action.kind.label().to_owned();
    if result.sides().len() > 1 {
        label.push_str(if slot == 0 { " (left arm)" } else { " (right arm)" });
    }
    let target = target_label(ctx, action.target);
    ctx.report(
        Report::visible(codes::ATTACK, action.attacker)
            .add(label)
            .add(target)
            .with_indent(1)
            .with_newlines(0),
    );

    let to_hit = &result.to_hit[slot];
    let roll = result.roll[slot].total;
    let swing = match to_hit {
        ToHit::Impossible(reason) => {
            ctx.report(Report::visible(codes::ATTACK_IMPOSSIBLE, action.attacker).add(reason.as_str()));
            Swing {
                hit: false,
                roll,
                value: to_hit.value(),
                automatic: false,
            }
        }
        ToHit::AutomaticSuccess(reason) => {
            ctx.report(Report::visible(codes::ATTACK_AUTOMATIC, action.attacker).add(reason.as_str()));
            Swing {
                hit: true,
                roll,
                value: to_hit.value(),
                automatic: true,
            }
        }
        ToHit::Value { value, .. } => {
            let hit = to_hit.hits(roll);
            ctx.report(
                Report::visible(codes::ATTACK_ROLL, action.attacker)
                    .add(*value)
                    .add(roll)
                    .with_newlines(0),
            );
            let verdict = if hit { codes::ATTACK_HIT } else { codes::ATTACK_MISS };
            ctx.report(Report::visible(verdict, action.attacker));
            Swing {
                hit,
                roll,
                value: *value,
                automatic: false,
            }
        }
    };
    debug!(
        target: "hexbrawl::resolve",
        attacker = %action.attacker,
        kind = ?action.kind,
        roll,
        to_hit = %to_hit,
        hit = swing.hit,
        "attack roll"
    );
    swing
}

/// Damage after the optional glancing and direct blow rules.
pub(crate) fn blow_damage(
    ctx: &mut RoundContext<'_>,
    swing: &Swing,
    damage: u32,
    target: EntityId,
) -> u32 {
    if swing.automatic || damage == 0 {
        return damage;
    }
    let options = ctx.options;
    let blow = apply_blow_rules(
        damage,
        swing.roll,
        swing.value,
        options.glancing_blows,
        options.direct_blows,
    );
    if blow.glancing {
        ctx.report(
            Report::visible(codes::GLANCING_BLOW, target)
                .add(blow.damage)
                .with_indent(2),
        );
    }
    if blow.direct_bonus > 0 {
        ctx.report(
            Report::visible(codes::DIRECT_BLOW, target)
                .add(blow.direct_bonus)
                .with_indent(2),
        );
    }
    blow.damage
}
