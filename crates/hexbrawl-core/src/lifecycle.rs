//! Unit destruction and everything that hangs off it.
//!
//! [`destroy`] marks a unit DOOMED and unwinds its relationships in a fixed
//! order:
//!
//! 1. Crews it picked up die with it.
//! 2. Units it guided lose their controller.
//! 3. Passengers try to escape, in manifest order.
//! 4. If it was itself a passenger, it leaves its carrier.
//! 5. Tow, grapple and swarm partners are released.
//! 6. Heavy wrecks roughen their hex (optional rule).
//!
//! Every unit touched is marked for a visibility update. The call is
//! idempotent: a unit that is already doomed produces nothing.

use hexfield::MovementMode;
use tracing::{debug, info};

use crate::arena::Arena;
use crate::context::RoundContext;
use crate::entity::{Entity, EntityId, EntityTag, RemovalCondition, StatusFlags};
use crate::report::{codes, Report};

/// Escape target number for passengers of `carrier`, `None` when escape is
/// impossible.
fn escape_target(carrier: &Entity) -> Option<i32> {
    let airborne = carrier.elevation > 0;
    match carrier.movement_mode {
        MovementMode::Naval => Some(7),
        MovementMode::Vtol if airborne => Some(10),
        MovementMode::Aerodyne | MovementMode::Spheroid if airborne => None,
        _ => Some(3),
    }
}

/// Rough levels a wreck of this weight leaves behind.
fn wreckage_levels(tonnage: u32) -> i32 {
    match tonnage {
        70.. => 2,
        30..=69 => 1,
        _ => 0,
    }
}

/// Destroys `id` and runs the cascade. Returns the reports in order.
///
/// Missing, doomed and destroyed units are left alone.
pub fn destroy(
    ctx: &mut RoundContext<'_>,
    id: EntityId,
    reason: &str,
    survivable: bool,
    salvageable: bool,
) -> Vec<Report> {
    let mut reports = Vec::new();
    let Some(entity) = ctx.arena.get_mut(id) else {
        debug!(target: "hexbrawl::lifecycle", entity = %id, "destroy: no such unit");
        return reports;
    };
    if entity.is_doomed() {
        return reports;
    }

    entity.status.insert(StatusFlags::DOOMED);
    entity.removal = Some(if salvageable {
        RemovalCondition::Salvageable
    } else {
        RemovalCondition::Devastated
    });
    let name = entity.name.clone();
    let links = entity.links.clone();
    info!(target: "hexbrawl::lifecycle", entity = %id, reason, survivable, salvageable, "unit destroyed");
    reports.push(
        Report::visible(codes::DESTROYED, id)
            .add(name.as_str())
            .add(reason)
            .with_newlines(2),
    );
    ctx.touch(id);

    // Rescued crews go down with the ship.
    for crew in links.picked_up_crew {
        let Some(crew_name) = ctx.arena.get(crew).map(|c| c.name.clone()) else {
            debug!(target: "hexbrawl::lifecycle", entity = %crew, "picked-up crew missing");
            continue;
        };
        reports.push(Report::visible(codes::CREW_KILLED, crew).add(crew_name).with_indent(1));
        reports.extend(destroy(ctx, crew, "rescuer destroyed", false, false));
        if let Some(unit) = ctx.arena.get_mut(crew) {
            unit.status.insert(StatusFlags::REMOVED);
        }
    }

    for controlled in links.controlled {
        let Some(unit) = ctx.arena.get_mut(controlled) else {
            debug!(target: "hexbrawl::lifecycle", entity = %controlled, "controlled unit missing");
            continue;
        };
        unit.links.controller = None;
        reports.push(
            Report::visible(codes::CONTROL_LOST, controlled)
                .add(unit.name.as_str())
                .with_indent(1),
        );
        ctx.touch(controlled);
    }
    if let Some(controller) = links.controller.and_then(|c| ctx.arena.get_mut(c)) {
        controller.links.controlled.retain(|&c| c != id);
    }
    if let Some(entity) = ctx.arena.get_mut(id) {
        entity.links.picked_up_crew.clear();
        entity.links.controlled.clear();
        entity.links.controller = None;
    }

    for passenger in links.loaded {
        reports.extend(evacuate(ctx, id, passenger, survivable));
    }

    if let Some(carrier) = links.transported_by {
        reports.extend(leave_carrier(ctx, id, carrier));
    }

    reports.extend(release_partners(ctx, id, &name));

    if ctx.options.battlefield_wreckage {
        reports.extend(leave_wreckage(ctx, id));
    }
    reports
}

/// One passenger's attempt to get out of a destroyed carrier.
fn evacuate(
    ctx: &mut RoundContext<'_>,
    carrier_id: EntityId,
    passenger: EntityId,
    survivable: bool,
) -> Vec<Report> {
    let mut reports = Vec::new();
    if let Some(carrier) = ctx.arena.get_mut(carrier_id) {
        carrier.links.loaded.retain(|&p| p != passenger);
    }
    let Some(unit) = ctx.arena.get_mut(passenger) else {
        debug!(target: "hexbrawl::lifecycle", entity = %passenger, "passenger missing");
        return reports;
    };
    unit.links.transported_by = None;
    let passenger_name = unit.name.clone();
    ctx.touch(passenger);

    let Some(carrier) = ctx.arena.get(carrier_id) else {
        return reports;
    };
    let carrier_at = carrier.position();
    let facing = carrier.facing;
    let ejected = carrier.status.contains(StatusFlags::CREW_EJECTED);
    let needs = escape_target(carrier);

    let needs = match needs {
        Some(needs) if survivable && !ejected => needs,
        _ => {
            let report = Report::visible(codes::PASSENGER_KILLED, passenger).add(passenger_name);
            reports.extend(lose_passenger(ctx, passenger, report));
            return reports;
        }
    };

    let roll = ctx.dice.roll_2d6();
    if roll.total < needs {
        let report = Report::visible(codes::ESCAPE_FAILED, passenger)
            .add(passenger_name)
            .add(needs)
            .add(roll.total);
        reports.extend(lose_passenger(ctx, passenger, report));
        return reports;
    }

    let blocked = match (carrier_at, ctx.arena.get(passenger)) {
        (Some(at), Some(unit)) => {
            ctx.arena.is_prohibited(unit, at) || ctx.arena.stacking_violation(unit, at).is_some()
        }
        _ => true,
    };
    let Some(at) = carrier_at.filter(|_| !blocked) else {
        let report = Report::visible(codes::ESCAPE_NO_ROOM, passenger).add(passenger_name);
        reports.extend(lose_passenger(ctx, passenger, report));
        return reports;
    };

    ctx.services
        .transport
        .unload(ctx.arena, carrier_id, passenger, at, facing, 0);
    reports.push(
        Report::visible(codes::ESCAPED, passenger)
            .add(passenger_name)
            .add(needs)
            .add(roll.total)
            .with_indent(1),
    );
    reports
}

fn lose_passenger(ctx: &mut RoundContext<'_>, passenger: EntityId, report: Report) -> Vec<Report> {
    debug!(target: "hexbrawl::lifecycle", entity = %passenger, code = report.id, "passenger lost");
    let mut reports = vec![report.with_indent(1)];
    reports.extend(destroy(ctx, passenger, "carrier destroyed", false, false));
    reports
}

/// Takes a destroyed passenger off its carrier.
fn leave_carrier(ctx: &mut RoundContext<'_>, id: EntityId, carrier_id: EntityId) -> Vec<Report> {
    let mut reports = Vec::new();
    let Some(carrier) = ctx.arena.get(carrier_id) else {
        debug!(target: "hexbrawl::lifecycle", entity = %carrier_id, "carrier missing");
        if let Some(entity) = ctx.arena.get_mut(id) {
            entity.links.transported_by = None;
        }
        return reports;
    };
    let carrier_name = carrier.name.clone();
    let placement = carrier.position().map(|at| (at, carrier.facing));

    match placement {
        Some((at, facing)) => {
            ctx.services.transport.unload(ctx.arena, carrier_id, id, at, facing, 0);
        }
        None => {
            if let Some(carrier) = ctx.arena.get_mut(carrier_id) {
                carrier.links.loaded.retain(|&p| p != id);
            }
            if let Some(entity) = ctx.arena.get_mut(id) {
                entity.links.transported_by = None;
            }
        }
    }
    let name = name_of(ctx.arena, id);
    reports.push(
        Report::visible(codes::UNLOADED, id)
            .add(name)
            .add(carrier_name.as_str())
            .with_indent(1),
    );
    ctx.touch(carrier_id);

    if let Some(carrier) = ctx.arena.get_mut(carrier_id) {
        if carrier.tag() == EntityTag::FighterSquadron
            && carrier.links.loaded.is_empty()
            && !carrier.is_doomed()
        {
            carrier.status.insert(StatusFlags::DOOMED);
            carrier.removal = Some(RemovalCondition::Devastated);
            reports.push(
                Report::visible(codes::SQUADRON_EMPTY, carrier_id)
                    .add(carrier_name)
                    .with_indent(1),
            );
        }
    }
    reports
}

fn name_of(arena: &Arena, id: EntityId) -> String {
    arena.get(id).map(|e| e.name.clone()).unwrap_or_default()
}

/// Severs tows and frees grapple and swarm partners.
fn release_partners(ctx: &mut RoundContext<'_>, id: EntityId, name: &str) -> Vec<Report> {
    let mut reports = Vec::new();
    let Some(links) = ctx.arena.get(id).map(|e| e.links.clone()) else {
        return reports;
    };

    if let Some(trailer) = links.towing {
        ctx.services.transport.disconnect_tow(ctx.arena, id, trailer);
        let trailer_name = name_of(ctx.arena, trailer);
        reports.push(
            Report::visible(codes::TOW_SEVERED, id)
                .add(name)
                .add(trailer_name)
                .with_indent(1),
        );
        ctx.touch(trailer);
    }
    if let Some(tractor) = links.towed_by {
        ctx.services.transport.disconnect_tow(ctx.arena, tractor, id);
        let tractor_name = name_of(ctx.arena, tractor);
        reports.push(
            Report::visible(codes::TOW_SEVERED, id)
                .add(tractor_name)
                .add(name)
                .with_indent(1),
        );
        ctx.touch(tractor);
    }

    if let Some(partner) = links.grappled {
        match ctx.arena.get_mut(partner) {
            Some(other) => {
                other.links.grappled = None;
                other.links.grapple_holder = false;
                other.links.grapple_side = None;
                reports.push(
                    Report::visible(codes::GRAPPLE_RELEASED, partner)
                        .add(other.name.as_str())
                        .with_indent(1),
                );
                ctx.touch(partner);
            }
            None => debug!(target: "hexbrawl::lifecycle", entity = %partner, "grapple partner missing"),
        }
    }

    if let Some(swarmer) = links.swarm_attacker {
        match ctx.arena.get_mut(swarmer) {
            Some(other) => {
                other.links.swarm_target = None;
                other
                    .status
                    .remove(StatusFlags::DONE | StatusFlags::UNLOADED_THIS_TURN);
                reports.push(
                    Report::visible(codes::SWARM_RELEASED, swarmer)
                        .add(other.name.as_str())
                        .add(name)
                        .with_indent(1),
                );
                ctx.touch(swarmer);
            }
            None => debug!(target: "hexbrawl::lifecycle", entity = %swarmer, "swarming unit missing"),
        }
    }
    if let Some(target) = links.swarm_target {
        if let Some(other) = ctx.arena.get_mut(target) {
            other.links.swarm_attacker = None;
            ctx.touch(target);
        }
    }

    if let Some(entity) = ctx.arena.get_mut(id) {
        let own = &mut entity.links;
        own.towing = None;
        own.towed_by = None;
        own.grappled = None;
        own.grapple_holder = false;
        own.grapple_side = None;
        own.swarm_attacker = None;
        own.swarm_target = None;
    }
    reports
}

/// Roughens the hex a heavy non-infantry wreck dies in.
fn leave_wreckage(ctx: &mut RoundContext<'_>, id: EntityId) -> Vec<Report> {
    let Some(entity) = ctx.arena.get(id) else {
        return Vec::new();
    };
    let Some(at) = entity.position() else {
        return Vec::new();
    };
    if entity.is_infantry() {
        return Vec::new();
    }
    let levels = wreckage_levels(entity.tonnage);
    if levels == 0 {
        return Vec::new();
    }
    match ctx.arena.board_mut().add_wreckage(at, levels) {
        Ok(true) => vec![Report::public(codes::WRECKAGE)
            .add(at.to_string())
            .with_indent(1)],
        Ok(false) => Vec::new(),
        Err(err) => {
            debug!(target: "hexbrawl::lifecycle", entity = %id, error = %err, "no wreckage");
            Vec::new()
        }
    }
}
