//! End-to-end tests of a physical phase through the [`Engine`].
//!
//! Dice are scripted so every roll below is known: attack rolls are drawn at
//! pretreatment in queue order, then hit locations and piloting rolls during
//! resolution.

use hexfield::{BuildingClass, Coords};

use crate::action::{ArmSide, AttackAction, AttackKind, LegSide, Target};
use crate::config::RuleOptions;
use crate::engine::Engine;
use crate::entity::{
    Entity, EntityId, EntityInner, EntityTag, GrappleSide, Location, MechComponents,
    RemovalCondition, StatusFlags,
};
use crate::report::codes;
use crate::services::{Packet, StandardTransport, TransportOps};

use super::helpers::{
    codes_of, count_code, duel, quiet_engine, scripted_engine, spawn_apc, spawn_mech, spawn_squad,
};

fn total_armor(entity: &Entity) -> u32 {
    entity
        .locations
        .values()
        .map(|s| s.armor + s.rear_armor)
        .sum()
}

fn punch(attacker: EntityId, target: EntityId) -> AttackAction {
    AttackAction::new(attacker, target, AttackKind::Punch { arm: ArmSide::Left })
}

// =============================================================================
// Single Attacks
// =============================================================================

#[test]
fn test_punch_hits_left_arm() {
    let mut d = duel();
    d.arena.get_mut(d.attacker).unwrap().piloting = 6;
    // attack roll 4+5, then punch table 1 (left arm)
    let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [4, 5, 1]);

    engine.declare(punch(d.attacker, d.defender));
    assert_eq!(engine.pretreat(), 1);
    assert_eq!(engine.results()[0].to_hit[0].value(), 6);
    engine.resolve_physical_attacks();

    let defender = engine.arena().get(d.defender).unwrap();
    assert_eq!(defender.location(Location::LeftArm).unwrap().armor, 5);
    assert!(defender.status.contains(StatusFlags::STRUCK));

    let ids = codes_of(engine.reports().reports());
    let at = ids.iter().position(|&c| c == codes::HIT_LOCATION).unwrap();
    assert_eq!(ids[at + 1], codes::DAMAGE);
    assert_eq!(ids[0], codes::ATTACK_HEADER);
    assert!(ids.contains(&codes::ATTACK_HIT));
}

#[test]
fn test_missed_punch_does_nothing() {
    let d = duel();
    let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [1, 1]);
    let before = total_armor(engine.arena().get(d.defender).unwrap());

    engine.declare(punch(d.attacker, d.defender));
    engine.pretreat();
    engine.resolve_physical_attacks();

    assert_eq!(total_armor(engine.arena().get(d.defender).unwrap()), before);
    assert_eq!(count_code(engine.reports().reports(), codes::ATTACK_MISS), 1);
    assert_eq!(count_code(engine.reports().reports(), codes::DAMAGE), 0);
}

#[test]
fn test_glancing_blow_halves_damage() {
    let mut d = duel();
    d.arena.get_mut(d.attacker).unwrap().piloting = 6;
    let options = RuleOptions::default().with_glancing_blows(true);
    // roll 3+3 equals the target number
    let (mut engine, _) = scripted_engine(d.arena, options, [3, 3, 1]);

    engine.declare(punch(d.attacker, d.defender));
    engine.pretreat();
    engine.resolve_physical_attacks();

    let reports = engine.reports().reports();
    assert_eq!(count_code(reports, codes::GLANCING_BLOW), 1);
    let arm = engine
        .arena()
        .get(d.defender)
        .unwrap()
        .location(Location::LeftArm)
        .unwrap()
        .armor;
    assert_eq!(arm, 8);
}

#[test]
fn test_building_absorbs_part_of_a_punch() {
    let mut d = duel();
    let hall = d
        .arena
        .board_mut()
        .add_building("Hall", BuildingClass::Medium, &[(Coords::new(4, 3), 2)]);
    let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [6, 6, 1]);

    engine.declare(punch(d.attacker, d.defender));
    engine.pretreat();
    engine.resolve_physical_attacks();

    // CF 40 soaks 4 of the 5 points
    assert_eq!(count_code(engine.reports().reports(), codes::BUILDING_ABSORBS), 1);
    let defender = engine.arena().get(d.defender).unwrap();
    assert_eq!(defender.location(Location::LeftArm).unwrap().armor, 9);
    let cf = engine
        .arena()
        .board()
        .building(hall)
        .and_then(|b| b.hex(Coords::new(4, 3)))
        .map(|h| h.cf)
        .unwrap();
    assert_eq!(cf, 36);
}

#[test]
fn test_charge_damages_both_and_queues_rolls() {
    let d = duel();
    let (mut engine, _) =
        scripted_engine(d.arena, RuleOptions::default(), [6, 6, 4, 3, 4, 3, 4, 3]);
    let attacker_before = total_armor(engine.arena().get(d.attacker).unwrap());
    let defender_before = total_armor(engine.arena().get(d.defender).unwrap());

    let charge = AttackAction::new(d.attacker, d.defender, AttackKind::Charge { hexes_moved: 3 });
    assert_eq!(engine.carry_over([charge]), 1);
    engine.pretreat();
    engine.resolve_physical_attacks();

    // 50 tons over 2 effective hexes deals 10; the defender's 50 tons recoil 5
    let defender = engine.arena().get(d.defender).unwrap();
    let attacker = engine.arena().get(d.attacker).unwrap();
    assert_eq!(defender_before - total_armor(defender), 10);
    assert_eq!(attacker_before - total_armor(attacker), 5);
    assert_eq!(engine.arena().pending_psrs().len(), 2);
}

#[test]
fn test_kick_forces_a_piloting_roll_at_phase_end() {
    let d = duel();
    // kick roll 6+6, kick table 1 (right leg), then a failed roll 1+1
    let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [6, 6, 1, 1, 1]);

    engine.declare(AttackAction::new(
        d.attacker,
        d.defender,
        AttackKind::Kick { leg: LegSide::Right },
    ));
    engine.pretreat();
    engine.resolve_physical_attacks();
    assert_eq!(engine.arena().pending_psrs().len(), 1);

    engine.end_physical_phase();

    let defender = engine.arena().get(d.defender).unwrap();
    assert!(defender.is_prone());
    assert!(!defender.status.contains(StatusFlags::STRUCK));
    let reports = engine.reports().reports();
    assert_eq!(count_code(reports, codes::PSR_ROLL), 1);
    assert_eq!(count_code(reports, codes::PSR_FALL), 1);
    assert!(engine.arena().pending_psrs().is_empty());
}

#[test]
fn test_lay_explosives_arms_the_building() {
    let mut d = duel();
    let at = Coords::new(8, 8);
    let depot = d
        .arena
        .board_mut()
        .add_building("Depot", BuildingClass::Light, &[(at, 1)]);
    let sappers = spawn_squad(&mut d.arena, d.players[0], Some(at));
    if let Some(inf) = d.arena.get_mut(sappers).and_then(Entity::as_infantry_mut) {
        inf.explosive_damage = 6;
    }
    let (mut engine, _) = quiet_engine(d.arena, RuleOptions::default());

    engine.declare(AttackAction {
        attacker: sappers,
        target: Target::Building {
            building: depot,
            coords: at,
        },
        kind: AttackKind::LayExplosives,
    });
    engine.pretreat();
    engine.resolve_physical_attacks();

    let building = engine.arena().board().building(depot).unwrap();
    assert_eq!(building.explosives, 6);
    assert_eq!(count_code(engine.reports().reports(), codes::EXPLOSIVES_SET), 1);
}

// =============================================================================
// Mutual Pairs
// =============================================================================

fn mutual_push(defender_first: bool) -> (Engine, EntityId) {
    let d = duel();
    let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [6, 6, 6, 6]);
    let ab = AttackAction::new(d.attacker, d.defender, AttackKind::Push);
    let ba = AttackAction::new(d.defender, d.attacker, AttackKind::Push);
    if defender_first {
        engine.declare(ba);
        engine.declare(ab);
    } else {
        engine.declare(ab);
        engine.declare(ba);
    }
    engine.pretreat();
    engine.resolve_physical_attacks();
    (engine, d.attacker)
}

#[test]
fn test_mutual_push_resolves_each_side_once() {
    for defender_first in [false, true] {
        let (engine, attacker) = mutual_push(defender_first);
        let reports = engine.reports().reports();
        assert_eq!(count_code(reports, codes::ATTACK), 2);
        assert_eq!(count_code(reports, codes::MUTUAL_PUSH), 1);
        assert!(engine.results().iter().all(|r| r.resolved));
        assert_eq!(engine.arena().pending_psrs().len(), 2);
        assert_eq!(
            engine.arena().get(attacker).unwrap().position(),
            Some(Coords::new(4, 4))
        );
    }
}

#[test]
fn test_one_sided_push_moves_the_target() {
    let d = duel();
    let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [6, 6, 6, 6]);
    engine.declare(AttackAction::new(d.attacker, d.defender, AttackKind::Push));
    engine.pretreat();
    engine.resolve_physical_attacks();

    assert_eq!(
        engine.arena().get(d.defender).unwrap().position(),
        Some(Coords::new(4, 2))
    );
}

#[test]
fn test_mutual_grapple_goes_to_the_better_margin() {
    let d = duel();
    // attacker rolls 8, defender rolls 12
    let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [4, 4, 6, 6]);
    engine.declare(AttackAction::new(
        d.attacker,
        d.defender,
        AttackKind::Grapple {
            side: GrappleSide::Both,
        },
    ));
    engine.declare(AttackAction::new(
        d.defender,
        d.attacker,
        AttackKind::Grapple {
            side: GrappleSide::Left,
        },
    ));
    engine.pretreat();
    engine.resolve_physical_attacks();

    let holder = engine.arena().get(d.defender).unwrap();
    let held = engine.arena().get(d.attacker).unwrap();
    assert_eq!(holder.links.grappled, Some(d.attacker));
    assert!(holder.links.grapple_holder);
    assert_eq!(holder.links.grapple_side, Some(GrappleSide::Left));
    assert_eq!(held.links.grappled, Some(d.defender));
    assert!(!held.links.grapple_holder);
    assert_eq!(count_code(engine.reports().reports(), codes::GRAPPLED), 1);
}

// =============================================================================
// Destruction
// =============================================================================

#[test]
fn test_kill_credit_goes_to_the_dooming_blow_only() {
    let mut d = duel();
    let glass = d.arena.spawn_with(
        EntityTag::Mech,
        EntityInner::Mech(MechComponents::default()),
        Some(Coords::new(4, 3)),
        |e| e.with_name("Glass").with_owner(d.players[1]).with_tonnage(20).with_armor(0, 1),
    );
    d.arena.despawn(d.defender);
    let second = spawn_mech(&mut d.arena, d.players[0], Coords::new(4, 2), "Second");
    // both punches roll 12; each lands on the head (punch table 6)
    let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [6, 6, 6, 6, 6, 6]);

    engine.declare(punch(d.attacker, glass));
    engine.declare(punch(second, glass));
    engine.pretreat();
    engine.resolve_physical_attacks();

    let victim = engine.arena().get(glass).unwrap();
    assert!(victim.is_doomed());
    assert_eq!(victim.kill_credit, Some(d.attacker));
    assert_eq!(count_code(engine.reports().reports(), codes::KILL_CREDIT), 1);
    assert_eq!(count_code(engine.reports().reports(), codes::DESTROYED), 1);
}

#[test]
fn test_carrier_destruction_lets_passengers_escape() {
    let mut d = duel();
    let at = Coords::new(9, 9);
    let apc = spawn_apc(&mut d.arena, d.players[0], at);
    let first = spawn_squad(&mut d.arena, d.players[0], None);
    let second = spawn_squad(&mut d.arena, d.players[0], None);
    let transport = StandardTransport::new();
    assert!(transport.load(&mut d.arena, apc, first));
    assert!(transport.load(&mut d.arena, apc, second));
    // first escape roll 2 fails, second rolls 4 against 3
    let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [1, 1, 2, 2]);

    let reports = engine.destroy_entity(apc, "ammunition explosion", true, true);

    let ids = codes_of(&reports);
    assert!(ids.contains(&codes::ESCAPE_FAILED));
    assert!(ids.contains(&codes::ESCAPED));
    assert!(engine.arena().get(apc).unwrap().links.loaded.is_empty());
    assert!(engine.arena().get(first).unwrap().is_doomed());
    let survivor = engine.arena().get(second).unwrap();
    assert_eq!(survivor.position(), Some(at));
    assert!(survivor.status.contains(StatusFlags::UNLOADED_THIS_TURN));

    engine.end_physical_phase();
    assert!(engine.arena().get(apc).is_none());
    assert!(engine.arena().get(first).is_none());
    assert!(engine.arena().get(second).is_some());
}

#[test]
fn test_destroying_a_swarm_host_frees_the_swarmer() {
    let mut d = duel();
    let swarmer = spawn_squad(&mut d.arena, d.players[0], Some(Coords::new(4, 3)));
    {
        let s = d.arena.get_mut(swarmer).unwrap();
        s.links.swarm_target = Some(d.defender);
        s.status.insert(StatusFlags::DONE | StatusFlags::UNLOADED_THIS_TURN);
    }
    d.arena.get_mut(d.defender).unwrap().links.swarm_attacker = Some(swarmer);
    let (mut engine, _) = quiet_engine(d.arena, RuleOptions::default());

    let reports = engine.destroy_entity(d.defender, "center torso destroyed", true, true);

    let freed = engine.arena().get(swarmer).unwrap();
    assert_eq!(freed.links.swarm_target, None);
    assert!(!freed.status.contains(StatusFlags::DONE));
    assert!(!freed.status.contains(StatusFlags::UNLOADED_THIS_TURN));
    assert_eq!(count_code(&reports, codes::SWARM_RELEASED), 1);
}

#[test]
fn test_doomed_units_are_announced_on_removal() {
    let d = duel();
    let (mut engine, sink) = quiet_engine(d.arena, RuleOptions::default());
    engine.destroy_entity(d.defender, "ammo", false, false);
    sink.clear();
    engine.end_physical_phase();

    let sent = sink.sent();
    assert!(sent.contains(&(
        None,
        Packet::EntityRemove {
            id: d.defender,
            condition: RemovalCondition::Devastated
        }
    )));
}

// =============================================================================
// Queue and Visibility
// =============================================================================

#[test]
fn test_searchlights_never_reach_resolution() {
    let mut d = duel();
    d.arena
        .get_mut(d.attacker)
        .unwrap()
        .status
        .insert(StatusFlags::SEARCHLIGHT);
    let (mut engine, _) = quiet_engine(d.arena, RuleOptions::default());

    engine.declare(AttackAction::new(d.attacker, d.defender, AttackKind::Searchlight));
    assert_eq!(engine.pretreat(), 0);

    assert!(engine.queue().is_empty());
    assert!(engine.results().is_empty());
    assert!(engine
        .arena()
        .get(d.defender)
        .unwrap()
        .status
        .contains(StatusFlags::ILLUMINATED));
    assert_eq!(count_code(engine.reports().reports(), codes::SEARCHLIGHT), 1);
}

#[test]
fn test_double_blind_update_reaches_only_observers() {
    let mut d = duel();
    let third = d.arena.add_player("green", 3);
    let [red, blue] = d.players;
    let scout = spawn_mech(&mut d.arena, red, Coords::new(0, 0), "Locust");
    // move the blue mech out of sensor range of everything red owns
    d.arena.set_position(d.defender, Some(Coords::new(15, 15)));
    d.arena.despawn(d.attacker);
    let options = RuleOptions::default().with_double_blind(true);
    let (mut engine, sink) = quiet_engine(d.arena, options);

    engine.update_entity(scout);

    assert!(matches!(
        sink.received_by(red).as_slice(),
        [Packet::EntityUpdate(e)] if e.id() == scout
    ));
    for other in [blue, third] {
        assert_eq!(
            sink.received_by(other),
            vec![Packet::EntityRemove {
                id: scout,
                condition: RemovalCondition::NeverJoined
            }]
        );
    }
}

#[test]
fn test_reports_delivered_per_player() {
    let mut d = duel();
    d.arena.get_mut(d.attacker).unwrap().piloting = 6;
    let options = RuleOptions::default().with_double_blind(true);
    let (mut engine, sink) = scripted_engine(d.arena, options, [4, 5, 1]);
    engine.declare(punch(d.attacker, d.defender));
    engine.pretreat();
    engine.resolve_physical_attacks();
    sink.clear();

    engine.deliver_reports();

    for player in d.players {
        let packets = sink.received_by(player);
        assert_eq!(packets.len(), 1);
        assert!(matches!(&packets[0], Packet::Reports(r) if !r.is_empty()));
    }
    assert!(!engine.take_reports().is_empty());
    assert!(engine.reports().is_empty());
}
