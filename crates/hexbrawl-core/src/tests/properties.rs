//! Property tests of the resolution invariants.

use proptest::prelude::*;

use hexfield::{BuildingClass, Coords, Direction};

use crate::action::{ArmSide, AttackAction, AttackKind};
use crate::config::RuleOptions;
use crate::damage::{apply_blow_rules, building_absorption};
use crate::entity::{EntityId, EntityInner, EntityTag, GrappleSide, MechComponents, PlayerId};
use crate::report::{codes, Perception, Report, ReportLog};
use crate::services::{BuildingDamager, StandardBuildings};

use super::helpers::{count_code, duel, face, scripted_engine, spawn_mech};

/// Sees everything; units belong to player 0.
struct Omniscient;

impl Perception for Omniscient {
    fn can_see(&self, _observer: PlayerId, _entity: EntityId) -> bool {
        true
    }

    fn owner(&self, _entity: EntityId) -> Option<PlayerId> {
        Some(PlayerId::new(0))
    }
}

fn any_report() -> impl Strategy<Value = Report> {
    (0u8..4, 1000u16..7000, 1u64..6, 0u32..3, any::<i32>()).prop_map(
        |(kind, id, subject, player, value)| {
            let subject = EntityId::new(subject);
            let report = match kind {
                0 => Report::public(id),
                1 => Report::visible(id, subject),
                2 => Report::hidden(id, subject),
                _ => Report::player(id, PlayerId::new(player)),
            };
            report.add(value).add_obscured(value)
        },
    )
}

fn die() -> impl Strategy<Value = u8> {
    1u8..=6
}

proptest! {
    #[test]
    fn prop_destroy_is_idempotent(survivable in any::<bool>(), salvageable in any::<bool>()) {
        let d = duel();
        let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), [3u8, 3, 3, 3]);
        let first = engine.destroy_entity(d.defender, "test", survivable, salvageable);
        prop_assert!(!first.is_empty());
        let hash = engine.state_hash();
        let logged = engine.reports().len();

        let second = engine.destroy_entity(d.defender, "test", survivable, salvageable);

        prop_assert!(second.is_empty());
        prop_assert_eq!(engine.state_hash(), hash);
        prop_assert_eq!(engine.reports().len(), logged);
    }

    #[test]
    fn prop_roll_on_target_number_is_glancing(value in 2i32..=12, damage in 0u32..200) {
        let blow = apply_blow_rules(damage, value, value, true, false);
        prop_assert!(blow.glancing);
        prop_assert_eq!(blow.damage, damage / 2);
    }

    #[test]
    fn prop_building_only_reduces_damage(
        damage in 0u32..500,
        class in prop_oneof![
            Just(BuildingClass::Light),
            Just(BuildingClass::Medium),
            Just(BuildingClass::Heavy),
            Just(BuildingClass::Hardened),
        ],
    ) {
        let mut board = hexfield::Board::new(4, 4);
        let at = Coords::new(1, 1);
        let id = board.add_building("Block", class, &[(at, 2)]);
        let buildings = StandardBuildings::new();
        let absorption = buildings.absorption(&board, id, at);
        let scale = buildings.damage_scale(&board, id);

        let (to_building, residual) = building_absorption(damage, absorption, scale);

        prop_assert!(residual <= damage);
        prop_assert!(to_building <= damage);
        prop_assert!(to_building <= absorption);
    }

    #[test]
    fn prop_open_filter_is_identity(reports in proptest::collection::vec(any_report(), 0..40)) {
        let mut log = ReportLog::new();
        log.extend(reports.clone());
        let view = log.filter_for(None, false, &Omniscient);
        prop_assert_eq!(view.reports, reports);
        prop_assert!(view.obscured.is_empty());
    }

    #[test]
    fn prop_mutual_push_settles_each_side_once(
        faces in proptest::collection::vec(die(), 4),
        defender_first in any::<bool>(),
    ) {
        let d = duel();
        let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), faces);
        let ab = AttackAction::new(d.attacker, d.defender, AttackKind::Push);
        let ba = AttackAction::new(d.defender, d.attacker, AttackKind::Push);
        let order = if defender_first { [ba, ab] } else { [ab, ba] };
        for action in order {
            engine.declare(action);
        }
        engine.pretreat();
        engine.resolve_physical_attacks();

        prop_assert_eq!(count_code(engine.reports().reports(), codes::ATTACK), 2);
        prop_assert!(count_code(engine.reports().reports(), codes::MUTUAL_PUSH) <= 1);
        prop_assert!(engine.results().iter().all(|r| r.resolved));
    }

    #[test]
    fn prop_mutual_grapple_binds_at_most_once(faces in proptest::collection::vec(die(), 4)) {
        let d = duel();
        let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), faces);
        let side = GrappleSide::Both;
        engine.declare(AttackAction::new(d.attacker, d.defender, AttackKind::Grapple { side }));
        engine.declare(AttackAction::new(d.defender, d.attacker, AttackKind::Grapple { side }));
        engine.pretreat();
        engine.resolve_physical_attacks();

        prop_assert_eq!(count_code(engine.reports().reports(), codes::ATTACK), 2);
        prop_assert!(count_code(engine.reports().reports(), codes::GRAPPLED) <= 1);
        let a = engine.arena().get(d.attacker).unwrap();
        let b = engine.arena().get(d.defender).unwrap();
        prop_assert_eq!(a.links.grappled.is_some(), b.links.grappled.is_some());
        prop_assert!(!(a.links.grapple_holder && b.links.grapple_holder));
    }

    #[test]
    fn prop_kill_credit_at_most_once(faces in proptest::collection::vec(die(), 12)) {
        let mut d = duel();
        let owner = d.players[1];
        let glass = d.arena.spawn_with(
            EntityTag::Mech,
            EntityInner::Mech(MechComponents::default()),
            Some(Coords::new(4, 2)),
            |e| e.with_owner(owner).with_tonnage(20).with_armor(0, 1),
        );
        let third = spawn_mech(&mut d.arena, d.players[0], Coords::new(4, 1), "Third");
        face(&mut d.arena, d.defender, Direction::North);
        face(&mut d.arena, third, Direction::South);
        let (mut engine, _) = scripted_engine(d.arena, RuleOptions::default(), faces);
        engine.declare(AttackAction::new(d.defender, glass, AttackKind::Punch { arm: ArmSide::Both }));
        engine.declare(AttackAction::new(third, glass, AttackKind::Punch { arm: ArmSide::Both }));
        engine.pretreat();
        engine.resolve_physical_attacks();

        let victim = engine.arena().get(glass).unwrap();
        let credits = count_code(engine.reports().reports(), codes::KILL_CREDIT);
        prop_assert!(credits <= 1);
        prop_assert_eq!(credits == 1, victim.kill_credit.is_some());
        if victim.is_doomed() {
            prop_assert_eq!(credits, 1);
        }
    }
}
