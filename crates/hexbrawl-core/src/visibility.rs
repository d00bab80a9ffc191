//! Who learns what: unit snapshots and per-player report delivery.
//!
//! With double-blind off every player gets every unit and every report that
//! is not addressed to somebody else. With it on, a unit is sent only to the
//! players that perceive it (through the [`VisibilityOracle`], plus the owners
//! of active ECM nearby); everyone else is told the unit is not there.

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::config::RuleOptions;
use crate::entity::{Entity, EntityId, PlayerId, RemovalCondition, StatusFlags};
use crate::report::{Perception, ReportLog};
use crate::services::{BroadcastSink, Packet, VisibilityCache, VisibilityOracle};

/// Limit on nested cargo when walking manifests.
const MAX_CARGO_DEPTH: usize = 8;

/// Owners of active ECM units whose radius covers `target`.
fn ecm_owners(arena: &Arena, target: &Entity) -> BTreeSet<PlayerId> {
    let Some(at) = target.position() else {
        return BTreeSet::new();
    };
    arena
        .entities_sorted()
        .filter(|e| e.id() != target.id() && e.is_deployed())
        .filter(|e| e.status.contains(StatusFlags::ECM_ACTIVE) && e.ecm_radius > 0)
        .filter(|e| e.position().is_some_and(|p| p.distance(at) <= e.ecm_radius))
        .map(|e| e.owner)
        .collect()
}

/// Players that receive updates about `id` under double-blind.
#[must_use]
pub fn recipients(
    arena: &Arena,
    oracle: &dyn VisibilityOracle,
    id: EntityId,
    cache: Option<&mut VisibilityCache>,
) -> BTreeSet<PlayerId> {
    let mut players = oracle.who_can_see(arena, id, cache);
    if let Some(entity) = arena.get(id) {
        players.extend(ecm_owners(arena, entity));
    }
    players
}

/// [`Perception`] over an arena, backed by an oracle.
pub struct ArenaPerception<'a> {
    arena: &'a Arena,
    oracle: &'a dyn VisibilityOracle,
}

impl<'a> ArenaPerception<'a> {
    /// Wraps an arena and oracle.
    #[must_use]
    pub fn new(arena: &'a Arena, oracle: &'a dyn VisibilityOracle) -> Self {
        Self { arena, oracle }
    }
}

impl Perception for ArenaPerception<'_> {
    fn can_see(&self, observer: PlayerId, entity: EntityId) -> bool {
        recipients(self.arena, self.oracle, entity, None).contains(&observer)
    }

    fn owner(&self, entity: EntityId) -> Option<PlayerId> {
        self.arena.lookup(entity).map(|e| e.owner)
    }
}

impl std::fmt::Debug for ArenaPerception<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaPerception")
            .field("round", &self.arena.round())
            .finish_non_exhaustive()
    }
}

/// Sends unit snapshots and filtered reports to players.
#[derive(Debug, Clone, Default)]
pub struct VisibilityManager {
    cache: VisibilityCache,
}

impl VisibilityManager {
    /// A manager with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-round detection cache.
    #[must_use]
    pub fn cache(&self) -> &VisibilityCache {
        &self.cache
    }

    /// Sends the current state of `id` (and anything it carries).
    pub fn update_entity(
        &mut self,
        arena: &Arena,
        options: &RuleOptions,
        oracle: &dyn VisibilityOracle,
        sink: &mut dyn BroadcastSink,
        id: EntityId,
    ) {
        self.update_nested(arena, options, oracle, sink, id, 0);
    }

    fn update_nested(
        &mut self,
        arena: &Arena,
        options: &RuleOptions,
        oracle: &dyn VisibilityOracle,
        sink: &mut dyn BroadcastSink,
        id: EntityId,
        depth: usize,
    ) {
        let Some(entity) = arena.get(id) else {
            warn!(target: "hexbrawl::visibility", entity = %id, "update for unknown unit");
            return;
        };
        if !options.double_blind {
            sink.send_all(Packet::EntityUpdate(Box::new(entity.clone())));
        } else {
            let cache = options.use_visibility_cache.then_some(&mut self.cache);
            let seen_by = recipients(arena, oracle, id, cache);
            for player in arena.connected_players() {
                if seen_by.contains(&player) {
                    sink.send_to(player, Packet::EntityUpdate(Box::new(entity.clone())));
                } else {
                    sink.send_to(
                        player,
                        Packet::EntityRemove {
                            id,
                            condition: RemovalCondition::NeverJoined,
                        },
                    );
                }
            }
            debug!(target: "hexbrawl::visibility", entity = %id, seen_by = ?seen_by, "unit update");
        }

        if depth >= MAX_CARGO_DEPTH {
            warn!(target: "hexbrawl::visibility", entity = %id, "cargo nested too deep");
            return;
        }
        for &cargo in &entity.links.loaded {
            self.update_nested(arena, options, oracle, sink, cargo, depth + 1);
        }
    }

    /// Sends every player the full set of units it may know about.
    ///
    /// Under double-blind each player's list is computed in parallel and the
    /// lists are sent in player order.
    pub fn update_all(
        &mut self,
        arena: &Arena,
        options: &RuleOptions,
        oracle: &dyn VisibilityOracle,
        sink: &mut dyn BroadcastSink,
    ) {
        if !options.double_blind {
            let all: Vec<Entity> = arena.entities_sorted().cloned().collect();
            info!(target: "hexbrawl::visibility", units = all.len(), "full update to all");
            sink.send_all(Packet::AllEntities(all));
            return;
        }

        let players = arena.connected_players();
        let ids: Vec<EntityId> = arena.entity_ids_sorted().collect();
        let mut views: Vec<(PlayerId, Vec<Entity>)> = players
            .par_iter()
            .map(|&player| {
                let seen = ids
                    .iter()
                    .filter(|&&id| recipients(arena, oracle, id, None).contains(&player))
                    .filter_map(|&id| arena.get(id).cloned())
                    .collect();
                (player, seen)
            })
            .collect();
        views.sort_by_key(|(player, _)| *player);

        for (player, seen) in views {
            debug!(target: "hexbrawl::visibility", %player, units = seen.len(), "full update");
            sink.send_to(player, Packet::AllEntities(seen));
        }
    }

    /// Sends each connected player its filtered copy of `log`, and records
    /// who received obscured copies.
    pub fn deliver_reports(
        &self,
        arena: &Arena,
        options: &RuleOptions,
        oracle: &dyn VisibilityOracle,
        log: &mut ReportLog,
        sink: &mut dyn BroadcastSink,
    ) {
        let perception = ArenaPerception::new(arena, oracle);
        for player in arena.connected_players() {
            let view = log.filter_for(Some(player), options.double_blind, &perception);
            for &index in &view.obscured {
                log.mark_obscured(index, player);
            }
            debug!(
                target: "hexbrawl::visibility",
                %player,
                reports = view.reports.len(),
                obscured = view.obscured.len(),
                "reports delivered"
            );
            sink.send_to(player, Packet::Reports(view.reports));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfield::Coords;

    use crate::entity::{EntityInner, EntityTag, InfantryComponents, MechComponents, VehicleComponents};
    use crate::report::{codes, Report};
    use crate::services::{RecordingBroadcast, SensorVisibility};

    struct World {
        arena: Arena,
        players: [PlayerId; 3],
    }

    fn world() -> World {
        let mut arena = Arena::default();
        let players = [
            arena.add_player("one", 1),
            arena.add_player("two", 2),
            arena.add_player("three", 3),
        ];
        World { arena, players }
    }

    fn unit(arena: &mut Arena, owner: PlayerId, at: Coords, range: u32) -> EntityId {
        arena.spawn_with(
            EntityTag::Mech,
            EntityInner::Mech(MechComponents::default()),
            Some(at),
            |mut e| {
                e.sensor_range = range;
                e.with_owner(owner)
            },
        )
    }

    mod update_tests {
        use super::*;

        #[test]
        fn open_game_broadcasts_to_all() {
            let mut w = world();
            let id = unit(&mut w.arena, w.players[0], Coords::new(2, 2), 3);
            let mut sink = RecordingBroadcast::new();
            VisibilityManager::new().update_entity(
                &w.arena,
                &RuleOptions::default(),
                &SensorVisibility::new(),
                &mut sink,
                id,
            );
            assert_eq!(sink.sent().len(), 1);
            assert!(sink.sent()[0].0.is_none());
        }

        #[test]
        fn double_blind_hides_from_players_without_contact() {
            let mut w = world();
            let [p1, p2, p3] = w.players;
            let target = unit(&mut w.arena, p1, Coords::new(2, 2), 0);
            unit(&mut w.arena, p2, Coords::new(12, 12), 1);
            unit(&mut w.arena, p3, Coords::new(14, 14), 1);
            let options = RuleOptions::default().with_double_blind(true);
            let mut sink = RecordingBroadcast::new();

            VisibilityManager::new().update_entity(
                &w.arena,
                &options,
                &SensorVisibility::new(),
                &mut sink,
                target,
            );

            let to_p1: Vec<_> = sink.received_by(p1).collect();
            assert!(matches!(to_p1.as_slice(), [Packet::EntityUpdate(_)]));
            for other in [p2, p3] {
                let got: Vec<_> = sink.received_by(other).collect();
                assert_eq!(
                    got,
                    vec![&Packet::EntityRemove {
                        id: target,
                        condition: RemovalCondition::NeverJoined
                    }]
                );
            }
        }

        #[test]
        fn active_ecm_reveals_to_its_owner() {
            let mut w = world();
            let [p1, p2, _] = w.players;
            let target = unit(&mut w.arena, p1, Coords::new(5, 5), 0);
            let jammer = unit(&mut w.arena, p2, Coords::new(5, 8), 0);
            {
                let e = w.arena.get_mut(jammer).unwrap();
                e.status.insert(StatusFlags::ECM_ACTIVE);
                e.ecm_radius = 6;
            }
            let seen = recipients(&w.arena, &SensorVisibility::new(), target, None);
            assert!(seen.contains(&p2));
        }

        #[test]
        fn cargo_is_updated_with_its_carrier() {
            let mut w = world();
            let p1 = w.players[0];
            let apc = w.arena.spawn_with(
                EntityTag::Vehicle,
                EntityInner::Vehicle(VehicleComponents::default()),
                Some(Coords::new(3, 3)),
                |e| e.with_owner(p1),
            );
            let squad = w.arena.spawn_with(
                EntityTag::Infantry,
                EntityInner::Infantry(InfantryComponents::default()),
                None,
                |e| e.with_owner(p1),
            );
            w.arena.get_mut(apc).unwrap().links.loaded.push(squad);
            w.arena.get_mut(squad).unwrap().links.transported_by = Some(apc);
            let mut sink = RecordingBroadcast::new();
            VisibilityManager::new().update_entity(
                &w.arena,
                &RuleOptions::default(),
                &SensorVisibility::new(),
                &mut sink,
                apc,
            );
            assert_eq!(sink.sent().len(), 2);
        }

        #[test]
        fn update_all_is_sorted_by_player() {
            let mut w = world();
            let [p1, p2, p3] = w.players;
            unit(&mut w.arena, p1, Coords::new(2, 2), 2);
            unit(&mut w.arena, p2, Coords::new(2, 3), 2);
            unit(&mut w.arena, p3, Coords::new(14, 14), 2);
            let options = RuleOptions::default().with_double_blind(true);
            let mut sink = RecordingBroadcast::new();
            VisibilityManager::new().update_all(
                &w.arena,
                &options,
                &SensorVisibility::new(),
                &mut sink,
            );
            let order: Vec<_> = sink.sent().iter().map(|(to, _)| *to).collect();
            assert_eq!(order, vec![Some(p1), Some(p2), Some(p3)]);
            match &sink.sent()[2].1 {
                Packet::AllEntities(list) => assert_eq!(list.len(), 1),
                other => panic!("unexpected packet {other:?}"),
            }
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn obscured_recipients_recorded() {
            let mut w = world();
            let [p1, p2, _] = w.players;
            let hidden = unit(&mut w.arena, p1, Coords::new(1, 1), 0);
            unit(&mut w.arena, p2, Coords::new(14, 14), 1);
            let mut log = ReportLog::new();
            log.push(Report::visible(codes::DAMAGE, hidden).add("Atlas").add_obscured(5));
            log.push(Report::public(codes::WRECKAGE).add("0101"));
            let options = RuleOptions::default().with_double_blind(true);
            let mut sink = RecordingBroadcast::new();

            VisibilityManager::new().deliver_reports(
                &w.arena,
                &options,
                &SensorVisibility::new(),
                &mut log,
                &mut sink,
            );

            let marked = log.obscured_recipients(0).unwrap();
            assert!(marked.contains(&p2));
            assert!(!marked.contains(&p1));
            assert!(log.obscured_recipients(1).is_none());
        }

        #[test]
        fn open_game_passes_reports_unchanged() {
            let mut w = world();
            let p1 = w.players[0];
            let id = unit(&mut w.arena, p1, Coords::new(1, 1), 0);
            let mut log = ReportLog::new();
            log.push(Report::visible(codes::DAMAGE, id).add_obscured(3));
            let expected = log.reports().to_vec();
            let mut sink = RecordingBroadcast::new();
            VisibilityManager::new().deliver_reports(
                &w.arena,
                &RuleOptions::default(),
                &SensorVisibility::new(),
                &mut log,
                &mut sink,
            );
            for player in w.players {
                let got: Vec<_> = sink.received_by(player).collect();
                assert_eq!(got, vec![&Packet::Reports(expected.clone())]);
            }
        }
    }
}
