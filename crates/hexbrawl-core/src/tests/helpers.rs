//! Test helpers: unit factories, a shared packet recorder and engine setup.

use std::sync::{Arc, Mutex};

use hexfield::{Coords, Direction};

use crate::arena::Arena;
use crate::config::RuleOptions;
use crate::dice::ScriptedDice;
use crate::engine::Engine;
use crate::entity::{
    EntityId, EntityInner, EntityTag, InfantryComponents, MechComponents, PlayerId,
    VehicleComponents,
};
use crate::report::Report;
use crate::services::{BroadcastSink, Packet, RecordingBroadcast};

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hexbrawl=debug")
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Shared Broadcast
// =============================================================================

/// A recorder the test keeps a handle to after handing a clone to the engine.
#[derive(Debug, Clone, Default)]
pub struct SharedBroadcast(Arc<Mutex<RecordingBroadcast>>);

impl SharedBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<(Option<PlayerId>, Packet)> {
        self.0.lock().unwrap().sent().to_vec()
    }

    /// Packets `player` received, broadcasts included.
    pub fn received_by(&self, player: PlayerId) -> Vec<Packet> {
        self.0
            .lock()
            .unwrap()
            .received_by(player)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().take();
    }
}

impl BroadcastSink for SharedBroadcast {
    fn send_to(&mut self, player: PlayerId, packet: Packet) {
        self.0.lock().unwrap().send_to(player, packet);
    }

    fn send_all(&mut self, packet: Packet) {
        self.0.lock().unwrap().send_all(packet);
    }
}

// =============================================================================
// Unit Factories
// =============================================================================

/// A 50-ton mech, piloting 5, 10 armor and 5 structure everywhere.
pub fn spawn_mech(arena: &mut Arena, owner: PlayerId, at: Coords, name: &str) -> EntityId {
    arena.spawn_with(
        EntityTag::Mech,
        EntityInner::Mech(MechComponents::default()),
        Some(at),
        |e| {
            e.with_name(name)
                .with_owner(owner)
                .with_tonnage(50)
                .with_piloting(5)
                .with_armor(10, 5)
        },
    )
}

/// An infantry squad, off board unless `at` is given.
pub fn spawn_squad(arena: &mut Arena, owner: PlayerId, at: Option<Coords>) -> EntityId {
    arena.spawn_with(
        EntityTag::Infantry,
        EntityInner::Infantry(InfantryComponents::default()),
        at,
        |e| e.with_name("Squad").with_owner(owner).with_armor(0, 10),
    )
}

/// A 20-ton tracked carrier.
pub fn spawn_apc(arena: &mut Arena, owner: PlayerId, at: Coords) -> EntityId {
    arena.spawn_with(
        EntityTag::Vehicle,
        EntityInner::Vehicle(VehicleComponents::default()),
        Some(at),
        |e| {
            e.with_name("APC")
                .with_owner(owner)
                .with_tonnage(20)
                .with_armor(5, 5)
        },
    )
}

/// Turns a unit to face `dir`.
pub fn face(arena: &mut Arena, id: EntityId, dir: Direction) {
    if let Some(e) = arena.get_mut(id) {
        e.facing = dir;
    }
}

// =============================================================================
// Scenarios
// =============================================================================

/// Two players and two mechs in adjacent hexes, facing each other.
///
/// The attacker stands at (4, 4) facing north; the defender at (4, 3) facing
/// south, so attacks between them land on the front.
pub struct Duel {
    pub arena: Arena,
    pub players: [PlayerId; 2],
    pub attacker: EntityId,
    pub defender: EntityId,
}

pub fn duel() -> Duel {
    let mut arena = Arena::default();
    let players = [arena.add_player("red", 1), arena.add_player("blue", 2)];
    let attacker = spawn_mech(&mut arena, players[0], Coords::new(4, 4), "Wolverine");
    let defender = spawn_mech(&mut arena, players[1], Coords::new(4, 3), "Griffin");
    face(&mut arena, defender, Direction::South);
    Duel {
        arena,
        players,
        attacker,
        defender,
    }
}

/// An engine over `arena` whose dice play `faces` first, with a shared sink.
pub fn scripted_engine(
    arena: Arena,
    options: RuleOptions,
    faces: impl IntoIterator<Item = u8>,
) -> (Engine, SharedBroadcast) {
    init_tracing();
    let sink = SharedBroadcast::new();
    let engine = Engine::new(arena, options)
        .with_dice(Box::new(ScriptedDice::new(faces)))
        .with_sink(Box::new(sink.clone()));
    (engine, sink)
}

/// An engine with seeded dice only.
pub fn quiet_engine(arena: Arena, options: RuleOptions) -> (Engine, SharedBroadcast) {
    scripted_engine(arena, options, Vec::<u8>::new())
}

/// Template ids of `reports`, in order.
pub fn codes_of(reports: &[Report]) -> Vec<u16> {
    reports.iter().map(|r| r.id).collect()
}

/// How many reports carry template `code`.
pub fn count_code(reports: &[Report], code: u16) -> usize {
    reports.iter().filter(|r| r.id == code).count()
}
