//! Arena: the battlefield state a round resolves against.
//!
//! The Arena owns:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - A position index from hex to the entities standing in it
//! - The [`Board`] (terrain and buildings)
//! - The player roster
//! - The graveyard of removed entities, kept for replay and kill attribution
//! - Piloting rolls queued during the phase
//!
//! # Position Index
//!
//! Entity positions can only change through [`Arena::set_position`], which
//! keeps the index in sync. Loaded units have no position and are absent
//! from the index.
//!
//! # Example
//!
//! ```
//! use hexbrawl_core::arena::Arena;
//! use hexbrawl_core::entity::{EntityTag, EntityInner};
//! use hexbrawl_core::entity::components::MechComponents;
//! use hexfield::Coords;
//!
//! let mut arena = Arena::default();
//! let id = arena.spawn(EntityTag::Mech, EntityInner::Mech(MechComponents::default()));
//! arena.set_position(id, Some(Coords::new(3, 3)));
//!
//! assert_eq!(arena.entities_at(Coords::new(3, 3)), vec![id]);
//! assert!(arena.entities_within(Coords::new(3, 4), 1).contains(&id));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use hexfield::{hash_board, Board, Coords};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{Entity, EntityId, EntityInner, EntityTag, PlayerId, StatusFlags};

// =============================================================================
// Players and Pending Rolls
// =============================================================================

/// A participant in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player id
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Team number; players on one team share nothing here but the number
    pub team: u32,
    /// Currently connected and receiving packets
    pub connected: bool,
}

/// A piloting skill roll waiting to be made at the end of the phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotingRoll {
    /// Unit making the roll
    pub entity: EntityId,
    /// Modifier added to the piloting skill
    pub modifier: i32,
    /// Why the roll is needed
    pub reason: String,
}

// =============================================================================
// Arena
// =============================================================================

/// Container for all battlefield state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Live entities.
    entities: BTreeMap<EntityId, Entity>,
    /// Hex to entities standing there.
    #[serde(with = "hexfield::coord_map")]
    positions: BTreeMap<Coords, BTreeSet<EntityId>>,
    /// Terrain and buildings.
    board: Board,
    /// Player roster.
    players: BTreeMap<PlayerId, Player>,
    /// Next player id.
    next_player: u32,
    /// Entities removed from play.
    graveyard: BTreeMap<EntityId, Entity>,
    /// Current game round.
    round: u32,
    /// Piloting rolls owed this phase, in the order they were incurred.
    pending_psrs: Vec<PilotingRoll>,
}

impl Arena {
    /// Creates an empty arena on the given board.
    #[must_use]
    pub fn new(board: Board) -> Self {
        Self {
            next_id: 1,
            entities: BTreeMap::new(),
            positions: BTreeMap::new(),
            board,
            players: BTreeMap::new(),
            next_player: 1,
            graveyard: BTreeMap::new(),
            round: 1,
            pending_psrs: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Entities
    // -------------------------------------------------------------------------

    /// Spawns a new entity off board and returns its id.
    pub fn spawn(&mut self, tag: EntityTag, inner: EntityInner) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, tag, inner));
        id
    }

    /// Spawns an entity built by the caller, assigning it a fresh id.
    ///
    /// The closure receives the default entity for `tag` and returns the
    /// configured one; its position is applied through the index.
    pub fn spawn_with(
        &mut self,
        tag: EntityTag,
        inner: EntityInner,
        at: Option<Coords>,
        build: impl FnOnce(Entity) -> Entity,
    ) -> EntityId {
        let id = self.spawn(tag, inner);
        if let Some(entity) = self.entities.remove(&id) {
            let mut built = build(entity);
            built.set_position_unindexed(None);
            self.entities.insert(id, built);
        }
        self.set_position(id, at);
        id
    }

    /// Moves an entity from play into the graveyard.
    ///
    /// Returns `false` if the entity is not live.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.set_position(id, None);
        match self.entities.remove(&id) {
            Some(mut entity) => {
                entity.status.insert(StatusFlags::REMOVED);
                debug!(target: "hexbrawl::engine", entity = %id, "entity moved to graveyard");
                self.graveyard.insert(id, entity);
                true
            }
            None => false,
        }
    }

    /// Returns a live entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a live entity mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns a live or removed entity.
    #[must_use]
    pub fn lookup(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id).or_else(|| self.graveyard.get(&id))
    }

    /// Live entity ids in sorted order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Live entities in id order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Live entities in id order, mutably.
    pub fn entities_sorted_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Removed entities.
    #[must_use]
    pub fn graveyard(&self) -> &BTreeMap<EntityId, Entity> {
        &self.graveyard
    }

    // -------------------------------------------------------------------------
    // Positions
    // -------------------------------------------------------------------------

    /// Places (or, with `None`, lifts) an entity, keeping the index in sync.
    ///
    /// Returns `false` if the entity is not live.
    pub fn set_position(&mut self, id: EntityId, position: Option<Coords>) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        if let Some(old) = entity.position() {
            if let Some(set) = self.positions.get_mut(&old) {
                set.remove(&id);
                if set.is_empty() {
                    self.positions.remove(&old);
                }
            }
        }
        entity.set_position_unindexed(position);
        if let Some(new) = position {
            self.positions.entry(new).or_default().insert(id);
        }
        true
    }

    /// Entities standing in a hex, in id order.
    #[must_use]
    pub fn entities_at(&self, coords: Coords) -> Vec<EntityId> {
        self.positions
            .get(&coords)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Entities within `radius` hexes of `center`, in id order.
    #[must_use]
    pub fn entities_within(&self, center: Coords, radius: u32) -> Vec<EntityId> {
        let mut found: Vec<EntityId> = self
            .positions
            .iter()
            .filter(|(coords, _)| coords.distance(center) <= radius)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        found.sort_unstable();
        found
    }

    /// Returns the unit `entity` would illegally share `coords` with, if any.
    ///
    /// Infantry and flying units never violate stacking. Any other ground unit
    /// may not share a hex with another live ground unit that is not infantry.
    #[must_use]
    pub fn stacking_violation(&self, entity: &Entity, coords: Coords) -> Option<EntityId> {
        if entity.is_infantry() || entity.is_airborne() {
            return None;
        }
        self.entities_at(coords).into_iter().find(|&other| {
            other != entity.id()
                && self
                    .get(other)
                    .is_some_and(|o| o.is_alive() && !o.is_infantry() && !o.is_airborne())
        })
    }

    /// True if `entity` cannot enter `coords` (off board or forbidden terrain).
    #[must_use]
    pub fn is_prohibited(&self, entity: &Entity, coords: Coords) -> bool {
        !self.board.contains(coords) || self.board.hex(coords).is_prohibited(entity.movement_mode)
    }

    // -------------------------------------------------------------------------
    // Board, players, round
    // -------------------------------------------------------------------------

    /// The battlefield map.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The battlefield map, mutably.
    #[must_use]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Registers a connected player.
    pub fn add_player(&mut self, name: impl Into<String>, team: u32) -> PlayerId {
        let id = PlayerId::new(self.next_player);
        self.next_player += 1;
        self.players.insert(
            id,
            Player {
                id,
                name: name.into(),
                team,
                connected: true,
            },
        );
        id
    }

    /// Looks up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Looks up a player mutably.
    #[must_use]
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// All players in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> + '_ {
        self.players.values()
    }

    /// Connected player ids in order.
    #[must_use]
    pub fn connected_players(&self) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|p| p.connected)
            .map(|p| p.id)
            .collect()
    }

    /// Current round.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Advances to the next round.
    pub fn advance_round(&mut self) {
        self.round += 1;
    }

    // -------------------------------------------------------------------------
    // Piloting rolls
    // -------------------------------------------------------------------------

    /// Queues a piloting roll for the end of the phase.
    pub fn queue_psr(&mut self, entity: EntityId, modifier: i32, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(target: "hexbrawl::resolve", entity = %entity, modifier, reason = %reason, "piloting roll queued");
        self.pending_psrs.push(PilotingRoll {
            entity,
            modifier,
            reason,
        });
    }

    /// Piloting rolls still owed.
    #[must_use]
    pub fn pending_psrs(&self) -> &[PilotingRoll] {
        &self.pending_psrs
    }

    /// Removes and returns every queued piloting roll.
    pub fn take_psrs(&mut self) -> Vec<PilotingRoll> {
        std::mem::take(&mut self.pending_psrs)
    }

    // -------------------------------------------------------------------------
    // Hashing
    // -------------------------------------------------------------------------

    /// Deterministic hash of the battlefield state.
    ///
    /// Covers the board, the round, every live entity's position, status,
    /// armor and links, and the graveyard roster.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        hash_board(&self.board).hash(&mut hasher);
        self.round.hash(&mut hasher);

        for (id, entity) in &self.entities {
            id.hash(&mut hasher);
            entity.position().hash(&mut hasher);
            entity.facing.hash(&mut hasher);
            entity.elevation.hash(&mut hasher);
            entity.status.bits().hash(&mut hasher);
            for (loc, state) in &entity.locations {
                loc.hash(&mut hasher);
                state.armor.hash(&mut hasher);
                state.rear_armor.hash(&mut hasher);
                state.structure.hash(&mut hasher);
                state.destroyed.hash(&mut hasher);
            }
            let links = &entity.links;
            links.transported_by.hash(&mut hasher);
            links.loaded.hash(&mut hasher);
            links.towing.hash(&mut hasher);
            links.towed_by.hash(&mut hasher);
            links.grappled.hash(&mut hasher);
            links.swarm_target.hash(&mut hasher);
            links.swarm_attacker.hash(&mut hasher);
            entity.kill_credit.hash(&mut hasher);
        }

        for (id, entity) in &self.graveyard {
            id.hash(&mut hasher);
            entity.removal.hash(&mut hasher);
        }

        hasher.finish()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(Board::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
