//! Sensor-range visibility.

use std::collections::{BTreeMap, BTreeSet};

use hexfield::Coords;

use crate::arena::Arena;
use crate::entity::{Entity, EntityId, PlayerId};

use super::VisibilityOracle;

/// Per-round memo of `(observer, target) -> detected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityCache {
    round: u32,
    seen: BTreeMap<(EntityId, EntityId), bool>,
}

impl VisibilityCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry if `round` differs from the cached round.
    pub fn sync_round(&mut self, round: u32) {
        if self.round != round {
            self.seen.clear();
            self.round = round;
        }
    }

    /// Cached result for a pair.
    #[must_use]
    pub fn get(&self, observer: EntityId, target: EntityId) -> Option<bool> {
        self.seen.get(&(observer, target)).copied()
    }

    /// Stores a result.
    pub fn insert(&mut self, observer: EntityId, target: EntityId, seen: bool) {
        self.seen.insert((observer, target), seen);
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    /// Number of cached pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Owners always see their units; anyone else needs a unit in sensor range.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorVisibility;

impl SensorVisibility {
    /// Creates the oracle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Where `entity` effectively is: its hex, or its carrier's hex.
    fn effective_position(arena: &Arena, entity: &Entity) -> Option<Coords> {
        let mut current = entity;
        for _ in 0..8 {
            if let Some(at) = current.position() {
                return Some(at);
            }
            current = arena.get(current.links.transported_by?)?;
        }
        None
    }

    fn detects(observer: &Entity, observer_at: Coords, target_at: Coords) -> bool {
        observer_at.distance(target_at) <= observer.sensor_range
    }
}

impl VisibilityOracle for SensorVisibility {
    fn who_can_see(
        &self,
        arena: &Arena,
        id: EntityId,
        mut cache: Option<&mut VisibilityCache>,
    ) -> BTreeSet<PlayerId> {
        let mut players = BTreeSet::new();
        let Some(target) = arena.lookup(id) else {
            return players;
        };
        players.insert(target.owner);
        let Some(target_at) = Self::effective_position(arena, target) else {
            return players;
        };
        if let Some(cache) = cache.as_deref_mut() {
            cache.sync_round(arena.round());
        }

        for observer in arena.entities_sorted() {
            if observer.id() == id || players.contains(&observer.owner) || !observer.is_deployed()
            {
                continue;
            }
            let Some(observer_at) = observer.position() else {
                continue;
            };
            let seen = match cache.as_deref_mut() {
                Some(cache) => {
                    if let Some(hit) = cache.get(observer.id(), id) {
                        hit
                    } else {
                        let seen = Self::detects(observer, observer_at, target_at);
                        cache.insert(observer.id(), id, seen);
                        seen
                    }
                }
                None => Self::detects(observer, observer_at, target_at),
            };
            if seen {
                players.insert(observer.owner);
            }
        }
        players
    }
}
