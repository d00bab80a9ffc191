//! Cargo and tow links.

use hexfield::{Coords, Direction};
use tracing::debug;

use crate::arena::Arena;
use crate::entity::{EntityId, StatusFlags};

use super::TransportOps;

/// Keeps both ends of every link in step.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTransport;

impl StandardTransport {
    /// Creates the transport rules.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TransportOps for StandardTransport {
    fn load(&self, arena: &mut Arena, carrier: EntityId, unit: EntityId) -> bool {
        if carrier == unit || arena.get(carrier).is_none() || arena.get(unit).is_none() {
            return false;
        }
        arena.set_position(unit, None);
        if let Some(cargo) = arena.get_mut(unit) {
            cargo.links.transported_by = Some(carrier);
        }
        if let Some(host) = arena.get_mut(carrier) {
            if !host.links.loaded.contains(&unit) {
                host.links.loaded.push(unit);
            }
        }
        debug!(target: "hexbrawl::transport", %carrier, %unit, "loaded");
        true
    }

    fn unload(
        &self,
        arena: &mut Arena,
        carrier: EntityId,
        unit: EntityId,
        coords: Coords,
        facing: Direction,
        elevation: i32,
    ) -> bool {
        if let Some(host) = arena.get_mut(carrier) {
            host.links.loaded.retain(|&id| id != unit);
        }
        let Some(cargo) = arena.get_mut(unit) else {
            return false;
        };
        cargo.links.transported_by = None;
        cargo.facing = facing;
        cargo.elevation = elevation;
        cargo.status.insert(StatusFlags::UNLOADED_THIS_TURN);
        arena.set_position(unit, Some(coords));
        debug!(target: "hexbrawl::transport", %carrier, %unit, hex = %coords, "unloaded");
        true
    }

    fn disconnect_tow(&self, arena: &mut Arena, tractor: EntityId, trailer: EntityId) {
        if let Some(front) = arena.get_mut(tractor) {
            if front.links.towing == Some(trailer) {
                front.links.towing = None;
            }
        }
        if let Some(back) = arena.get_mut(trailer) {
            if back.links.towed_by == Some(tractor) {
                back.links.towed_by = None;
            }
        }
    }
}
