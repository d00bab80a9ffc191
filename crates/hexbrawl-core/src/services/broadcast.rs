//! Outbound packets.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, PlayerId, RemovalCondition};
use crate::report::Report;

/// A message to one or more players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packet {
    /// Full snapshot of one unit
    EntityUpdate(Box<Entity>),
    /// The unit is gone (or, under double-blind, not visible)
    EntityRemove {
        /// Unit id
        id: EntityId,
        /// Why it left
        condition: RemovalCondition,
    },
    /// Every unit the recipient may know about
    AllEntities(Vec<Entity>),
    /// The recipient's view of the round's reports
    Reports(Vec<Report>),
}

/// Delivers packets to players.
pub trait BroadcastSink: Send {
    /// Sends to one player.
    fn send_to(&mut self, player: PlayerId, packet: Packet);

    /// Sends to everyone.
    fn send_all(&mut self, packet: Packet);
}

/// Sink that keeps every packet in order. `None` marks a broadcast to all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingBroadcast {
    sent: Vec<(Option<PlayerId>, Packet)>,
}

impl RecordingBroadcast {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent, in order.
    #[must_use]
    pub fn sent(&self) -> &[(Option<PlayerId>, Packet)] {
        &self.sent
    }

    /// Packets `player` received, including broadcasts.
    pub fn received_by(&self, player: PlayerId) -> impl Iterator<Item = &Packet> + '_ {
        self.sent
            .iter()
            .filter(move |(to, _)| to.map_or(true, |p| p == player))
            .map(|(_, packet)| packet)
    }

    /// Drains the record.
    pub fn take(&mut self) -> Vec<(Option<PlayerId>, Packet)> {
        std::mem::take(&mut self.sent)
    }
}

impl BroadcastSink for RecordingBroadcast {
    fn send_to(&mut self, player: PlayerId, packet: Packet) {
        self.sent.push((Some(player), packet));
    }

    fn send_all(&mut self, packet: Packet) {
        self.sent.push((None, packet));
    }
}
