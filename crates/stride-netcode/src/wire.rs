//! Wire messages and their binary encoding
//!
//! Two messages cross the network:
//!
//! - client → server: the client's whole unacknowledged input buffer
//!   (`Packet::Inputs`), resent on every send so a lost batch is covered by
//!   the next one;
//! - server → client: the authoritative `(sequence, position)` pair
//!   (`Packet::Snapshot`), emitted per processed batch and re-delivered
//!   periodically.
//!
//! Both sides tolerate duplicates and reordering through sequence numbers, so
//! the encoding carries no delivery metadata of its own.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use stride_core::{InputSample, Sequence, Vec3};

/// Identifier of a networked entity, shared by all nodes
pub type EntityId = u64;

/// Authoritative state for one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeSnapshot {
    /// Highest input sequence applied when the snapshot was taken
    pub sequence: Sequence,
    pub position: Vec3,
}

impl AuthoritativeSnapshot {
    pub fn new(sequence: Sequence, position: Vec3) -> Self {
        Self { sequence, position }
    }

    /// Whether this snapshot supersedes one at `sequence`
    pub fn is_newer_than(&self, sequence: Sequence) -> bool {
        self.sequence > sequence
    }
}

/// A message between nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Packet {
    /// Ordered input samples for an entity
    Inputs {
        entity: EntityId,
        batch: Vec<InputSample>,
    },
    /// Authoritative state for an entity
    Snapshot {
        entity: EntityId,
        snapshot: AuthoritativeSnapshot,
    },
}

impl Packet {
    /// Entity this packet is addressed to
    pub fn entity(&self) -> EntityId {
        match self {
            Packet::Inputs { entity, .. } | Packet::Snapshot { entity, .. } => *entity,
        }
    }

    /// Short name for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Inputs { .. } => "inputs",
            Packet::Snapshot { .. } => "snapshot",
        }
    }

    /// Encode to bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bytes
    pub fn decode(bytes: &[u8]) -> Result<Packet> {
        Ok(bincode::deserialize(bytes)?)
    }
}
