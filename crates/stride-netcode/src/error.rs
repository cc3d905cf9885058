//! Error types for stride-netcode

use thiserror::Error;

use crate::entity::Role;
use crate::wire::EntityId;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid RON
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Configuration parsed but holds unusable values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Movement tuning or tick rate rejected by the core
    #[error("Core error: {0}")]
    Core(#[from] stride_core::Error),

    /// Packet could not be encoded or decoded
    #[error("Wire codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Packet addressed to an entity whose role cannot handle it
    #[error("Entity {entity} with role {role:?} cannot handle {packet}")]
    UnexpectedPacket {
        entity: EntityId,
        role: Role,
        packet: &'static str,
    },

    /// Packet addressed to an entity this session does not know
    #[error("Unknown entity {0}")]
    UnknownEntity(EntityId),

    /// An entity id was registered twice
    #[error("Entity {0} already exists")]
    DuplicateEntity(EntityId),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
