//! Error types for world loading and the wire protocol

use crate::EntityId;
use std::io;
use thiserror::Error;

/// Failures while building, loading, saving or mutating a world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A room file or save document could not be understood.
    #[error("malformed world data in {source_name} (line {line}): {reason}")]
    MalformedWorldData {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("unknown room: {0}")]
    UnknownRoom(String),

    #[error("no character with id {0}")]
    UnknownCharacter(EntityId),

    /// The id is already in a room or waiting to respawn.
    #[error("character {0} is already in the world")]
    DuplicateCharacter(EntityId),

    #[error("no NPC ids left")]
    NpcIdsExhausted,

    #[error("save document error: {0}")]
    Save(#[from] serde_json::Error),
}

impl WorldError {
    pub fn malformed(source_name: &str, line: usize, reason: impl Into<String>) -> Self {
        WorldError::MalformedWorldData {
            source_name: source_name.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

/// Failures on a single relay connection. None of these are fatal to the
/// process; the connection that produced one is closed.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("unknown action code {0}")]
    UnknownAction(i32),

    #[error("unknown weapon id {0}")]
    UnknownWeapon(i32),

    #[error("invalid payload for action {code}: {reason}")]
    InvalidPayload { code: i32, reason: String },

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

impl ProtocolError {
    /// True when the peer simply went away rather than sending garbage.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
