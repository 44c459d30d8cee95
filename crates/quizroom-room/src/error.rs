//! Error types for the room layer.

use quizroom_protocol::{PlayerId, RoomCode};

use crate::RoomPhase;

/// Failure reported by an external collaborator (accounts, quiz content,
/// game store).
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// No record with this id exists.
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: String },

    /// The collaborator could not be reached or refused the request.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

impl LookupError {
    /// Shorthand for [`LookupError::NotFound`].
    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }
}

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The player already belongs to another active room.
    #[error("player {player} is already in room {room}")]
    AlreadyInRoom { player: PlayerId, room: RoomCode },

    /// Only the room's creator may start it.
    #[error("player {player} is not the creator of room {room}")]
    NotCreator { player: PlayerId, room: RoomCode },

    /// The room's phase doesn't allow this operation. For example,
    /// joining or starting a room that's already in progress.
    #[error("room {room} is {phase}")]
    InvalidPhase { room: RoomCode, phase: RoomPhase },

    /// No free join code was found.
    #[error("no free room code after {0} attempts")]
    CodeSpaceExhausted(usize),

    /// An account, quiz, or game record lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}
