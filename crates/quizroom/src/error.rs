//! Unified error type for Quizroom.

use quizroom_protocol::ProtocolError;
use quizroom_room::{LookupError, RoomError};
use quizroom_session::SessionError;
use quizroom_transport::TransportError;

use crate::RequestError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `quizroom` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizroomError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad payload).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (admission, dispatch).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, wrong phase, not the creator).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A collaborator lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The upgrade path didn't name a valid room request.
    #[error("bad request: {0}")]
    BadRequest(#[from] RequestError),
}
