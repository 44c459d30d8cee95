//! Error types for the session layer.

use quizroom_protocol::ProtocolError;
use quizroom_transport::ConnectionId;

/// Errors that can occur while admitting connections or handling their
/// events.
///
/// Handler errors are logged by the read loop and never reach the peer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No handler is registered for this event kind.
    #[error("unknown event kind {0:?}")]
    UnknownEvent(String),

    /// The event payload could not be decoded for its kind.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A handler refused the request (wrong room state, not allowed, ...).
    #[error("rejected: {0}")]
    Rejected(String),

    /// A connection with this id is already live.
    #[error("{0} is already admitted")]
    AlreadyAdmitted(ConnectionId),

    /// The origin names a different connection than the one being opened.
    #[error("origin is for {origin}, but the connection is {actual}")]
    OriginMismatch {
        origin: ConnectionId,
        actual: ConnectionId,
    },
}
