//! Event handler hook: what the registry calls for each inbound event.
//!
//! The session layer doesn't know what a "submit-answer" means. Higher
//! layers register an [`EventHandler`] per event kind and the registry
//! routes each decoded [`Event`] to the matching one.

use std::sync::Arc;

use quizroom_protocol::{Event, PlayerId, RoomCode};
use quizroom_transport::ConnectionId;

use crate::{Registry, SessionError};

/// Who sent an event: the connection and the identity it was opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub connection: ConnectionId,
    pub player_id: PlayerId,
    pub room: RoomCode,
}

/// Handles one kind of inbound event.
///
/// Handlers run on the sender's read loop, so they must not block for
/// long. They get the registry so they can reply to the sender or
/// broadcast to the room.
///
/// Any `Fn(&Arc<Registry>, &Origin, &Event) -> Result<(), SessionError>`
/// closure is a handler.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use quizroom_protocol::Event;
/// use quizroom_session::{LivenessConfig, Origin, Registry, SessionError};
///
/// let registry = Registry::new(LivenessConfig::default()).with_handler(
///     "wave",
///     |registry: &Arc<Registry>, origin: &Origin, event: &Event| -> Result<(), SessionError> {
///         registry.broadcast(event, &origin.room);
///         Ok(())
///     },
/// );
/// assert!(registry.handles("wave"));
/// ```
pub trait EventHandler: Send + Sync + 'static {
    /// Handles `event`, sent by `origin`.
    ///
    /// # Errors
    /// An error is logged by the caller; it never closes the connection.
    fn handle(
        &self,
        registry: &Arc<Registry>,
        origin: &Origin,
        event: &Event,
    ) -> Result<(), SessionError>;
}

impl<F> EventHandler for F
where
    F: Fn(&Arc<Registry>, &Origin, &Event) -> Result<(), SessionError>
        + Send
        + Sync
        + 'static,
{
    fn handle(
        &self,
        registry: &Arc<Registry>,
        origin: &Origin,
        event: &Event,
    ) -> Result<(), SessionError> {
        self(registry, origin, event)
    }
}
