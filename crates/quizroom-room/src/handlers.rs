//! Event handlers for the in-game event kinds.
//!
//! Register them on the [`Registry`] under [`kind::SUBMIT_ANSWER`] and
//! [`kind::START_GAME`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use quizroom_protocol::kind;
//! use quizroom_room::{
//!     Collaborators, MemoryStore, RoomConfig, RoomDirectory, StartGameHandler,
//!     SubmitAnswerHandler,
//! };
//! use quizroom_session::{LivenessConfig, Registry};
//!
//! let store = Arc::new(MemoryStore::new());
//! let directory = Arc::new(RoomDirectory::new(
//!     Collaborators::from_store(store),
//!     RoomConfig::default(),
//! ));
//! let registry = Registry::new(LivenessConfig::default())
//!     .with_handler(kind::SUBMIT_ANSWER, SubmitAnswerHandler::new(Arc::clone(&directory)))
//!     .with_handler(kind::START_GAME, StartGameHandler::new(directory));
//! assert!(registry.handles(kind::START_GAME));
//! ```

use std::sync::Arc;

use quizroom_protocol::{Event, SubmitAnswer, kind};
use quizroom_session::{EventHandler, Origin, Registry, SessionError};

use crate::{AnswerOutcome, Broadcaster, RoomDirectory, RoomError};

/// Handles `submit-answer`: scores the answer in the sender's room.
///
/// Answers that don't score (unknown id, wrong question, repeated, room
/// gone) are dropped quietly. Only a malformed payload or an unreachable
/// content catalog is reported as an error.
pub struct SubmitAnswerHandler {
    directory: Arc<RoomDirectory>,
}

impl SubmitAnswerHandler {
    pub fn new(directory: Arc<RoomDirectory>) -> Self {
        Self { directory }
    }
}

impl EventHandler for SubmitAnswerHandler {
    fn handle(
        &self,
        _registry: &Arc<Registry>,
        origin: &Origin,
        event: &Event,
    ) -> Result<(), SessionError> {
        let submit: SubmitAnswer = event.payload_as()?;
        match self.directory.submit_answer(
            &origin.room,
            origin.player_id,
            submit.answer_id,
            submit.question_id,
        ) {
            Ok(AnswerOutcome::Counted { points, total }) => {
                tracing::debug!(
                    room = %origin.room,
                    player_id = %origin.player_id,
                    points,
                    total,
                    "answer scored"
                );
                Ok(())
            }
            Ok(outcome) => {
                tracing::debug!(
                    room = %origin.room,
                    player_id = %origin.player_id,
                    ?outcome,
                    "answer ignored"
                );
                Ok(())
            }
            Err(RoomError::NotFound(room)) => {
                tracing::debug!(%room, "answer for a room that no longer exists");
                Ok(())
            }
            Err(e) => Err(SessionError::Rejected(e.to_string())),
        }
    }
}

/// Handles `start-game`: the room's creator starts the game over the
/// socket.
///
/// A refused start is reported back to the sender as an `error` event.
pub struct StartGameHandler {
    directory: Arc<RoomDirectory>,
}

impl StartGameHandler {
    pub fn new(directory: Arc<RoomDirectory>) -> Self {
        Self { directory }
    }
}

impl EventHandler for StartGameHandler {
    fn handle(
        &self,
        registry: &Arc<Registry>,
        origin: &Origin,
        _event: &Event,
    ) -> Result<(), SessionError> {
        let broadcaster: Arc<dyn Broadcaster> = registry.clone();
        match self.directory.request_start(
            &origin.room,
            origin.player_id,
            broadcaster,
        ) {
            // The controller runs detached.
            Ok(_rounds) => Ok(()),
            Err(e) => {
                let message = e.to_string();
                match Event::error(message.clone()) {
                    Ok(notice) => {
                        registry.send_to(origin.connection, notice);
                    }
                    Err(encode) => {
                        tracing::error!(error = %encode, kind = kind::ERROR, "failed to build error event");
                    }
                }
                Err(SessionError::Rejected(message))
            }
        }
    }
}
