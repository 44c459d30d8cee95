//! The coordinator: one registry and one room directory, wired together.
//!
//! This is the piece the server (or an embedding application) talks to.
//! It owns the process-wide [`Registry`] of live connections and the
//! [`RoomDirectory`], registers the in-game event handlers, and exposes the
//! two lifecycle operations: opening a connection for a room and starting
//! a room's game.

use std::sync::Arc;

use quizroom_protocol::{
    Event, JsonCodec, PlayerId, RoomCode, RoomOpened, kind,
};
use quizroom_room::{
    Collaborators, RoomConfig, RoomDirectory, RoundHandle, StartGameHandler,
    SubmitAnswerHandler,
};
use quizroom_session::{
    ConnectionHandle, LivenessConfig, Origin, Registry, open,
};
use quizroom_transport::Connection;

use crate::{QuizroomError, UpgradeRequest};

/// A player cleared to connect to a room.
///
/// Produced by [`Coordinator::admit`]; hand it to
/// [`Coordinator::attach`] together with the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub player: PlayerId,
    pub code: RoomCode,
    /// `true` if the room was opened by this request.
    pub opened: bool,
}

/// Coordinates connections, rooms, and games.
///
/// Cheap to share: wrap it in an `Arc` and hand it to every task that
/// accepts connections.
pub struct Coordinator {
    registry: Arc<Registry>,
    directory: Arc<RoomDirectory>,
}

impl Coordinator {
    /// Builds the room directory and the registry, with the
    /// `submit-answer` and `start-game` handlers registered.
    pub fn new(
        collaborators: Collaborators,
        liveness: LivenessConfig,
        rooms: RoomConfig,
    ) -> Self {
        let directory = Arc::new(RoomDirectory::new(collaborators, rooms));
        let registry = Registry::new(liveness)
            .with_handler(
                kind::SUBMIT_ANSWER,
                SubmitAnswerHandler::new(Arc::clone(&directory)),
            )
            .with_handler(
                kind::START_GAME,
                StartGameHandler::new(Arc::clone(&directory)),
            );
        Self {
            registry: Arc::new(registry),
            directory,
        }
    }

    /// The live-connection registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The room directory.
    pub fn directory(&self) -> &Arc<RoomDirectory> {
        &self.directory
    }

    /// Validates an upgrade request and updates room membership.
    ///
    /// For [`UpgradeRequest::Create`] this opens the room; for
    /// [`UpgradeRequest::Join`] it joins it. No connection is registered
    /// yet, so a rejected request leaves the caller free to report the
    /// error on the socket.
    ///
    /// # Errors
    /// Any [`RoomError`](quizroom_room::RoomError) from opening or joining.
    pub fn admit(
        &self,
        request: &UpgradeRequest,
    ) -> Result<Admission, QuizroomError> {
        match request {
            UpgradeRequest::Create { player, quiz } => {
                let code = self.directory.open_room(*player, *quiz)?;
                Ok(Admission {
                    player: *player,
                    code,
                    opened: true,
                })
            }
            UpgradeRequest::Join { code, player } => {
                self.directory.join_room(code, *player)?;
                Ok(Admission {
                    player: *player,
                    code: code.clone(),
                    opened: false,
                })
            }
        }
    }

    /// Registers `conn` for an admitted player and starts its loops.
    ///
    /// A creator also gets a `room-opened` event with the join code.
    pub fn attach<C: Connection>(
        &self,
        conn: C,
        admission: Admission,
    ) -> Result<ConnectionHandle, QuizroomError> {
        let origin = Origin {
            connection: conn.id(),
            player_id: admission.player,
            room: admission.code.clone(),
        };
        let handle = open(&self.registry, conn, origin, JsonCodec)?;

        if admission.opened {
            let opened = Event::new(
                kind::ROOM_OPENED,
                &RoomOpened {
                    code: admission.code,
                },
            )?;
            self.registry.send_to(handle.id(), opened);
        }
        Ok(handle)
    }

    /// Opens a connection for `player` in room `code`.
    ///
    /// # Errors
    /// - The room doesn't exist or is no longer open.
    /// - The player belongs to another active room.
    pub fn open_connection<C: Connection>(
        &self,
        conn: C,
        player: PlayerId,
        code: &RoomCode,
    ) -> Result<ConnectionHandle, QuizroomError> {
        let admission = self.admit(&UpgradeRequest::Join {
            code: code.clone(),
            player,
        })?;
        self.attach(conn, admission)
    }

    /// Starts the game in room `code` on behalf of `player`.
    ///
    /// Returns once the game has started; rounds then advance on their own
    /// task, broadcasting to the room through the registry.
    ///
    /// # Errors
    /// Room not found, not the creator, or already started.
    pub fn request_start(
        &self,
        code: &RoomCode,
        player: PlayerId,
    ) -> Result<RoundHandle, QuizroomError> {
        let rounds =
            self.directory
                .request_start(code, player, self.registry.clone())?;
        Ok(rounds)
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("registry", &self.registry)
            .field("directory", &self.directory)
            .finish()
    }
}
