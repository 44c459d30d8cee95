//! Room directory: opens rooms, tracks who is in which one, and starts
//! games.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use quizroom_protocol::{
    AnswerId, LeaderboardEntry, PlayerId, QuestionId, QuizId, RoomCode,
};
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::room::{Room, SharedRoom, lock};
use crate::rounds::{self, RoundHandle};
use crate::{
    Broadcaster, Collaborators, GameRecord, LookupError, Recorded,
    RoomConfig, RoomError, RoomInfo, RoomPhase,
};

/// What became of a submitted answer.
///
/// Gameplay events never fail loudly: anything that doesn't score is one of
/// these outcomes, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer counted. `points` is zero for a wrong answer.
    Counted { points: u64, total: u64 },
    /// The answer id doesn't exist.
    UnknownAnswer,
    /// The room isn't in progress.
    NotInProgress,
    /// The answer belongs to a question that isn't on screen.
    NotCurrentQuestion,
    /// The player already answered this question.
    AlreadyAnswered,
    /// The player has no score entry in this room.
    NotEnrolled,
}

/// Where a room code was found.
enum Found {
    /// Hosted by this directory.
    Live(SharedRoom),
    /// No longer hosted; this is its last saved record.
    Retired(GameRecord),
}

/// Rooms by code, plus the "which room is this player in" index.
#[derive(Default)]
struct Index {
    rooms: HashMap<RoomCode, SharedRoom>,

    /// Maps each player to the active room they belong to.
    /// A player can be in at most ONE active room at a time.
    memberships: HashMap<PlayerId, RoomCode>,
}

/// Creates and tracks rooms, and routes players to them.
///
/// This is the entry point for room operations from higher layers (the
/// coordinator and the event handlers).
///
/// ## Locking
///
/// The directory index and each room have their own `std::sync::Mutex`.
/// When both are needed the index is locked first. Neither is ever held
/// across an `.await`, and collaborator calls are synchronous.
pub struct RoomDirectory {
    index: Mutex<Index>,
    collaborators: Collaborators,
    config: RoomConfig,
}

impl RoomDirectory {
    pub fn new(collaborators: Collaborators, config: RoomConfig) -> Self {
        Self {
            index: Mutex::new(Index::default()),
            collaborators,
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Opens a room for `quiz`, with `creator` as its first member.
    ///
    /// # Errors
    /// - [`RoomError::Lookup`] if the account or quiz doesn't exist, or the
    ///   initial save fails.
    /// - [`RoomError::AlreadyInRoom`] if the creator is in another active
    ///   room.
    /// - [`RoomError::CodeSpaceExhausted`] if no free code was found.
    pub fn open_room(
        &self,
        creator: PlayerId,
        quiz: QuizId,
    ) -> Result<RoomCode, RoomError> {
        let account = self.collaborators.accounts.account(creator)?;

        let mut index = lock(&self.index);
        if let Some(current) = index.memberships.get(&creator) {
            return Err(RoomError::AlreadyInRoom {
                player: creator,
                room: current.clone(),
            });
        }

        let quiz = self.collaborators.quizzes.quiz(quiz)?;
        let code = self.free_code(&index)?;
        let room = Room::new(code.clone(), creator, account.username, quiz);
        self.collaborators.games.save_game(&room.record())?;

        tracing::info!(
            room = %code,
            %creator,
            quiz = %room.quiz.id,
            questions = room.quiz.questions.len(),
            "room opened"
        );
        index.memberships.insert(creator, code.clone());
        index
            .rooms
            .insert(code.clone(), Arc::new(Mutex::new(room)));
        Ok(code)
    }

    /// Adds `player` to the room `code`.
    ///
    /// A player re-joining the room they already belong to is accepted
    /// without a second score entry.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if there is no such room.
    /// - [`RoomError::AlreadyInRoom`] if the player is in another active
    ///   room.
    /// - [`RoomError::InvalidPhase`] if the room is no longer open.
    /// - [`RoomError::Lookup`] if the account doesn't exist or the save
    ///   fails.
    pub fn join_room(
        &self,
        code: &RoomCode,
        player: PlayerId,
    ) -> Result<(), RoomError> {
        let account = self.collaborators.accounts.account(player)?;

        let mut index = lock(&self.index);
        let shared = match index.rooms.get(code).cloned() {
            Some(shared) => shared,
            None => {
                let record = self.collaborators.games.load_game(code)?;
                return Err(not_hosted(code, record));
            }
        };
        let rejoin = match index.memberships.get(&player) {
            Some(current) if current == code => true,
            Some(current) => {
                return Err(RoomError::AlreadyInRoom {
                    player,
                    room: current.clone(),
                });
            }
            None => false,
        };

        let mut room = lock(&shared);
        if !room.phase.is_joinable() {
            return Err(RoomError::InvalidPhase {
                room: code.clone(),
                phase: room.phase,
            });
        }
        if rejoin {
            tracing::debug!(room = %code, %player, "player rejoined");
            return Ok(());
        }

        room.ledger.enroll(player, account.username);
        if let Err(e) = self.collaborators.games.save_game(&room.record()) {
            room.ledger.withdraw(player);
            return Err(e.into());
        }
        index.memberships.insert(player, code.clone());

        tracing::info!(
            room = %code,
            %player,
            players = room.ledger.len(),
            "player joined"
        );
        Ok(())
    }

    /// Starts the game in room `code` on behalf of `player`.
    ///
    /// The check and the `Open → InProgress` transition happen under the
    /// room's lock, so of two concurrent start requests exactly one wins.
    /// Round progression then runs on its own task, broadcasting through
    /// `broadcaster`; the returned handle resolves when it is done.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if there is no such room.
    /// - [`RoomError::NotCreator`] if `player` didn't open the room.
    /// - [`RoomError::InvalidPhase`] if the game already started or ended.
    /// - [`RoomError::Lookup`] if the save fails (the room stays open).
    pub fn request_start(
        self: &Arc<Self>,
        code: &RoomCode,
        player: PlayerId,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Result<RoundHandle, RoomError> {
        let shared = match self.find(code)? {
            Found::Live(shared) => shared,
            Found::Retired(record) => {
                return Err(not_hosted(code, Some(record)));
            }
        };
        {
            let mut room = lock(&shared);
            if room.creator != player {
                return Err(RoomError::NotCreator {
                    player,
                    room: code.clone(),
                });
            }
            if !room.phase.can_transition_to(RoomPhase::InProgress) {
                return Err(RoomError::InvalidPhase {
                    room: code.clone(),
                    phase: room.phase,
                });
            }
            room.phase = RoomPhase::InProgress;
            if let Err(e) = self.collaborators.games.save_game(&room.record())
            {
                room.phase = RoomPhase::Open;
                return Err(e.into());
            }
        }

        tracing::info!(room = %code, %player, "game started");
        Ok(rounds::spawn(Arc::clone(self), shared, broadcaster))
    }

    /// Scores `answer` for `player` in room `code`.
    ///
    /// Only the first answer per player to the question on screen counts,
    /// and only while the game is in progress. A right answer adds its
    /// points; a wrong one adds zero. If `question` is given it must also
    /// match the question on screen.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if there is no such room.
    /// - [`RoomError::Lookup`] if the content catalog is unavailable.
    pub fn submit_answer(
        &self,
        code: &RoomCode,
        player: PlayerId,
        answer: AnswerId,
        question: Option<QuestionId>,
    ) -> Result<AnswerOutcome, RoomError> {
        let answer = match self.collaborators.quizzes.answer(answer) {
            Ok(answer) => answer,
            Err(LookupError::NotFound { .. }) => {
                return Ok(AnswerOutcome::UnknownAnswer);
            }
            Err(e) => return Err(e.into()),
        };

        let Found::Live(shared) = self.find(code)? else {
            return Ok(AnswerOutcome::NotInProgress);
        };
        let mut room = lock(&shared);
        if room.phase != RoomPhase::InProgress {
            return Ok(AnswerOutcome::NotInProgress);
        }
        let (Some(round), Some(on_screen)) =
            (room.current_question, room.current().map(|q| q.id))
        else {
            return Ok(AnswerOutcome::NotInProgress);
        };
        if answer.question != on_screen
            || question.is_some_and(|claimed| claimed != on_screen)
        {
            return Ok(AnswerOutcome::NotCurrentQuestion);
        }

        let points = if answer.is_right { answer.points } else { 0 };
        let outcome = match room.ledger.record(player, round, points) {
            Recorded::Counted { points, total } => {
                AnswerOutcome::Counted { points, total }
            }
            Recorded::AlreadyAnswered => AnswerOutcome::AlreadyAnswered,
            Recorded::NotEnrolled => AnswerOutcome::NotEnrolled,
        };
        tracing::debug!(room = %code, %player, answer = %answer.id, ?outcome, "answer recorded");
        Ok(outcome)
    }

    /// Returns metadata for room `code`.
    ///
    /// Rooms that are no longer hosted are answered from their last saved
    /// record.
    pub fn room_info(&self, code: &RoomCode) -> Result<RoomInfo, RoomError> {
        let info = match self.find(code)? {
            Found::Live(shared) => lock(&shared).info(),
            Found::Retired(record) => record.info(),
        };
        Ok(info)
    }

    /// Returns the current standings in room `code`.
    pub fn leaderboard(
        &self,
        code: &RoomCode,
    ) -> Result<Vec<LeaderboardEntry>, RoomError> {
        let leaderboard = match self.find(code)? {
            Found::Live(shared) => lock(&shared).ledger.leaderboard(),
            Found::Retired(record) => record.leaderboard(),
        };
        Ok(leaderboard)
    }

    /// Returns the active room `player` belongs to, if any.
    pub fn room_of(&self, player: PlayerId) -> Option<RoomCode> {
        lock(&self.index).memberships.get(&player).cloned()
    }

    /// Returns the number of rooms this directory hosts.
    pub fn room_count(&self) -> usize {
        lock(&self.index).rooms.len()
    }

    /// Marks the room completed and releases its players' memberships.
    pub(crate) fn complete(&self, shared: &SharedRoom) -> GameRecord {
        let mut index = lock(&self.index);
        let mut room = lock(shared);
        room.phase = RoomPhase::Completed;
        let code = room.code.clone();
        index.memberships.retain(|_, member_of| *member_of != code);
        room.record()
    }

    /// Saves a record from a background task, where there is no caller to
    /// report a failure to.
    pub(crate) fn save_logged(&self, record: &GameRecord) {
        if let Err(e) = self.collaborators.games.save_game(record) {
            tracing::error!(room = %record.code, error = %e, "failed to save game record");
        }
    }

    /// Stops hosting room `code`. Call once its final record is saved.
    pub(crate) fn retire(&self, code: &RoomCode) {
        if lock(&self.index).rooms.remove(code).is_some() {
            tracing::debug!(room = %code, "room retired");
        }
    }

    fn find(&self, code: &RoomCode) -> Result<Found, RoomError> {
        let live = lock(&self.index).rooms.get(code).cloned();
        if let Some(shared) = live {
            return Ok(Found::Live(shared));
        }
        match self.collaborators.games.load_game(code)? {
            Some(record) => Ok(Found::Retired(record)),
            None => Err(RoomError::NotFound(code.clone())),
        }
    }

    /// Picks a random code that is neither a live room nor a saved game.
    fn free_code(&self, index: &Index) -> Result<RoomCode, RoomError> {
        let mut rng = rand::rng();
        for _ in 0..self.config.max_code_attempts {
            let code: String = (&mut rng)
                .sample_iter(Alphanumeric)
                .take(self.config.code_length)
                .map(char::from)
                .collect();
            let code = RoomCode::new(code);
            if index.rooms.contains_key(&code) {
                continue;
            }
            if self.collaborators.games.load_game(&code)?.is_some() {
                continue;
            }
            return Ok(code);
        }
        Err(RoomError::CodeSpaceExhausted(self.config.max_code_attempts))
    }
}

/// The error for joining or starting a room this directory doesn't host.
/// A finished game reports its phase; anything else is not found.
fn not_hosted(code: &RoomCode, record: Option<GameRecord>) -> RoomError {
    match record {
        Some(record) if !record.phase.is_joinable() => RoomError::InvalidPhase {
            room: code.clone(),
            phase: record.phase,
        },
        _ => RoomError::NotFound(code.clone()),
    }
}

impl std::fmt::Debug for RoomDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomDirectory")
            .field("rooms", &self.room_count())
            .field("config", &self.config)
            .finish()
    }
}
