//! A single room's state: who created it, what quiz it plays, where the
//! game is, and the scores.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quizroom_protocol::{PlayerId, QuizId, RoomCode};

use crate::{GameRecord, Question, Quiz, RoomPhase, ScoreLedger};

/// Rooms are shared between the directory and their round controller.
pub(crate) type SharedRoom = Arc<Mutex<Room>>;

/// Locks a std mutex, ignoring poison. Every critical section in this crate
/// is a handful of field writes, so a panicked holder can't leave a room
/// half-updated in a way later readers would trip over.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub(crate) struct Room {
    pub code: RoomCode,
    pub creator: PlayerId,
    pub quiz: Arc<Quiz>,
    pub phase: RoomPhase,
    /// Index into `quiz.questions` of the question on screen. Only moves
    /// forward, one step per round.
    pub current_question: Option<usize>,
    pub ledger: ScoreLedger,
}

impl Room {
    pub fn new(
        code: RoomCode,
        creator: PlayerId,
        creator_name: String,
        quiz: Quiz,
    ) -> Self {
        let mut ledger = ScoreLedger::new();
        ledger.enroll(creator, creator_name);
        Self {
            code,
            creator,
            quiz: Arc::new(quiz),
            phase: RoomPhase::Open,
            current_question: None,
            ledger,
        }
    }

    /// The question on screen, if the game has started.
    pub fn current(&self) -> Option<&Question> {
        self.current_question
            .and_then(|index| self.quiz.questions.get(index))
    }

    pub fn record(&self) -> GameRecord {
        GameRecord {
            code: self.code.clone(),
            quiz: self.quiz.id,
            creator: self.creator,
            phase: self.phase,
            current_question: self.current_question,
            total_rounds: self.quiz.questions.len(),
            scores: self.ledger.scores(),
        }
    }

    pub fn info(&self) -> RoomInfo {
        self.record().info()
    }
}

/// A snapshot of room metadata (not the scores themselves).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    /// The room's join code.
    pub code: RoomCode,
    /// The quiz being played.
    pub quiz: QuizId,
    /// The player who opened the room.
    pub creator: PlayerId,
    /// Current lifecycle phase.
    pub phase: RoomPhase,
    /// 1-based number of the round on screen, once started.
    pub round: Option<usize>,
    /// Number of questions in the quiz.
    pub total_rounds: usize,
    /// Number of players with a ledger entry.
    pub player_count: usize,
}
