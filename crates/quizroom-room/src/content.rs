//! External collaborators: accounts, quiz content, and game records.
//!
//! The room layer doesn't own any of this data. It reaches it through three
//! narrow, synchronous traits so that the backing store (a database, an HTTP
//! service, or the [`MemoryStore`](crate::MemoryStore) used in tests) can be
//! swapped without touching room logic.

use std::sync::Arc;

use quizroom_protocol::{
    AnswerId, AnswerOption, LeaderboardEntry, PlayerId, QuestionId,
    QuestionView, QuizId, RoomCode,
};
use serde::{Deserialize, Serialize};

use crate::{LookupError, PlayerScore, RoomInfo, RoomPhase, ledger};

/// A player account, as far as rooms care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: PlayerId,
    pub username: String,
}

/// One answer option of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    /// The question this answer belongs to.
    pub question: QuestionId,
    pub text: String,
    /// Points awarded when this answer is chosen and is right.
    pub points: u64,
    pub is_right: bool,
}

/// A question with its time limit and answer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    /// Time limit in [`RoomConfig::time_unit`](crate::RoomConfig)s.
    pub time: u32,
    pub answers: Vec<Answer>,
}

impl Question {
    /// The client-facing view: no correctness flags, no points.
    pub fn view(&self) -> QuestionView {
        QuestionView {
            id: self.id,
            text: self.text.clone(),
            time_limit: self.time,
            answers: self
                .answers
                .iter()
                .map(|answer| AnswerOption {
                    id: answer.id,
                    text: answer.text.clone(),
                })
                .collect(),
        }
    }
}

/// An ordered list of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub name: String,
    pub questions: Vec<Question>,
}

/// A snapshot of a room, written to the [`GameStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub code: RoomCode,
    pub quiz: QuizId,
    pub creator: PlayerId,
    pub phase: RoomPhase,
    /// Index of the question on screen, once the game has started.
    pub current_question: Option<usize>,
    /// Number of questions in the quiz.
    pub total_rounds: usize,
    /// Standings in join order.
    pub scores: Vec<PlayerScore>,
}

impl GameRecord {
    /// Room metadata as of this snapshot.
    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            quiz: self.quiz,
            creator: self.creator,
            phase: self.phase,
            round: self.current_question.map(|index| index + 1),
            total_rounds: self.total_rounds,
            player_count: self.scores.len(),
        }
    }

    /// The leaderboard as of this snapshot.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        ledger::rank(&self.scores)
    }
}

/// Looks up player accounts.
pub trait AccountDirectory: Send + Sync + 'static {
    /// # Errors
    /// [`LookupError::NotFound`] if no account has this id.
    fn account(&self, id: PlayerId) -> Result<Account, LookupError>;
}

/// Looks up quiz content.
pub trait QuizCatalog: Send + Sync + 'static {
    /// Returns the quiz with its questions in play order.
    ///
    /// # Errors
    /// [`LookupError::NotFound`] if no quiz has this id.
    fn quiz(&self, id: QuizId) -> Result<Quiz, LookupError>;

    /// Returns a single answer, including its correctness and points.
    ///
    /// # Errors
    /// [`LookupError::NotFound`] if no answer has this id.
    fn answer(&self, id: AnswerId) -> Result<Answer, LookupError>;
}

/// Loads and saves game records by join code.
pub trait GameStore: Send + Sync + 'static {
    /// Returns the record for `code`, or `None` if there is none.
    fn load_game(
        &self,
        code: &RoomCode,
    ) -> Result<Option<GameRecord>, LookupError>;

    /// Inserts or replaces the record for `record.code`.
    fn save_game(&self, record: &GameRecord) -> Result<(), LookupError>;
}

/// The three collaborators a [`RoomDirectory`](crate::RoomDirectory) needs.
#[derive(Clone)]
pub struct Collaborators {
    pub accounts: Arc<dyn AccountDirectory>,
    pub quizzes: Arc<dyn QuizCatalog>,
    pub games: Arc<dyn GameStore>,
}

impl Collaborators {
    /// Uses one store for all three roles.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: AccountDirectory + QuizCatalog + GameStore,
    {
        Self {
            accounts: store.clone(),
            quizzes: store.clone(),
            games: store,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
