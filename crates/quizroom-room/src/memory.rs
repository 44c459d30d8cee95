//! In-memory collaborator store for tests and the demo server.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use quizroom_protocol::{AnswerId, PlayerId, QuizId, RoomCode};

use crate::{
    Account, AccountDirectory, Answer, GameRecord, GameStore, LookupError,
    Quiz, QuizCatalog,
};

#[derive(Default)]
struct Tables {
    accounts: HashMap<PlayerId, Account>,
    quizzes: HashMap<QuizId, Quiz>,
    answers: HashMap<AnswerId, Answer>,
    games: HashMap<RoomCode, GameRecord>,
}

/// Accounts, quizzes, and game records held in a few hash maps.
///
/// Implements [`AccountDirectory`], [`QuizCatalog`], and [`GameStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an account.
    pub fn insert_account(&self, id: PlayerId, username: impl Into<String>) {
        let account = Account {
            id,
            username: username.into(),
        };
        self.tables().accounts.insert(id, account);
    }

    /// Adds (or replaces) a quiz and indexes its answers.
    pub fn insert_quiz(&self, quiz: Quiz) {
        let mut tables = self.tables();
        for question in &quiz.questions {
            for answer in &question.answers {
                tables.answers.insert(answer.id, answer.clone());
            }
        }
        tables.quizzes.insert(quiz.id, quiz);
    }

    /// Number of saved game records.
    pub fn game_count(&self) -> usize {
        self.tables().games.len()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AccountDirectory for MemoryStore {
    fn account(&self, id: PlayerId) -> Result<Account, LookupError> {
        self.tables()
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| LookupError::not_found("account", id))
    }
}

impl QuizCatalog for MemoryStore {
    fn quiz(&self, id: QuizId) -> Result<Quiz, LookupError> {
        self.tables()
            .quizzes
            .get(&id)
            .cloned()
            .ok_or_else(|| LookupError::not_found("quiz", id))
    }

    fn answer(&self, id: AnswerId) -> Result<Answer, LookupError> {
        self.tables()
            .answers
            .get(&id)
            .cloned()
            .ok_or_else(|| LookupError::not_found("answer", id))
    }
}

impl GameStore for MemoryStore {
    fn load_game(
        &self,
        code: &RoomCode,
    ) -> Result<Option<GameRecord>, LookupError> {
        Ok(self.tables().games.get(code).cloned())
    }

    fn save_game(&self, record: &GameRecord) -> Result<(), LookupError> {
        self.tables()
            .games
            .insert(record.code.clone(), record.clone());
        Ok(())
    }
}
