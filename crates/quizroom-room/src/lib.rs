//! Room lifecycle, round progression, and scoring for Quizroom.
//!
//! Each room is a small piece of shared state (phase, current question,
//! score ledger) behind its own lock. A started room gets one Tokio task
//! that walks it through the quiz on the server's clock.
//!
//! # Key types
//!
//! - [`RoomDirectory`] — opens rooms, tracks memberships, starts games,
//!   scores answers
//! - [`RoundHandle`] — completion handle for a room's round controller
//! - [`ScoreLedger`] — per-room scores and leaderboard
//! - [`RoomPhase`] — lifecycle state machine
//! - [`RoomConfig`] — join-code and timing settings
//! - [`SubmitAnswerHandler`], [`StartGameHandler`] — event handlers to
//!   register on the session [`Registry`](quizroom_session::Registry)
//! - [`AccountDirectory`], [`QuizCatalog`], [`GameStore`] — the external
//!   collaborators, with [`MemoryStore`] as an in-process implementation

mod config;
mod content;
mod directory;
mod error;
mod handlers;
mod ledger;
mod memory;
mod room;
mod rounds;

pub use config::{RoomConfig, RoomPhase};
pub use content::{
    Account, AccountDirectory, Answer, Collaborators, GameRecord, GameStore,
    Question, Quiz, QuizCatalog,
};
pub use directory::{AnswerOutcome, RoomDirectory};
pub use error::{LookupError, RoomError};
pub use handlers::{StartGameHandler, SubmitAnswerHandler};
pub use ledger::{PlayerScore, Recorded, ScoreLedger};
pub use memory::MemoryStore;
pub use room::RoomInfo;
pub use rounds::{Broadcaster, RoundHandle};
