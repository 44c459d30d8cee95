//! # Quizroom
//!
//! Real-time coordinator for multiplayer quiz sessions.
//!
//! Players connect over WebSocket to open or join a room by its join code.
//! The room's creator starts the game; the server then walks every member
//! through the quiz on its own clock, broadcasting each question with the
//! current leaderboard, and scores answers as they arrive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quizroom::prelude::*;
//!
//! # async fn run() -> Result<(), QuizroomError> {
//! let store = Arc::new(MemoryStore::new());
//! // store.insert_account(...); store.insert_quiz(...);
//! let server = QuizroomServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(Collaborators::from_store(store))
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! Clients then connect to `/game/create?player=<id>&quiz=<id>` or
//! `/game/<code>/join?player=<id>`.

mod coordinator;
mod error;
mod logging;
mod request;
mod server;

pub use coordinator::{Admission, Coordinator};
pub use error::QuizroomError;
pub use logging::init_logging;
pub use request::{RequestError, UpgradeRequest};
pub use server::{QuizroomServer, QuizroomServerBuilder, ServerConfig};

/// Everything needed to run and talk to a Quizroom server.
pub mod prelude {
    pub use crate::{
        Coordinator, QuizroomError, QuizroomServer, QuizroomServerBuilder,
        ServerConfig, UpgradeRequest, init_logging,
    };
    pub use quizroom_protocol::{
        AdvanceRound, AnswerId, AnswerOption, Codec, ErrorNotice, Event,
        JsonCodec, LeaderboardEntry, PlayerId, QuestionId, QuestionView,
        QuizId, RoomCode, RoomOpened, SubmitAnswer, kind,
    };
    pub use quizroom_room::{
        Account, AccountDirectory, Answer, Collaborators, GameStore,
        MemoryStore, Question, Quiz, QuizCatalog, RoomConfig, RoomDirectory,
        RoomError, RoomInfo, RoomPhase, RoundHandle,
    };
    pub use quizroom_session::{LivenessConfig, Registry, SessionError};
}
