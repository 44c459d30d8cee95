//! Wire protocol for Quizroom.
//!
//! This crate defines the "language" that players and the server speak:
//!
//! - **Types** ([`Event`], [`AdvanceRound`], [`SubmitAnswer`], etc.) —
//!   the messages that travel on the wire, plus the identity newtypes
//!   ([`PlayerId`], [`RoomCode`], ...) shared by every layer.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are converted
//!   to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (connection registry and dispatch). It doesn't know about connections
//! or rooms, only how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Event) → Session (dispatch to handlers)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    AdvanceRound, AnswerId, AnswerOption, ErrorNotice, Event,
    LeaderboardEntry, PlayerId, QuestionId, QuestionView, QuizId, RoomCode,
    RoomOpened, SubmitAnswer, kind,
};
