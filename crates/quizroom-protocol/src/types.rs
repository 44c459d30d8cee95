//! Core protocol types for Quizroom's wire format.
//!
//! Every message on the wire is an [`Event`]: a kind tag plus an opaque JSON
//! payload whose schema depends on the kind. The payload structs below are
//! the schemas for the kinds listed in [`kind`].
//!
//! ```text
//! { "type": "advance-round", "payload": { "round": 1, "question": {...}, "leaderboard": [...] } }
//! ```
//!
//! Payload fields are camelCase because the clients are browsers.

use std::fmt;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player account.
///
/// Serialized as the plain number (`#[serde(transparent)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The join code of a room: short, unique, and typeable by a human.
///
/// Codes are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps a code string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as typed by players.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a quiz in the content catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(pub u64);

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q-{}", self.0)
    }
}

/// Identifies a question in the content catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Qn-{}", self.0)
    }
}

/// Identifies an answer option in the content catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerId(pub u64);

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// The event kinds understood by the server.
pub mod kind {
    /// Inbound: a player picks an answer. Payload: [`SubmitAnswer`](crate::SubmitAnswer).
    pub const SUBMIT_ANSWER: &str = "submit-answer";

    /// Inbound: the room's creator asks to start the game. Payload ignored.
    pub const START_GAME: &str = "start-game";

    /// Outbound broadcast: the next question and the current standings.
    /// Payload: [`AdvanceRound`](crate::AdvanceRound).
    pub const ADVANCE_ROUND: &str = "advance-round";

    /// Outbound direct: the creator's room is open.
    /// Payload: [`RoomOpened`](crate::RoomOpened).
    pub const ROOM_OPENED: &str = "room-opened";

    /// Outbound direct: a request from this connection was rejected.
    /// Payload: [`ErrorNotice`](crate::ErrorNotice).
    pub const ERROR: &str = "error";
}

// ---------------------------------------------------------------------------
// Event: the top-level wire format
// ---------------------------------------------------------------------------

/// The unit of wire communication: a kind tag and an opaque payload.
///
/// The payload is kept as raw JSON so the registry can route an event by
/// kind without knowing its schema; handlers decode it with
/// [`Event::payload_as`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Which kind of event this is (see [`kind`]).
    #[serde(rename = "type")]
    pub kind: String,

    /// Kind-specific body. Missing payloads decode as `null`.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Event {
    /// Builds an event, serializing `payload` into the body.
    pub fn new<T: Serialize>(
        kind: &str,
        payload: &T,
    ) -> Result<Self, ProtocolError> {
        let payload =
            serde_json::to_value(payload).map_err(ProtocolError::Encode)?;
        Ok(Self {
            kind: kind.to_string(),
            payload,
        })
    }

    /// Builds a [`kind::ERROR`] event carrying `message`.
    pub fn error(message: impl Into<String>) -> Result<Self, ProtocolError> {
        Self::new(
            kind::ERROR,
            &ErrorNotice {
                message: message.into(),
            },
        )
    }

    /// Decodes the payload into the schema for this event's kind.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        T::deserialize(&self.payload).map_err(|source| ProtocolError::Payload {
            kind: self.kind.clone(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Payload of [`kind::SUBMIT_ANSWER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswer {
    /// The answer option the player picked.
    pub answer_id: AnswerId,

    /// The question the client believes is showing. Optional; when present
    /// and stale the submission does not score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
}

/// One answer option as shown to players. Correctness and points stay on
/// the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: AnswerId,
    pub text: String,
}

/// A question as shown to players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    /// How long the question stays up, in the server's time unit
    /// (seconds by default).
    pub time_limit: u32,
    pub answers: Vec<AnswerOption>,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub score: u64,
}

/// Payload of [`kind::ADVANCE_ROUND`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRound {
    /// 1-based number of the round now starting.
    pub round: usize,
    /// How many rounds the game has in total.
    pub total_rounds: usize,
    pub question: QuestionView,
    /// Standings before this round, highest score first.
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Payload of [`kind::ROOM_OPENED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOpened {
    pub code: RoomCode,
}

/// Payload of [`kind::ERROR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub message: String,
}

// =========================================================================
// Tests
// =========================================================================
