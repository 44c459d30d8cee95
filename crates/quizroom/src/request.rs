//! Parsing the WebSocket upgrade path into a room request.
//!
//! Two routes are recognised:
//!
//! ```text
//! /game/create?player=<id>&quiz=<id>   open a room and join it as creator
//! /game/<code>/join?player=<id>        join an existing room
//! ```
//!
//! The player id is trusted: authentication happens in front of this
//! server.

use quizroom_protocol::{PlayerId, QuizId, RoomCode};

/// Why an upgrade path couldn't be turned into a [`UpgradeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("unknown route {0:?}")]
    UnknownRoute(String),

    #[error("missing query parameter {0:?}")]
    MissingParam(&'static str),

    #[error("query parameter {name:?} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },
}

/// What a connecting player asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeRequest {
    /// Open a new room for `quiz` with `player` as creator.
    Create { player: PlayerId, quiz: QuizId },
    /// Join the room `code`.
    Join { code: RoomCode, player: PlayerId },
}

impl UpgradeRequest {
    /// Parses a request target such as `/game/AB12cd/join?player=7`.
    pub fn parse(target: &str) -> Result<Self, RequestError> {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let segments: Vec<&str> =
            path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["game", "create"] => Ok(Self::Create {
                player: PlayerId(number(query, "player")?),
                quiz: QuizId(number(query, "quiz")?),
            }),
            ["game", code, "join"] => Ok(Self::Join {
                code: RoomCode::new(*code),
                player: PlayerId(number(query, "player")?),
            }),
            _ => Err(RequestError::UnknownRoute(path.to_string())),
        }
    }

    /// The player making the request.
    pub fn player(&self) -> PlayerId {
        match self {
            Self::Create { player, .. } | Self::Join { player, .. } => *player,
        }
    }
}

fn param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn number(query: &str, name: &'static str) -> Result<u64, RequestError> {
    let value = param(query, name).ok_or(RequestError::MissingParam(name))?;
    value.parse().map_err(|_| RequestError::NotANumber {
        name,
        value: value.to_string(),
    })
}
