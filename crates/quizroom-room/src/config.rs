//! Room configuration and phase machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room in a [`RoomDirectory`](crate::RoomDirectory).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Length of generated join codes.
    pub code_length: usize,

    /// How many random codes to try before giving up on opening a room.
    pub max_code_attempts: usize,

    /// Length of one unit of a question's time limit. A question with
    /// `time: 5` stays up for `5 * time_unit`.
    pub time_unit: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            max_code_attempts: 32,
            time_unit: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// Transitions are strictly ordered, with no skipping and no way back:
///
/// ```text
/// Open → InProgress → Completed
/// ```
///
/// - **Open**: the room exists and accepts joins. Only the creator can
///   start it.
/// - **InProgress**: the round controller is walking through the quiz.
///   Answers score; joins are refused.
/// - **Completed**: the last question's time ran out. Memberships are
///   released and the room cannot be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Open,
    InProgress,
    Completed,
}

impl RoomPhase {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` while the room holds its players' memberships.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    /// Returns the phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Open => Some(Self::InProgress),
            Self::InProgress => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Returns `true` if moving to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}
