//! Per-room score ledger.

use quizroom_protocol::{LeaderboardEntry, PlayerId};
use serde::{Deserialize, Serialize};

/// One player's standing in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub player_name: String,
    pub score: u64,
}

/// What happened to an answer handed to [`ScoreLedger::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// The answer counted; `total` is the player's new score.
    Counted { points: u64, total: u64 },
    /// The player already answered this round.
    AlreadyAnswered,
    /// The player has no entry in this ledger.
    NotEnrolled,
}

#[derive(Debug, Clone)]
struct Entry {
    standing: PlayerScore,
    /// Last round this player answered, so only the first answer per round
    /// counts.
    answered: Option<usize>,
}

/// Scores for every player in one room, in join order.
///
/// The ledger is plain data. The [`RoomDirectory`](crate::RoomDirectory)
/// keeps it behind the room's lock, which is what makes concurrent
/// submissions safe.
#[derive(Debug, Clone, Default)]
pub struct ScoreLedger {
    entries: Vec<Entry>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `player` with a zero score.
    ///
    /// Returns `false` (and changes nothing) if the player already has an
    /// entry.
    pub fn enroll(
        &mut self,
        player_id: PlayerId,
        player_name: impl Into<String>,
    ) -> bool {
        if self.contains(player_id) {
            return false;
        }
        self.entries.push(Entry {
            standing: PlayerScore {
                player_id,
                player_name: player_name.into(),
                score: 0,
            },
            answered: None,
        });
        true
    }

    /// Removes `player`'s entry. Used to undo an enrollment.
    pub fn withdraw(&mut self, player_id: PlayerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.standing.player_id != player_id);
        self.entries.len() != before
    }

    /// Records `player`'s answer for `round`, adding `points` (zero for a
    /// wrong answer).
    ///
    /// Only the first answer per player per round is counted.
    pub fn record(
        &mut self,
        player_id: PlayerId,
        round: usize,
        points: u64,
    ) -> Recorded {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.standing.player_id == player_id)
        else {
            return Recorded::NotEnrolled;
        };
        if entry.answered == Some(round) {
            return Recorded::AlreadyAnswered;
        }
        entry.answered = Some(round);
        entry.standing.score = entry.standing.score.saturating_add(points);
        Recorded::Counted {
            points,
            total: entry.standing.score,
        }
    }

    /// Returns `true` if the player has an entry.
    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.entries
            .iter()
            .any(|e| e.standing.player_id == player_id)
    }

    /// Returns the player's current score, if enrolled.
    pub fn score_of(&self, player_id: PlayerId) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.standing.player_id == player_id)
            .map(|e| e.standing.score)
    }

    /// Every player's standing, in join order.
    pub fn scores(&self) -> Vec<PlayerScore> {
        self.entries.iter().map(|e| e.standing.clone()).collect()
    }

    /// The leaderboard: highest score first, ties in join order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        rank(self.entries.iter().map(|e| &e.standing))
    }

    /// Number of enrolled players.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Orders standings highest score first. Equal scores keep their input
/// order, which is join order everywhere this is called.
pub(crate) fn rank<'a>(
    standings: impl IntoIterator<Item = &'a PlayerScore>,
) -> Vec<LeaderboardEntry> {
    let mut standings: Vec<&PlayerScore> = standings.into_iter().collect();
    // `sort_by` is stable.
    standings.sort_by(|a, b| b.score.cmp(&a.score));
    standings
        .into_iter()
        .map(|s| LeaderboardEntry {
            player_name: s.player_name.clone(),
            score: s.score,
        })
        .collect()
}
