//! Round progression: the task that walks a started room through its quiz.
//!
//! One task per started room. For each question, in order:
//!
//! ```text
//! snapshot leaderboard → broadcast advance-round → sleep(time × time_unit)
//! ```
//!
//! After the last question's time runs out the room is marked
//! `Completed`, its memberships are released, its final record is saved,
//! and the directory stops hosting it. Nothing is broadcast after that. A started game can't be cancelled.

use std::sync::Arc;
use std::time::Duration;

use quizroom_protocol::{AdvanceRound, Event, RoomCode, kind};
use quizroom_session::Registry;
use tokio::task::JoinHandle;
use tokio::time;

use crate::RoomDirectory;
use crate::room::{SharedRoom, lock};

/// Delivers an event to every live connection in a room.
///
/// [`Registry`] is the production implementation; tests can record what
/// would have been sent.
pub trait Broadcaster: Send + Sync + 'static {
    /// Fans `event` out to `room`, returning how many connections took it.
    fn broadcast(&self, event: &Event, room: &RoomCode) -> usize;
}

impl Broadcaster for Registry {
    fn broadcast(&self, event: &Event, room: &RoomCode) -> usize {
        Registry::broadcast(self, event, room)
    }
}

/// Handle to a room's round controller.
///
/// Dropping it detaches the controller; the game still runs to the end.
#[derive(Debug)]
pub struct RoundHandle {
    code: RoomCode,
    task: JoinHandle<()>,
}

impl RoundHandle {
    /// The room this controller drives.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Returns `true` once the room has completed.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits until the last question's time has run out and the room is
    /// completed.
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            tracing::error!(room = %self.code, error = %e, "round controller failed");
        }
    }
}

pub(crate) fn spawn(
    directory: Arc<RoomDirectory>,
    room: SharedRoom,
    broadcaster: Arc<dyn Broadcaster>,
) -> RoundHandle {
    let code = lock(&room).code.clone();
    let task = tokio::spawn(run(directory, room, code.clone(), broadcaster));
    RoundHandle { code, task }
}

/// How long question `time` stays on screen. Saturates instead of
/// overflowing; `time::sleep` treats a huge duration as "far future".
fn question_duration(time_unit: Duration, time: u32) -> Duration {
    time_unit.checked_mul(time).unwrap_or_else(|| {
        tracing::warn!(?time_unit, time, "question duration overflows, saturating");
        Duration::MAX
    })
}

async fn run(
    directory: Arc<RoomDirectory>,
    room: SharedRoom,
    code: RoomCode,
    broadcaster: Arc<dyn Broadcaster>,
) {
    let time_unit = directory.config().time_unit;
    let quiz = Arc::clone(&lock(&room).quiz);
    let total_rounds = quiz.questions.len();

    for (index, question) in quiz.questions.iter().enumerate() {
        // The guard must be gone before the first `.await` below.
        let (update, record) = {
            let mut state = lock(&room);
            state.current_question = Some(index);
            let update = AdvanceRound {
                round: index + 1,
                total_rounds,
                question: question.view(),
                leaderboard: state.ledger.leaderboard(),
            };
            (update, state.record())
        };
        directory.save_logged(&record);

        match Event::new(kind::ADVANCE_ROUND, &update) {
            Ok(event) => {
                let delivered = broadcaster.broadcast(&event, &code);
                tracing::info!(
                    room = %code,
                    round = index + 1,
                    total_rounds,
                    delivered,
                    "round advanced"
                );
            }
            Err(e) => {
                tracing::error!(room = %code, round = index + 1, error = %e, "failed to build round update");
            }
        }

        time::sleep(question_duration(time_unit, question.time)).await;
    }

    let record = directory.complete(&room);
    directory.save_logged(&record);
    directory.retire(&code);
    tracing::info!(room = %code, total_rounds, "game completed");
}
