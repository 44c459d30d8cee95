//! Integration tests for the room system: directory rules, the round
//! timeline on a paused clock, and concurrent scoring.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use quizroom_protocol::{
    AdvanceRound, AnswerId, Event, PlayerId, QuestionId, QuizId, RoomCode,
    kind,
};
use quizroom_room::{
    Answer, AnswerOutcome, Broadcaster, Collaborators, GameStore, MemoryStore,
    Question, Quiz, RoomConfig, RoomDirectory, RoomError, RoomPhase,
};
use tokio::time::{self, Instant};

// =========================================================================
// Fixtures
// =========================================================================

const CREATOR: PlayerId = PlayerId(1);
const GUEST: PlayerId = PlayerId(2);
const OUTSIDER: PlayerId = PlayerId(3);

const GEOGRAPHY: QuizId = QuizId(1);
const EMPTY: QuizId = QuizId(2);

fn answer(id: u64, question: u64, points: u64, is_right: bool) -> Answer {
    Answer {
        id: AnswerId(id),
        question: QuestionId(question),
        text: format!("answer {id}"),
        points,
        is_right,
    }
}

/// Two questions: 5 time units then 3.
fn geography() -> Quiz {
    Quiz {
        id: GEOGRAPHY,
        name: "geography".into(),
        questions: vec![
            Question {
                id: QuestionId(10),
                text: "Capital of France?".into(),
                time: 5,
                answers: vec![answer(100, 10, 10, true), answer(101, 10, 10, false)],
            },
            Question {
                id: QuestionId(20),
                text: "Capital of Peru?".into(),
                time: 3,
                answers: vec![answer(200, 20, 20, true), answer(201, 20, 20, false)],
            },
        ],
    }
}

fn store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_account(CREATOR, "ada");
    store.insert_account(GUEST, "grace");
    store.insert_account(OUTSIDER, "linus");
    store.insert_quiz(geography());
    store.insert_quiz(Quiz {
        id: EMPTY,
        name: "empty".into(),
        questions: Vec::new(),
    });
    store
}

fn directory_with(store: Arc<MemoryStore>, config: RoomConfig) -> Arc<RoomDirectory> {
    Arc::new(RoomDirectory::new(Collaborators::from_store(store), config))
}

fn directory() -> (Arc<RoomDirectory>, Arc<MemoryStore>) {
    let store = store();
    (directory_with(Arc::clone(&store), RoomConfig::default()), store)
}

/// Records every broadcast with the (virtual) time it happened.
#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<(Instant, RoomCode, Event)>>,
}

impl Recorder {
    fn rounds(&self) -> Vec<(Instant, AdvanceRound)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, _, event)| event.kind == kind::ADVANCE_ROUND)
            .map(|(at, _, event)| (*at, event.payload_as().unwrap()))
            .collect()
    }
}

impl Broadcaster for Recorder {
    fn broadcast(&self, event: &Event, room: &RoomCode) -> usize {
        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), room.clone(), event.clone()));
        1
    }
}

// =========================================================================
// Opening and joining
// =========================================================================

#[test]
fn test_open_room_generates_six_char_alphanumeric_code() {
    let (directory, store) = directory();

    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();

    assert_eq!(code.as_str().len(), 6);
    assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(directory.room_of(CREATOR), Some(code.clone()));

    let record = store.load_game(&code).unwrap().unwrap();
    assert_eq!(record.phase, RoomPhase::Open);
    assert_eq!(record.scores.len(), 1);
    assert_eq!(record.scores[0].score, 0);
}

#[test]
fn test_open_room_unknown_account_or_quiz_fails() {
    let (directory, _) = directory();

    let err = directory.open_room(PlayerId(99), GEOGRAPHY).unwrap_err();
    assert!(matches!(err, RoomError::Lookup(_)));

    let err = directory.open_room(CREATOR, QuizId(99)).unwrap_err();
    assert!(matches!(err, RoomError::Lookup(_)));
    assert_eq!(directory.room_count(), 0);
}

#[test]
fn test_open_room_while_in_another_room_fails() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();

    let err = directory.open_room(CREATOR, GEOGRAPHY).unwrap_err();
    assert!(matches!(
        err,
        RoomError::AlreadyInRoom { player, room } if player == CREATOR && room == code
    ));
}

#[test]
fn test_open_room_gives_up_when_codes_run_out() {
    // Zero-length codes: the first room takes "", the second finds no
    // free code.
    let config = RoomConfig {
        code_length: 0,
        max_code_attempts: 3,
        ..RoomConfig::default()
    };
    let directory = directory_with(store(), config);

    directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    let err = directory.open_room(GUEST, GEOGRAPHY).unwrap_err();
    assert!(matches!(err, RoomError::CodeSpaceExhausted(3)));
    assert_eq!(directory.room_of(GUEST), None);
}

#[test]
fn test_join_room_adds_zero_score_entry() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();

    directory.join_room(&code, GUEST).unwrap();

    let info = directory.room_info(&code).unwrap();
    assert_eq!(info.player_count, 2);
    assert_eq!(info.phase, RoomPhase::Open);
    assert_eq!(info.round, None);
    assert_eq!(directory.room_of(GUEST), Some(code));
}

#[test]
fn test_rejoin_same_room_keeps_one_entry() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();

    directory.join_room(&code, GUEST).unwrap();
    directory.join_room(&code, GUEST).unwrap();
    directory.join_room(&code, CREATOR).unwrap();

    assert_eq!(directory.room_info(&code).unwrap().player_count, 2);
}

#[test]
fn test_join_unknown_room_fails() {
    let (directory, _) = directory();
    let err = directory
        .join_room(&RoomCode::new("NOPE00"), GUEST)
        .unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
}

#[test]
fn test_join_second_room_fails() {
    let (directory, _) = directory();
    let first = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    let second = directory.open_room(OUTSIDER, GEOGRAPHY).unwrap();
    directory.join_room(&first, GUEST).unwrap();

    let err = directory.join_room(&second, GUEST).unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInRoom { room, .. } if room == first));
    assert_eq!(directory.room_info(&second).unwrap().player_count, 1);
}

// =========================================================================
// Starting
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_by_non_creator_is_rejected() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    directory.join_room(&code, GUEST).unwrap();

    let err = directory
        .request_start(&code, GUEST, Arc::new(Recorder::default()))
        .unwrap_err();

    assert!(matches!(err, RoomError::NotCreator { .. }));
    assert_eq!(directory.room_info(&code).unwrap().phase, RoomPhase::Open);
}

#[tokio::test(start_paused = true)]
async fn test_start_unknown_room_is_not_found() {
    let (directory, _) = directory();
    let err = directory
        .request_start(&RoomCode::new("NOPE00"), CREATOR, Arc::new(Recorder::default()))
        .unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_second_start_is_rejected_and_does_not_reset() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    let recorder = Arc::new(Recorder::default());

    let rounds = directory
        .request_start(&code, CREATOR, recorder.clone())
        .unwrap();
    time::sleep(Duration::from_secs(6)).await;
    assert_eq!(directory.room_info(&code).unwrap().round, Some(2));

    let err = directory
        .request_start(&code, CREATOR, recorder.clone())
        .unwrap_err();
    assert!(matches!(
        err,
        RoomError::InvalidPhase { phase: RoomPhase::InProgress, .. }
    ));
    assert_eq!(directory.room_info(&code).unwrap().round, Some(2));

    rounds.finished().await;
    assert_eq!(recorder.rounds().len(), 2);

    // Completed rooms can't restart either.
    let err = directory
        .request_start(&code, CREATOR, recorder)
        .unwrap_err();
    assert!(matches!(
        err,
        RoomError::InvalidPhase { phase: RoomPhase::Completed, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_join_while_in_progress_is_rejected() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    let _rounds = directory
        .request_start(&code, CREATOR, Arc::new(Recorder::default()))
        .unwrap();

    let err = directory.join_room(&code, GUEST).unwrap_err();
    assert!(matches!(
        err,
        RoomError::InvalidPhase { phase: RoomPhase::InProgress, .. }
    ));
    assert_eq!(directory.room_of(GUEST), None);
}

// =========================================================================
// Round timeline
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_two_question_timeline() {
    let (directory, store) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    directory.join_room(&code, GUEST).unwrap();
    let recorder = Arc::new(Recorder::default());
    let started = Instant::now();

    let rounds = directory
        .request_start(&code, CREATOR, recorder.clone())
        .unwrap();
    assert_eq!(rounds.code(), &code);

    time::sleep(Duration::from_secs(1)).await;
    let info = directory.room_info(&code).unwrap();
    assert_eq!(info.phase, RoomPhase::InProgress);
    assert_eq!(info.round, Some(1));

    time::sleep(Duration::from_secs(5)).await; // t = 6
    assert_eq!(directory.room_info(&code).unwrap().round, Some(2));

    rounds.finished().await;
    assert_eq!(started.elapsed(), Duration::from_secs(8));

    let rounds = recorder.rounds();
    assert_eq!(rounds.len(), 2);

    let (at, first) = &rounds[0];
    assert_eq!(at.duration_since(started), Duration::ZERO);
    assert_eq!(first.round, 1);
    assert_eq!(first.total_rounds, 2);
    assert_eq!(first.question.id, QuestionId(10));
    assert_eq!(first.question.time_limit, 5);
    assert_eq!(first.leaderboard.len(), 2);
    assert!(first.leaderboard.iter().all(|entry| entry.score == 0));

    let (at, second) = &rounds[1];
    assert_eq!(at.duration_since(started), Duration::from_secs(5));
    assert_eq!(second.round, 2);
    assert_eq!(second.question.id, QuestionId(20));

    let info = directory.room_info(&code).unwrap();
    assert_eq!(info.phase, RoomPhase::Completed);
    assert_eq!(info.round, Some(2));
    let record = store.load_game(&code).unwrap().unwrap();
    assert_eq!(record.phase, RoomPhase::Completed);

    // Nothing is broadcast after completion.
    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(recorder.rounds().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_completion_releases_memberships() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    directory.join_room(&code, GUEST).unwrap();

    directory
        .request_start(&code, CREATOR, Arc::new(Recorder::default()))
        .unwrap()
        .finished()
        .await;

    assert_eq!(directory.room_of(CREATOR), None);
    assert_eq!(directory.room_of(GUEST), None);
    // Both are free to play again.
    let next = directory.open_room(GUEST, GEOGRAPHY).unwrap();
    directory.join_room(&next, CREATOR).unwrap();
    // The finished room is still visible, and closed to joins.
    assert_eq!(directory.room_info(&code).unwrap().phase, RoomPhase::Completed);
    assert!(directory.join_room(&code, OUTSIDER).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_empty_quiz_completes_immediately() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, EMPTY).unwrap();
    let recorder = Arc::new(Recorder::default());
    let started = Instant::now();

    directory
        .request_start(&code, CREATOR, recorder.clone())
        .unwrap()
        .finished()
        .await;

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(recorder.rounds().is_empty());
    assert_eq!(directory.room_info(&code).unwrap().phase, RoomPhase::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_time_unit_scales_question_time() {
    let config = RoomConfig {
        time_unit: Duration::from_millis(10),
        ..RoomConfig::default()
    };
    let directory = directory_with(store(), config);
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    let started = Instant::now();

    directory
        .request_start(&code, CREATOR, Arc::new(Recorder::default()))
        .unwrap()
        .finished()
        .await;

    assert_eq!(started.elapsed(), Duration::from_millis(80));
}

#[tokio::test(start_paused = true)]
async fn test_finished_rooms_are_no_longer_hosted() {
    let (directory, _) = directory();
    let mut codes = Vec::new();

    for _ in 0..20 {
        let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
        directory.join_room(&code, GUEST).unwrap();
        assert_eq!(directory.room_count(), 1);
        directory
            .request_start(&code, CREATOR, Arc::new(Recorder::default()))
            .unwrap()
            .finished()
            .await;
        codes.push(code);
    }

    assert_eq!(directory.room_count(), 0);
    // Finished games are still answered from their saved records.
    for code in &codes {
        let info = directory.room_info(code).unwrap();
        assert_eq!(info.phase, RoomPhase::Completed);
        assert_eq!(info.total_rounds, 2);
        assert_eq!(info.player_count, 2);
    }
    assert_eq!(directory.leaderboard(&codes[0]).unwrap().len(), 2);
    let outcome = directory
        .submit_answer(&codes[0], GUEST, AnswerId(200), None)
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::NotInProgress);
}

#[tokio::test(start_paused = true)]
async fn test_overflowing_question_time_does_not_kill_the_game() {
    let config = RoomConfig {
        time_unit: Duration::MAX,
        ..RoomConfig::default()
    };
    let directory = directory_with(store(), config);
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    let recorder = Arc::new(Recorder::default());

    let rounds = directory
        .request_start(&code, CREATOR, recorder.clone())
        .unwrap();
    time::sleep(Duration::from_secs(3600)).await;

    assert!(!rounds.is_finished());
    let info = directory.room_info(&code).unwrap();
    assert_eq!(info.phase, RoomPhase::InProgress);
    assert_eq!(info.round, Some(1));
    assert_eq!(recorder.rounds().len(), 1);
    assert_eq!(directory.room_of(CREATOR), Some(code));
}

// =========================================================================
// Scoring
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scores_show_up_on_next_round_leaderboard() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    directory.join_room(&code, GUEST).unwrap();
    let recorder = Arc::new(Recorder::default());
    let rounds = directory
        .request_start(&code, CREATOR, recorder.clone())
        .unwrap();
    time::sleep(Duration::from_secs(1)).await;

    let outcome = directory
        .submit_answer(&code, GUEST, AnswerId(100), None)
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::Counted { points: 10, total: 10 });
    let outcome = directory
        .submit_answer(&code, CREATOR, AnswerId(101), Some(QuestionId(10)))
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::Counted { points: 0, total: 0 });

    rounds.finished().await;

    let (_, second) = &recorder.rounds()[1];
    assert_eq!(second.leaderboard[0].player_name, "grace");
    assert_eq!(second.leaderboard[0].score, 10);
    assert_eq!(second.leaderboard[1].player_name, "ada");
    assert_eq!(second.leaderboard[1].score, 0);
}

#[tokio::test(start_paused = true)]
async fn test_only_first_answer_per_question_counts() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    let _rounds = directory
        .request_start(&code, CREATOR, Arc::new(Recorder::default()))
        .unwrap();
    time::sleep(Duration::from_secs(1)).await;

    directory
        .submit_answer(&code, CREATOR, AnswerId(101), None)
        .unwrap();
    let outcome = directory
        .submit_answer(&code, CREATOR, AnswerId(100), None)
        .unwrap();

    assert_eq!(outcome, AnswerOutcome::AlreadyAnswered);
    assert_eq!(directory.leaderboard(&code).unwrap()[0].score, 0);
}

#[tokio::test(start_paused = true)]
async fn test_answer_for_other_question_is_ignored() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    let _rounds = directory
        .request_start(&code, CREATOR, Arc::new(Recorder::default()))
        .unwrap();
    time::sleep(Duration::from_secs(1)).await;

    // Answer 200 belongs to question 20, which isn't up yet.
    let outcome = directory
        .submit_answer(&code, CREATOR, AnswerId(200), None)
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::NotCurrentQuestion);

    // Right answer, but the client claims a different question.
    let outcome = directory
        .submit_answer(&code, CREATOR, AnswerId(100), Some(QuestionId(20)))
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::NotCurrentQuestion);
    assert_eq!(directory.leaderboard(&code).unwrap()[0].score, 0);
}

#[test]
fn test_answer_before_start_is_ignored() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();

    let outcome = directory
        .submit_answer(&code, CREATOR, AnswerId(100), None)
        .unwrap();

    assert_eq!(outcome, AnswerOutcome::NotInProgress);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_answer_is_ignored() {
    let (directory, _) = directory();
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    let _rounds = directory
        .request_start(&code, CREATOR, Arc::new(Recorder::default()))
        .unwrap();
    time::sleep(Duration::from_secs(1)).await;
    let before = directory.leaderboard(&code).unwrap();

    let outcome = directory
        .submit_answer(&code, CREATOR, AnswerId(9999), None)
        .unwrap();

    assert_eq!(outcome, AnswerOutcome::UnknownAnswer);
    assert_eq!(directory.leaderboard(&code).unwrap(), before);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_correct_answers_are_all_counted() {
    const PLAYERS: u64 = 64;
    const POINTS: u64 = 10;

    let store = store();
    for n in 0..PLAYERS {
        store.insert_account(PlayerId(1000 + n), format!("player{n}"));
    }
    let directory = directory_with(Arc::clone(&store), RoomConfig::default());
    let code = directory.open_room(CREATOR, GEOGRAPHY).unwrap();
    for n in 0..PLAYERS {
        directory.join_room(&code, PlayerId(1000 + n)).unwrap();
    }
    let _rounds = directory
        .request_start(&code, CREATOR, Arc::new(Recorder::default()))
        .unwrap();
    time::sleep(Duration::from_secs(1)).await;

    std::thread::scope(|scope| {
        for n in 0..PLAYERS {
            let directory = &directory;
            let code = &code;
            scope.spawn(move || {
                directory
                    .submit_answer(code, PlayerId(1000 + n), AnswerId(100), None)
                    .unwrap();
            });
        }
    });

    let total: u64 = directory
        .leaderboard(&code)
        .unwrap()
        .iter()
        .map(|entry| entry.score)
        .sum();
    assert_eq!(total, PLAYERS * POINTS);
}
