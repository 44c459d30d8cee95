//! Room event handlers wired into a real registry, with players on
//! in-memory connections.

use std::sync::Arc;
use std::time::Duration;

use quizroom_protocol::{
    AdvanceRound, AnswerId, Codec, ErrorNotice, Event, JsonCodec, PlayerId,
    QuestionId, QuizId, RoomCode, SubmitAnswer, kind,
};
use quizroom_room::{
    Answer, Collaborators, MemoryStore, Question, Quiz, RoomConfig,
    RoomDirectory, RoomPhase, StartGameHandler, SubmitAnswerHandler,
};
use quizroom_session::{LivenessConfig, Origin, Registry, open};
use quizroom_transport::Connection;
use quizroom_transport::memory::{self, MemoryPeer, Outbound};
use tokio::time;

const CREATOR: PlayerId = PlayerId(1);
const GUEST: PlayerId = PlayerId(2);

struct Game {
    directory: Arc<RoomDirectory>,
    registry: Arc<Registry>,
    code: RoomCode,
}

fn game() -> Game {
    let store = Arc::new(MemoryStore::new());
    store.insert_account(CREATOR, "ada");
    store.insert_account(GUEST, "grace");
    store.insert_quiz(Quiz {
        id: QuizId(1),
        name: "one question".into(),
        questions: vec![Question {
            id: QuestionId(10),
            text: "2 + 2?".into(),
            time: 5,
            answers: vec![
                Answer {
                    id: AnswerId(100),
                    question: QuestionId(10),
                    text: "4".into(),
                    points: 10,
                    is_right: true,
                },
                Answer {
                    id: AnswerId(101),
                    question: QuestionId(10),
                    text: "5".into(),
                    points: 10,
                    is_right: false,
                },
            ],
        }],
    });

    let directory = Arc::new(RoomDirectory::new(
        Collaborators::from_store(store),
        RoomConfig::default(),
    ));
    // Long deadline so liveness doesn't interfere with the game clock.
    let liveness = LivenessConfig::with_pong_wait(Duration::from_secs(600));
    let registry = Arc::new(
        Registry::new(liveness)
            .with_handler(
                kind::SUBMIT_ANSWER,
                SubmitAnswerHandler::new(Arc::clone(&directory)),
            )
            .with_handler(
                kind::START_GAME,
                StartGameHandler::new(Arc::clone(&directory)),
            ),
    );
    let code = directory.open_room(CREATOR, QuizId(1)).unwrap();
    directory.join_room(&code, GUEST).unwrap();
    Game {
        directory,
        registry,
        code,
    }
}

impl Game {
    fn connect(&self, player: PlayerId) -> MemoryPeer {
        let (conn, peer) = memory::pair();
        let origin = Origin {
            connection: conn.id(),
            player_id: player,
            room: self.code.clone(),
        };
        open(&self.registry, conn, origin, JsonCodec).unwrap();
        peer
    }
}

fn send(peer: &MemoryPeer, kind: &str, payload: serde_json::Value) {
    let event = Event::new(kind, &payload).unwrap();
    assert!(peer.send(JsonCodec.encode(&event).unwrap()));
}

async fn next_event(peer: &mut MemoryPeer) -> Event {
    loop {
        match peer.recv().await {
            Some(Outbound::Data(bytes)) => return JsonCodec.decode(&bytes).unwrap(),
            Some(Outbound::Probe) => continue,
            other => panic!("expected data, got {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_game_broadcasts_first_round_to_everyone() {
    let game = game();
    let mut creator = game.connect(CREATOR);
    let mut guest = game.connect(GUEST);

    send(&creator, kind::START_GAME, serde_json::Value::Null);

    for peer in [&mut creator, &mut guest] {
        let event = next_event(peer).await;
        assert_eq!(event.kind, kind::ADVANCE_ROUND);
        let round: AdvanceRound = event.payload_as().unwrap();
        assert_eq!(round.round, 1);
        assert_eq!(round.question.answers.len(), 2);
    }
    assert_eq!(
        game.directory.room_info(&game.code).unwrap().phase,
        RoomPhase::InProgress
    );
}

#[tokio::test(start_paused = true)]
async fn test_start_game_from_guest_gets_error_event() {
    let game = game();
    let mut guest = game.connect(GUEST);

    send(&guest, kind::START_GAME, serde_json::Value::Null);

    let event = next_event(&mut guest).await;
    assert_eq!(event.kind, kind::ERROR);
    let notice: ErrorNotice = event.payload_as().unwrap();
    assert!(notice.message.contains("not the creator"));
    assert_eq!(
        game.directory.room_info(&game.code).unwrap().phase,
        RoomPhase::Open
    );
}

#[tokio::test(start_paused = true)]
async fn test_submit_answer_over_the_wire_scores() {
    let game = game();
    let mut creator = game.connect(CREATOR);
    let guest = game.connect(GUEST);

    send(&creator, kind::START_GAME, serde_json::Value::Null);
    assert_eq!(next_event(&mut creator).await.kind, kind::ADVANCE_ROUND);

    let submit = SubmitAnswer {
        answer_id: AnswerId(100),
        question_id: Some(QuestionId(10)),
    };
    send(&guest, kind::SUBMIT_ANSWER, serde_json::to_value(&submit).unwrap());
    // Garbage payloads and unknown answers are dropped without a reply.
    send(&guest, kind::SUBMIT_ANSWER, serde_json::json!({ "answerId": "x" }));
    send(&creator, kind::SUBMIT_ANSWER, serde_json::json!({ "answerId": 4242 }));
    time::sleep(Duration::from_secs(1)).await;

    let leaderboard = game.directory.leaderboard(&game.code).unwrap();
    assert_eq!(leaderboard[0].player_name, "grace");
    assert_eq!(leaderboard[0].score, 10);
    assert_eq!(leaderboard[1].score, 0);
}
