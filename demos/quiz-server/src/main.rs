use std::sync::Arc;

use quizroom::prelude::*;

// ---------------------------------------------------------------------------
// Seed content
// ---------------------------------------------------------------------------

/// Three players and one short quiz, enough to play a game by hand.
fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (id, name) in [(1, "ada"), (2, "grace"), (3, "linus")] {
        store.insert_account(PlayerId(id), name);
    }

    let questions = [
        ("What does `?` do on an Err?", 10, ["returns it early", "panics"]),
        ("Which type is shared across threads?", 15, ["Arc", "Rc"]),
        ("What does tokio::spawn return?", 10, ["a JoinHandle", "the output"]),
    ];
    let mut next_answer = 0;
    let questions = questions
        .into_iter()
        .enumerate()
        .map(|(i, (text, time, [right, wrong]))| {
            let question = QuestionId(i as u64 + 1);
            let answers = [(right, true), (wrong, false)]
                .into_iter()
                .map(|(text, is_right)| {
                    next_answer += 1;
                    Answer {
                        id: AnswerId(next_answer),
                        question,
                        text: text.to_string(),
                        points: 100,
                        is_right,
                    }
                })
                .collect();
            Question {
                id: question,
                text: text.to_string(),
                time,
                answers,
            }
        })
        .collect();

    store.insert_quiz(Quiz {
        id: QuizId(1),
        name: "Rust basics".into(),
        questions,
    });
    store
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info");

    let addr =
        std::env::var("QUIZROOM_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    tracing::info!(%addr, "starting quiz server");

    let server = QuizroomServer::builder()
        .bind(&addr)
        .build(Collaborators::from_store(seeded_store()))
        .await?;

    server.run().await?;
    Ok(())
}
