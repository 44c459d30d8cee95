//! Logging setup for binaries built on Quizroom.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a `fmt` subscriber filtered at `default_level` for the Quizroom
/// crates.
///
/// `RUST_LOG` overrides the default when set.
///
/// ```no_run
/// quizroom::init_logging("debug");
/// ```
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        [
            "quizroom",
            "quizroom_transport",
            "quizroom_protocol",
            "quizroom_session",
            "quizroom_room",
            "quiz_server",
        ]
        .iter()
        .map(|target| format!("{target}={default_level}"))
        .collect::<Vec<_>>()
        .join(",")
        .into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
