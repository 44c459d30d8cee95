//! `QuizroomServer` builder and server loop.
//!
//! This is the entry point for running a Quizroom server. It ties together
//! all the layers: transport → protocol → session → room.

use std::net::SocketAddr;
use std::sync::Arc;

use quizroom_protocol::{Codec, Event, JsonCodec};
use quizroom_room::{Collaborators, RoomConfig};
use quizroom_session::LivenessConfig;
use quizroom_transport::{
    Connection, Transport, WebSocketConnection, WebSocketTransport,
};

use crate::{Coordinator, QuizroomError, UpgradeRequest};

/// Everything a server needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. Default: `127.0.0.1:8080`.
    pub bind_addr: String,
    pub liveness: LivenessConfig,
    pub rooms: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            liveness: LivenessConfig::default(),
            rooms: RoomConfig::default(),
        }
    }
}

/// Builder for configuring and starting a Quizroom server.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use quizroom::prelude::*;
///
/// # async fn run() -> Result<(), QuizroomError> {
/// let store = Arc::new(MemoryStore::new());
/// let server = QuizroomServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(Collaborators::from_store(store))
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Default)]
pub struct QuizroomServerBuilder {
    config: ServerConfig,
}

impl QuizroomServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the connection liveness configuration.
    pub fn liveness(mut self, config: LivenessConfig) -> Self {
        self.config.liveness = config;
        self
    }

    /// Sets the room configuration.
    pub fn rooms(mut self, config: RoomConfig) -> Self {
        self.config.rooms = config;
        self
    }

    /// Binds the listener and builds the coordinator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`. Inbound messages are
    /// capped at the liveness config's `max_frame_len` by the socket itself.
    pub async fn build(
        self,
        collaborators: Collaborators,
    ) -> Result<QuizroomServer, QuizroomError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr)
            .await?
            .with_max_message_size(self.config.liveness.max_frame_len);
        let coordinator = Arc::new(Coordinator::new(
            collaborators,
            self.config.liveness,
            self.config.rooms,
        ));
        Ok(QuizroomServer {
            transport,
            coordinator,
        })
    }
}

/// A bound Quizroom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizroomServer {
    transport: WebSocketTransport,
    coordinator: Arc<Coordinator>,
}

impl QuizroomServer {
    /// Creates a new builder.
    pub fn builder() -> QuizroomServerBuilder {
        QuizroomServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The coordinator serving this server's connections.
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Runs the server accept loop.
    ///
    /// Each accepted connection is admitted according to its upgrade path
    /// and then served by its own read and write tasks. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), QuizroomError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Quizroom server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let coordinator = Arc::clone(&self.coordinator);
                    tokio::spawn(async move {
                        serve(conn, &coordinator).await;
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Admits one upgraded connection, or tells the client why not and closes.
async fn serve(conn: WebSocketConnection, coordinator: &Coordinator) {
    let conn_id = conn.id();
    let admission = UpgradeRequest::parse(conn.request_path())
        .map_err(QuizroomError::from)
        .and_then(|request| coordinator.admit(&request));

    let result = match admission {
        Ok(admission) => coordinator.attach(conn, admission).map(|_| ()),
        Err(e) => {
            reject(&conn, &e).await;
            Err(e)
        }
    };
    if let Err(e) = result {
        tracing::info!(%conn_id, error = %e, "connection refused");
    }
}

/// Sends an `error` event describing `reason`, then a close frame.
async fn reject<C: Connection>(conn: &C, reason: &QuizroomError) {
    let sent = match Event::error(reason.to_string())
        .and_then(|event| JsonCodec.encode(&event))
    {
        Ok(bytes) => conn.send(&bytes).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode rejection");
            false
        }
    };
    if let Err(e) = conn.close().await {
        tracing::debug!(conn_id = %conn.id(), sent, error = %e, "close after rejection failed");
    }
}
