//! Per-connection read and write loops.
//!
//! [`open`] admits a connection into the [`Registry`] and spawns two tasks
//! for it:
//!
//! ```text
//!            ┌──────────── read loop ─────────────┐
//! peer ────→ │ recv → decode → registry.dispatch  │  deadline: pong_wait
//!            └────────────────────────────────────┘
//!            ┌──────────── write loop ────────────┐
//! peer ←──── │ mailbox → encode → send            │  probe: ping_interval
//!            └────────────────────────────────────┘
//! ```
//!
//! Whichever loop stops first removes the connection from the registry.
//! Removal closes the mailbox, and the write loop answers a closed mailbox
//! by sending a close frame and exiting. Neither loop ever waits for the
//! other.

use std::sync::Arc;

use quizroom_protocol::{Codec, Event};
use quizroom_transport::{Connection, ConnectionId, Frame};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{Mailbox, Origin, Registry, SessionError};

/// Handle to the two tasks serving one connection.
///
/// Dropping it does not stop the tasks; they run until the connection ends.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    read: JoinHandle<()>,
    write: JoinHandle<()>,
}

impl ConnectionHandle {
    /// The id the connection is registered under.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Waits until both loops have exited.
    pub async fn closed(self) {
        for (side, task) in [("read", self.read), ("write", self.write)] {
            if let Err(e) = task.await {
                tracing::debug!(conn_id = %self.id, side, error = %e, "loop did not exit cleanly");
            }
        }
    }
}

/// Admits `conn` as `origin.player_id` in `origin.room` and starts its loops.
///
/// Returns as soon as the tasks are spawned.
///
/// # Errors
/// - [`SessionError::OriginMismatch`] if `origin.connection` isn't
///   `conn`'s id.
/// - [`SessionError::AlreadyAdmitted`] if the connection id is already
///   live.
pub fn open<C, K>(
    registry: &Arc<Registry>,
    conn: C,
    origin: Origin,
    codec: K,
) -> Result<ConnectionHandle, SessionError>
where
    C: Connection,
    K: Codec + Clone + Send + Sync + 'static,
{
    let id = origin.connection;
    if conn.id() != id {
        return Err(SessionError::OriginMismatch {
            origin: id,
            actual: conn.id(),
        });
    }
    let mailbox = registry.admit(origin.clone())?;
    let conn = Arc::new(conn);

    tracing::info!(
        conn_id = %id,
        player_id = %origin.player_id,
        room = %origin.room,
        "connection opened"
    );

    let read = tokio::spawn(read_loop(
        Arc::clone(&conn),
        Arc::clone(registry),
        origin,
        codec.clone(),
    ));
    let write = tokio::spawn(write_loop(
        conn,
        Arc::clone(registry),
        id,
        mailbox,
        codec,
    ));

    Ok(ConnectionHandle { id, read, write })
}

/// Removes the connection from the registry when a loop exits, however it
/// exits.
struct Deregister {
    registry: Arc<Registry>,
    id: ConnectionId,
    side: &'static str,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        if self.registry.remove(self.id) {
            tracing::debug!(conn_id = %self.id, side = self.side, "loop ended first");
        }
    }
}

async fn read_loop<C, K>(
    conn: Arc<C>,
    registry: Arc<Registry>,
    origin: Origin,
    codec: K,
) where
    C: Connection,
    K: Codec,
{
    let _deregister = Deregister {
        registry: Arc::clone(&registry),
        id: origin.connection,
        side: "read",
    };
    let pong_wait = registry.config().pong_wait;
    let max_frame_len = registry.config().max_frame_len;
    let mut deadline = Instant::now() + pong_wait;

    loop {
        let frame = match time::timeout_at(deadline, conn.recv()).await {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                tracing::debug!(conn_id = %origin.connection, "peer closed");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(conn_id = %origin.connection, error = %e, "read failed");
                break;
            }
            Err(_) => {
                tracing::warn!(
                    conn_id = %origin.connection,
                    player_id = %origin.player_id,
                    ?pong_wait,
                    "no pulse before deadline, evicting"
                );
                break;
            }
        };

        let data = match frame {
            Frame::Pulse => {
                deadline = Instant::now() + pong_wait;
                continue;
            }
            Frame::Data(data) => data,
        };

        if data.len() > max_frame_len {
            tracing::warn!(
                conn_id = %origin.connection,
                len = data.len(),
                max_frame_len,
                "frame too large, closing"
            );
            break;
        }

        let event: Event = match codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(conn_id = %origin.connection, error = %e, "dropping malformed frame");
                continue;
            }
        };

        if let Err(e) = registry.dispatch(&event, &origin) {
            tracing::warn!(
                conn_id = %origin.connection,
                player_id = %origin.player_id,
                kind = %event.kind,
                error = %e,
                "event not handled"
            );
        }
    }
}

async fn write_loop<C, K>(
    conn: Arc<C>,
    registry: Arc<Registry>,
    id: ConnectionId,
    mut mailbox: Mailbox,
    codec: K,
) where
    C: Connection,
    K: Codec,
{
    let _deregister = Deregister {
        registry: Arc::clone(&registry),
        id,
        side: "write",
    };
    let every = registry.config().ping_interval;
    // First probe one interval from now, not immediately.
    let mut probe = time::interval_at(Instant::now() + every, every);
    probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            next = mailbox.recv() => {
                let Some(event) = next else {
                    // Removed from the registry.
                    if let Err(e) = conn.close().await {
                        tracing::debug!(conn_id = %id, error = %e, "close frame not sent");
                    }
                    return;
                };
                let bytes = match codec.encode(&event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(conn_id = %id, kind = %event.kind, error = %e, "failed to encode event");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(conn_id = %id, error = %e, "write failed");
                    break;
                }
            }
            _ = probe.tick() => {
                if let Err(e) = conn.probe().await {
                    tracing::debug!(conn_id = %id, error = %e, "probe failed");
                    break;
                }
            }
        }
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(conn_id = %id, error = %e, "close frame not sent");
    }
}
