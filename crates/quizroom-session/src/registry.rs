//! The registry: every live connection and the handlers for their events.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Admitting a connection and handing back its outbound mailbox
//! - Removing a connection (idempotently) and closing its mailbox
//! - Routing inbound events to the handler registered for their kind
//! - Broadcasting events to every live connection in a room
//!
//! # Concurrency note
//!
//! Unlike a manager owned by a single task, the registry is shared by every
//! connection's read and write loops at once, so it lives behind an `Arc`
//! and guards the live table with a `std::sync::Mutex`. The lock is only
//! held for map operations and non-blocking `try_send` calls, never across
//! an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quizroom_protocol::{Event, RoomCode};
use quizroom_transport::ConnectionId;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{EventHandler, LivenessConfig, Origin, SessionError};

/// The receiving end of a connection's outbound queue.
///
/// The write loop drains it. Once the registry drops the sending half
/// (on removal), `recv` returns the buffered events and then `None`.
pub type Mailbox = mpsc::Receiver<Event>;

/// A live connection as the registry sees it.
struct Member {
    origin: Origin,
    outbox: mpsc::Sender<Event>,
}

/// Tracks all live connections and routes their events.
///
/// ## Lifecycle of a connection
///
/// ```text
/// admit() ──→ [live: dispatch / broadcast / send_to] ──→ remove()
///                                                          │
///                                                          ▼
///                                            mailbox closed, write loop
///                                            sends close and exits
/// ```
pub struct Registry {
    /// Live connections keyed by connection id.
    live: Mutex<HashMap<ConnectionId, Member>>,

    /// Event handlers keyed by event kind. Fixed once the registry is
    /// shared, so no lock is needed to read it.
    handlers: HashMap<String, Arc<dyn EventHandler>>,

    config: LivenessConfig,
}

impl Registry {
    /// Creates an empty registry with no handlers.
    pub fn new(config: LivenessConfig) -> Self {
        Self {
            live: Mutex::new(HashMap::new()),
            handlers: HashMap::new(),
            config: config.validated(),
        }
    }

    /// Registers the handler for events of `kind`, replacing any previous
    /// one.
    ///
    /// Handlers are registered while building the registry, before it is
    /// wrapped in an `Arc` and shared with connection loops.
    pub fn with_handler(
        mut self,
        kind: impl Into<String>,
        handler: impl EventHandler,
    ) -> Self {
        self.handlers.insert(kind.into(), Arc::new(handler));
        self
    }

    /// Returns `true` if a handler is registered for `kind`.
    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Returns the liveness settings every connection loop uses.
    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    /// Adds a connection to the live set and returns its mailbox.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyAdmitted`] if a connection with the
    /// same id is already live.
    pub fn admit(&self, origin: Origin) -> Result<Mailbox, SessionError> {
        let mut live = self.lock();
        let id = origin.connection;
        if live.contains_key(&id) {
            return Err(SessionError::AlreadyAdmitted(id));
        }

        let (outbox, mailbox) = mpsc::channel(self.config.mailbox_capacity);
        tracing::debug!(
            conn_id = %id,
            player_id = %origin.player_id,
            room = %origin.room,
            "connection admitted"
        );
        live.insert(id, Member { origin, outbox });
        Ok(mailbox)
    }

    /// Removes a connection from the live set.
    ///
    /// Dropping the sending half closes the mailbox, which tells the write
    /// loop to shut the connection down. Safe to call any number of times
    /// from either loop; only the first call returns `true`.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let removed = self.lock().remove(&id);
        match removed {
            Some(member) => {
                tracing::info!(
                    conn_id = %id,
                    player_id = %member.origin.player_id,
                    room = %member.origin.room,
                    "connection removed"
                );
                true
            }
            None => false,
        }
    }

    /// Routes `event` to the handler registered for its kind.
    ///
    /// # Errors
    /// - [`SessionError::UnknownEvent`] if no handler is registered.
    /// - Whatever the handler returns.
    pub fn dispatch(
        self: &Arc<Self>,
        event: &Event,
        origin: &Origin,
    ) -> Result<(), SessionError> {
        let handler = self
            .handlers
            .get(&event.kind)
            .ok_or_else(|| SessionError::UnknownEvent(event.kind.clone()))?;
        handler.handle(self, origin, event)
    }

    /// Queues `event` for every live connection in `room`.
    ///
    /// Delivery is best-effort: a recipient whose mailbox is full or
    /// already closed is skipped, and the rest still get the event.
    /// Returns the number of mailboxes that accepted it.
    ///
    /// The whole fan-out happens under the registry lock, so it never
    /// overlaps a removal: a removed connection either got the event
    /// before its mailbox closed or is not visited at all.
    pub fn broadcast(&self, event: &Event, room: &RoomCode) -> usize {
        let live = self.lock();
        let mut delivered = 0;
        for (id, member) in live.iter() {
            if member.origin.room != *room {
                continue;
            }
            match member.outbox.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        conn_id = %id,
                        kind = %event.kind,
                        "mailbox full, dropping broadcast for this connection"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(conn_id = %id, "mailbox closed, skipping");
                }
            }
        }
        tracing::trace!(%room, kind = %event.kind, delivered, "broadcast");
        delivered
    }

    /// Queues `event` for a single connection.
    ///
    /// Returns `false` if the connection is not live or its mailbox could
    /// not take the event.
    pub fn send_to(&self, id: ConnectionId, event: Event) -> bool {
        let live = self.lock();
        match live.get(&id) {
            Some(member) => member.outbox.try_send(event).is_ok(),
            None => false,
        }
    }

    /// Returns `true` if the connection is live.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Returns the number of live connections in `room`.
    pub fn room_size(&self, room: &RoomCode) -> usize {
        self.lock()
            .values()
            .filter(|member| member.origin.room == *room)
            .count()
    }

    /// Returns the number of live connections.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if there are no live connections.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock can't leave the map half-updated
    // (every critical section is a single map operation), so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Member>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("live", &self.len())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}
