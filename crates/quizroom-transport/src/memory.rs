//! In-process connection pair, used to drive connection loops in tests
//! without a socket.
//!
//! [`pair`] returns the server side ([`MemoryConnection`], which implements
//! [`Connection`]) and the client side ([`MemoryPeer`]) that a test uses to
//! play the remote player.

use tokio::sync::{Mutex, mpsc};

use crate::{Connection, ConnectionId, Frame, TransportError};

/// What the server side wrote to the wire, as seen by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// An application payload.
    Data(Vec<u8>),
    /// A liveness probe (ping).
    Probe,
    /// A close frame.
    Close,
}

/// Server side of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    inbound: Mutex<mpsc::UnboundedReceiver<Frame>>,
    outbound: mpsc::UnboundedSender<Outbound>,
}

/// Client side of an in-memory connection.
///
/// Dropping the peer (or calling [`hang_up`](Self::hang_up)) looks like
/// the remote end closing the socket.
pub struct MemoryPeer {
    inbound: Option<mpsc::UnboundedSender<Frame>>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

/// Creates a connected server/peer pair.
pub fn pair() -> (MemoryConnection, MemoryPeer) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let conn = MemoryConnection {
        id: ConnectionId::next(),
        inbound: Mutex::new(in_rx),
        outbound: out_tx,
    };
    let peer = MemoryPeer {
        inbound: Some(in_tx),
        outbound: out_rx,
    };
    (conn, peer)
}

impl MemoryConnection {
    fn push(&self, frame: Outbound) -> Result<(), TransportError> {
        self.outbound.send(frame).map_err(|_| {
            TransportError::ConnectionClosed("peer hung up".into())
        })
    }
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        self.push(Outbound::Data(data.to_vec()))
    }

    async fn recv(&self) -> Result<Option<Frame>, Self::Error> {
        Ok(self.inbound.lock().await.recv().await)
    }

    async fn probe(&self) -> Result<(), Self::Error> {
        self.push(Outbound::Probe)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.push(Outbound::Close)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

impl MemoryPeer {
    /// Sends an application payload to the server.
    ///
    /// Returns `false` if the server side has been dropped.
    pub fn send(&self, data: impl Into<Vec<u8>>) -> bool {
        self.deliver(Frame::Data(data.into()))
    }

    /// Answers a probe with a liveness pulse (a pong).
    pub fn pulse(&self) -> bool {
        self.deliver(Frame::Pulse)
    }

    /// Waits for the next frame the server wrote. `None` once the server
    /// side is gone.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.outbound.recv().await
    }

    /// Returns an already-written frame without waiting.
    pub fn try_recv(&mut self) -> Option<Outbound> {
        self.outbound.try_recv().ok()
    }

    /// Closes the client-to-server direction, which the server reads as a
    /// clean close.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    fn deliver(&self, frame: Frame) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(frame).is_ok())
    }
}
