//! Connection registry and event dispatch for Quizroom.
//!
//! This crate owns the live side of every player connection:
//!
//! 1. **Registry** — the process-wide table of live connections
//!    ([`Registry`]): admission, removal, dispatch, and room broadcast.
//! 2. **Connection loops** — [`open`] starts one read task and one write
//!    task per connection, with liveness probing.
//! 3. **Dispatch** — inbound events are routed by kind to an
//!    [`EventHandler`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← registers handlers, broadcasts round updates
//!     ↕
//! Session Layer (this crate)  ← live connections, mailboxes, dispatch
//!     ↕
//! Protocol + Transport (below)  ← Event codec, WebSocket frames
//! ```

mod config;
mod connection;
mod error;
mod handler;
mod registry;

pub use config::LivenessConfig;
pub use connection::{ConnectionHandle, open};
pub use error::SessionError;
pub use handler::{EventHandler, Origin};
pub use registry::{Mailbox, Registry};
