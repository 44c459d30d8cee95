//! Liveness and mailbox settings shared by every connection.

use std::time::Duration;

/// Configuration for connection liveness and outbound buffering.
///
/// The read loop evicts a peer that sends no pulse for `pong_wait`; the
/// write loop probes every `ping_interval`, which must be shorter so the
/// peer's answer can arrive before the deadline.
#[derive(Debug, Clone)]
pub struct LivenessConfig {
    /// How long the read loop waits for a pulse before evicting the peer.
    ///
    /// Default: 10 seconds.
    pub pong_wait: Duration,

    /// How often the write loop sends a probe. Default: 9/10 of `pong_wait`.
    pub ping_interval: Duration,

    /// Capacity of each connection's outbound mailbox. Broadcasts to a full
    /// mailbox are dropped for that recipient.
    pub mailbox_capacity: usize,

    /// Largest inbound frame accepted, in bytes. A bigger frame ends the
    /// connection.
    pub max_frame_len: usize,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self::with_pong_wait(Duration::from_secs(10))
    }
}

impl LivenessConfig {
    /// Creates a config for the given deadline, probing at 9/10 of it.
    pub fn with_pong_wait(pong_wait: Duration) -> Self {
        Self {
            pong_wait,
            ping_interval: pong_wait * 9 / 10,
            mailbox_capacity: 32,
            max_frame_len: 512,
        }
    }

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// Called by [`Registry::new`](crate::Registry::new). Rules:
    /// - `mailbox_capacity` is at least 1.
    /// - `ping_interval` is non-zero and shorter than `pong_wait`.
    pub fn validated(mut self) -> Self {
        self.mailbox_capacity = self.mailbox_capacity.max(1);
        if self.ping_interval.is_zero() || self.ping_interval >= self.pong_wait
        {
            let fixed = (self.pong_wait * 9 / 10).max(Duration::from_millis(1));
            tracing::warn!(
                ping_interval = ?self.ping_interval,
                pong_wait = ?self.pong_wait,
                ?fixed,
                "ping_interval must be shorter than pong_wait, adjusting"
            );
            self.ping_interval = fixed;
        }
        self
    }
}
