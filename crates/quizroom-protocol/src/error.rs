//! Error types for the protocol layer.
//!
//! Each crate in Quizroom defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization/deserialization, not in
//! networking or room management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or wrong
    /// data types.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event's payload did not match the schema for its kind.
    #[error("bad payload for {kind}: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
