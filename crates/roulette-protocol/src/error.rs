//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding notifications.
///
/// Each crate in the workspace defines its own error enum, so a
/// `ProtocolError` always means a serialization problem, never a game
/// rule violation.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or a
    /// payload of the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value decoded but violates a protocol rule, e.g. slot `0`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
