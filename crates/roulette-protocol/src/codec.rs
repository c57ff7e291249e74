//! Codec trait and implementations for serializing notifications.
//!
//! The core emits [`Notification`](crate::Notification) values; whatever
//! sits on the other side of the process boundary needs bytes. A codec is
//! the strategy that bridges the two, so transports can swap formats
//! without touching the game code.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec is typically stored in a
/// long-lived transport task and shared between Tokio worker threads.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Human-readable, which makes it the natural choice for bot transports
/// and logs. Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use roulette_protocol::{Codec, JsonCodec, Notification, SessionKey, UserId};
///
/// let codec = JsonCodec;
/// let note = Notification::TurnMissed {
///     key: SessionKey(7),
///     shooter: UserId(42),
/// };
///
/// let bytes = codec.encode(&note).unwrap();
/// let decoded: Notification = codec.decode(&bytes).unwrap();
/// assert_eq!(note, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
