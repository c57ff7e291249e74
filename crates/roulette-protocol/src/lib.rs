//! Wire vocabulary for the roulette engine.
//!
//! This crate defines what the game core and its transport layer
//! (a chat bot, a websocket gateway, a test harness) agree on:
//!
//! - **Types** ([`UserId`], [`SessionKey`], [`Slot`], [`Player`],
//!   [`Choice`]): who is playing and what they can pick.
//! - **Notifications** ([`Notification`]): the payloads the core emits
//!   for the transport to render. The core never renders anything.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how notifications are
//!   turned into bytes when they leave the process.
//!
//! ```text
//! Game core ──(Notification)──→ Codec ──(bytes)──→ Transport
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Choice, Notification, Player, SessionKey, Slot, UserId};
