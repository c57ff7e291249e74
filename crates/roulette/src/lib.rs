//! # Roulette
//!
//! Session-scoped elimination roulette for chat bots.
//!
//! A host process (a chat bot, a test harness) creates one [`Roulette`],
//! starts a game per chat session, forwards player joins and turn actions,
//! and renders the [`Notification`]s that come back. Transport and
//! presentation stay on the host's side of that line.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roulette::prelude::*;
//!
//! # async fn demo() -> Result<(), RouletteError> {
//! roulette::init_tracing();
//! let (engine, mut notes) = Roulette::new(GameConfig::default());
//!
//! engine.start_session(SessionKey(1)).await?;
//! engine
//!     .submit_join(SessionKey(1), UserId(10), "alice", Slot(1))
//!     .await?;
//!
//! while let Some(note) = notes.recv().await {
//!     println!("{note:?}");
//!     if note.is_terminal() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;

use std::path::Path;

pub use engine::Roulette;
pub use error::RouletteError;

pub use roulette_game::{
    GameConfig, GameError, GameHandle, GameId, GameInfo, GamePhase, MAX_TIMER,
    NotificationReceiver,
};
pub use roulette_protocol::{
    Choice, Codec, JsonCodec, Notification, Player, ProtocolError, SessionKey, Slot, UserId,
};

/// Everything a host needs in one import.
pub mod prelude {
    pub use crate::{
        Choice, Codec, GameConfig, GameError, GameHandle, GameInfo, GamePhase, JsonCodec,
        Notification, NotificationReceiver, Player, Roulette, RouletteError, SessionKey, Slot,
        UserId,
    };
}

/// Reads a [`GameConfig`] from a JSON file.
///
/// Missing fields take their defaults; out-of-range values are clamped.
///
/// # Errors
/// [`RouletteError::Io`] if the file cannot be read,
/// [`RouletteError::Config`] if it is not a valid config.
pub fn load_config(path: impl AsRef<Path>) -> Result<GameConfig, RouletteError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| RouletteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GameConfig =
        serde_json::from_str(&text).map_err(|source| RouletteError::Config {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config.validated())
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
