//! Unified error type for the roulette facade.

use std::path::PathBuf;

use roulette_game::GameError;
use roulette_protocol::ProtocolError;

/// Top-level error that wraps the sub-crate errors.
///
/// `#[from]` lets `?` lift a [`GameError`] or [`ProtocolError`] without
/// mapping by hand.
#[derive(Debug, thiserror::Error)]
pub enum RouletteError {
    /// A join or action was rejected, or the session does not exist.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A notification could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl RouletteError {
    /// The game-level rejection, if that is what this is.
    pub fn as_game(&self) -> Option<&GameError> {
        match self {
            Self::Game(e) => Some(e),
            _ => None,
        }
    }
}
