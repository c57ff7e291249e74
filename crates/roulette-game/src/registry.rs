//! Game registry: at most one active game per session key.
//!
//! The registry is the only state shared between games. Every operation
//! takes the same async mutex, so "is this key free?" and "spawn a game
//! for it" happen as one atomic step.

use std::collections::HashMap;
use std::sync::Arc;

use roulette_protocol::SessionKey;
use tokio::sync::Mutex;

use crate::game::spawn_game;
use crate::{GameConfig, GameError, GameHandle, GameId, NotificationSender};

/// Tracks the running game for each session key.
///
/// Cheap to clone; all clones share one map. Each game task holds a clone
/// so it can release its key when it ends.
#[derive(Clone, Default)]
pub struct GameRegistry {
    games: Arc<Mutex<HashMap<SessionKey, GameHandle>>>,
}

impl GameRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a game for `key` and returns a handle to it.
    ///
    /// The game begins in its lobby immediately. Notifications for it are
    /// delivered on `events`.
    ///
    /// # Errors
    /// Returns [`GameError::SessionAlreadyActive`] if `key` already has a
    /// game that has not finished or been cancelled.
    pub async fn register(
        &self,
        key: SessionKey,
        config: GameConfig,
        events: NotificationSender,
    ) -> Result<GameHandle, GameError> {
        let mut games = self.games.lock().await;
        if games.contains_key(&key) {
            tracing::debug!(%key, "session already active");
            return Err(GameError::SessionAlreadyActive(key));
        }

        let handle = spawn_game(key, config.validated(), events, self.clone());
        games.insert(key, handle.clone());
        tracing::info!(%key, game = %handle.id(), "session registered");
        Ok(handle)
    }

    /// Removes the entry for `key` if it still belongs to game `id`.
    ///
    /// Returns `false` when the key is free or owned by a newer game, so a
    /// finished game can never evict its successor.
    pub async fn unregister(&self, key: SessionKey, id: GameId) -> bool {
        let mut games = self.games.lock().await;
        match games.get(&key) {
            Some(handle) if handle.id() == id => {
                games.remove(&key);
                tracing::info!(%key, game = %id, "session released");
                true
            }
            _ => false,
        }
    }

    /// Returns the handle for the game running under `key`, if any.
    pub async fn get(&self, key: SessionKey) -> Option<GameHandle> {
        self.games.lock().await.get(&key).cloned()
    }

    pub async fn contains(&self, key: SessionKey) -> bool {
        self.games.lock().await.contains_key(&key)
    }

    /// Returns the number of active games.
    pub async fn active_count(&self) -> usize {
        self.games.lock().await.len()
    }

    /// Lists the keys with an active game.
    pub async fn keys(&self) -> Vec<SessionKey> {
        self.games.lock().await.keys().copied().collect()
    }
}
