//! The host-facing engine: session lifecycle plus join and action routing.

use roulette_game::{
    GameConfig, GameError, GameHandle, GameInfo, GameRegistry, NotificationReceiver,
    NotificationSender,
};
use roulette_protocol::{Choice, SessionKey, Slot, UserId};
use tokio::sync::mpsc;

use crate::RouletteError;

/// Entry point for a host process.
///
/// Holds the session registry and the sending side of the notification
/// stream. Cheap to clone; clones drive the same set of games, so a host
/// can hand one to each chat handler task.
#[derive(Clone)]
pub struct Roulette {
    config: GameConfig,
    registry: GameRegistry,
    events: NotificationSender,
}

impl Roulette {
    /// Creates an engine and the receiver every game's notifications
    /// arrive on, in emission order per session.
    pub fn new(config: GameConfig) -> (Self, NotificationReceiver) {
        let (events, rx) = mpsc::unbounded_channel();
        let engine = Self {
            config: config.validated(),
            registry: GameRegistry::new(),
            events,
        };
        (engine, rx)
    }

    /// The config new sessions start with.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Opens a lobby for `key` with the engine's config.
    ///
    /// # Errors
    /// [`GameError::SessionAlreadyActive`] if `key` has a running game.
    pub async fn start_session(&self, key: SessionKey) -> Result<GameHandle, RouletteError> {
        self.start_session_with(key, self.config.clone()).await
    }

    /// Opens a lobby for `key` with a session-specific config.
    ///
    /// # Errors
    /// [`GameError::SessionAlreadyActive`] if `key` has a running game.
    pub async fn start_session_with(
        &self,
        key: SessionKey,
        config: GameConfig,
    ) -> Result<GameHandle, RouletteError> {
        let handle = self.registry.register(key, config, self.events.clone()).await?;
        Ok(handle)
    }

    /// Adds `user` to the lobby for `key` on `slot`. Returns the roster
    /// size after the join.
    ///
    /// # Errors
    /// [`GameError::NoSuchSession`], or whatever the lobby rejects the
    /// join with.
    pub async fn submit_join(
        &self,
        key: SessionKey,
        user: UserId,
        display: impl Into<String>,
        slot: Slot,
    ) -> Result<usize, RouletteError> {
        let game = self.session(key).await?;
        Ok(game.join(user, display, slot).await?)
    }

    /// Submits the current shooter's pick for `key`.
    ///
    /// # Errors
    /// [`GameError::NoSuchSession`], [`GameError::NotYourTurn`],
    /// [`GameError::InvalidChoice`], or [`GameError::NoTurnInProgress`].
    pub async fn submit_turn_action(
        &self,
        key: SessionKey,
        actor: UserId,
        choice: Choice,
    ) -> Result<(), RouletteError> {
        let game = self.session(key).await?;
        game.submit_action(actor, choice)?;
        tracing::debug!(%key, user = %actor, %choice, "turn action accepted");
        Ok(())
    }

    /// Snapshot of the game running under `key`, if any.
    pub async fn session_info(&self, key: SessionKey) -> Option<GameInfo> {
        self.registry.get(key).await.map(|game| game.info())
    }

    /// Keys with a running game.
    pub async fn active_sessions(&self) -> Vec<SessionKey> {
        self.registry.keys().await
    }

    /// The handle for the game running under `key`.
    ///
    /// # Errors
    /// [`GameError::NoSuchSession`] if the key is free.
    pub async fn session(&self, key: SessionKey) -> Result<GameHandle, RouletteError> {
        self.registry
            .get(key)
            .await
            .ok_or(RouletteError::Game(GameError::NoSuchSession(key)))
    }
}
