//! Game actor: one Tokio task per game, owning the lobby and then the
//! turn engine.
//!
//! The outside world talks to the task through a [`GameHandle`]:
//! joins travel over a bounded `mpsc` channel with a `oneshot` reply,
//! turn actions go through the shared [`TurnGate`], and state snapshots
//! come back over a `watch` channel. No game state is shared mutably.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use roulette_protocol::{Choice, Notification, Player, SessionKey, Slot, UserId};
use roulette_timer::{Deadline, millis};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::{GameConfig, GameError, GamePhase, GameRegistry, Lobby, TurnEngine, TurnGate};

/// Counter for generating unique game IDs.
static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// Join commands that may queue up before the game task reads them.
const JOIN_CHANNEL_SIZE: usize = 64;

/// Channel sender the engine emits notifications on.
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Receiving end handed to the transport layer.
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Identity of one game instance. Two games that reuse a session key
/// one after the other have different IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl GameId {
    fn next() -> Self {
        Self(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// A snapshot of a game's externally visible state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub key: SessionKey,
    pub id: GameId,
    pub phase: GamePhase,
    /// Players in join order. Grows during the lobby and is frozen at the
    /// roster the game started with once sealed.
    pub players: Vec<Player>,
    /// Set once the game is `Finished`.
    pub winner: Option<Player>,
}

/// A join request waiting for the game task.
pub(crate) struct JoinCommand {
    user: UserId,
    display: String,
    slot: Slot,
    reply: oneshot::Sender<Result<usize, GameError>>,
}

// ---------------------------------------------------------------------------
// GameHandle
// ---------------------------------------------------------------------------

/// Handle to a running game. Cheap to clone.
#[derive(Clone)]
pub struct GameHandle {
    key: SessionKey,
    id: GameId,
    joins: mpsc::Sender<JoinCommand>,
    gate: TurnGate,
    info: watch::Receiver<GameInfo>,
}

impl GameHandle {
    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    /// The latest published snapshot.
    pub fn info(&self) -> GameInfo {
        self.info.borrow().clone()
    }

    pub fn phase(&self) -> GamePhase {
        self.info.borrow().phase
    }

    /// Asks the lobby to add a player. Returns the new roster size.
    ///
    /// # Errors
    /// [`GameError::AlreadyJoined`], [`GameError::SlotTaken`],
    /// [`GameError::InvalidSlot`], or [`GameError::LobbyClosed`] once the
    /// lobby has sealed or been cancelled.
    pub async fn join(
        &self,
        user: UserId,
        display: impl Into<String>,
        slot: Slot,
    ) -> Result<usize, GameError> {
        let (reply, rx) = oneshot::channel();
        self.joins
            .send(JoinCommand {
                user,
                display: display.into(),
                slot,
                reply,
            })
            .await
            .map_err(|_| GameError::LobbyClosed)?;
        rx.await.map_err(|_| GameError::LobbyClosed)?
    }

    /// Submits the current shooter's pick.
    ///
    /// # Errors
    /// [`GameError::NotYourTurn`], [`GameError::InvalidChoice`], or
    /// [`GameError::NoTurnInProgress`] between turns and outside the game.
    pub fn submit_action(&self, actor: UserId, choice: Choice) -> Result<(), GameError> {
        self.gate.submit(actor, choice)
    }

    /// Waits until the game is `Finished` or `Cancelled` and returns the
    /// final snapshot.
    pub async fn finished(&self) -> GameInfo {
        let mut rx = self.info.clone();
        let done = rx
            .wait_for(|info| info.phase.is_terminal())
            .await
            .map(|info| info.clone());
        // The task is gone; its last snapshot is final.
        done.unwrap_or_else(|_| rx.borrow().clone())
    }
}

impl fmt::Debug for GameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameHandle")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// GameActor
// ---------------------------------------------------------------------------

enum LobbyOutcome {
    Cancelled,
    Sealed(Vec<Player>),
}

/// The internal game task state.
struct GameActor {
    key: SessionKey,
    id: GameId,
    config: GameConfig,
    lobby: Lobby,
    joins: mpsc::Receiver<JoinCommand>,
    gate: TurnGate,
    events: NotificationSender,
    info: watch::Sender<GameInfo>,
    registry: GameRegistry,
}

impl GameActor {
    /// Runs the game from lobby to its terminal phase.
    ///
    /// The session key is released before the terminal phase is published
    /// or announced, so anyone reacting to either can reuse the key.
    async fn run(mut self) {
        info!(key = %self.key, game = %self.id, "lobby opened");
        self.emit(Notification::LobbyOpened {
            key: self.key,
            join_window_ms: millis(self.config.join_window),
            min_players: self.config.min_players,
            max_slots: self.config.max_slots,
        });

        match self.run_lobby().await {
            LobbyOutcome::Cancelled => {
                self.release().await;
                self.set_phase(GamePhase::Cancelled);
                self.emit(Notification::LobbyCancelled { key: self.key });
            }
            LobbyOutcome::Sealed(roster) => self.run_game(roster).await,
        }

        debug!(key = %self.key, game = %self.id, "game task stopped");
    }

    async fn run_lobby(&mut self) -> LobbyOutcome {
        let mut join_window = Deadline::after("join_window", self.config.join_window);
        let mut grace = Deadline::disarmed("grace_countdown");

        // Timers are polled first: at the exact instant a deadline
        // elapses, it wins over a join arriving in the same tick.
        loop {
            tokio::select! {
                biased;
                _ = join_window.wait() => {
                    info!(
                        key = %self.key,
                        players = self.lobby.roster().len(),
                        "join window elapsed without quorum, cancelling"
                    );
                    self.close_joins();
                    return LobbyOutcome::Cancelled;
                }
                _ = grace.wait() => {
                    let roster = self.lobby.seal();
                    self.close_joins();
                    info!(key = %self.key, players = roster.len(), "lobby sealed");
                    return LobbyOutcome::Sealed(roster);
                }
                cmd = self.joins.recv() => {
                    let Some(cmd) = cmd else {
                        warn!(key = %self.key, "every handle dropped, cancelling lobby");
                        return LobbyOutcome::Cancelled;
                    };
                    if self.handle_join(cmd) {
                        join_window.disarm();
                        grace.arm(self.config.grace_countdown);
                    }
                }
            }
        }
    }

    /// Applies one join. Returns `true` when it reached quorum for the
    /// first time.
    fn handle_join(&mut self, cmd: JoinCommand) -> bool {
        let JoinCommand {
            user,
            display,
            slot,
            reply,
        } = cmd;

        let result = self.lobby.join(user, display, slot);
        let quorum = match &result {
            Ok(size) => {
                debug!(key = %self.key, %user, %slot, players = size, "player joined");
                let roster = self.lobby.roster().to_vec();
                self.info.send_modify(|info| info.players = roster);
                self.emit(Notification::PlayerJoined {
                    key: self.key,
                    user,
                    slot,
                    roster_size: *size,
                });
                self.lobby.on_join_change(*size)
            }
            Err(e) => {
                debug!(key = %self.key, %user, %slot, reason = %e, "join rejected");
                false
            }
        };

        if quorum {
            info!(
                key = %self.key,
                grace_ms = millis(self.config.grace_countdown),
                "quorum reached, countdown started"
            );
            self.set_phase(GamePhase::Countdown);
            self.emit(Notification::QuorumReached {
                key: self.key,
                eta_ms: millis(self.config.grace_countdown),
            });
        }

        let _ = reply.send(result);
        quorum
    }

    /// Stops accepting joins and answers everything still queued.
    fn close_joins(&mut self) {
        self.joins.close();
        while let Ok(cmd) = self.joins.try_recv() {
            let _ = cmd.reply.send(Err(GameError::LobbyClosed));
        }
    }

    async fn run_game(&mut self, roster: Vec<Player>) {
        self.set_phase(GamePhase::InProgress);
        info!(key = %self.key, game = %self.id, players = roster.len(), "game started");
        self.emit(Notification::GameStarted {
            key: self.key,
            roster: roster.clone(),
        });

        let rng = match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let engine = TurnEngine::new(
            self.key,
            roster,
            &self.config,
            self.gate.clone(),
            rng,
            self.events.clone(),
        );
        let winner = engine.run().await;

        self.release().await;
        self.info.send_modify(|info| {
            info.phase = GamePhase::Finished;
            info.winner = winner.clone();
        });

        match winner {
            Some(winner) => {
                info!(key = %self.key, winner = %winner.user, slot = %winner.slot, "game won");
                self.emit(Notification::GameWon {
                    key: self.key,
                    winner: winner.user,
                    slot: winner.slot,
                });
            }
            None => warn!(key = %self.key, "game ended with an empty roster"),
        }
    }

    fn set_phase(&self, phase: GamePhase) {
        self.info.send_modify(|info| {
            if !info.phase.can_transition_to(phase) {
                warn!(
                    key = %self.key,
                    from = %info.phase,
                    to = %phase,
                    "unexpected phase transition"
                );
            }
            info.phase = phase;
        });
    }

    /// Frees the session key. Called exactly once, at the terminal phase.
    async fn release(&self) {
        if !self.registry.unregister(self.key, self.id).await {
            warn!(key = %self.key, game = %self.id, "session was already released");
        }
    }

    /// A closed receiver means nobody is rendering; the game goes on.
    fn emit(&self, note: Notification) {
        let _ = self.events.send(note);
    }
}

/// Spawns a game task and returns a handle to it.
pub(crate) fn spawn_game(
    key: SessionKey,
    config: GameConfig,
    events: NotificationSender,
    registry: GameRegistry,
) -> GameHandle {
    let id = GameId::next();
    let (join_tx, join_rx) = mpsc::channel(JOIN_CHANNEL_SIZE);
    let (info_tx, info_rx) = watch::channel(GameInfo {
        key,
        id,
        phase: GamePhase::Lobby,
        players: Vec::new(),
        winner: None,
    });
    let gate = TurnGate::new();

    let actor = GameActor {
        key,
        id,
        lobby: Lobby::new(config.min_players, config.max_slots),
        config,
        joins: join_rx,
        gate: gate.clone(),
        events,
        info: info_tx,
        registry,
    };

    tokio::spawn(actor.run());

    GameHandle {
        key,
        id,
        joins: join_tx,
        gate,
        info: info_rx,
    }
}
