//! Game core for the roulette engine.
//!
//! Each game runs as an isolated Tokio task: a lobby that collects players
//! under a join window and a grace countdown, then a turn engine that
//! eliminates players until one survivor is left.
//!
//! # Key types
//!
//! - [`GameRegistry`]: one active game per session key
//! - [`GameHandle`]: join, act, and observe a running game
//! - [`Lobby`]: join validation and quorum detection
//! - [`TurnEngine`]: the elimination loop
//! - [`ActionCollector`]: how a turn waits for its shooter ([`TurnGate`]
//!   in production)
//! - [`GameConfig`], [`GamePhase`]: settings and lifecycle

mod collector;
mod config;
mod error;
mod game;
mod lobby;
mod registry;
mod turn;

pub use collector::{ActionCollector, Collected, TurnGate};
pub use config::{GameConfig, GamePhase, MAX_TIMER};
pub use error::GameError;
pub use game::{GameHandle, GameId, GameInfo, NotificationReceiver, NotificationSender};
pub use lobby::Lobby;
pub use registry::GameRegistry;
pub use turn::{TurnEngine, TurnOutcome, build_choice_set};
