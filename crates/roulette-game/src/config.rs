//! Game configuration and lifecycle state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Longest any single timer may run. Longer values are clamped.
pub const MAX_TIMER: Duration = Duration::from_secs(24 * 60 * 60);

/// Tunables for one game instance.
///
/// Every field has a default, and `#[serde(default)]` lets a config file
/// override only the fields it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Players required before the grace countdown starts.
    pub min_players: usize,

    /// Highest slot number a player can pick (slots are `1..=max_slots`).
    pub max_slots: u8,

    /// How long the lobby waits for quorum before cancelling.
    pub join_window: Duration,

    /// Delay between quorum and sealing the lobby. Zero seals at quorum.
    pub grace_countdown: Duration,

    /// How long a shooter has to pick a target.
    pub turn_deadline: Duration,

    /// Chance that a shot eliminates its target.
    pub hit_probability: f64,

    /// Pause around each outcome announcement. Zero for headless runs.
    pub pacing_delay: Duration,

    /// Seed for shooter selection and hit rolls. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_slots: 16,
            join_window: Duration::from_secs(35),
            grace_countdown: Duration::from_secs(15),
            turn_deadline: Duration::from_secs(60),
            hit_probability: 0.6,
            pacing_delay: Duration::from_secs(2),
            rng_seed: None,
        }
    }
}

impl GameConfig {
    /// Clamp out-of-range values so the config is safe to run.
    ///
    /// - `max_slots` at least 1.
    /// - `min_players` within `1..=max_slots`.
    /// - `hit_probability` within `0.0..=1.0`; NaN falls back to the default.
    /// - every timer at most [`MAX_TIMER`].
    pub fn validated(mut self) -> Self {
        if self.max_slots == 0 {
            warn!("max_slots is 0, raising to 1");
            self.max_slots = 1;
        }
        let max_players = usize::from(self.max_slots);
        if self.min_players == 0 || self.min_players > max_players {
            let clamped = self.min_players.clamp(1, max_players);
            warn!(
                min_players = self.min_players,
                max_slots = self.max_slots,
                clamped,
                "min_players out of range, clamping"
            );
            self.min_players = clamped;
        }
        if self.hit_probability.is_nan() {
            warn!("hit_probability is NaN, using default");
            self.hit_probability = Self::default().hit_probability;
        } else if !(0.0..=1.0).contains(&self.hit_probability) {
            warn!(
                hit_probability = self.hit_probability,
                "hit_probability outside 0..=1, clamping"
            );
            self.hit_probability = self.hit_probability.clamp(0.0, 1.0);
        }
        for (name, timer) in [
            ("join_window", &mut self.join_window),
            ("grace_countdown", &mut self.grace_countdown),
            ("turn_deadline", &mut self.turn_deadline),
            ("pacing_delay", &mut self.pacing_delay),
        ] {
            if *timer > MAX_TIMER {
                warn!(timer = name, secs = timer.as_secs(), "timer too long, clamping");
                *timer = MAX_TIMER;
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a game.
///
/// ```text
/// Lobby → Countdown → InProgress → Finished
///   └──→ Cancelled
/// ```
///
/// - **Lobby**: accepting joins, quorum not reached, join window running.
/// - **Countdown**: quorum reached, grace countdown running, joins still
///   accepted.
/// - **InProgress**: lobby sealed, elimination loop running.
/// - **Finished**: one survivor left.
/// - **Cancelled**: join window elapsed before quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Lobby,
    Countdown,
    InProgress,
    Finished,
    Cancelled,
}

impl GamePhase {
    /// Returns `true` while joins can be accepted.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby | Self::Countdown)
    }

    /// Returns `true` once the game can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    /// Returns `true` if moving from `self` to `target` is a legal step.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Lobby, Self::Countdown)
                | (Self::Lobby, Self::Cancelled)
                | (Self::Countdown, Self::InProgress)
                | (Self::InProgress, Self::Finished)
        )
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Countdown => write!(f, "Countdown"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}
