//! Core types shared by the game engine and its transports.
//!
//! Everything here is plain data: identifiers, the immutable [`Player`]
//! record, the [`Choice`] a shooter can make, and the [`Notification`]
//! payloads the engine emits. None of it knows about timers, channels, or
//! rendering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// An opaque user identifier, as reported by the transport.
///
/// Identity equality is decided by this value alone; the engine performs
/// no authentication. Serialized as a plain number thanks to
/// `#[serde(transparent)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// Scopes at most one active game, typically a chat channel ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(pub u64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// A player number picked at join time (`1..=max_slots`).
///
/// Range validation happens in the lobby, which knows the configured
/// `max_slots`; this type only carries the number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Slot(pub u8);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One participant of a game.
///
/// Created when the lobby accepts a join and never mutated afterwards.
/// Elimination removes the whole record from the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Who this is.
    pub user: UserId,
    /// Opaque handle the transport uses to render the player (a mention,
    /// a nickname). The engine never interprets it.
    pub display: String,
    /// The number this player picked in the lobby.
    pub slot: Slot,
}

impl Player {
    pub fn new(user: UserId, display: impl Into<String>, slot: Slot) -> Self {
        Self {
            user,
            display: display.into(),
            slot,
        }
    }
}

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// A target a shooter may pick during their turn.
///
/// Other players are addressed by slot rather than by user ID, which is
/// what a numbered button menu reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    /// The shooter aims at themselves.
    Shooter,
    /// The shooter aims at the player holding this slot.
    Slot(Slot),
}

/// Renders the identifier a button-style UI would attach to the option:
/// `"self"` or the slot number.
impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shooter => write!(f, "self"),
            Self::Slot(slot) => write!(f, "{}", slot.0),
        }
    }
}

/// Parses the identifier produced by [`Display`](fmt::Display).
impl FromStr for Choice {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("self") {
            return Ok(Self::Shooter);
        }
        match s.parse::<u8>() {
            Ok(0) | Err(_) => Err(ProtocolError::InvalidMessage(format!(
                "unknown choice {s:?}"
            ))),
            Ok(n) => Ok(Self::Slot(Slot(n))),
        }
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// Payloads the engine emits for the transport layer to render.
///
/// Every variant carries the session key so a single receiver can serve
/// many concurrent games. Durations travel as milliseconds.
///
/// `#[serde(tag = "type")]` produces `{ "type": "GameWon", "key": 1, ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    // -- Lobby --

    /// A lobby opened and is accepting joins.
    LobbyOpened {
        key: SessionKey,
        join_window_ms: u64,
        min_players: usize,
        max_slots: u8,
    },

    /// A join was accepted.
    PlayerJoined {
        key: SessionKey,
        user: UserId,
        slot: Slot,
        roster_size: usize,
    },

    /// The minimum player count was reached; the lobby seals after `eta_ms`.
    QuorumReached { key: SessionKey, eta_ms: u64 },

    /// The join window elapsed without quorum. Terminal.
    LobbyCancelled { key: SessionKey },

    /// The lobby sealed and the elimination loop is starting.
    GameStarted { key: SessionKey, roster: Vec<Player> },

    // -- Turns --

    /// A shooter was drawn and must pick one of `choices`.
    TurnAnnounced {
        key: SessionKey,
        turn: u64,
        shooter: UserId,
        slot: Slot,
        choices: Vec<Choice>,
        deadline_ms: u64,
    },

    /// The shooter let the deadline pass. Nobody is eliminated.
    TurnMissed { key: SessionKey, shooter: UserId },

    /// The shooter picked a target.
    TargetAimed {
        key: SessionKey,
        shooter: UserId,
        target: UserId,
        is_self: bool,
    },

    /// The shot hit; `target` left the roster.
    OutcomeEliminated {
        key: SessionKey,
        target: UserId,
        remaining: usize,
    },

    /// The chamber was empty.
    OutcomeSurvived { key: SessionKey, target: UserId },

    /// One player remains. Terminal.
    GameWon {
        key: SessionKey,
        winner: UserId,
        slot: Slot,
    },
}

impl Notification {
    /// The session this notification belongs to.
    pub fn key(&self) -> SessionKey {
        match self {
            Self::LobbyOpened { key, .. }
            | Self::PlayerJoined { key, .. }
            | Self::QuorumReached { key, .. }
            | Self::LobbyCancelled { key }
            | Self::GameStarted { key, .. }
            | Self::TurnAnnounced { key, .. }
            | Self::TurnMissed { key, .. }
            | Self::TargetAimed { key, .. }
            | Self::OutcomeEliminated { key, .. }
            | Self::OutcomeSurvived { key, .. }
            | Self::GameWon { key, .. } => *key,
        }
    }

    /// Returns `true` for the last notification a session ever emits.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::LobbyCancelled { .. } | Self::GameWon { .. })
    }
}

// =========================================================================
// Tests
// =========================================================================
