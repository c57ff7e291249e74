//! Error types for the game layer.

use roulette_protocol::{Choice, SessionKey, Slot, UserId};

/// Errors reported back to whoever submitted a join or an action.
///
/// All of them are local and recoverable: a rejected submission never
/// changes game state and never ends the game. Deadlines are not errors;
/// an elapsed turn becomes a missed turn and an elapsed join window
/// cancels the lobby.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// A game is already running for this key.
    #[error("a game is already active for {0}")]
    SessionAlreadyActive(SessionKey),

    /// No game is running for this key.
    #[error("no active game for {0}")]
    NoSuchSession(SessionKey),

    /// The user is already in the roster.
    #[error("{0} already joined")]
    AlreadyJoined(UserId),

    /// Another player holds this slot.
    #[error("slot {0} is taken")]
    SlotTaken(Slot),

    /// The slot is outside `1..=max_slots`.
    #[error("slot {0} is out of range (1..={1})")]
    InvalidSlot(Slot, u8),

    /// The lobby has sealed; the game has started or ended.
    #[error("the lobby is closed")]
    LobbyClosed,

    /// Someone other than the current shooter tried to act.
    #[error("not {0}'s turn")]
    NotYourTurn(UserId),

    /// No turn is waiting for an action right now.
    #[error("no turn is in progress")]
    NoTurnInProgress,

    /// The choice is not in the set offered this turn.
    #[error("choice {0} is not available")]
    InvalidChoice(Choice),
}
