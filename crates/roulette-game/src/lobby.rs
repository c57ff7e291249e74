//! Lobby state: who has joined, under which slot, and whether quorum
//! has been reached.
//!
//! This is the pure half of the lobby. The timers that cancel or seal it
//! live in the game task, which calls into [`Lobby`] for every join.

use roulette_protocol::{Player, Slot, UserId};

use crate::GameError;

/// Collects players for one game until it is sealed.
#[derive(Debug)]
pub struct Lobby {
    roster: Vec<Player>,
    min_players: usize,
    max_slots: u8,
    quorum_armed: bool,
    sealed: bool,
}

impl Lobby {
    pub fn new(min_players: usize, max_slots: u8) -> Self {
        Self {
            roster: Vec::new(),
            min_players,
            max_slots,
            quorum_armed: false,
            sealed: false,
        }
    }

    /// Adds a player and returns the new roster size.
    ///
    /// # Errors
    /// Checked in this order:
    /// - [`GameError::InvalidSlot`]: slot outside `1..=max_slots`
    /// - [`GameError::LobbyClosed`]: the lobby has been sealed
    /// - [`GameError::AlreadyJoined`]: the user is already in the roster
    /// - [`GameError::SlotTaken`]: another player holds the slot
    pub fn join(
        &mut self,
        user: UserId,
        display: impl Into<String>,
        slot: Slot,
    ) -> Result<usize, GameError> {
        if slot.0 == 0 || slot.0 > self.max_slots {
            return Err(GameError::InvalidSlot(slot, self.max_slots));
        }
        if self.sealed {
            return Err(GameError::LobbyClosed);
        }
        if self.roster.iter().any(|p| p.user == user) {
            return Err(GameError::AlreadyJoined(user));
        }
        if self.roster.iter().any(|p| p.slot == slot) {
            return Err(GameError::SlotTaken(slot));
        }

        self.roster.push(Player::new(user, display, slot));
        Ok(self.roster.len())
    }

    /// Observes a roster size change. Returns `true` exactly once: on the
    /// first call where `roster_size` reaches `min_players`.
    pub fn on_join_change(&mut self, roster_size: usize) -> bool {
        if self.quorum_armed || roster_size < self.min_players {
            return false;
        }
        self.quorum_armed = true;
        true
    }

    /// Whether quorum has been reached at least once.
    pub fn has_quorum(&self) -> bool {
        self.quorum_armed
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    /// Closes the lobby and hands the roster over in join order.
    ///
    /// Later joins fail with [`GameError::LobbyClosed`].
    pub fn seal(&mut self) -> Vec<Player> {
        self.sealed = true;
        std::mem::take(&mut self.roster)
    }
}
