//! The elimination loop.
//!
//! Each turn runs `SelectShooter → AwaitAction → ResolveOutcome` to
//! completion before the next one starts. The engine owns the roster
//! outright once the lobby hands it over.

use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;
use roulette_protocol::{Choice, Notification, Player, SessionKey, UserId};
use roulette_timer::{millis, pace};
use tracing::{debug, info, warn};

use crate::{ActionCollector, Collected, GameConfig, NotificationSender};

/// Builds the options a shooter may pick from: themselves first, then every
/// other player by slot, in roster order.
pub fn build_choice_set(roster: &[Player], shooter: UserId) -> Vec<Choice> {
    std::iter::once(Choice::Shooter)
        .chain(
            roster
                .iter()
                .filter(|p| p.user != shooter)
                .map(|p| Choice::Slot(p.slot)),
        )
        .collect()
}

/// The result of one completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The shooter let the deadline pass.
    Missed { shooter: UserId },
    /// The shot hit and `target` left the roster.
    Eliminated { shooter: UserId, target: Player },
    /// The chamber was empty.
    Survived { shooter: UserId, target: UserId },
}

/// Runs turns over a roster until one player is left.
pub struct TurnEngine<C: ActionCollector, R: Rng> {
    key: SessionKey,
    roster: Vec<Player>,
    collector: C,
    rng: R,
    hit_probability: f64,
    turn_deadline: Duration,
    pacing_delay: Duration,
    events: NotificationSender,
    turn: u64,
}

impl<C: ActionCollector, R: Rng> TurnEngine<C, R> {
    /// Creates an engine for a sealed roster.
    pub fn new(
        key: SessionKey,
        roster: Vec<Player>,
        config: &GameConfig,
        collector: C,
        rng: R,
        events: NotificationSender,
    ) -> Self {
        Self {
            key,
            roster,
            collector,
            rng,
            hit_probability: config.hit_probability,
            turn_deadline: config.turn_deadline,
            pacing_delay: config.pacing_delay,
            events,
            turn: 0,
        }
    }

    /// The players still in the game, in join order.
    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    /// Number of turns started so far.
    pub fn turns_played(&self) -> u64 {
        self.turn
    }

    /// Plays turns until one player remains and returns them.
    ///
    /// Returns `None` only for an empty roster, which a sealed lobby never
    /// produces. Announcing the winner is left to the caller, which must
    /// release the session first.
    pub async fn run(mut self) -> Option<Player> {
        while self.roster.len() > 1 {
            self.play_turn().await;
        }
        debug!(key = %self.key, turns = self.turn, "elimination loop finished");
        self.roster.pop()
    }

    /// Plays one full turn. The roster shrinks by at most one player.
    ///
    /// Returns `None` without doing anything once fewer than two players
    /// remain.
    pub async fn play_turn(&mut self) -> Option<TurnOutcome> {
        if self.roster.len() < 2 {
            return None;
        }

        // --- SelectShooter ---
        let shooter = self.roster.choose(&mut self.rng)?.clone();
        self.turn += 1;

        // --- AwaitAction ---
        let choices = build_choice_set(&self.roster, shooter.user);
        debug!(
            key = %self.key,
            turn = self.turn,
            shooter = %shooter.user,
            options = choices.len(),
            "turn announced"
        );
        self.emit(Notification::TurnAnnounced {
            key: self.key,
            turn: self.turn,
            shooter: shooter.user,
            slot: shooter.slot,
            choices: choices.clone(),
            deadline_ms: millis(self.turn_deadline),
        });

        let choice = match self
            .collector
            .collect(&shooter, &choices, self.turn_deadline)
            .await
        {
            Collected::Chosen(choice) => choice,
            Collected::Missed => return Some(self.miss(&shooter)),
        };

        let Some(target) = self.target_for(&shooter, choice) else {
            warn!(
                key = %self.key,
                shooter = %shooter.user,
                %choice,
                "collector returned a choice outside the roster"
            );
            return Some(self.miss(&shooter));
        };

        // --- ResolveOutcome ---
        let is_self = target.user == shooter.user;
        self.emit(Notification::TargetAimed {
            key: self.key,
            shooter: shooter.user,
            target: target.user,
            is_self,
        });
        pace(self.pacing_delay).await;

        let hit = self.rng.random::<f64>() < self.hit_probability;
        let outcome = if hit {
            self.roster.retain(|p| p.user != target.user);
            info!(
                key = %self.key,
                shooter = %shooter.user,
                target = %target.user,
                remaining = self.roster.len(),
                "player eliminated"
            );
            self.emit(Notification::OutcomeEliminated {
                key: self.key,
                target: target.user,
                remaining: self.roster.len(),
            });
            TurnOutcome::Eliminated {
                shooter: shooter.user,
                target,
            }
        } else {
            debug!(key = %self.key, target = %target.user, "shot missed");
            self.emit(Notification::OutcomeSurvived {
                key: self.key,
                target: target.user,
            });
            TurnOutcome::Survived {
                shooter: shooter.user,
                target: target.user,
            }
        };

        pace(self.pacing_delay).await;
        Some(outcome)
    }

    fn miss(&self, shooter: &Player) -> TurnOutcome {
        debug!(key = %self.key, shooter = %shooter.user, "turn missed");
        self.emit(Notification::TurnMissed {
            key: self.key,
            shooter: shooter.user,
        });
        TurnOutcome::Missed {
            shooter: shooter.user,
        }
    }

    fn target_for(&self, shooter: &Player, choice: Choice) -> Option<Player> {
        match choice {
            Choice::Shooter => Some(shooter.clone()),
            Choice::Slot(slot) => self
                .roster
                .iter()
                .find(|p| p.slot == slot && p.user != shooter.user)
                .cloned(),
        }
    }

    /// Delivers a notification. A closed receiver means nobody is
    /// rendering, which never stops the game.
    fn emit(&self, note: Notification) {
        let _ = self.events.send(note);
    }
}
