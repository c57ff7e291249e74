//! The action collector: the seam between the turn engine and whatever
//! UI lets a shooter pick a target.
//!
//! The engine only needs one thing from the outside world each turn: "did
//! this player pick one of these options before the deadline, and which?"
//! [`ActionCollector`] is that question as a trait. [`TurnGate`] is the
//! live implementation, fed by [`GameHandle::submit_action`](crate::GameHandle::submit_action).

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use roulette_protocol::{Choice, Player, UserId};
use tokio::sync::oneshot;

use crate::GameError;

/// How a collection round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collected {
    /// The shooter picked this option in time.
    Chosen(Choice),
    /// The deadline elapsed with no valid submission.
    Missed,
}

/// Waits for a specific player to pick from a set of choices.
///
/// # Contract
///
/// - Submissions from anyone other than `shooter` are rejected and do not
///   resolve the call or move the deadline.
/// - Resolves with [`Collected::Missed`] once `deadline` elapses without a
///   valid submission.
/// - Resolves exactly once per call.
///
/// Implementations must not block the thread: many games share the
/// runtime.
pub trait ActionCollector: Send + 'static {
    fn collect(
        &mut self,
        shooter: &Player,
        choices: &[Choice],
        deadline: Duration,
    ) -> impl Future<Output = Collected> + Send;
}

// ---------------------------------------------------------------------------
// TurnGate
// ---------------------------------------------------------------------------

/// The turn currently waiting for its shooter.
struct OpenTurn {
    shooter: UserId,
    choices: Vec<Choice>,
    reply: oneshot::Sender<Choice>,
}

/// Live [`ActionCollector`] shared between the game task and its handles.
///
/// The game task opens a turn; any number of handle clones submit into
/// it. Whoever takes the open turn out of the mutex first (a valid
/// submission or the expiring deadline) decides the outcome, so a
/// submission racing the deadline is processed exactly once.
#[derive(Clone, Default)]
pub struct TurnGate {
    open: Arc<Mutex<Option<OpenTurn>>>,
}

impl TurnGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits `choice` on behalf of `actor`.
    ///
    /// # Errors
    /// - [`GameError::NoTurnInProgress`]: no turn is open
    /// - [`GameError::NotYourTurn`]: `actor` is not the shooter
    /// - [`GameError::InvalidChoice`]: `choice` was not offered
    ///
    /// A rejected submission leaves the open turn untouched.
    pub fn submit(&self, actor: UserId, choice: Choice) -> Result<(), GameError> {
        let mut open = self.lock();
        let Some(turn) = open.as_ref() else {
            return Err(GameError::NoTurnInProgress);
        };
        if turn.shooter != actor {
            return Err(GameError::NotYourTurn(actor));
        }
        if !turn.choices.contains(&choice) {
            return Err(GameError::InvalidChoice(choice));
        }

        if let Some(turn) = open.take() {
            // The collector may have been dropped mid-turn (game task
            // cancelled); the submission is still accepted.
            let _ = turn.reply.send(choice);
        }
        Ok(())
    }

    /// The shooter the gate is currently waiting on, if any.
    pub fn awaiting(&self) -> Option<UserId> {
        self.lock().as_ref().map(|turn| turn.shooter)
    }

    /// Opens a turn for `shooter`, replacing any stale one.
    fn open_turn(&self, shooter: UserId, choices: &[Choice]) -> oneshot::Receiver<Choice> {
        let (reply, rx) = oneshot::channel();
        *self.lock() = Some(OpenTurn {
            shooter,
            choices: choices.to_vec(),
            reply,
        });
        rx
    }

    /// Closes the turn once its deadline has elapsed. A submission that
    /// took the turn first still counts.
    fn expire_turn(&self, rx: &mut oneshot::Receiver<Choice>) -> Collected {
        let still_open = self.lock().take();
        match still_open {
            Some(_) => Collected::Missed,
            None => rx.try_recv().map_or(Collected::Missed, Collected::Chosen),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<OpenTurn>> {
        // The guarded data is a plain Option, valid even after a panic.
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActionCollector for TurnGate {
    async fn collect(
        &mut self,
        shooter: &Player,
        choices: &[Choice],
        deadline: Duration,
    ) -> Collected {
        let mut rx = self.open_turn(shooter.user, choices);
        match tokio::time::timeout(deadline, &mut rx).await {
            Ok(Ok(choice)) => Collected::Chosen(choice),
            Ok(Err(_)) => Collected::Missed,
            Err(_) => self.expire_turn(&mut rx),
        }
    }
}
