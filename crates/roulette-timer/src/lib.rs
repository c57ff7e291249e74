//! Fire-once deadlines for the roulette engine.
//!
//! A game only ever waits on a handful of timers: the lobby's join window,
//! the grace countdown after quorum, and each turn's action deadline. All
//! of them share the same shape: armed at some point, possibly disarmed
//! before they fire, and never firing twice.
//!
//! # Disarmed mode
//!
//! A disarmed [`Deadline`] makes [`Deadline::wait`] pend forever, exactly
//! like an event-driven scheduler. That lets a game task keep every timer
//! in one `tokio::select!` without special-casing the ones not in use:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         biased;
//!         _ = join_window.wait() => { /* cancel */ }
//!         _ = grace.wait() => { /* seal */ }
//!         Some(cmd) = joins.recv() => { /* maybe grace.arm(..) */ }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{trace, warn};

/// Where a deadline lands when `now + after` does not fit in an
/// [`Instant`]: about thirty years out, the same stand-in Tokio uses.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

/// A one-shot timer that can be armed, disarmed, and awaited.
///
/// Uses Tokio's clock, so tests running with `start_paused = true`
/// control it deterministically.
#[derive(Debug, Clone)]
pub struct Deadline {
    label: &'static str,
    at: Option<Instant>,
    fired: bool,
}

impl Deadline {
    /// Creates a deadline armed to fire `after` from now.
    pub fn after(label: &'static str, after: Duration) -> Self {
        let mut deadline = Self::disarmed(label);
        deadline.arm(after);
        deadline
    }

    /// Creates a deadline that never fires until [`arm`](Self::arm) is called.
    pub fn disarmed(label: &'static str) -> Self {
        Self {
            label,
            at: None,
            fired: false,
        }
    }

    /// Arms the deadline to fire `after` from now.
    ///
    /// A deadline that has already fired stays spent; arming it again is
    /// ignored.
    pub fn arm(&mut self, after: Duration) {
        if self.fired {
            trace!(label = self.label, "ignoring arm on spent deadline");
            return;
        }
        let now = Instant::now();
        let at = now.checked_add(after).unwrap_or_else(|| {
            warn!(label = self.label, "deadline out of range, treating as never");
            now + FAR_FUTURE
        });
        self.at = Some(at);
        trace!(label = self.label, after_ms = millis(after), "deadline armed");
    }

    /// Disarms the deadline. Pending and future [`wait`](Self::wait) calls
    /// pend forever. Idempotent.
    pub fn disarm(&mut self) {
        if self.at.take().is_some() {
            trace!(label = self.label, "deadline disarmed");
        }
    }

    /// Whether the deadline is currently counting down.
    pub fn is_armed(&self) -> bool {
        self.at.is_some()
    }

    /// Whether the deadline has already fired through [`wait`](Self::wait).
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Time left before the deadline fires, or `None` when disarmed.
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Waits until the deadline fires.
    ///
    /// Resolves at most once per arming: on completion the deadline marks
    /// itself spent and disarms, so a later `wait` pends forever. Dropping
    /// the future before it completes leaves the deadline armed.
    pub async fn wait(&mut self) {
        let Some(at) = self.at else {
            std::future::pending::<()>().await;
            return;
        };

        time::sleep_until(at).await;

        self.at = None;
        self.fired = true;
        trace!(label = self.label, "deadline fired");
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Sleeps for a UX pacing delay. A zero delay returns immediately without
/// yielding to the timer wheel, which keeps headless runs instant.
pub async fn pace(delay: Duration) {
    if !delay.is_zero() {
        time::sleep(delay).await;
    }
}
