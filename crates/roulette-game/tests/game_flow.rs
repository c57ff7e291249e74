//! End-to-end tests for the game task: lobby timers, join races, live
//! turns through the turn gate, and registry lifecycle.
//!
//! All tests run on a paused clock; Tokio advances it only when every
//! task is idle, so deadlines fire at exact, predictable instants.

use std::time::Duration;

use roulette_game::{
    GameConfig, GameError, GameHandle, GamePhase, GameRegistry, MAX_TIMER, NotificationReceiver,
};
use roulette_protocol::{Choice, Notification, SessionKey, Slot, UserId};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

// =========================================================================
// Helpers
// =========================================================================

const KEY: SessionKey = SessionKey(100);

fn config() -> GameConfig {
    GameConfig {
        pacing_delay: Duration::ZERO,
        rng_seed: Some(7),
        ..GameConfig::default()
    }
}

async fn start(config: GameConfig) -> (GameRegistry, GameHandle, NotificationReceiver) {
    let registry = GameRegistry::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = registry.register(KEY, config, tx).await.unwrap();
    (registry, handle, rx)
}

fn uid(n: u64) -> UserId {
    UserId(n)
}

/// Receives notifications until one matches, returning everything seen.
async fn recv_until(
    rx: &mut NotificationReceiver,
    pred: impl Fn(&Notification) -> bool,
) -> Vec<Notification> {
    let mut seen = Vec::new();
    while let Some(note) = rx.recv().await {
        let done = pred(&note);
        seen.push(note);
        if done {
            return seen;
        }
    }
    panic!("notification stream closed; saw {seen:?}");
}

fn drain(rx: &mut NotificationReceiver) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(note) = rx.try_recv() {
        out.push(note);
    }
    out
}

fn count(notes: &[Notification], pred: impl Fn(&Notification) -> bool) -> usize {
    notes.iter().filter(|n| pred(n)).count()
}

// =========================================================================
// Scenario A: join window elapses without quorum
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_lobby_cancelled_when_window_elapses() {
    let t0 = Instant::now();
    let (registry, handle, mut rx) = start(GameConfig {
        join_window: Duration::from_secs(5),
        ..config()
    })
    .await;

    assert_eq!(handle.join(uid(1), "a", Slot(1)).await, Ok(1));
    assert_eq!(handle.join(uid(2), "b", Slot(2)).await, Ok(2));

    let info = handle.finished().await;
    assert_eq!(info.phase, GamePhase::Cancelled);
    assert_eq!(t0.elapsed().as_secs(), 5);
    assert!(!registry.contains(KEY).await, "key must be free again");

    let notes = recv_until(&mut rx, |n| n.is_terminal()).await;
    assert_eq!(notes.last(), Some(&Notification::LobbyCancelled { key: KEY }));
    assert_eq!(
        count(&notes, |n| matches!(n, Notification::GameStarted { .. })),
        0
    );
    assert!(drain(&mut rx).is_empty(), "exactly one terminal notification");

    assert_eq!(
        handle.join(uid(3), "c", Slot(3)).await,
        Err(GameError::LobbyClosed)
    );
}

#[tokio::test(start_paused = true)]
async fn test_key_reusable_after_cancel() {
    let (registry, handle, _rx) = start(GameConfig {
        join_window: Duration::from_secs(1),
        ..config()
    })
    .await;
    let old_id = handle.id();
    handle.finished().await;

    let (tx, _rx2) = mpsc::unbounded_channel();
    let fresh = registry.register(KEY, config(), tx).await.unwrap();
    assert_ne!(fresh.id(), old_id);

    // A stale release must not evict the new game.
    assert!(!registry.unregister(KEY, old_id).await);
    assert!(registry.contains(KEY).await);
}

#[tokio::test(start_paused = true)]
async fn test_overlong_join_window_still_cancels_and_frees_key() {
    let t0 = Instant::now();
    let (registry, handle, mut rx) = start(GameConfig {
        join_window: Duration::MAX,
        ..config()
    })
    .await;

    assert_eq!(handle.join(uid(1), "a", Slot(1)).await, Ok(1));
    assert_eq!(handle.phase(), GamePhase::Lobby);

    let info = handle.finished().await;
    assert_eq!(info.phase, GamePhase::Cancelled);
    assert_eq!(t0.elapsed().as_secs(), MAX_TIMER.as_secs());
    assert!(!registry.contains(KEY).await);

    let notes = recv_until(&mut rx, |n| n.is_terminal()).await;
    assert!(matches!(
        notes.first(),
        Some(Notification::LobbyOpened { join_window_ms: 86_400_000, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_handle_debug_names_game() {
    let (_registry, handle, _rx) = start(config()).await;
    let shown = format!("{handle:?}");
    assert!(shown.contains("GameHandle"));
    assert!(shown.contains("Lobby"));
}

// =========================================================================
// Scenario B: grace countdown keeps the lobby open until it elapses
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_grace_countdown_accepts_until_sealed() {
    let t0 = Instant::now();
    let (_registry, handle, mut rx) = start(config()).await;

    assert_eq!(handle.join(uid(1), "a", Slot(1)).await, Ok(1));
    sleep_until(t0 + Duration::from_secs(1)).await;
    assert_eq!(handle.join(uid(2), "b", Slot(2)).await, Ok(2));
    sleep_until(t0 + Duration::from_secs(2)).await;
    assert_eq!(handle.join(uid(3), "c", Slot(3)).await, Ok(3));
    assert_eq!(handle.phase(), GamePhase::Countdown);

    let notes = drain(&mut rx);
    assert!(notes.contains(&Notification::QuorumReached {
        key: KEY,
        eta_ms: 15_000,
    }));

    sleep_until(t0 + Duration::from_secs(16)).await;
    assert_eq!(handle.join(uid(4), "d", Slot(4)).await, Ok(4));

    sleep_until(t0 + Duration::from_secs(18)).await;
    assert_eq!(
        handle.join(uid(5), "e", Slot(5)).await,
        Err(GameError::LobbyClosed)
    );
    assert_eq!(handle.phase(), GamePhase::InProgress);

    let notes = recv_until(&mut rx, |n| matches!(n, Notification::GameStarted { .. })).await;
    let Some(Notification::GameStarted { roster, .. }) = notes.last() else {
        unreachable!()
    };
    let users: Vec<_> = roster.iter().map(|p| p.user).collect();
    assert_eq!(users, vec![uid(1), uid(2), uid(3), uid(4)]);
    assert_eq!(handle.info().players.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_quorum_arms_countdown_once_for_simultaneous_joins() {
    let t0 = Instant::now();
    let (_registry, handle, mut rx) = start(config()).await;

    handle.join(uid(1), "a", Slot(1)).await.unwrap();
    handle.join(uid(2), "b", Slot(2)).await.unwrap();
    let (third, fourth) = tokio::join!(
        handle.join(uid(3), "c", Slot(3)),
        handle.join(uid(4), "d", Slot(4)),
    );
    assert!(third.is_ok() && fourth.is_ok());

    let notes = recv_until(&mut rx, |n| matches!(n, Notification::GameStarted { .. })).await;
    assert_eq!(
        count(&notes, |n| matches!(n, Notification::QuorumReached { .. })),
        1
    );
    // Sealed 15s after the third join, not restarted by the fourth.
    assert_eq!(t0.elapsed().as_secs(), 15);
}

#[tokio::test(start_paused = true)]
async fn test_zero_grace_seals_at_quorum() {
    let (_registry, handle, mut rx) = start(GameConfig {
        min_players: 2,
        grace_countdown: Duration::ZERO,
        ..config()
    })
    .await;

    handle.join(uid(1), "a", Slot(1)).await.unwrap();
    handle.join(uid(2), "b", Slot(2)).await.unwrap();
    recv_until(&mut rx, |n| matches!(n, Notification::GameStarted { .. })).await;

    assert_eq!(
        handle.join(uid(3), "c", Slot(3)).await,
        Err(GameError::LobbyClosed)
    );
}

// =========================================================================
// Join validation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_duplicate_join_rejected_roster_unchanged() {
    let (_registry, handle, _rx) = start(config()).await;

    handle.join(uid(1), "a", Slot(1)).await.unwrap();
    assert_eq!(
        handle.join(uid(1), "a", Slot(2)).await,
        Err(GameError::AlreadyJoined(uid(1)))
    );
    assert_eq!(handle.info().players.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_racing_joins_for_one_slot() {
    let (_registry, handle, _rx) = start(config()).await;

    let (a, b) = tokio::join!(
        handle.join(uid(1), "a", Slot(7)),
        handle.join(uid(2), "b", Slot(7)),
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.contains(&Err(GameError::SlotTaken(Slot(7)))));
    assert_eq!(handle.info().players.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_slot_rejected() {
    let (_registry, handle, _rx) = start(config()).await;
    assert_eq!(
        handle.join(uid(1), "a", Slot(17)).await,
        Err(GameError::InvalidSlot(Slot(17), 16))
    );
}

#[tokio::test(start_paused = true)]
async fn test_action_in_lobby_has_no_turn() {
    let (_registry, handle, _rx) = start(config()).await;
    handle.join(uid(1), "a", Slot(1)).await.unwrap();
    assert_eq!(
        handle.submit_action(uid(1), Choice::Shooter),
        Err(GameError::NoTurnInProgress)
    );
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_second_session_for_key_rejected() {
    let (registry, _handle, _rx) = start(config()).await;
    let (tx, _rx2) = mpsc::unbounded_channel();
    let second = registry.register(KEY, config(), tx).await;
    assert!(matches!(second, Err(GameError::SessionAlreadyActive(KEY))));
    assert_eq!(registry.active_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_games_on_different_keys_are_independent() {
    let registry = GameRegistry::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    let a = registry.register(SessionKey(1), config(), tx.clone()).await.unwrap();
    let b = registry.register(SessionKey(2), config(), tx).await.unwrap();

    a.join(uid(1), "a", Slot(1)).await.unwrap();
    assert_eq!(b.join(uid(1), "a", Slot(1)).await, Ok(1));

    let mut keys = registry.keys().await;
    keys.sort_by_key(|k| k.0);
    assert_eq!(keys, vec![SessionKey(1), SessionKey(2)]);
}

// =========================================================================
// Live turns
// =========================================================================

async fn started_game(config: GameConfig) -> (GameRegistry, GameHandle, NotificationReceiver) {
    let (registry, handle, mut rx) = start(GameConfig {
        grace_countdown: Duration::ZERO,
        ..config
    })
    .await;
    for i in 1..=3 {
        handle.join(uid(i), format!("p{i}"), Slot(i as u8)).await.unwrap();
    }
    recv_until(&mut rx, |n| matches!(n, Notification::GameStarted { .. })).await;
    (registry, handle, rx)
}

#[tokio::test(start_paused = true)]
async fn test_wrong_actor_does_not_shorten_deadline() {
    let (_registry, handle, mut rx) = started_game(config()).await;

    let notes = recv_until(&mut rx, |n| matches!(n, Notification::TurnAnnounced { .. })).await;
    let t0 = Instant::now();
    let Some(Notification::TurnAnnounced { shooter, .. }) = notes.last().cloned() else {
        unreachable!()
    };
    let intruder = (1..=3).map(uid).find(|u| *u != shooter).unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(
        handle.submit_action(intruder, Choice::Shooter),
        Err(GameError::NotYourTurn(intruder))
    );

    let notes = recv_until(&mut rx, |n| matches!(n, Notification::TurnMissed { .. })).await;
    assert_eq!(notes.last(), Some(&Notification::TurnMissed { key: KEY, shooter }));
    assert_eq!(t0.elapsed().as_secs(), 60);
    assert_eq!(handle.info().players.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_full_game_to_single_winner() {
    let (registry, handle, mut rx) = started_game(GameConfig {
        hit_probability: 1.0,
        ..config()
    })
    .await;

    let mut eliminated = Vec::new();
    let winner = loop {
        match rx.recv().await.expect("game still running") {
            Notification::TurnAnnounced { shooter, choices, .. } => {
                // Aim at someone else when possible.
                let choice = *choices.last().unwrap();
                handle.submit_action(shooter, choice).unwrap();
                assert_eq!(
                    handle.submit_action(shooter, choice),
                    Err(GameError::NoTurnInProgress),
                    "a turn resolves exactly once"
                );
            }
            Notification::OutcomeEliminated { target, .. } => eliminated.push(target),
            Notification::GameWon { winner, .. } => break winner,
            _ => {}
        }
    };

    assert_eq!(eliminated.len(), 2);
    assert!(!eliminated.contains(&winner));
    assert!(!registry.contains(KEY).await);

    let info = handle.finished().await;
    assert_eq!(info.phase, GamePhase::Finished);
    assert_eq!(info.winner.map(|p| p.user), Some(winner));
}
