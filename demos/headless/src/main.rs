//! Plays one roulette game with bots and prints every notification as a
//! JSON line.
//!
//! ```text
//! cargo run -p headless                 # built-in short timers
//! cargo run -p headless -- config.json  # timers from a config file
//! RUST_LOG=debug cargo run -p headless  # with engine logs
//! ```

use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;
use roulette::prelude::*;
use tracing::info;

const KEY: SessionKey = SessionKey(1);
const BOTS: u8 = 5;

/// Chance a bot sits out its turn and lets the deadline expire.
const IDLE_RATE: f64 = 0.2;

// ---------------------------------------------------------------------------
// Bots
// ---------------------------------------------------------------------------

/// Timers short enough to watch a whole game in a few seconds.
fn demo_config() -> GameConfig {
    GameConfig {
        join_window: Duration::from_secs(5),
        grace_countdown: Duration::from_secs(1),
        turn_deadline: Duration::from_secs(2),
        pacing_delay: Duration::from_millis(300),
        ..GameConfig::default()
    }
}

/// A bot's move: `None` to stay idle, otherwise a pick from `choices`.
fn bot_pick(rng: &mut impl Rng, choices: &[Choice], idle_rate: f64) -> Option<Choice> {
    if rng.random_bool(idle_rate) {
        return None;
    }
    choices.choose(rng).copied()
}

/// Joins the bots one at a time on consecutive slots.
async fn join_bots(engine: &Roulette) -> Result<(), RouletteError> {
    for i in 1..=BOTS {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let size = engine
            .submit_join(KEY, UserId(u64::from(i)), format!("bot-{i}"), Slot(i))
            .await?;
        info!(bot = i, roster = size, "bot joined");
    }
    Ok(())
}

/// Lets the shooter bot think, then submits its pick.
fn play_turn(engine: &Roulette, shooter: UserId, choices: &[Choice]) {
    let mut rng = rand::rng();
    let Some(choice) = bot_pick(&mut rng, choices, IDLE_RATE) else {
        info!(%shooter, "bot idles");
        return;
    };
    let think = Duration::from_millis(rng.random_range(100..800));

    let engine = engine.clone();
    tokio::spawn(async move {
        tokio::time::sleep(think).await;
        if let Err(e) = engine.submit_turn_action(KEY, shooter, choice).await {
            info!(%shooter, error = %e, "bot action rejected");
        }
    });
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), RouletteError> {
    roulette::init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => roulette::load_config(path)?,
        None => demo_config(),
    };
    let (engine, mut notes) = Roulette::new(config);
    engine.start_session(KEY).await?;

    let joiner = engine.clone();
    tokio::spawn(async move {
        if let Err(e) = join_bots(&joiner).await {
            info!(error = %e, "stopped joining");
        }
    });

    let codec = JsonCodec;
    while let Some(note) = notes.recv().await {
        println!("{}", String::from_utf8_lossy(&codec.encode(&note)?));

        if let Notification::TurnAnnounced {
            shooter, choices, ..
        } = &note
        {
            play_turn(&engine, *shooter, choices);
        }
        if note.is_terminal() {
            break;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
