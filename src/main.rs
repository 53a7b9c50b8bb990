//! Feed The Cat headless runner
//!
//! Plays a seeded session with the autoplay AI and logs what happened.
//! Useful for balance passes and for checking saves round-trip.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use feed_the_cat::consts::SIM_DT;
use feed_the_cat::persistence::{JsonFileStore, KvStore, MemoryStore};
use feed_the_cat::sim::{BoosterKind, GameEvent, GamePhase, GameState, TickInput, tick};
use feed_the_cat::{EconomyLedger, Tuning};

/// Run a headless autoplay session
#[derive(Parser)]
#[command(name = "feed-the-cat")]
#[command(about = "Headless merge simulation runner", long_about = None)]
#[command(version)]
struct Cli {
    /// RNG seed (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,

    /// Balance overrides (JSON)
    #[arg(short, long, value_name = "FILE")]
    tuning: Option<PathBuf>,

    /// Save file for the ledger (in-memory if omitted)
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Buy this many boosters before playing (bomb, paw or cat)
    #[arg(long, value_name = "KIND", requires = "quantity")]
    buy: Option<String>,

    #[arg(long, value_name = "N")]
    quantity: Option<u32>,

    /// Start a new session when the field clears after a loss
    #[arg(long)]
    restart: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let tuning = match &cli.tuning {
        Some(path) => match Tuning::load(path) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::error!("Failed to load tuning {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    let store: Box<dyn KvStore> = match &cli.save {
        Some(path) => match JsonFileStore::open(path) {
            Ok(store) => Box::new(store),
            Err(err) => {
                log::error!("Failed to open save {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(MemoryStore::new()),
    };
    let mut ledger = EconomyLedger::new(store);

    if let (Some(name), Some(quantity)) = (&cli.buy, cli.quantity) {
        let Some(kind) = BoosterKind::from_str(name) else {
            log::error!("Unknown booster '{}'", name);
            return ExitCode::FAILURE;
        };
        match tuning.economy.booster_price(kind) {
            Some(price) if ledger.purchase_boosters(kind, quantity, price) => {
                log::info!(
                    "Bought {} {} for {} coins",
                    quantity,
                    kind.as_str(),
                    price as u64 * quantity as u64
                );
            }
            Some(price) => log::warn!(
                "Cannot afford {} {} ({} coins, have {})",
                quantity,
                kind.as_str(),
                price as u64 * quantity as u64,
                ledger.coins()
            ),
            None => log::warn!("{} boosters are not sold", kind.as_str()),
        }
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut state = GameState::new(tuning, seed, &ledger);
    state.start_game(&mut ledger);

    let input = TickInput {
        autoplay: true,
        ..Default::default()
    };
    let ticks = (cli.seconds.max(0.0) / SIM_DT).round() as u64;
    let mut merges = 0u32;
    let mut sessions = 1u32;

    for _ in 0..ticks {
        tick(&mut state, &mut ledger, &input, SIM_DT);
        for event in state.drain_events() {
            match event {
                GameEvent::ItemMerged { kind, .. } => {
                    merges += 1;
                    log::debug!("Merged into {}", kind.as_str());
                }
                GameEvent::SatisfactionChanged { level } => log::info!("Cat is {:?}", level),
                GameEvent::BoosterActivated { kind } => log::info!("Used {}", kind.as_str()),
                GameEvent::GameOver => log::info!("Field cleared after loss"),
                _ => {}
            }
        }
        for event in ledger.drain_events() {
            log::trace!("{:?}", event);
        }

        if state.phase == GamePhase::GameOver && state.live_items().next().is_none() {
            if !cli.restart {
                break;
            }
            state.reset_game(&mut ledger);
            sessions += 1;
        }
    }

    let seconds = state.time_ticks as f32 * SIM_DT;
    log::info!(
        "Seed {}: {:.1}s, {} sessions, {} merges, {} coins, {} xp, {} kinds discovered",
        seed,
        seconds,
        sessions,
        merges,
        ledger.coins(),
        ledger.experience(),
        ledger.discovered().len()
    );
    println!(
        "seed={} seconds={:.1} merges={} coins={} experience={} goal={}",
        seed,
        seconds,
        merges,
        ledger.coins(),
        ledger.experience(),
        ledger.current_goal().as_str()
    );
    ExitCode::SUCCESS
}
