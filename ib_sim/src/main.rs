//! Headless INBAWK simulator.
//!
//! Runs bot-only games through the host session on a virtual clock and
//! reports who got stuck holding the cards. Useful for eyeballing the
//! bot strategy and for soak-testing the engine.

use anyhow::{Error, bail};
use log::info;
use pico_args::Arguments;
use rand::Rng;

use inbawk::{Game, GameConfig, HostSession, Intent, MAX_PLAYERS, MIN_PLAYERS, game::PlayerSpec};

const HELP: &str = "\
Run headless INBAWK games with bot players

USAGE:
  ib_sim [OPTIONS]

OPTIONS:
  --players    N           Number of bot players per game  [default: 4]
  --games      N           Number of games to run          [default: 1]
  --seed       N           Seed for the first game; later games
                           increment it  [default: random]

FLAGS:
  -h, --help               Print help information
";

struct Args {
    players: usize,
    games: u64,
    seed: u64,
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        players: pargs
            .opt_value_from_str("--players")?
            .unwrap_or(inbawk::DEFAULT_PLAYERS),
        games: pargs.opt_value_from_str("--games")?.unwrap_or(1),
        seed: pargs
            .opt_value_from_str("--seed")?
            .unwrap_or_else(|| rand::rng().random()),
    };
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&args.players) {
        bail!("--players must be within {MIN_PLAYERS}-{MAX_PLAYERS}");
    }

    let mut losses = vec![0u64; args.players];
    let mut drawn = 0u64;
    for i in 0..args.games {
        let seed = args.seed.wrapping_add(i);
        match run_game(args.players, seed)? {
            Some(loser) => losses[loser] += 1,
            None => drawn += 1,
        }
    }

    println!("{} games, {} players, base seed {}", args.games, args.players, args.seed);
    for (seat, count) in losses.iter().enumerate() {
        println!("  seat {seat}: lost {count}");
    }
    if drawn > 0 {
        println!("  ended with no loser: {drawn}");
    }
    Ok(())
}

/// Runs one bot-only game to completion and returns the loser's seat.
fn run_game(players: usize, seed: u64) -> Result<Option<usize>, Error> {
    let config = GameConfig {
        player_count: players,
        ..GameConfig::default()
    };
    let mut game = Game::with_roster(config, Vec::<PlayerSpec>::new())?;
    game.reseed(seed);

    let mut session = HostSession::new(game);
    session.dispatch(Intent::StartGame)?;
    session.fast_forward()?;

    let game = session.game();
    if game.game_active() {
        bail!("bot game stalled (seed {seed})");
    }
    match game.loser() {
        Some(loser) => {
            info!(
                "seed {seed}: {} is left holding {} cards",
                game.players()[loser].name,
                game.players()[loser].hand.len()
            );
            Ok(Some(loser))
        }
        None => {
            info!("seed {seed}: game ended with no loser");
            Ok(None)
        }
    }
}
