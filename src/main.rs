use clap::Parser;
use log::{error, info};
use std::env;
use std::process::ExitCode;

use penguins::bot_task::BotWorker;
use penguins::config::Config;
use penguins::debug_logger::DebugLogger;
use penguins::game::Game;
use penguins::rng::make_rng;
use penguins::turn::{Actor, Session, TurnState};

/// Plays a game of Penguins between bots
#[derive(Parser)]
struct Args {
    /// Configuration file, Penguins.toml when omitted
    #[arg(long)]
    config: Option<String>,

    /// RNG seed, overrides the one from the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Write every game event to the debug trace file
    #[arg(long)]
    trace: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    let args = Args::parse();
    info!("Starting Penguins self-play...");

    let mut config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::load_or_default(),
    };
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }
    if args.trace {
        config.debug.enabled = true;
    }

    match play(&config, args.seed).await {
        Ok(game) => {
            info!("Final board:\n{}", game.board());
            for player in game.players() {
                info!(
                    "{:>10}: {:>3} fish in {} moves",
                    player.name, player.points, player.moves_count
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Game aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn play(config: &Config, seed_override: Option<u64>) -> Result<Game, String> {
    let seed = seed_override
        .or(config.game.seed)
        .unwrap_or_else(rand::random);
    info!("Seed: {}", seed);

    let game_config = &config.game;
    let mut game = Game::new(
        game_config.board_width,
        game_config.board_height,
        &game_config.players,
        game_config.penguins_per_player,
    )
    .map_err(|e| e.to_string())?;
    let mut board_rng = make_rng(game_config.rng, Some(seed));
    game.generate_board(game_config.generator, &mut *board_rng)
        .map_err(|e| e.to_string())?;

    let bot_rng = make_rng(game_config.rng, Some(seed.wrapping_add(1)));
    let worker = BotWorker::new(config.bot.clone(), bot_rng);
    let actors = vec![Actor::Bot; game.players_count()];
    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;

    let mut session = Session::new(game, actors, worker)
        .map_err(|e| e.to_string())?
        .with_logger(logger.clone());

    let state = session.play_bot_turns().await.map_err(|e| e.to_string())?;
    logger.sync().await;

    match state {
        TurnState::GameOver => {
            let game = session.game();
            let game = game.lock();
            Ok(game.clone())
        }
        _ => Err("the game stopped before its end".to_string()),
    }
}
