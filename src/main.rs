//! Strictly Chess - Unified CLI
//!
//! Terminal chess against a UCI engine, plus an engine probe.

#![warn(missing_docs)]

mod cli;
mod tui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::Path;
use strictly_chess::{EngineConfig, FirstLegalOracle, GameConfig, Oracle, Position, UciOracle};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info,strictly_chess=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            engine,
            movetime,
            builtin,
        } => run_play(&config, engine, movetime, builtin).await,
        Command::Probe { config, engine } => run_probe(&config, engine).await,
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Reads the config file and applies environment and CLI overrides.
fn load_config(path: &Path, engine: Option<String>, movetime: Option<u64>) -> Result<GameConfig> {
    let config = GameConfig::load(path)?.with_env_overrides();

    let mut engine_config: EngineConfig = config.engine().clone();
    if let Some(command) = engine {
        engine_config = engine_config.with_command_line(&command);
    }
    if let Some(ms) = movetime {
        engine_config = engine_config.with_move_time_ms(ms);
    }
    engine_config.validate()?;

    Ok(config.with_engine(engine_config))
}

/// Run the terminal UI
#[instrument(skip(config_path, engine, movetime), fields(config_path = %config_path.display()))]
async fn run_play(
    config_path: &Path,
    engine: Option<String>,
    movetime: Option<u64>,
    builtin: bool,
) -> Result<()> {
    let config = load_config(config_path, engine, movetime)?;

    // Log to a file so the terminal stays clean
    let log_file = std::fs::File::create(config.log_file())?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();

    info!(engine = ?config.engine().command(), builtin, "Starting Strictly Chess");

    let oracle: Box<dyn Oracle> = if builtin {
        Box::new(FirstLegalOracle::default())
    } else {
        match UciOracle::spawn(config.engine()).await {
            Ok(oracle) => Box::new(oracle),
            Err(e) => {
                warn!(error = %e, "Engine failed to start");
                anyhow::bail!("{} (use --builtin to play without an engine)", e);
            }
        }
    };

    tui::run_tui(oracle, config.engine().move_time()).await
}

/// Run the engine probe
#[instrument(skip_all, fields(config_path = %config_path.display()))]
async fn run_probe(config_path: &Path, engine: Option<String>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(config_path, engine, None)?;
    info!(engine = ?config.engine().command(), "Probing engine");

    let mut oracle = UciOracle::spawn(config.engine()).await?;
    println!("Engine: {}", oracle.name());

    let position = Position::new();
    let result = oracle.request_move(&position, config.engine().move_time()).await;
    oracle.shutdown().await;

    let mv = result?;
    println!("Opening move: {}", mv);
    Ok(())
}
