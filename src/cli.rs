//! Command-line interface for strictly_chess.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Chess - play white against a UCI engine in the terminal
#[derive(Parser, Debug)]
#[command(name = "strictly_chess")]
#[command(about = "Terminal chess against a UCI engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game in the terminal UI
    Play {
        /// Path to the configuration file
        #[arg(short, long, default_value = "strictly_chess.toml")]
        config: PathBuf,

        /// Override the engine command (space-separated)
        #[arg(short, long)]
        engine: Option<String>,

        /// Override the engine thinking time per move, in milliseconds
        #[arg(short, long)]
        movetime: Option<u64>,

        /// Play against the built-in first-legal-move oracle instead of an engine
        #[arg(long)]
        builtin: bool,
    },

    /// Start the engine, print its name and ask it for an opening move
    Probe {
        /// Path to the configuration file
        #[arg(short, long, default_value = "strictly_chess.toml")]
        config: PathBuf,

        /// Override the engine command (space-separated)
        #[arg(short, long)]
        engine: Option<String>,
    },
}
