//! UCI text protocol: commands we send and lines we understand.

use crate::games::chess::{Move, Position};
use std::time::Duration;
use tracing::instrument;

/// A line received from a UCI engine, as far as we care about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    /// `id name <name>`.
    IdName(String),
    /// `uciok`.
    UciOk,
    /// `readyok`.
    ReadyOk,
    /// `bestmove <move> [ponder <move>]`; `Err` holds the unusable text.
    BestMove(Result<Move, String>),
    /// Anything else (`info`, `option`, `id author`, ...).
    Other,
}

/// `position startpos [moves ...]` for the given position.
#[instrument(skip(position), fields(plies = position.history().len()))]
pub fn position_command(position: &Position) -> String {
    let mut command = String::from("position startpos");
    if !position.history().is_empty() {
        command.push_str(" moves");
        for mv in position.history() {
            command.push(' ');
            command.push_str(&mv.to_string());
        }
    }
    command
}

/// `go movetime <ms>`, never asking for less than a millisecond.
pub fn go_command(budget: Duration) -> String {
    format!("go movetime {}", budget.as_millis().max(1))
}

/// `setoption name <name> value <value>`.
pub fn setoption_command(name: &str, value: &str) -> String {
    format!("setoption name {} value {}", name, value)
}

/// Classifies one line of engine output.
#[instrument]
pub fn parse_line(line: &str) -> EngineLine {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("uciok") => EngineLine::UciOk,
        Some("readyok") => EngineLine::ReadyOk,
        Some("id") => match tokens.next() {
            Some("name") => EngineLine::IdName(tokens.collect::<Vec<_>>().join(" ")),
            _ => EngineLine::Other,
        },
        Some("bestmove") => match tokens.next() {
            Some(text) => EngineLine::BestMove(text.parse::<Move>().map_err(|_| text.to_string())),
            None => EngineLine::BestMove(Err(String::new())),
        },
        _ => EngineLine::Other,
    }
}
