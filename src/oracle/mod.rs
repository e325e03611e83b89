//! Decision oracle trait and implementations.

mod first_legal;
pub mod protocol;
mod uci;

pub use first_legal::FirstLegalOracle;
pub use uci::UciOracle;

use crate::games::chess::{Move, Position};
use std::time::Duration;

/// Something that picks the automated side's move.
///
/// One call is one request: implementations never retry, and never
/// substitute a move of their own when the underlying source fails.
#[async_trait::async_trait]
pub trait Oracle: Send {
    /// Asks for a move in `position`, thinking for at most `budget`.
    ///
    /// The reply is a proposal; the caller validates it before use.
    async fn request_move(&mut self, position: &Position, budget: Duration) -> Result<Move, OracleError>;

    /// Prepares for a fresh game.
    async fn new_game(&mut self) -> Result<(), OracleError> {
        Ok(())
    }

    /// Releases the oracle's resources. Must not block indefinitely.
    async fn shutdown(&mut self) {}

    /// Returns the oracle's display name.
    fn name(&self) -> &str;
}

/// Ways a request to the oracle can fail.
///
/// All of them end the current game.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum OracleError {
    /// Process not running, handshake failed or pipe closed.
    #[display("Oracle unavailable: {}", _0)]
    Unavailable(String),

    /// No reply within the time budget plus grace.
    #[display("Oracle did not reply within {:?}", _0)]
    Timeout(Duration),

    /// The reply was not a usable move.
    #[display("Oracle replied with an illegal move: {}", _0)]
    IllegalReply(String),
}

impl std::error::Error for OracleError {}
