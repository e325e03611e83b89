//! Outcome and turn-state types.
//!
//! `GameOutcome` is what the rules say about a position. `Conclusion` is why
//! a game stopped, which also covers the integration faults that end a game
//! without any rules verdict.

use super::Side;
use crate::oracle::OracleError;

/// Why a drawn position is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DrawReason {
    /// Neither side can possibly deliver mate.
    #[display("insufficient material")]
    InsufficientMaterial,
    /// 75 moves by each side without a capture or pawn move.
    #[display("75-move rule")]
    SeventyFiveMoveRule,
    /// Same position occurred five times.
    #[display("fivefold repetition")]
    FivefoldRepetition,
}

/// Classification of a position by the rules adapter.
///
/// Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOutcome {
    /// Play continues.
    InProgress,
    /// Side to move is mated.
    Checkmate {
        /// The side that delivered mate.
        winner: Side,
    },
    /// Side to move has no legal move and is not in check.
    Stalemate,
    /// Drawn for the given reason.
    Draw(DrawReason),
}

impl GameOutcome {
    /// Returns true for every outcome except `InProgress`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameOutcome::InProgress)
    }

    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Side> {
        match self {
            GameOutcome::Checkmate { winner } => Some(*winner),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOutcome::InProgress => write!(f, "In progress"),
            GameOutcome::Checkmate { winner } => write!(f, "Checkmate! {} wins", winner),
            GameOutcome::Stalemate => write!(f, "Stalemate!"),
            GameOutcome::Draw(reason) => write!(f, "Draw by {}", reason),
        }
    }
}

/// Which input the coordinator accepts next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TurnState {
    /// Waiting for the human to propose a move.
    #[display("Your move")]
    AwaitingHumanMove,
    /// The oracle is computing its reply.
    #[display("Engine thinking")]
    AwaitingOracleMove,
    /// No further moves are accepted.
    #[display("Game over")]
    GameOver,
}

/// Why a game reached `TurnState::GameOver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conclusion {
    /// The rules ended the game (mate, stalemate or draw).
    Decided(GameOutcome),
    /// The oracle failed; the game cannot continue without it.
    OracleFailure(OracleError),
    /// An internal consistency fault aborted the game.
    Aborted(String),
}

impl Conclusion {
    /// Rules outcome, if the game ended by the rules.
    pub fn outcome(&self) -> Option<GameOutcome> {
        match self {
            Conclusion::Decided(outcome) => Some(*outcome),
            _ => None,
        }
    }

    /// Returns true if the game ended because of the oracle.
    pub fn is_oracle_failure(&self) -> bool {
        matches!(self, Conclusion::OracleFailure(_))
    }
}

impl std::fmt::Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conclusion::Decided(outcome) => write!(f, "Game Over - {}", outcome),
            Conclusion::OracleFailure(err) => write!(f, "Game Over - engine failure: {}", err),
            Conclusion::Aborted(detail) => write!(f, "Game aborted: {}", detail),
        }
    }
}
