mod description;
pub mod invariants;
mod outcome;
mod position;
mod rules;
mod types;

pub use description::MoveDescription;
pub use outcome::{Conclusion, DrawReason, GameOutcome, TurnState};
pub use position::{InvalidApplication, Position, PositionSnapshot};
pub use rules::{Rules, RulesError, ShakmatyRules};
pub use types::{Move, ParseError, Piece, PieceKind, Side, Square};
