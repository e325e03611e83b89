//! Pawn placement invariant: no pawn stands on the first or eighth rank.

use super::super::{PieceKind, Position, Side};
use super::Invariant;

/// Invariant: pawns never rest on a back rank.
///
/// A pawn reaching the last rank must have been promoted.
pub struct PawnPlacementInvariant;

impl Invariant<Position> for PawnPlacementInvariant {
    fn holds(position: &Position) -> bool {
        position
            .pieces()
            .filter(|(_, piece)| piece.kind == PieceKind::Pawn)
            .all(|(square, _)| square.rank() != Side::White.home_rank() && square.rank() != Side::Black.home_rank())
    }

    fn description() -> &'static str {
        "No pawn on the first or eighth rank"
    }
}
