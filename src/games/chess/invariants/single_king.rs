//! Single king invariant: each side has exactly one king.

use super::super::{PieceKind, Position, Side};
use super::Invariant;
use strum::IntoEnumIterator;

/// Invariant: exactly one king per side.
pub struct SingleKingInvariant;

impl Invariant<Position> for SingleKingInvariant {
    fn holds(position: &Position) -> bool {
        let kings = |side: Side| {
            position
                .pieces()
                .filter(|(_, piece)| piece.kind == PieceKind::King && piece.side == side)
                .count()
        };
        Side::iter().all(|side| kings(side) == 1)
    }

    fn description() -> &'static str {
        "Each side has exactly one king"
    }
}
