//! Human-readable move descriptions for logs and the move list.

use super::{Move, PieceKind, Position, Side, Square};
use tracing::instrument;

/// What a move did, described against the position it was played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveDescription {
    /// Side that moved.
    pub side: Side,
    /// Kind of the moving piece, if the origin was occupied.
    pub piece: Option<PieceKind>,
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Kind of the captured piece, if any.
    pub captured: Option<PieceKind>,
    /// Promotion kind, if any.
    pub promotion: Option<PieceKind>,
}

impl MoveDescription {
    /// Describes `mv` as played in `before`.
    ///
    /// Must be called before the move is applied.
    #[instrument(skip(before), fields(mv = %mv))]
    pub fn describe(before: &Position, mv: Move) -> Self {
        let mover = before.piece_at(mv.from);
        let target = before.piece_at(mv.to);

        let en_passant = matches!(mover, Some(p) if p.kind == PieceKind::Pawn)
            && target.is_none()
            && mv.from.file() != mv.to.file();
        let captured = match target {
            Some(piece) => Some(piece.kind),
            None if en_passant => Some(PieceKind::Pawn),
            None => None,
        };

        Self {
            side: mover.map(|p| p.side).unwrap_or_else(|| before.side_to_move()),
            piece: mover.map(|p| p.kind),
            from: mv.from,
            to: mv.to,
            captured,
            promotion: mv.promotion,
        }
    }
}

impl std::fmt::Display for MoveDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.piece {
            Some(kind) => write!(
                f,
                "{} moved {} from {} to {}",
                self.side,
                kind.letter(),
                self.from,
                self.to
            )?,
            None => write!(f, "{} moved from {} to {}", self.side, self.from, self.to)?,
        }
        if let Some(captured) = self.captured {
            write!(f, " and captured {}", captured.letter())?;
        }
        if let Some(promotion) = self.promotion {
            write!(f, " and promoted to {}", promotion.letter())?;
        }
        Ok(())
    }
}
