//! Bridge to the rules engine.
//!
//! The crate never implements chess movement rules itself. Legality,
//! terminal detection and draw bookkeeping all come from `shakmaty`, reached
//! through the [`Rules`] trait so the coordinator can be driven by any
//! rules provider.

use super::{DrawReason, GameOutcome, Move, PieceKind, Position, Side, Square};
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position as ShakmatyPosition, Role};
use tracing::{debug, instrument, trace, warn};

/// Half-moves without capture or pawn move that end the game.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of one position that end the game.
const FIVEFOLD: usize = 5;

/// Legality and terminal-state oracle for positions.
///
/// Implementations hold no per-game state; every answer is a function of the
/// position passed in.
pub trait Rules: Send + Sync {
    /// True iff `mv` is legal for the side to move.
    fn is_legal(&self, position: &Position, mv: Move) -> bool;

    /// Classifies the position.
    ///
    /// Checkmate takes precedence over stalemate, which takes precedence over
    /// insufficient material, the 75-move rule and fivefold repetition, in
    /// that order.
    fn outcome(&self, position: &Position) -> Result<GameOutcome, RulesError>;

    /// All legal moves for the side to move.
    fn legal_moves(&self, position: &Position) -> Vec<Move>;

    /// Destinations reachable from `origin`, for highlighting drop targets.
    fn legal_destinations(&self, position: &Position, origin: Square) -> Vec<Square> {
        let mut destinations: Vec<Square> = self
            .legal_moves(position)
            .into_iter()
            .filter(|mv| mv.from == origin)
            .map(|mv| mv.to)
            .collect();
        destinations.sort();
        destinations.dedup();
        destinations
    }
}

/// [`Rules`] backed by the `shakmaty` crate.
///
/// Each query replays the position's history from the standard starting
/// position, which also yields the repetition and 75-move bookkeeping the
/// outcome needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

impl ShakmatyRules {
    /// Creates the adapter.
    pub fn new() -> Self {
        Self
    }

    /// Replays history, returning the engine position and how often the
    /// final position has occurred.
    #[instrument(skip(self, position), fields(plies = position.history().len()))]
    fn replay(&self, position: &Position) -> Result<Replay, RulesError> {
        let mut chess = Chess::default();
        let mut seen: Vec<Zobrist64> = Vec::with_capacity(position.history().len() + 1);
        seen.push(chess.zobrist_hash(EnPassantMode::Legal));

        for (ply, mv) in position.history().iter().enumerate() {
            let legal = to_uci(*mv)
                .to_move(&chess)
                .map_err(|_| RulesError::CorruptHistory { ply, mv: *mv })?;
            chess.play_unchecked(&legal);
            seen.push(chess.zobrist_hash(EnPassantMode::Legal));
        }

        let current = seen[seen.len() - 1];
        let occurrences = seen.iter().filter(|hash| **hash == current).count();
        trace!(occurrences, "History replayed");
        Ok(Replay { chess, occurrences })
    }
}

struct Replay {
    chess: Chess,
    occurrences: usize,
}

impl Rules for ShakmatyRules {
    #[instrument(skip(self, position), fields(mv = %mv))]
    fn is_legal(&self, position: &Position, mv: Move) -> bool {
        match self.replay(position) {
            Ok(replay) => to_uci(mv).to_move(&replay.chess).is_ok(),
            Err(e) => {
                warn!(error = %e, "Cannot judge legality against an unreplayable history");
                false
            }
        }
    }

    #[instrument(skip(self, position))]
    fn outcome(&self, position: &Position) -> Result<GameOutcome, RulesError> {
        let Replay { chess, occurrences } = self.replay(position)?;
        verify_agreement(position, &chess)?;

        let outcome = classify(&chess, occurrences);
        debug!(%outcome, "Position classified");
        Ok(outcome)
    }

    #[instrument(skip(self, position))]
    fn legal_moves(&self, position: &Position) -> Vec<Move> {
        let chess = match self.replay(position) {
            Ok(replay) => replay.chess,
            Err(e) => {
                warn!(error = %e, "Cannot list moves for an unreplayable history");
                return Vec::new();
            }
        };

        let mut moves: Vec<Move> = chess
            .legal_moves()
            .iter()
            .filter_map(|m| from_uci(&m.to_uci(CastlingMode::Standard)))
            .collect();
        moves.sort();
        moves
    }
}

/// Terminal classification of a replayed position, first match wins.
fn classify(chess: &Chess, occurrences: usize) -> GameOutcome {
    if chess.is_checkmate() {
        GameOutcome::Checkmate {
            winner: from_color(chess.turn()).opponent(),
        }
    } else if chess.is_stalemate() {
        GameOutcome::Stalemate
    } else if chess.is_insufficient_material() {
        GameOutcome::Draw(DrawReason::InsufficientMaterial)
    } else if chess.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES {
        GameOutcome::Draw(DrawReason::SeventyFiveMoveRule)
    } else if occurrences >= FIVEFOLD {
        GameOutcome::Draw(DrawReason::FivefoldRepetition)
    } else {
        GameOutcome::InProgress
    }
}

/// Checks that the occupancy model agrees with the rules engine.
fn verify_agreement(position: &Position, chess: &Chess) -> Result<(), RulesError> {
    if from_color(chess.turn()) != position.side_to_move() {
        return Err(RulesError::Desync {
            detail: format!(
                "side to move is {} but the rules engine has {}",
                position.side_to_move(),
                from_color(chess.turn())
            ),
        });
    }

    for square in Square::all() {
        let ours = position.piece_at(square);
        let theirs = chess
            .board()
            .piece_at(to_shakmaty_square(square))
            .map(|piece| (from_role(piece.role), from_color(piece.color)));
        if ours.map(|piece| (piece.kind, piece.side)) != theirs {
            return Err(RulesError::Desync {
                detail: format!("occupancy of {} differs from the rules engine", square),
            });
        }
    }

    Ok(())
}

fn to_uci(mv: Move) -> UciMove {
    UciMove::Normal {
        from: to_shakmaty_square(mv.from),
        to: to_shakmaty_square(mv.to),
        promotion: mv.promotion.map(to_role),
    }
}

fn from_uci(uci: &UciMove) -> Option<Move> {
    match uci {
        UciMove::Normal {
            from,
            to,
            promotion,
        } => Some(Move {
            from: from_shakmaty_square(*from)?,
            to: from_shakmaty_square(*to)?,
            promotion: promotion.map(from_role),
        }),
        _ => None,
    }
}

fn to_shakmaty_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::new(u32::from(square.index()))
}

fn from_shakmaty_square(square: shakmaty::Square) -> Option<Square> {
    Square::new(square as u8)
}

fn to_role(kind: PieceKind) -> Role {
    match kind {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}

fn from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

fn from_color(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

/// The rules engine could not make sense of a position.
///
/// Both variants mean the position was corrupted by a caller; the game
/// must be aborted.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RulesError {
    /// A move in history is not legal where it was played.
    #[display("History move {} at ply {} is not legal", mv, ply)]
    CorruptHistory {
        /// Zero-based index into the history.
        ply: usize,
        /// The offending move.
        mv: Move,
    },

    /// The occupancy model and the rules engine disagree.
    #[display("Position out of sync with rules engine: {}", detail)]
    Desync {
        /// What differs.
        detail: String,
    },
}

impl std::error::Error for RulesError {}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;

    fn setup(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap()
    }

    #[test]
    fn test_mate_beats_expired_move_counter() {
        // Back-rank mate delivered on the 150th quiet half-move.
        let chess = setup("R5k1/5ppp/8/8/8/8/8/6K1 b - - 150 120");
        assert_eq!(
            classify(&chess, FIVEFOLD),
            GameOutcome::Checkmate { winner: Side::White }
        );
    }

    #[test]
    fn test_stalemate_beats_draw_rules() {
        let chess = setup("7k/5Q2/6K1/8/8/8/8/8 b - - 150 120");
        assert_eq!(classify(&chess, FIVEFOLD), GameOutcome::Stalemate);

        // King and bishop against king is also insufficient material.
        let bare = setup("k7/2K5/1B6/8/8/8/8/8 b - - 0 60");
        assert_eq!(classify(&bare, 1), GameOutcome::Stalemate);
    }

    #[test]
    fn test_insufficient_material_beats_counters() {
        let chess = setup("8/8/4k3/8/8/4K3/8/8 w - - 150 120");
        assert_eq!(
            classify(&chess, FIVEFOLD),
            GameOutcome::Draw(DrawReason::InsufficientMaterial)
        );
    }

    #[test]
    fn test_seventy_five_moves_beats_repetition() {
        let expired = setup("4k3/8/8/8/8/8/8/R3K3 w - - 150 120");
        assert_eq!(
            classify(&expired, FIVEFOLD),
            GameOutcome::Draw(DrawReason::SeventyFiveMoveRule)
        );

        let running = setup("4k3/8/8/8/8/8/8/R3K3 w - - 149 120");
        assert_eq!(classify(&running, FIVEFOLD - 1), GameOutcome::InProgress);
        assert_eq!(
            classify(&running, FIVEFOLD),
            GameOutcome::Draw(DrawReason::FivefoldRepetition)
        );
    }

    #[test]
    fn test_square_conversion_round_trips() {
        for square in Square::all() {
            assert_eq!(from_shakmaty_square(to_shakmaty_square(square)), Some(square));
        }
    }

    #[test]
    fn test_castling_reported_as_king_move() {
        let mut position = Position::new();
        for m in ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"] {
            position.apply(m.parse().unwrap()).unwrap();
        }
        let moves = ShakmatyRules::new().legal_moves(&position);
        assert!(moves.contains(&"e1g1".parse().unwrap()));
    }
}
