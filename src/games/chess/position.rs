//! Authoritative board state: occupancy, side to move and move history.

use super::{Move, Piece, PieceKind, Side, Square};
use derive_getters::Getters;
use tracing::{instrument, trace};

/// Back-rank layout from the a-file to the h-file.
const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// The position of a game in progress.
///
/// Only the turn coordinator mutates a position, and only through
/// [`Position::apply`]. Legality is the caller's business: `apply` trusts
/// that the rules adapter has already accepted the move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Occupancy indexed by square (a1 = 0).
    board: [Option<Piece>; 64],
    /// Side to move.
    side_to_move: Side,
    /// Moves applied so far, oldest first.
    history: Vec<Move>,
}

impl Position {
    /// Creates the standard initial position.
    #[instrument]
    pub fn new() -> Self {
        let mut board = [None; 64];
        for (file, kind) in BACK_RANK.iter().enumerate() {
            board[file] = Some(Piece::new(*kind, Side::White));
            board[8 + file] = Some(Piece::new(PieceKind::Pawn, Side::White));
            board[48 + file] = Some(Piece::new(PieceKind::Pawn, Side::Black));
            board[56 + file] = Some(Piece::new(*kind, Side::Black));
        }
        Self {
            board,
            side_to_move: Side::White,
            history: Vec::new(),
        }
    }

    /// Returns the piece on a square.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.index() as usize]
    }

    /// Returns the side to move.
    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    /// Returns the applied moves, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Returns the most recently applied move.
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().copied()
    }

    /// Iterates over occupied squares.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }

    /// Returns an owned read-only view for presentation.
    #[instrument(skip(self))]
    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            board: self.board,
            side_to_move: self.side_to_move,
            history_len: self.history.len(),
            last_move: self.last_move(),
        }
    }

    /// Applies a move the rules adapter has accepted.
    ///
    /// Moves the piece, removes whatever it captures (including a pawn taken
    /// en passant), relocates the rook when the king castles, substitutes the
    /// promotion kind, appends to history and flips the side to move.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidApplication`] if the origin square is empty. The
    /// position is left untouched in that case.
    #[instrument(skip(self, mv), fields(mv = %mv, side = %self.side_to_move))]
    pub fn apply(&mut self, mv: Move) -> Result<(), InvalidApplication> {
        let piece = self
            .piece_at(mv.from)
            .ok_or_else(|| InvalidApplication::new(mv, "origin square is empty"))?;

        let is_en_passant = piece.kind == PieceKind::Pawn
            && mv.from.file() != mv.to.file()
            && self.piece_at(mv.to).is_none();
        if is_en_passant {
            // The passed pawn sits beside the origin, on the destination file.
            if let Some(passed) = Square::from_coords(mv.to.file(), mv.from.rank()) {
                trace!(square = %passed, "Removing pawn captured en passant");
                self.set(passed, None);
            }
        }

        let is_castle = piece.kind == PieceKind::King && mv.from.file().abs_diff(mv.to.file()) == 2;
        if is_castle {
            let rank = mv.from.rank();
            let (rook_from, rook_to) = if mv.to.file() > mv.from.file() {
                (Square::from_coords(7, rank), Square::from_coords(5, rank))
            } else {
                (Square::from_coords(0, rank), Square::from_coords(3, rank))
            };
            if let (Some(rook_from), Some(rook_to)) = (rook_from, rook_to) {
                trace!(from = %rook_from, to = %rook_to, "Relocating castling rook");
                let rook = self.piece_at(rook_from);
                self.set(rook_from, None);
                self.set(rook_to, rook);
            }
        }

        let placed = match mv.promotion {
            Some(kind) => Piece::new(kind, piece.side),
            None => piece,
        };
        self.set(mv.from, None);
        self.set(mv.to, Some(placed));
        self.history.push(mv);
        self.side_to_move = self.side_to_move.opponent();
        Ok(())
    }

    fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.board[square.index() as usize] = piece;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.snapshot(), f)
    }
}

/// Owned, read-only view of a position handed to presentation.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PositionSnapshot {
    /// Occupancy indexed by square (a1 = 0).
    board: [Option<Piece>; 64],
    /// Side to move.
    side_to_move: Side,
    /// Number of moves applied so far.
    history_len: usize,
    /// Most recent move, for highlighting.
    last_move: Option<Move>,
}

impl PositionSnapshot {
    /// Returns the piece on a square.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.index() as usize]
    }
}

/// Board diagram with rank 8 at the top, as FEN-style letters.
impl std::fmt::Display for PositionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let symbol = Square::from_coords(file, rank)
                    .and_then(|sq| self.piece_at(sq))
                    .map(Piece::symbol)
                    .unwrap_or('.');
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, "  abcdefgh")
    }
}

/// A move could not be applied to the position.
///
/// Raised only when the caller breaks the contract of [`Position::apply`];
/// the game must be aborted rather than continued.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Invalid application of {}: {} at {}:{}", mv, message, file, line)]
pub struct InvalidApplication {
    /// The move that could not be applied.
    pub mv: Move,
    /// What was wrong.
    pub message: String,
    /// Line number where the error was raised.
    pub line: u32,
    /// Source file where the error was raised.
    pub file: &'static str,
}

impl InvalidApplication {
    /// Creates a new error with caller location tracking.
    #[track_caller]
    pub fn new(mv: Move, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            mv,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl std::error::Error for InvalidApplication {}
