//! Application state and logic.

use crossterm::event::KeyCode;
use strictly_chess::{
    Conclusion, GameEvent, HUMAN_SIDE, Move, PieceKind, Position, PositionSnapshot, Square, TurnState,
};
use tracing::debug;

use super::input::move_cursor;

/// Most log lines kept for the move panel.
const LOG_CAPACITY: usize = 200;

/// A move that needs a promotion piece before it can be proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
}

/// Main application state.
///
/// A mirror of what the coordinator last published plus the selection
/// state of the pointer and keyboard. It never decides legality; it only
/// uses the published legal moves to highlight and to ask for promotions.
pub struct App {
    position: PositionSnapshot,
    state: TurnState,
    legal_moves: Vec<Move>,
    conclusion: Option<Conclusion>,
    cursor: Square,
    selected: Option<Square>,
    drag_origin: Option<Square>,
    promotion: Option<PendingPromotion>,
    pending: bool,
    status_message: String,
    log: Vec<String>,
    engine_name: String,
}

impl App {
    /// Creates a new application.
    pub fn new(engine_name: impl Into<String>) -> Self {
        Self {
            position: Position::new().snapshot(),
            state: TurnState::AwaitingHumanMove,
            legal_moves: Vec::new(),
            conclusion: None,
            cursor: Square::from_coords(4, 1).unwrap_or_default(),
            selected: None,
            drag_origin: None,
            promotion: None,
            pending: true,
            status_message: "Waiting for game to start...".to_string(),
            log: Vec::new(),
            engine_name: engine_name.into(),
        }
    }

    /// Gets the last published position.
    pub fn position(&self) -> &PositionSnapshot {
        &self.position
    }

    /// Gets the turn state.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Gets the keyboard cursor.
    pub fn cursor(&self) -> Square {
        self.cursor
    }

    /// Gets the selected origin square.
    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Gets the current status message.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Gets the move log, oldest first.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Gets the engine's display name.
    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    /// Gets why the game ended, if it has.
    pub fn conclusion(&self) -> Option<&Conclusion> {
        self.conclusion.as_ref()
    }

    /// Gets the move awaiting a promotion choice.
    pub fn promotion(&self) -> Option<PendingPromotion> {
        self.promotion
    }

    /// True when the human may act.
    pub fn accepts_input(&self) -> bool {
        self.state == TurnState::AwaitingHumanMove && !self.pending
    }

    /// True while the session may be blocked on the engine: it is thinking,
    /// or a command was sent and not yet answered.
    pub fn session_busy(&self) -> bool {
        self.state == TurnState::AwaitingOracleMove || self.pending
    }

    /// Destinations of the selected origin.
    pub fn legal_destinations(&self) -> Vec<Square> {
        let Some(origin) = self.selected else {
            return Vec::new();
        };
        let mut destinations: Vec<Square> = self
            .legal_moves
            .iter()
            .filter(|mv| mv.from == origin)
            .map(|mv| mv.to)
            .collect();
        destinations.dedup();
        destinations
    }

    /// Handles an event from the coordinator.
    pub fn handle_event(&mut self, event: GameEvent) {
        debug!(?event, "Handling game event");

        match event {
            GameEvent::StateChanged {
                state,
                position,
                legal_moves,
                conclusion,
            } => {
                if *position.history_len() == 0 && *self.position.history_len() > 0 {
                    self.log.clear();
                }
                self.position = position;
                self.state = state;
                self.legal_moves = legal_moves;
                self.pending = false;
                self.status_message = match (&conclusion, state) {
                    (Some(conclusion), _) => {
                        format!("{}. Press 'r' for a new game or 'q' to quit.", conclusion)
                    }
                    (None, TurnState::AwaitingOracleMove) => {
                        format!("{} is thinking...", self.engine_name)
                    }
                    (None, _) => format!("{}. Select a piece to move.", state),
                };
                self.conclusion = conclusion;
                if self.state != TurnState::AwaitingHumanMove {
                    self.clear_selection();
                }
            }
            GameEvent::MoveRejected { proposal, reason } => {
                self.pending = false;
                self.status_message = format!("{} ({})", reason, proposal);
                self.clear_selection();
            }
            GameEvent::MoveMade { description, .. } => {
                self.log.push(description.to_string());
                if self.log.len() > LOG_CAPACITY {
                    self.log.remove(0);
                }
            }
        }
    }

    /// Moves the keyboard cursor.
    pub fn move_cursor(&mut self, key: KeyCode) {
        self.cursor = move_cursor(self.cursor, key);
    }

    /// Handles Enter/Space on the cursor square.
    pub fn activate_cursor(&mut self) -> Option<Move> {
        self.click(self.cursor)
    }

    /// Handles a click (or keyboard activation) on a square.
    ///
    /// The first click on one of the human's pieces selects it; the second
    /// click on another square proposes the move. Clicking the selected
    /// square again deselects it.
    pub fn click(&mut self, square: Square) -> Option<Move> {
        if !self.accepts_input() || self.promotion.is_some() {
            return None;
        }
        self.cursor = square;

        match self.selected {
            Some(origin) if origin == square => {
                self.selected = None;
                None
            }
            Some(_) if self.owns(square) => {
                self.selected = Some(square);
                None
            }
            Some(origin) => self.attempt(origin, square),
            None => {
                if self.owns(square) {
                    self.selected = Some(square);
                }
                None
            }
        }
    }

    /// Mouse button pressed on a square.
    pub fn press(&mut self, square: Square) -> Option<Move> {
        if !self.accepts_input() || self.promotion.is_some() {
            return None;
        }
        self.cursor = square;

        if self.owns(square) {
            self.selected = Some(square);
            self.drag_origin = Some(square);
            None
        } else if let Some(origin) = self.selected {
            self.attempt(origin, square)
        } else {
            None
        }
    }

    /// Mouse button released, over `square` if it is on the board.
    ///
    /// Releasing on the origin keeps the selection so a second click can
    /// finish the move.
    pub fn release(&mut self, square: Option<Square>) -> Option<Move> {
        let origin = self.drag_origin.take()?;
        match square {
            Some(target) if target != origin => {
                self.cursor = target;
                self.attempt(origin, target)
            }
            _ => None,
        }
    }

    /// Resolves a pending promotion with the chosen kind.
    pub fn choose_promotion(&mut self, kind: PieceKind) -> Option<Move> {
        if !kind.is_promotion_target() {
            return None;
        }
        let pending = self.promotion.take()?;
        self.propose(Move::with_promotion(pending.from, pending.to, kind))
    }

    /// Drops the selection and any pending promotion.
    pub fn cancel(&mut self) {
        if self.promotion.is_some() {
            self.status_message = format!("{}. Select a piece to move.", self.state);
        }
        self.clear_selection();
    }

    /// Marks a new game as requested.
    pub fn request_new_game(&mut self) {
        self.clear_selection();
        self.pending = true;
        self.status_message = "Starting a new game...".to_string();
    }

    /// Builds the move for `origin -> target`, asking for a promotion kind
    /// when several moves share those squares.
    fn attempt(&mut self, origin: Square, target: Square) -> Option<Move> {
        let candidates: Vec<Move> = self
            .legal_moves
            .iter()
            .filter(|mv| mv.same_squares(&Move::new(origin, target)))
            .copied()
            .collect();

        match candidates.as_slice() {
            [single] => self.propose(*single),
            [] => self.propose(Move::new(origin, target)),
            _ => {
                self.promotion = Some(PendingPromotion {
                    from: origin,
                    to: target,
                });
                self.status_message = "Promote to: (q)ueen, (r)ook, (b)ishop or k(n)ight".to_string();
                None
            }
        }
    }

    fn propose(&mut self, mv: Move) -> Option<Move> {
        debug!(mv = %mv, "Proposing move");
        self.clear_selection();
        self.pending = true;
        Some(mv)
    }

    fn owns(&self, square: Square) -> bool {
        matches!(self.position.piece_at(square), Some(piece) if piece.side == HUMAN_SIDE)
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.drag_origin = None;
        self.promotion = None;
    }
}
