//! Turn coordination between the human and the decision oracle.

use crate::games::chess::invariants::{ChessInvariants, InvariantSet};
use crate::games::chess::{
    Conclusion, GameOutcome, Move, MoveDescription, Position, PositionSnapshot, Rules, ShakmatyRules,
    Side, Square, TurnState,
};
use crate::oracle::{Oracle, OracleError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// The side the human plays.
pub const HUMAN_SIDE: Side = Side::White;

/// Messages sent from the coordinator to the presentation layer.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// The position or turn state changed.
    StateChanged {
        /// Turn state after the change.
        state: TurnState,
        /// Position after the change.
        position: PositionSnapshot,
        /// Legal moves for the side to move, empty once the game is over.
        legal_moves: Vec<Move>,
        /// Why the game ended, once it has.
        conclusion: Option<Conclusion>,
    },
    /// A human proposal was refused. Nothing changed.
    MoveRejected {
        /// The refused move.
        proposal: Move,
        /// Why it was refused.
        reason: TurnError,
    },
    /// A move was applied.
    MoveMade {
        /// Side that moved.
        side: Side,
        /// The move.
        mv: Move,
        /// What the move did.
        description: MoveDescription,
    },
}

/// A proposal the coordinator refused.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TurnError {
    /// The move is not legal in the current position.
    #[display("Illegal move: {}", _0)]
    IllegalHumanMove(Move),

    /// The game has ended; start a new one.
    #[display("The game is over")]
    GameAlreadyOver,

    /// The oracle is still to move.
    ///
    /// Only seen after a `propose_move` future was dropped while the oracle
    /// was thinking, which leaves the coordinator mid-turn. Start a new game
    /// to recover.
    #[display("Not your turn")]
    NotHumanTurn,
}

impl std::error::Error for TurnError {}

/// What happened during one accepted human turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// The human's move, as applied.
    pub human_move: Move,
    /// The oracle's reply, if one was requested and applied.
    pub reply: Option<Move>,
    /// Turn state after the turn.
    pub state: TurnState,
    /// Why the game ended, if it did.
    pub conclusion: Option<Conclusion>,
}

/// Owns the authoritative position and sequences turns.
///
/// The coordinator is driven through `&mut self`, so one transition always
/// completes before the next proposal is looked at.
pub struct TurnCoordinator<R: Rules = ShakmatyRules> {
    position: Position,
    state: TurnState,
    conclusion: Option<Conclusion>,
    rules: R,
    oracle: Box<dyn Oracle>,
    move_time: Duration,
    event_tx: Option<mpsc::UnboundedSender<GameEvent>>,
}

impl TurnCoordinator<ShakmatyRules> {
    /// Creates a coordinator using the `shakmaty` rules adapter.
    pub fn new(oracle: Box<dyn Oracle>, move_time: Duration) -> Self {
        Self::with_rules(ShakmatyRules::new(), oracle, move_time)
    }
}

impl<R: Rules> TurnCoordinator<R> {
    /// Creates a coordinator with a custom rules adapter.
    #[instrument(skip(rules, oracle), fields(oracle = %oracle.name()))]
    pub fn with_rules(rules: R, oracle: Box<dyn Oracle>, move_time: Duration) -> Self {
        info!(?move_time, "Creating turn coordinator");
        Self {
            position: Position::new(),
            state: TurnState::AwaitingHumanMove,
            conclusion: None,
            rules,
            oracle,
            move_time,
            event_tx: None,
        }
    }

    /// Sends every event to `event_tx` from now on.
    pub fn with_events(mut self, event_tx: mpsc::UnboundedSender<GameEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Returns the authoritative position.
    pub fn current_position(&self) -> &Position {
        &self.position
    }

    /// Returns the turn state.
    pub fn current_state(&self) -> TurnState {
        self.state
    }

    /// Returns why the game ended, if it has.
    pub fn conclusion(&self) -> Option<&Conclusion> {
        self.conclusion.as_ref()
    }

    /// Returns the rules outcome of the game, if the rules ended it.
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.conclusion.as_ref().and_then(Conclusion::outcome)
    }

    /// Returns the oracle's display name.
    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Legal moves for the side to move, or none once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        match self.state {
            TurnState::GameOver => Vec::new(),
            _ => self.rules.legal_moves(&self.position),
        }
    }

    /// Legal destinations from `origin` for the human.
    pub fn legal_destinations(&self, origin: Square) -> Vec<Square> {
        match self.state {
            TurnState::AwaitingHumanMove => self.rules.legal_destinations(&self.position, origin),
            _ => Vec::new(),
        }
    }

    /// Handles a human proposal, then lets the oracle reply.
    ///
    /// An accepted move is applied before the oracle is asked anything, so
    /// an oracle failure leaves the human's move on the board and ends the
    /// game with [`Conclusion::OracleFailure`].
    ///
    /// # Errors
    ///
    /// Returns a [`TurnError`] if the proposal is refused. Refusals never
    /// change the position or the turn state.
    #[instrument(skip(self, proposal), fields(proposal = %proposal, state = %self.state))]
    pub async fn propose_move(&mut self, proposal: Move) -> Result<TurnReport, TurnError> {
        match self.state {
            TurnState::GameOver => return Err(self.reject(proposal, TurnError::GameAlreadyOver)),
            TurnState::AwaitingOracleMove => return Err(self.reject(proposal, TurnError::NotHumanTurn)),
            TurnState::AwaitingHumanMove => {}
        }

        if !self.rules.is_legal(&self.position, proposal) {
            return Err(self.reject(proposal, TurnError::IllegalHumanMove(proposal)));
        }

        info!("Human move accepted");
        let mut report = TurnReport {
            human_move: proposal,
            reply: None,
            state: self.state,
            conclusion: None,
        };

        if self.commit(proposal) {
            self.state = TurnState::AwaitingOracleMove;
            self.notify_state();
            if let Some(reply) = self.oracle_turn().await {
                report.reply = Some(reply);
            }
        }

        report.state = self.state;
        report.conclusion = self.conclusion.clone();
        Ok(report)
    }

    /// Abandons the current game and starts from the initial position.
    ///
    /// # Errors
    ///
    /// Returns the oracle's error if it cannot prepare for a new game. The
    /// board is reset either way, but the game is immediately over.
    #[instrument(skip(self))]
    pub async fn new_game(&mut self) -> Result<(), OracleError> {
        info!("Starting new game");
        self.position = Position::new();
        self.conclusion = None;
        self.state = TurnState::AwaitingHumanMove;

        let prepared = self.oracle.new_game().await;
        if let Err(e) = &prepared {
            warn!(error = %e, "Oracle could not start a new game");
            self.conclude(Conclusion::OracleFailure(e.clone()));
        }
        self.notify_state();
        prepared
    }

    /// Publishes the current state, e.g. for a freshly attached UI.
    pub fn announce(&self) {
        self.notify_state();
    }

    /// Shuts the oracle down.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self) {
        self.oracle.shutdown().await;
    }

    /// Requests, validates and applies the oracle's move.
    async fn oracle_turn(&mut self) -> Option<Move> {
        debug!(oracle = %self.oracle.name(), "Requesting oracle move");
        let reply = match self.oracle.request_move(&self.position, self.move_time).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Oracle request failed");
                self.conclude(Conclusion::OracleFailure(e));
                self.notify_state();
                return None;
            }
        };

        if !self.rules.is_legal(&self.position, reply) {
            warn!(reply = %reply, "Oracle replied with an illegal move");
            self.conclude(Conclusion::OracleFailure(OracleError::IllegalReply(reply.to_string())));
            self.notify_state();
            return None;
        }

        info!(reply = %reply, "Oracle move accepted");
        if self.commit(reply) {
            self.state = TurnState::AwaitingHumanMove;
            self.notify_state();
        }
        Some(reply)
    }

    /// Applies a legal move and settles the outcome.
    ///
    /// Returns true if play continues. On false the game is over and the
    /// state change has been published.
    fn commit(&mut self, mv: Move) -> bool {
        let side = self.position.side_to_move();
        let description = MoveDescription::describe(&self.position, mv);

        if let Err(e) = self.position.apply(mv) {
            warn!(error = %e, "Failed to apply a legal move");
            self.conclude(Conclusion::Aborted(e.to_string()));
            self.notify_state();
            return false;
        }

        if let Err(violations) = ChessInvariants::check_all(&self.position) {
            let detail = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%detail, "Position invariants violated");
            self.conclude(Conclusion::Aborted(format!("invariant violated: {}", detail)));
            self.notify_state();
            return false;
        }

        info!(%description, "Move applied");
        self.notify(GameEvent::MoveMade { side, mv, description });

        match self.rules.outcome(&self.position) {
            Ok(GameOutcome::InProgress) => true,
            Ok(outcome) => {
                self.conclude(Conclusion::Decided(outcome));
                self.notify_state();
                false
            }
            Err(e) => {
                warn!(error = %e, "Rules adapter rejected the position");
                self.conclude(Conclusion::Aborted(e.to_string()));
                self.notify_state();
                false
            }
        }
    }

    fn conclude(&mut self, conclusion: Conclusion) {
        info!(%conclusion, "Game over");
        self.state = TurnState::GameOver;
        self.conclusion = Some(conclusion);
    }

    fn reject(&self, proposal: Move, reason: TurnError) -> TurnError {
        warn!(%reason, "Proposal rejected");
        self.notify(GameEvent::MoveRejected {
            proposal,
            reason: reason.clone(),
        });
        reason
    }

    fn notify_state(&self) {
        self.notify(GameEvent::StateChanged {
            state: self.state,
            position: self.position.snapshot(),
            legal_moves: self.legal_moves(),
            conclusion: self.conclusion.clone(),
        });
    }

    fn notify(&self, event: GameEvent) {
        if let Some(tx) = &self.event_tx {
            if tx.send(event).is_err() {
                debug!("Event receiver dropped");
            }
        }
    }
}
