//! Tests for the turn coordinator with scripted oracles.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use strictly_chess::{
    Conclusion, FirstLegalOracle, GameEvent, GameOutcome, Move, Oracle, OracleError, Position, Rules,
    RulesError, Side, TurnCoordinator, TurnError, TurnState,
};
use tokio::sync::mpsc;

/// Oracle that replays a fixed list of answers.
struct ScriptedOracle {
    replies: VecDeque<Result<Move, OracleError>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedOracle {
    fn new(replies: Vec<Result<Move, OracleError>>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let oracle = Self {
            replies: replies.into(),
            calls: Arc::clone(&calls),
        };
        (oracle, calls)
    }

    fn moves(moves: &[&str]) -> (Self, Arc<AtomicUsize>) {
        Self::new(moves.iter().map(|m| Ok(mv(m))).collect())
    }
}

#[async_trait::async_trait]
impl Oracle for ScriptedOracle {
    async fn request_move(&mut self, _position: &Position, _budget: Duration) -> Result<Move, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".to_string())))
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

/// Rules that accept every move and report a fixed outcome.
struct PermissiveRules {
    outcome: Result<GameOutcome, RulesError>,
}

impl PermissiveRules {
    fn in_progress() -> Self {
        Self {
            outcome: Ok(GameOutcome::InProgress),
        }
    }
}

impl Rules for PermissiveRules {
    fn is_legal(&self, _position: &Position, _mv: Move) -> bool {
        true
    }

    fn outcome(&self, _position: &Position) -> Result<GameOutcome, RulesError> {
        self.outcome.clone()
    }

    fn legal_moves(&self, _position: &Position) -> Vec<Move> {
        Vec::new()
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn mv(text: &str) -> Move {
    text.parse().unwrap()
}

fn coordinator(oracle: ScriptedOracle) -> TurnCoordinator {
    TurnCoordinator::new(Box::new(oracle), Duration::from_millis(100))
}

#[tokio::test]
async fn test_opening_move_accepted_and_oracle_replies() {
    let (oracle, calls) = ScriptedOracle::moves(&["e7e5"]);
    let mut game = coordinator(oracle);

    let report = game.propose_move(mv("e2e4")).await.unwrap();

    assert_eq!(report.human_move, mv("e2e4"));
    assert_eq!(report.reply, Some(mv("e7e5")));
    assert_eq!(report.state, TurnState::AwaitingHumanMove);
    assert_eq!(report.conclusion, None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(game.current_position().history(), &[mv("e2e4"), mv("e7e5")]);
    assert_eq!(game.current_position().side_to_move(), Side::White);
}

#[tokio::test]
async fn test_empty_origin_rejected_without_change() {
    let (oracle, calls) = ScriptedOracle::moves(&["e7e5"]);
    let mut game = coordinator(oracle);

    let result = game.propose_move(mv("e3e4")).await;

    assert_eq!(result, Err(TurnError::IllegalHumanMove(mv("e3e4"))));
    assert_eq!(game.current_position(), &Position::new());
    assert_eq!(game.current_state(), TurnState::AwaitingHumanMove);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejection_is_idempotent() {
    let (oracle, calls) = ScriptedOracle::moves(&[]);
    let mut game = coordinator(oracle);

    let first = game.propose_move(mv("e2e5")).await;
    let after_first = game.current_position().clone();
    let second = game.propose_move(mv("e2e5")).await;

    assert_eq!(first, second);
    assert_eq!(game.current_position(), &after_first);
    assert_eq!(game.current_state(), TurnState::AwaitingHumanMove);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_black_piece_cannot_be_moved_by_human() {
    let (oracle, _calls) = ScriptedOracle::moves(&[]);
    let mut game = coordinator(oracle);

    let result = game.propose_move(mv("e7e5")).await;
    assert_eq!(result, Err(TurnError::IllegalHumanMove(mv("e7e5"))));
}

#[tokio::test]
async fn test_oracle_timeout_ends_game_with_position_unchanged() {
    let budget = Duration::from_millis(300);
    let (oracle, calls) = ScriptedOracle::new(vec![Err(OracleError::Timeout(budget))]);
    let mut game = coordinator(oracle);

    let report = game.propose_move(mv("e2e4")).await.unwrap();

    assert_eq!(report.reply, None);
    assert_eq!(report.state, TurnState::GameOver);
    assert_eq!(
        report.conclusion,
        Some(Conclusion::OracleFailure(OracleError::Timeout(budget)))
    );
    assert_eq!(game.current_position().history(), &[mv("e2e4")]);
    assert_eq!(game.current_position().side_to_move(), Side::Black);
    assert_eq!(game.outcome(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_illegal_oracle_reply_is_gated() {
    // A white move offered while black is to move.
    let (oracle, _calls) = ScriptedOracle::moves(&["d2d4"]);
    let mut game = coordinator(oracle);

    let report = game.propose_move(mv("e2e4")).await.unwrap();

    assert_eq!(report.state, TurnState::GameOver);
    assert_eq!(
        report.conclusion,
        Some(Conclusion::OracleFailure(OracleError::IllegalReply("d2d4".to_string())))
    );
    assert_eq!(game.current_position().history(), &[mv("e2e4")]);
    assert!(game.conclusion().is_some_and(Conclusion::is_oracle_failure));
}

#[tokio::test]
async fn test_fools_mate_locks_the_game() {
    let (oracle, calls) = ScriptedOracle::moves(&["e7e5", "d8h4", "a7a6"]);
    let mut game = coordinator(oracle);

    game.propose_move(mv("f2f3")).await.unwrap();
    let report = game.propose_move(mv("g2g4")).await.unwrap();

    let mate = GameOutcome::Checkmate { winner: Side::Black };
    assert_eq!(report.reply, Some(mv("d8h4")));
    assert_eq!(report.state, TurnState::GameOver);
    assert_eq!(report.conclusion, Some(Conclusion::Decided(mate)));
    assert_eq!(game.outcome(), Some(mate));

    let history = game.current_position().history().to_vec();
    let result = game.propose_move(mv("a2a3")).await;
    assert_eq!(result, Err(TurnError::GameAlreadyOver));
    assert_eq!(game.current_position().history(), history.as_slice());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(game.legal_moves().is_empty());
}

#[tokio::test]
async fn test_human_mate_skips_oracle() {
    let (oracle, calls) = ScriptedOracle::moves(&["e7e5", "b8c6", "g8f6", "a7a6"]);
    let mut game = coordinator(oracle);

    for m in ["e2e4", "f1c4", "d1h5"] {
        let report = game.propose_move(mv(m)).await.unwrap();
        assert_eq!(report.state, TurnState::AwaitingHumanMove);
    }
    let report = game.propose_move(mv("h5f7")).await.unwrap();

    assert_eq!(report.reply, None);
    assert_eq!(
        report.conclusion,
        Some(Conclusion::Decided(GameOutcome::Checkmate { winner: Side::White }))
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_sides_alternate_through_history() {
    let (oracle, _calls) = ScriptedOracle::moves(&["e7e5", "b8c6", "g8f6"]);
    let mut game = coordinator(oracle);

    for m in ["e2e4", "g1f3", "f1c4"] {
        game.propose_move(mv(m)).await.unwrap();
    }

    let position = game.current_position();
    assert_eq!(position.history().len(), 6);
    for (ply, played) in position.history().iter().enumerate() {
        let expected_rank_side = if ply % 2 == 0 { Side::White } else { Side::Black };
        let mover = if played.from.rank() < 4 { Side::White } else { Side::Black };
        assert_eq!(mover, expected_rank_side, "ply {} moved the wrong side", ply);
    }
}

#[tokio::test]
async fn test_events_follow_the_turn() {
    let (oracle, _calls) = ScriptedOracle::moves(&["e7e5"]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut game = coordinator(oracle).with_events(tx);

    game.propose_move(mv("e2e5")).await.unwrap_err();
    game.propose_move(mv("e2e4")).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(
        &events[0],
        GameEvent::MoveRejected { proposal, reason: TurnError::IllegalHumanMove(_) } if *proposal == mv("e2e5")
    ));
    assert!(matches!(&events[1], GameEvent::MoveMade { side: Side::White, .. }));
    assert!(matches!(
        &events[2],
        GameEvent::StateChanged { state: TurnState::AwaitingOracleMove, .. }
    ));
    match &events[3] {
        GameEvent::MoveMade { side, description, .. } => {
            assert_eq!(*side, Side::Black);
            assert_eq!(description.to_string(), "Black moved P from e7 to e5");
        }
        other => panic!("expected MoveMade, got {:?}", other),
    }
    match &events[4] {
        GameEvent::StateChanged {
            state,
            position,
            legal_moves,
            conclusion,
        } => {
            assert_eq!(*state, TurnState::AwaitingHumanMove);
            assert_eq!(*position.history_len(), 2);
            assert!(legal_moves.contains(&mv("g1f3")));
            assert_eq!(*conclusion, None);
        }
        other => panic!("expected StateChanged, got {:?}", other),
    }
    assert_eq!(events.len(), 5);
}

#[tokio::test]
async fn test_new_game_resets_after_game_over() {
    let (oracle, _calls) = ScriptedOracle::new(vec![Err(OracleError::Unavailable("gone".to_string()))]);
    let mut game = coordinator(oracle);

    game.propose_move(mv("d2d4")).await.unwrap();
    assert_eq!(game.current_state(), TurnState::GameOver);

    game.new_game().await.unwrap();

    assert_eq!(game.current_position(), &Position::new());
    assert_eq!(game.current_state(), TurnState::AwaitingHumanMove);
    assert_eq!(game.conclusion(), None);
    assert_eq!(game.legal_moves().len(), 20);
}

#[tokio::test]
async fn test_builtin_oracle_plays_first_legal_move() {
    let mut game = TurnCoordinator::new(Box::new(FirstLegalOracle::default()), Duration::from_millis(10));

    let report = game.propose_move(mv("e2e4")).await.unwrap();

    assert_eq!(report.reply, Some(mv("a7a5")));
    assert_eq!(game.legal_destinations(mv("g1f3").from), vec![mv("g1e2").to, mv("g1f3").to, mv("g1h3").to]);
}

#[tokio::test]
async fn test_unappliable_move_aborts_game_untouched() {
    let (oracle, calls) = ScriptedOracle::moves(&["e7e5"]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut game = TurnCoordinator::with_rules(
        PermissiveRules::in_progress(),
        Box::new(oracle),
        Duration::from_millis(100),
    )
    .with_events(tx);

    let report = game.propose_move(mv("e3e4")).await.unwrap();

    assert_eq!(report.reply, None);
    assert_eq!(report.state, TurnState::GameOver);
    assert!(matches!(report.conclusion, Some(Conclusion::Aborted(_))));
    assert_eq!(game.current_position(), &Position::new());
    assert_eq!(game.outcome(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        GameEvent::StateChanged {
            state: TurnState::GameOver,
            conclusion: Some(Conclusion::Aborted(_)),
            ..
        }
    ));

    let result = game.propose_move(mv("e2e4")).await;
    assert_eq!(result, Err(TurnError::GameAlreadyOver));
}

#[tokio::test]
async fn test_invariant_violation_aborts_game() {
    let (oracle, calls) = ScriptedOracle::moves(&["e7e5"]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut game = TurnCoordinator::with_rules(
        PermissiveRules::in_progress(),
        Box::new(oracle),
        Duration::from_millis(100),
    )
    .with_events(tx);

    // The white king lands on e8 and removes the black king.
    let report = game.propose_move(mv("e1e8")).await.unwrap();

    assert_eq!(report.state, TurnState::GameOver);
    match &report.conclusion {
        Some(Conclusion::Aborted(detail)) => assert!(detail.contains("invariant violated"), "{}", detail),
        other => panic!("expected an aborted game, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let events = drain(&mut rx);
    assert!(!events.iter().any(|e| matches!(e, GameEvent::MoveMade { .. })));
    assert!(matches!(
        events.last(),
        Some(GameEvent::StateChanged { state: TurnState::GameOver, .. })
    ));
}

#[tokio::test]
async fn test_rules_error_after_move_aborts_game() {
    let (oracle, calls) = ScriptedOracle::moves(&["e7e5"]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rules = PermissiveRules {
        outcome: Err(RulesError::Desync {
            detail: "occupancy of e4 differs from the rules engine".to_string(),
        }),
    };
    let mut game = TurnCoordinator::with_rules(rules, Box::new(oracle), Duration::from_millis(100))
        .with_events(tx);

    let report = game.propose_move(mv("e2e4")).await.unwrap();

    assert_eq!(report.reply, None);
    assert_eq!(report.state, TurnState::GameOver);
    match &report.conclusion {
        Some(Conclusion::Aborted(detail)) => assert!(detail.contains("out of sync"), "{}", detail),
        other => panic!("expected an aborted game, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], GameEvent::MoveMade { side: Side::White, .. }));
    assert!(matches!(
        &events[1],
        GameEvent::StateChanged { state: TurnState::GameOver, .. }
    ));
}
