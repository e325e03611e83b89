//! Tests for the UCI oracle against small shell-script engines.

#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;
use strictly_chess::{
    Conclusion, EngineConfig, Move, Oracle, OracleError, Position, TurnCoordinator, TurnState, UciOracle,
};
use tempfile::TempDir;

/// Answers the handshake and always replies `e7e5`.
const COOPERATIVE: &str = r#"
while read line; do
  case "$line" in
    uci) echo "id name Fake Engine"; echo "option name Hash type spin default 16"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "info depth 1 score cp 20"; echo "bestmove e7e5 ponder g1f3" ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Answers the handshake but never finds a move.
const SILENT: &str = r#"
while read line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Never completes the handshake.
const MUTE: &str = r#"
while read line; do
  :
done
"#;

/// Claims there is no move.
const RESIGNED: &str = r#"
while read line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "bestmove (none)" ;;
  esac
done
"#;

/// Dies when asked to think.
const CRASHING: &str = r#"
while read line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) exit 3 ;;
  esac
done
"#;

fn engine_config(dir: &TempDir, name: &str, script: &str) -> EngineConfig {
    let path: PathBuf = dir.path().join(format!("{}.sh", name));
    std::fs::write(&path, script).unwrap();
    EngineConfig::default()
        .with_command_line(&format!("sh {}", path.display()))
        .with_move_time_ms(50)
        .with_grace_ms(250)
        .with_handshake_timeout_ms(2000)
}

fn after_e4() -> Position {
    let mut position = Position::new();
    position.apply("e2e4".parse().unwrap()).unwrap();
    position
}

#[tokio::test]
async fn test_handshake_and_bestmove() {
    let dir = tempfile::tempdir().unwrap();
    let config = engine_config(&dir, "cooperative", COOPERATIVE);

    let mut oracle = UciOracle::spawn(&config).await.unwrap();
    assert_eq!(oracle.name(), "Fake Engine");

    let reply = oracle.request_move(&after_e4(), config.move_time()).await.unwrap();
    assert_eq!(reply, "e7e5".parse::<Move>().unwrap());

    oracle.new_game().await.unwrap();
    oracle.shutdown().await;
}

#[tokio::test]
async fn test_silent_engine_times_out_and_is_poisoned() {
    let dir = tempfile::tempdir().unwrap();
    let config = engine_config(&dir, "silent", SILENT);

    let mut oracle = UciOracle::spawn(&config).await.unwrap();
    let result = oracle.request_move(&after_e4(), config.move_time()).await;
    assert_eq!(result, Err(OracleError::Timeout(config.move_time() + config.grace())));

    let again = oracle.request_move(&after_e4(), config.move_time()).await;
    assert!(matches!(again, Err(OracleError::Unavailable(_))));
}

#[tokio::test]
async fn test_missing_binary_is_unavailable() {
    let config = EngineConfig::default().with_command_line("/nonexistent/strictly-chess-engine");

    let result = UciOracle::spawn(&config).await;
    assert!(matches!(result, Err(OracleError::Unavailable(_))));
}

#[tokio::test]
async fn test_handshake_timeout_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = engine_config(&dir, "mute", MUTE).with_handshake_timeout_ms(200);

    let result = UciOracle::spawn(&config).await;
    assert!(matches!(result, Err(OracleError::Unavailable(_))));
}

#[tokio::test]
async fn test_bestmove_none_is_illegal_reply() {
    let dir = tempfile::tempdir().unwrap();
    let config = engine_config(&dir, "resigned", RESIGNED);

    let mut oracle = UciOracle::spawn(&config).await.unwrap();
    let result = oracle.request_move(&after_e4(), config.move_time()).await;
    assert!(matches!(result, Err(OracleError::IllegalReply(_))));
}

#[tokio::test]
async fn test_crashing_engine_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = engine_config(&dir, "crashing", CRASHING);

    let mut oracle = UciOracle::spawn(&config).await.unwrap();
    let result = oracle.request_move(&after_e4(), config.move_time()).await;
    assert!(matches!(result, Err(OracleError::Unavailable(_))));
}

#[tokio::test]
async fn test_coordinator_with_engine_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = engine_config(&dir, "cooperative", COOPERATIVE);

    let oracle = UciOracle::spawn(&config).await.unwrap();
    let mut game = TurnCoordinator::new(Box::new(oracle), config.move_time());

    let report = game.propose_move("e2e4".parse().unwrap()).await.unwrap();
    assert_eq!(report.reply, Some("e7e5".parse().unwrap()));
    assert_eq!(report.state, TurnState::AwaitingHumanMove);

    // The script always answers e7e5, which is no longer legal.
    let report = game.propose_move("d2d4".parse().unwrap()).await.unwrap();
    assert_eq!(report.state, TurnState::GameOver);
    assert!(matches!(
        report.conclusion,
        Some(Conclusion::OracleFailure(OracleError::IllegalReply(_)))
    ));

    game.shutdown().await;
}
