//! Strictly Chess library - a human plays white against a UCI engine.
//!
//! # Architecture
//!
//! - **Games**: position model, rules adapter over `shakmaty`, invariants
//! - **Oracle**: the automated side's move source (UCI engine or built-in)
//! - **Coordinator**: owns the authoritative position and sequences turns
//! - **Config**: TOML + environment configuration for the engine
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use strictly_chess::{FirstLegalOracle, TurnCoordinator};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut coordinator = TurnCoordinator::new(
//!     Box::new(FirstLegalOracle::default()),
//!     Duration::from_secs(1),
//! );
//! let report = coordinator.propose_move("e2e4".parse()?).await?;
//! println!("Engine replied {:?}", report.reply);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod coordinator;
mod games;
mod oracle;

// Crate-level exports - Configuration
pub use config::{ConfigError, ENGINE_ENV_VAR, EngineConfig, GameConfig};

// Crate-level exports - Turn coordination
pub use coordinator::{GameEvent, HUMAN_SIDE, TurnCoordinator, TurnError, TurnReport};

// Crate-level exports - Oracles
pub use oracle::{FirstLegalOracle, Oracle, OracleError, UciOracle};
pub use oracle::protocol;

// Crate-level exports - Chess types
pub use games::chess::{
    Conclusion, DrawReason, GameOutcome, InvalidApplication, Move, MoveDescription, ParseError,
    Piece, PieceKind, Position, PositionSnapshot, Rules, RulesError, ShakmatyRules, Side, Square,
    TurnState,
};
pub use games::chess::invariants;
