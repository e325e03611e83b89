//! Background task that owns the turn coordinator.

use strictly_chess::{Move, TurnCoordinator};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Requests from the UI to the game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Propose a move for the human.
    Propose(Move),
    /// Abandon the current game and start over.
    NewGame,
}

/// Runs the coordinator on its own task until the command channel closes.
pub fn spawn_session(
    coordinator: TurnCoordinator,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
) -> JoinHandle<()> {
    tokio::spawn(run_session(coordinator, commands))
}

#[instrument(skip_all, fields(oracle = %coordinator.oracle_name()))]
async fn run_session(
    mut coordinator: TurnCoordinator,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
) {
    info!("Game session started");
    coordinator.announce();

    while let Some(command) = commands.recv().await {
        debug!(?command, "Session command");
        match command {
            SessionCommand::Propose(mv) => {
                // Rejections are reported to the UI as events.
                if let Err(e) = coordinator.propose_move(mv).await {
                    debug!(error = %e, "Proposal refused");
                }
            }
            SessionCommand::NewGame => {
                if let Err(e) = coordinator.new_game().await {
                    warn!(error = %e, "New game started without a working oracle");
                }
            }
        }
    }

    info!("Game session closing");
    coordinator.shutdown().await;
}
