//! Oracle backed by an external UCI engine process.

use super::protocol::{self, EngineLine};
use super::{Oracle, OracleError};
use crate::config::EngineConfig;
use crate::games::chess::{Move, Position};
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, instrument, trace, warn};

/// A running UCI engine.
///
/// The child process is killed when the oracle is dropped, so abandoning an
/// outstanding request never blocks shutdown.
pub struct UciOracle {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    grace: Duration,
    handshake_timeout: Duration,
    poisoned: bool,
}

impl UciOracle {
    /// Starts the engine and completes the UCI handshake.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Unavailable`] if the process cannot be started
    /// or the handshake does not complete within the configured timeout.
    #[instrument(skip(config), fields(command = ?config.command()))]
    pub async fn spawn(config: &EngineConfig) -> Result<Self, OracleError> {
        let (program, args) = config
            .command()
            .split_first()
            .ok_or_else(|| OracleError::Unavailable("engine command is empty".to_string()))?;

        info!(program = %program, args = ?args, "Starting engine process");

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(cwd) = config.cwd() {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|e| OracleError::Unavailable(format!("failed to start {}: {}", program, e)))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            tracing::error!("Failed to capture engine stdin");
            OracleError::Unavailable("failed to capture engine stdin".to_string())
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            tracing::error!("Failed to capture engine stdout");
            OracleError::Unavailable("failed to capture engine stdout".to_string())
        })?;

        let mut oracle = Self {
            name: program.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            grace: config.grace(),
            handshake_timeout: config.handshake_timeout(),
            poisoned: false,
        };

        let limit = oracle.handshake_timeout;
        let handshake = timeout(limit, oracle.handshake(config.options())).await;
        match handshake {
            Ok(Ok(())) => {
                info!(engine = %oracle.name, "Engine ready");
                Ok(oracle)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(OracleError::Unavailable(format!(
                "handshake did not complete within {:?}",
                limit
            ))),
        }
    }

    async fn handshake(&mut self, options: &BTreeMap<String, String>) -> Result<(), OracleError> {
        self.send("uci").await?;
        loop {
            match self.read_line().await? {
                EngineLine::IdName(name) => {
                    debug!(engine = %name, "Engine identified itself");
                    self.name = name;
                }
                EngineLine::UciOk => break,
                _ => {}
            }
        }

        for (name, value) in options {
            self.send(&protocol::setoption_command(name, value)).await?;
        }

        self.sync().await
    }

    /// Sends `isready` and waits for `readyok`.
    async fn sync(&mut self) -> Result<(), OracleError> {
        self.send("isready").await?;
        loop {
            if self.read_line().await? == EngineLine::ReadyOk {
                return Ok(());
            }
        }
    }

    async fn await_bestmove(&mut self) -> Result<Move, OracleError> {
        loop {
            match self.read_line().await? {
                EngineLine::BestMove(Ok(mv)) => return Ok(mv),
                EngineLine::BestMove(Err(text)) => {
                    return Err(OracleError::IllegalReply(format!("unusable bestmove {:?}", text)));
                }
                _ => {}
            }
        }
    }

    async fn send(&mut self, line: &str) -> Result<(), OracleError> {
        debug!(line, "-> engine");
        self.stdin
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| OracleError::Unavailable(format!("failed to write to engine: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| OracleError::Unavailable(format!("failed to write to engine: {}", e)))
    }

    async fn read_line(&mut self) -> Result<EngineLine, OracleError> {
        match self.stdout.next_line().await {
            Ok(Some(line)) => {
                trace!(line = %line, "<- engine");
                Ok(protocol::parse_line(&line))
            }
            Ok(None) => Err(OracleError::Unavailable("engine closed its output".to_string())),
            Err(e) => Err(OracleError::Unavailable(format!("failed to read from engine: {}", e))),
        }
    }

    fn ensure_usable(&self) -> Result<(), OracleError> {
        if self.poisoned {
            Err(OracleError::Unavailable(
                "engine stopped responding earlier in this session".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl Oracle for UciOracle {
    #[instrument(skip(self, position), fields(engine = %self.name, plies = position.history().len()))]
    async fn request_move(&mut self, position: &Position, budget: Duration) -> Result<Move, OracleError> {
        self.ensure_usable()?;

        let result = async {
            self.send(&protocol::position_command(position)).await?;
            self.send(&protocol::go_command(budget)).await?;
            let limit = budget + self.grace;
            match timeout(limit, self.await_bestmove()).await {
                Ok(reply) => reply,
                Err(_) => Err(OracleError::Timeout(limit)),
            }
        }
        .await;

        match &result {
            Ok(mv) => debug!(mv = %mv, "Engine replied"),
            Err(OracleError::Timeout(limit)) => {
                warn!(?limit, "Engine timed out");
                self.poisoned = true;
                if let Err(e) = self.send("stop").await {
                    debug!(error = %e, "Could not ask timed-out engine to stop");
                }
            }
            Err(e @ OracleError::Unavailable(_)) => {
                warn!(error = %e, "Engine became unavailable");
                self.poisoned = true;
            }
            Err(e) => warn!(error = %e, "Engine reply unusable"),
        }
        result
    }

    #[instrument(skip(self), fields(engine = %self.name))]
    async fn new_game(&mut self) -> Result<(), OracleError> {
        self.ensure_usable()?;
        self.send("ucinewgame").await?;
        let limit = self.handshake_timeout;
        match timeout(limit, self.sync()).await {
            Ok(result) => result,
            Err(_) => {
                self.poisoned = true;
                Err(OracleError::Timeout(limit))
            }
        }
    }

    #[instrument(skip(self), fields(engine = %self.name))]
    async fn shutdown(&mut self) {
        info!("Shutting down engine");
        if let Err(e) = self.send("quit").await {
            debug!(error = %e, "Engine already gone");
        }
        match timeout(self.grace, self.child.wait()).await {
            Ok(Ok(status)) => debug!(?status, "Engine exited"),
            Ok(Err(e)) => warn!(error = %e, "Failed to wait for engine"),
            Err(_) => {
                warn!("Engine ignored quit, killing it");
                if let Err(e) = self.child.start_kill() {
                    warn!(error = %e, "Failed to kill engine");
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
