//! Game and engine configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable overriding the engine command (space separated).
pub const ENGINE_ENV_VAR: &str = "STRICTLY_CHESS_ENGINE";

/// Top-level configuration, usually read from `strictly_chess.toml`.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct GameConfig {
    /// File the TUI writes its logs to.
    #[serde(default = "default_log_file")]
    log_file: String,

    /// Decision oracle settings.
    #[serde(default)]
    engine: EngineConfig,
}

/// How to start and drive the UCI engine.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Command to start the engine (program followed by arguments).
    #[serde(default = "default_command")]
    command: Vec<String>,

    /// Optional working directory for the engine process.
    #[serde(default)]
    cwd: Option<String>,

    /// Thinking time per engine move, in milliseconds.
    #[serde(default = "default_move_time_ms")]
    move_time_ms: u64,

    /// Extra time allowed on top of the thinking time before a reply counts
    /// as timed out, in milliseconds.
    #[serde(default = "default_grace_ms")]
    grace_ms: u64,

    /// Time allowed for the `uci` / `isready` handshake, in milliseconds.
    #[serde(default = "default_handshake_timeout_ms")]
    handshake_timeout_ms: u64,

    /// UCI options sent with `setoption` after the handshake.
    #[serde(default)]
    options: BTreeMap<String, String>,
}

#[instrument]
fn default_log_file() -> String {
    "strictly_chess.log".to_string()
}

#[instrument]
fn default_command() -> Vec<String> {
    vec!["stockfish".to_string()]
}

#[instrument]
fn default_move_time_ms() -> u64 {
    1000
}

#[instrument]
fn default_grace_ms() -> u64 {
    2000
}

#[instrument]
fn default_handshake_timeout_ms() -> u64 {
    5000
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            engine: EngineConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            cwd: None,
            move_time_ms: default_move_time_ms(),
            grace_ms: default_grace_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            options: BTreeMap::new(),
        }
    }
}

impl GameConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.engine.validate()?;

        info!(command = ?config.engine.command, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if it exists, otherwise falls back to defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Replaces the engine settings.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Applies the `STRICTLY_CHESS_ENGINE` override, if set.
    #[instrument(skip(self))]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(ENGINE_ENV_VAR) {
            Ok(command) if !command.trim().is_empty() => {
                info!(command = %command, "Engine command overridden from environment");
                let engine = self.engine.clone().with_command_line(&command);
                self.with_engine(engine)
            }
            _ => self,
        }
    }
}

impl EngineConfig {
    /// Replaces the command with a space-separated command line.
    pub fn with_command_line(mut self, command_line: &str) -> Self {
        self.command = command_line.split_whitespace().map(str::to_string).collect();
        self
    }

    /// Replaces the per-move thinking time.
    pub fn with_move_time_ms(mut self, move_time_ms: u64) -> Self {
        self.move_time_ms = move_time_ms;
        self
    }

    /// Replaces the grace period.
    pub fn with_grace_ms(mut self, grace_ms: u64) -> Self {
        self.grace_ms = grace_ms;
        self
    }

    /// Replaces the handshake timeout.
    pub fn with_handshake_timeout_ms(mut self, handshake_timeout_ms: u64) -> Self {
        self.handshake_timeout_ms = handshake_timeout_ms;
        self
    }

    /// Thinking time per engine move.
    pub fn move_time(&self) -> Duration {
        Duration::from_millis(self.move_time_ms)
    }

    /// Grace period on top of the thinking time.
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    /// Handshake timeout.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Checks that the settings can drive an engine.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command.is_empty() {
            return Err(ConfigError::new("Engine command must not be empty".to_string()));
        }
        if self.move_time_ms == 0 {
            return Err(ConfigError::new("Engine move_time_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
