//! Built-in oracle for playing without an installed engine.

use super::{Oracle, OracleError};
use crate::games::chess::{Move, Position, Rules, ShakmatyRules};
use std::time::Duration;
use tracing::{debug, instrument};

/// Oracle that plays the first legal move in coordinate order.
pub struct FirstLegalOracle {
    name: String,
    rules: ShakmatyRules,
}

impl FirstLegalOracle {
    /// Creates the oracle.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: ShakmatyRules::new(),
        }
    }
}

impl Default for FirstLegalOracle {
    fn default() -> Self {
        Self::new("First legal move")
    }
}

#[async_trait::async_trait]
impl Oracle for FirstLegalOracle {
    #[instrument(skip(self, position), fields(oracle = %self.name))]
    async fn request_move(&mut self, position: &Position, _budget: Duration) -> Result<Move, OracleError> {
        let choice = self
            .rules
            .legal_moves(position)
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::IllegalReply("no legal move available".to_string()))?;
        debug!(mv = %choice, "Built-in oracle chose move");
        Ok(choice)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
