//! Engine configuration.
//!
//! # Responsibility
//! - Hold tunables for transaction retries, lock waits and input limits.
//! - Deserialize from caller-provided documents with per-field defaults.
//!
//! # Invariants
//! - `max_tx_attempts >= 1`.
//! - Defaults match the requirement form of the staffing UI (0..=4 per role).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_MAX_TX_ATTEMPTS: u32 = 3;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_SLOTS_PER_ROLE: u32 = 4;
const DEFAULT_MAX_NOTES_CHARS: usize = 100_000;

/// Tunables shared by the staffing services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attempts per write transaction before reporting a transient conflict.
    pub max_tx_attempts: u32,
    /// SQLite busy handler wait per attempt.
    pub busy_timeout_ms: u64,
    /// Upper bound for sous-chef and KP counts.
    pub max_slots_per_role: u32,
    /// Upper bound for each meal notes field.
    pub max_notes_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tx_attempts: DEFAULT_MAX_TX_ATTEMPTS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            max_slots_per_role: DEFAULT_MAX_SLOTS_PER_ROLE,
            max_notes_chars: DEFAULT_MAX_NOTES_CHARS,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroTxAttempts,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroTxAttempts => write!(f, "max_tx_attempts must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tx_attempts == 0 {
            return Err(ConfigError::ZeroTxAttempts);
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
