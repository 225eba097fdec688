//! Engine configuration
//!
//! Tuning knobs applied as pragmas whenever the engine opens a connection.
//! Defaults are suitable for local single-writer databases; overrides can be
//! supplied programmatically or read from `LITEQUERY_*` environment
//! variables.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Connection tuning applied by [`QueryEngine::open`](crate::QueryEngine::open)
///
/// Write-requiring pragmas (WAL journal mode and its synchronous pairing)
/// are only applied to writable connections; a read-only open gets the busy
/// timeout and foreign-key settings alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a connection waits on a locked database before giving up,
    /// in milliseconds
    pub busy_timeout_ms: u64,

    /// Enable WAL journal mode (with synchronous=NORMAL) on writable
    /// connections
    pub wal: bool,

    /// Enforce foreign-key constraints
    pub foreign_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            wal: true,
            foreign_keys: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment
    ///
    /// Reads variables with the `LITEQUERY` prefix, e.g.
    /// `LITEQUERY_BUSY_TIMEOUT_MS=10000`. Unset fields keep their defaults.
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("LITEQUERY").try_parsing(true))
            .build()
            .map_err(|e| anyhow!("Failed to read environment configuration: {}", e))?;

        settings
            .try_deserialize()
            .map_err(|e| anyhow!("Invalid engine configuration: {}", e))
    }
}
