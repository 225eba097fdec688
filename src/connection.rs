//! Database connection management
//!
//! This module provides the engine entry point and its connection-opening
//! operations. A [`QueryEngine`] is bound to one database file path;
//! every operation opens (or is handed) a [`Connection`] against that path
//! under an explicit [`OpenMode`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use rusqlite::{Connection, OpenFlags};

use crate::config::EngineConfig;

/// Intent a connection is opened under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read statements only; fails if the database file does not exist
    ReadOnly,
    /// Read and write statements; fails if the database file does not exist
    ReadWrite,
    /// Read and write statements; creates the database file if absent
    CreateIfMissing,
}

impl OpenMode {
    /// Whether connections opened under this mode may modify the database
    pub fn is_writable(self) -> bool {
        !matches!(self, OpenMode::ReadOnly)
    }

    fn flags(self) -> OpenFlags {
        let base = match self {
            OpenMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
            OpenMode::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::CreateIfMissing => {
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
        };
        base | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }
}

/// Execution engine for one SQLite database file
///
/// `QueryEngine` owns no connection itself; it opens short-lived connections
/// on demand and hands longer-lived ones to the caller (for transactions and
/// paginated enumeration). Every connection it opens is configured from the
/// engine's [`EngineConfig`].
pub struct QueryEngine {
    db_path: PathBuf,
    config: EngineConfig,
}

impl QueryEngine {
    /// Create an engine for the database at `db_path` with default tuning
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self::with_config(db_path, EngineConfig::default())
    }

    /// Create an engine with explicit tuning
    pub fn with_config(db_path: impl Into<PathBuf>, config: EngineConfig) -> Self {
        Self {
            db_path: db_path.into(),
            config,
        }
    }

    /// Path of the database file this engine operates on
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection under the given mode
    ///
    /// The caller owns the returned connection; dropping it closes the
    /// underlying handle.
    pub fn open(&self, mode: OpenMode) -> Result<Connection> {
        let conn = Connection::open_with_flags(&self.db_path, mode.flags()).map_err(|e| {
            anyhow!(
                "Failed to open database at '{}' ({:?}): {}",
                self.db_path.display(),
                mode,
                e
            )
        })?;
        self.configure(&conn, mode)?;
        Ok(conn)
    }

    /// Open a read-only connection
    pub fn open_read_only(&self) -> Result<Connection> {
        self.open(OpenMode::ReadOnly)
    }

    /// Open a read-write connection
    pub fn open_read_write(&self) -> Result<Connection> {
        self.open(OpenMode::ReadWrite)
    }

    /// Open a connection that creates the database file if missing
    ///
    /// Intended for schema creation; otherwise identical to a read-write
    /// connection.
    pub fn open_for_create(&self) -> Result<Connection> {
        self.open(OpenMode::CreateIfMissing)
    }

    /// Apply the engine configuration to a freshly opened connection
    fn configure(&self, conn: &Connection, mode: OpenMode) -> Result<()> {
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(|e| anyhow!("Failed to set busy timeout: {}", e))?;

        if self.config.foreign_keys {
            conn.execute("PRAGMA foreign_keys=ON", [])
                .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;
        }

        // journal_mode returns a result row and needs write access
        if self.config.wal && mode.is_writable() {
            let _: String = conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| anyhow!("Failed to set journal mode: {}", e))?;

            conn.execute("PRAGMA synchronous=NORMAL", [])
                .map_err(|e| anyhow!("Failed to set synchronous mode: {}", e))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_if_missing_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.db");
        let engine = QueryEngine::new(&path);

        assert!(!path.exists());
        let conn = engine.open_for_create().unwrap();
        drop(conn);
        assert!(path.exists());
    }

    #[test]
    fn test_read_only_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = QueryEngine::new(dir.path().join("missing.db"));

        assert!(engine.open_read_only().is_err());
    }

    #[test]
    fn test_read_write_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = QueryEngine::new(dir.path().join("missing.db"));

        assert!(engine.open_read_write().is_err());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.db");
        let engine = QueryEngine::new(&path);

        let conn = engine.open_for_create().unwrap();
        conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)", [])
            .unwrap();
        drop(conn);

        let conn = engine.open_read_only().unwrap();
        assert!(conn.execute("INSERT INTO t (id) VALUES (1)", []).is_err());
    }

    #[test]
    fn test_reopen_existing_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rw.db");
        let engine = QueryEngine::new(&path);

        drop(engine.open_for_create().unwrap());

        let conn = engine.open_read_write().unwrap();
        conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)", [])
            .unwrap();
    }
}
