//! Schema version accessor
//!
//! Reads and writes the database's single persisted schema marker — the
//! SQLite `user_version` slot, a signed 32-bit integer with no history.
//! Both directions go through the statement executor.

use anyhow::Result;
use rusqlite::Connection;

use crate::connection::QueryEngine;
use crate::executor::QueryHooks;

impl QueryEngine {
    /// Read the schema version on an internally opened connection
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.open_read_only()?;
        self.schema_version_on(&conn)
    }

    /// Read the schema version on a caller-supplied connection
    pub fn schema_version_on(&self, conn: &Connection) -> Result<i32> {
        let mut version = 0i32;
        let hooks = QueryHooks::new().on_row(|row, _| version = row.get(0).unwrap_or(0));
        self.execute_read_on(conn, "PRAGMA user_version", hooks)?;
        Ok(version)
    }

    /// Write the schema version on an internally opened connection
    pub fn set_schema_version(&self, version: i32) -> Result<()> {
        let conn = self.open_read_write()?;
        self.set_schema_version_on(&conn, version)
    }

    /// Write the schema version on a caller-supplied connection
    ///
    /// The pragma cannot take bound parameters, so the value is formatted
    /// into the statement text.
    pub fn set_schema_version_on(&self, conn: &Connection, version: i32) -> Result<()> {
        let sql = format!("PRAGMA user_version = {}", version);
        self.execute_write_on(conn, &sql, QueryHooks::new())?;
        Ok(())
    }
}
