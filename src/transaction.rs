//! Transactional batch execution
//!
//! Runs an ordered list of caller-supplied operations against one
//! connection with all-or-nothing semantics: every operation succeeds and
//! the transaction commits, or the first failure halts the sequence and the
//! transaction rolls back. Operations communicate through a scratch mapping
//! owned by the transaction's execution and discarded when it ends.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use serde_json::Value;
use tracing::{debug, warn};

use crate::connection::{OpenMode, QueryEngine};

/// Scratch state shared by the operations of one transaction
///
/// A string-keyed mapping of JSON values, created when the transaction
/// begins and dropped when it ends. Operation N can read what operation
/// N-1 stored (e.g. a freshly inserted rowid). Never retained beyond the
/// transaction and never shared across concurrent transactions.
#[derive(Debug, Default)]
pub struct TxContext {
    values: HashMap<String, Value>,
}

impl TxContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning the previous value for the key if any
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Remove a value by key
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One operation within a transaction
///
/// Receives the open connection and the transaction's scratch mapping;
/// returns whether it succeeded. The first operation returning `false`
/// aborts the sequence. Failure reasons are not reported by the engine —
/// operations wanting to surface detail should record it in the scratch
/// mapping themselves.
pub type TxOperation<'a> = Box<dyn FnMut(&Connection, &mut TxContext) -> bool + 'a>;

impl QueryEngine {
    /// Run a sequence of operations between caller-supplied begin/end hooks
    ///
    /// `begin` opens the connection and issues the BEGIN-equivalent
    /// statement; if it fails the transaction aborts immediately with
    /// `false` and `end` is never invoked. Otherwise the operations execute
    /// strictly in order, all sharing one [`TxContext`]; the first `false`
    /// halts the sequence. `end` always runs afterwards, receives the
    /// aggregate success flag, and is expected to COMMIT or ROLLBACK before
    /// the connection it consumes is closed on drop.
    ///
    /// Returns the aggregate success flag: `true` only if `begin` and every
    /// operation succeeded.
    pub fn run_transaction<B, E>(
        &self,
        begin: B,
        mut operations: Vec<TxOperation<'_>>,
        end: E,
    ) -> bool
    where
        B: FnOnce() -> Result<Connection>,
        E: FnOnce(bool, Connection),
    {
        let conn = match begin() {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to begin transaction: {}", e);
                return false;
            }
        };

        let mut ctx = TxContext::new();
        let mut all_ok = true;
        for (index, operation) in operations.iter_mut().enumerate() {
            if !operation(&conn, &mut ctx) {
                debug!(index, "transaction operation failed, skipping the rest");
                all_ok = false;
                break;
            }
        }

        end(all_ok, conn);
        all_ok
    }

    /// Run write operations inside a `BEGIN IMMEDIATE` transaction
    ///
    /// Opens a read-write connection, acquires the write lock up front, and
    /// commits only if every operation succeeds. The typical use is a batch
    /// of INSERT/UPDATE/DELETE statements that must apply atomically.
    pub fn run_write_transaction(&self, operations: Vec<TxOperation<'_>>) -> bool {
        self.immediate_transaction(OpenMode::ReadWrite, operations)
    }

    /// Run create operations inside a `BEGIN IMMEDIATE` transaction
    ///
    /// Same contract as [`run_write_transaction`](Self::run_write_transaction)
    /// on a create-capable connection, for batches of CREATE TABLE /
    /// initial-population statements against a possibly absent database
    /// file.
    pub fn run_create_transaction(&self, operations: Vec<TxOperation<'_>>) -> bool {
        self.immediate_transaction(OpenMode::CreateIfMissing, operations)
    }

    fn immediate_transaction(&self, mode: OpenMode, operations: Vec<TxOperation<'_>>) -> bool {
        self.run_transaction(
            || {
                let conn = self.open(mode)?;
                conn.execute_batch("BEGIN IMMEDIATE TRANSACTION")
                    .map_err(|e| anyhow!("Failed to begin immediate transaction: {}", e))?;
                Ok(conn)
            },
            operations,
            |committed, conn| {
                let sql = if committed {
                    "COMMIT TRANSACTION"
                } else {
                    "ROLLBACK TRANSACTION"
                };
                debug!(committed, "ending transaction");
                if let Err(e) = conn.execute_batch(sql) {
                    warn!("Failed to end transaction with `{}`: {}", sql, e);
                }
            },
        )
    }
}
