//! Statement execution
//!
//! The core prepare → bind → step → finalize loop shared by every operation
//! in the crate. Callers observe execution through [`QueryHooks`]: an
//! optional parameter binder, an optional per-row callback, and an optional
//! completion callback that fires exactly once per invocation regardless of
//! row count or failure.

use anyhow::{anyhow, Result};
use rusqlite::{Connection, Row, Statement};
use tracing::warn;

use crate::connection::{OpenMode, QueryEngine};

/// Parameter binder: receives the prepared statement before stepping and
/// binds positional placeholders via
/// [`Statement::raw_bind_parameter`](rusqlite::Statement::raw_bind_parameter)
pub type BindHook<'a> = Box<dyn FnMut(&mut Statement<'_>) -> rusqlite::Result<()> + 'a>;

/// Row callback: receives the current row and its 0-based index within the
/// invocation
pub type RowHook<'a> = Box<dyn FnMut(&Row<'_>, usize) + 'a>;

/// Completion callback: invoked exactly once when the invocation finishes
pub type CompleteHook<'a> = Box<dyn FnMut() + 'a>;

/// Caller-supplied hooks for one statement execution
///
/// All hooks are optional; an absent binder means the statement has no
/// placeholders, an absent row callback discards rows, an absent completion
/// callback is simply skipped.
///
/// ```rust,ignore
/// let hooks = QueryHooks::new()
///     .bind(|stmt| stmt.raw_bind_parameter(1, 13335))
///     .on_row(|row, idx| println!("{}: {:?}", idx, row.get::<_, String>(0)))
///     .on_complete(|| println!("done"));
/// engine.execute_read("SELECT name FROM asns WHERE asn = ?1", hooks)?;
/// ```
#[derive(Default)]
pub struct QueryHooks<'a> {
    pub(crate) bind: Option<BindHook<'a>>,
    pub(crate) on_row: Option<RowHook<'a>>,
    pub(crate) on_complete: Option<CompleteHook<'a>>,
}

impl<'a> QueryHooks<'a> {
    /// Create an empty hook set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parameter binder
    pub fn bind(
        mut self,
        f: impl FnMut(&mut Statement<'_>) -> rusqlite::Result<()> + 'a,
    ) -> Self {
        self.bind = Some(Box::new(f));
        self
    }

    /// Set the per-row callback
    pub fn on_row(mut self, f: impl FnMut(&Row<'_>, usize) + 'a) -> Self {
        self.on_row = Some(Box::new(f));
        self
    }

    /// Set the completion callback
    pub fn on_complete(mut self, f: impl FnMut() + 'a) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Fire the completion callback, if any
    pub(crate) fn complete(&mut self) {
        if let Some(done) = self.on_complete.as_mut() {
            done();
        }
    }
}

/// Run one statement to completion on an open connection
///
/// Prepares `sql`, applies the binder if present, steps through all result
/// rows invoking `on_row` with indices starting at `base_index`, and
/// finalizes the statement (on drop) before returning. Returns the number of
/// rows stepped. A step failure halts row delivery and surfaces the error;
/// rows already delivered stay delivered.
pub(crate) fn run_statement<'b, 'r>(
    conn: &Connection,
    sql: &str,
    mut bind: Option<&mut (dyn FnMut(&mut Statement<'_>) -> rusqlite::Result<()> + 'b)>,
    mut on_row: Option<&mut (dyn FnMut(&Row<'_>, usize) + 'r)>,
    base_index: usize,
) -> Result<usize> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| anyhow!("Failed to prepare statement `{}`: {}", sql, e))?;

    if let Some(bind) = bind.as_mut() {
        bind(&mut stmt).map_err(|e| anyhow!("Failed to bind parameters for `{}`: {}", sql, e))?;
    }

    let mut rows = stmt.raw_query();
    let mut stepped = 0usize;
    loop {
        match rows.next() {
            Ok(Some(row)) => {
                if let Some(on_row) = on_row.as_mut() {
                    on_row(row, base_index + stepped);
                }
                stepped += 1;
            }
            Ok(None) => break,
            Err(e) => {
                return Err(anyhow!(
                    "Statement `{}` failed after {} row(s): {}",
                    sql,
                    stepped,
                    e
                ));
            }
        }
    }

    Ok(stepped)
}

/// Execute one statement with hooks, guaranteeing the completion callback
fn execute_on(conn: &Connection, sql: &str, mut hooks: QueryHooks<'_>) -> Result<usize> {
    let result = run_statement(
        conn,
        sql,
        hooks.bind.as_deref_mut(),
        hooks.on_row.as_deref_mut(),
        0,
    );
    hooks.complete();
    if let Err(e) = &result {
        warn!("Statement execution failed: {}", e);
    }
    result
}

impl QueryEngine {
    /// Execute a read statement on an internally opened connection
    ///
    /// Opens a read-only connection for the duration of the call and closes
    /// it afterward. Returns the number of rows delivered; the completion
    /// hook fires exactly once even when opening or preparing fails.
    pub fn execute_read(&self, sql: &str, hooks: QueryHooks<'_>) -> Result<usize> {
        self.execute_owned(OpenMode::ReadOnly, sql, hooks)
    }

    /// Execute a write statement on an internally opened connection
    ///
    /// Identical protocol to [`execute_read`](Self::execute_read) on a
    /// read-write connection; the engine does not distinguish DML from DQL.
    pub fn execute_write(&self, sql: &str, hooks: QueryHooks<'_>) -> Result<usize> {
        self.execute_owned(OpenMode::ReadWrite, sql, hooks)
    }

    /// Execute a read statement on a caller-supplied connection
    ///
    /// For use inside transactions, where the caller controls the
    /// connection's lifetime.
    pub fn execute_read_on(
        &self,
        conn: &Connection,
        sql: &str,
        hooks: QueryHooks<'_>,
    ) -> Result<usize> {
        execute_on(conn, sql, hooks)
    }

    /// Execute a write statement on a caller-supplied connection
    pub fn execute_write_on(
        &self,
        conn: &Connection,
        sql: &str,
        hooks: QueryHooks<'_>,
    ) -> Result<usize> {
        execute_on(conn, sql, hooks)
    }

    fn execute_owned(&self, mode: OpenMode, sql: &str, mut hooks: QueryHooks<'_>) -> Result<usize> {
        let conn = match self.open(mode) {
            Ok(conn) => conn,
            Err(e) => {
                // the completion guarantee holds even when no statement ran
                hooks.complete();
                warn!("Statement execution failed: {}", e);
                return Err(e);
            }
        };
        execute_on(&conn, sql, hooks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use tempfile::TempDir;

    fn test_engine() -> (TempDir, QueryEngine) {
        let dir = tempfile::tempdir().unwrap();
        let engine = QueryEngine::new(dir.path().join("test.db"));
        let conn = engine.open_for_create().unwrap();
        conn.execute(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
            [],
        )
        .unwrap();
        (dir, engine)
    }

    fn insert_items(engine: &QueryEngine, names: &[&str]) {
        let conn = engine.open_read_write().unwrap();
        for name in names {
            conn.execute("INSERT INTO items (name) VALUES (?1)", [name])
                .unwrap();
        }
    }

    #[test]
    fn test_read_delivers_all_rows_in_order() {
        let (_dir, engine) = test_engine();
        insert_items(&engine, &["a", "b", "c"]);

        let events = RefCell::new(Vec::new());
        let hooks = QueryHooks::new()
            .on_row(|row, idx| {
                let name: String = row.get(1).unwrap();
                events.borrow_mut().push(format!("row {} {}", idx, name));
            })
            .on_complete(|| events.borrow_mut().push("complete".to_string()));

        let delivered = engine
            .execute_read("SELECT id, name FROM items ORDER BY id", hooks)
            .unwrap();

        assert_eq!(delivered, 3);
        assert_eq!(
            *events.borrow(),
            vec!["row 0 a", "row 1 b", "row 2 c", "complete"]
        );
    }

    #[test]
    fn test_completion_fires_with_zero_rows() {
        let (_dir, engine) = test_engine();

        let completions = Cell::new(0u32);
        let rows = Cell::new(0u32);
        let hooks = QueryHooks::new()
            .on_row(|_, _| rows.set(rows.get() + 1))
            .on_complete(|| completions.set(completions.get() + 1));

        let delivered = engine.execute_read("SELECT * FROM items", hooks).unwrap();

        assert_eq!(delivered, 0);
        assert_eq!(rows.get(), 0);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn test_completion_fires_on_prepare_failure() {
        let (_dir, engine) = test_engine();

        let completions = Cell::new(0u32);
        let rows = Cell::new(0u32);
        let hooks = QueryHooks::new()
            .on_row(|_, _| rows.set(rows.get() + 1))
            .on_complete(|| completions.set(completions.get() + 1));

        let result = engine.execute_read("SELECT * FROM no_such_table", hooks);

        assert!(result.is_err());
        assert_eq!(rows.get(), 0);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn test_completion_fires_on_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = QueryEngine::new(dir.path().join("missing.db"));

        let completions = Cell::new(0u32);
        let hooks = QueryHooks::new().on_complete(|| completions.set(completions.get() + 1));

        assert!(engine.execute_read("SELECT 1", hooks).is_err());
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn test_binder_filters_rows() {
        let (_dir, engine) = test_engine();
        insert_items(&engine, &["alpha", "beta", "gamma"]);

        let matched = RefCell::new(Vec::new());
        let hooks = QueryHooks::new()
            .bind(|stmt| stmt.raw_bind_parameter(1, "beta"))
            .on_row(|row, _| matched.borrow_mut().push(row.get::<_, String>(0).unwrap()));

        let delivered = engine
            .execute_read("SELECT name FROM items WHERE name = ?1", hooks)
            .unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(*matched.borrow(), vec!["beta"]);
    }

    #[test]
    fn test_bind_failure_skips_rows_but_completes() {
        let (_dir, engine) = test_engine();
        insert_items(&engine, &["a"]);

        let completions = Cell::new(0u32);
        let rows = Cell::new(0u32);
        let hooks = QueryHooks::new()
            // index 5 is out of range for a single-placeholder statement
            .bind(|stmt| stmt.raw_bind_parameter(5, "x"))
            .on_row(|_, _| rows.set(rows.get() + 1))
            .on_complete(|| completions.set(completions.get() + 1));

        let result = engine.execute_read("SELECT name FROM items WHERE name = ?1", hooks);

        assert!(result.is_err());
        assert_eq!(rows.get(), 0);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn test_write_then_read_back() {
        let (_dir, engine) = test_engine();

        let hooks = QueryHooks::new().bind(|stmt| stmt.raw_bind_parameter(1, "stored"));
        engine
            .execute_write("INSERT INTO items (name) VALUES (?1)", hooks)
            .unwrap();

        let count = Cell::new(0i64);
        let hooks = QueryHooks::new().on_row(|row, _| count.set(row.get(0).unwrap_or(0)));
        engine
            .execute_read("SELECT COUNT(*) FROM items", hooks)
            .unwrap();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_execute_on_reuses_connection() {
        let (_dir, engine) = test_engine();
        let conn = engine.open_read_write().unwrap();

        engine
            .execute_write_on(
                &conn,
                "INSERT INTO items (name) VALUES (?1)",
                QueryHooks::new().bind(|stmt| stmt.raw_bind_parameter(1, "same-conn")),
            )
            .unwrap();

        let seen = Cell::new(0u32);
        engine
            .execute_read_on(
                &conn,
                "SELECT name FROM items",
                QueryHooks::new().on_row(|_, _| seen.set(seen.get() + 1)),
            )
            .unwrap();

        assert_eq!(seen.get(), 1);
    }
}
