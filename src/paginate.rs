//! Paginated enumeration
//!
//! Iterates an arbitrarily large result set in bounded memory by running the
//! target query repeatedly through a shifting `LIMIT`/`OFFSET` window. At
//! most one page of rows is in flight at any time.

use anyhow::{anyhow, ensure, Result};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::connection::QueryEngine;
use crate::executor::{run_statement, QueryHooks};

impl QueryEngine {
    /// Enumerate a query's full result set page by page
    ///
    /// `query` must not carry a trailing statement terminator; the engine
    /// appends its own ` LIMIT {page_size} OFFSET {offset}` clause each
    /// pass. `count_query` is executed once up front and must return the
    /// total row count as a single integer column; the binder (if any) is
    /// applied to it and re-applied on every page pass, so count and target
    /// queries can share a parameterized WHERE clause.
    ///
    /// Row indices passed to the row hook are cumulative across pages, and
    /// the completion hook fires exactly once for the whole enumeration —
    /// including when the count is zero or a pass fails. Returns the total
    /// number of rows delivered.
    pub fn enumerate_paged(
        &self,
        conn: &Connection,
        query: &str,
        count_query: &str,
        page_size: usize,
        mut hooks: QueryHooks<'_>,
    ) -> Result<usize> {
        ensure!(page_size >= 1, "page_size must be at least 1");

        let mut total = 0i64;
        let count_result = run_statement(
            conn,
            count_query,
            hooks.bind.as_deref_mut(),
            Some(&mut |row: &rusqlite::Row<'_>, _| total = row.get(0).unwrap_or(0)),
            0,
        );
        if let Err(e) = count_result {
            hooks.complete();
            warn!("Paginated enumeration failed: {}", e);
            return Err(anyhow!("Count query failed: {}", e));
        }

        let total = usize::try_from(total).unwrap_or(0);
        let pages = total.div_ceil(page_size);
        debug!(
            total,
            page_size, pages, "enumerating query result set in pages"
        );

        let mut delivered = 0usize;
        for page in 0..pages {
            let paged_sql = format!(
                "{} LIMIT {} OFFSET {}",
                query,
                page_size,
                page * page_size
            );
            match run_statement(
                conn,
                &paged_sql,
                hooks.bind.as_deref_mut(),
                hooks.on_row.as_deref_mut(),
                delivered,
            ) {
                Ok(stepped) => delivered += stepped,
                Err(e) => {
                    hooks.complete();
                    warn!("Paginated enumeration failed: {}", e);
                    return Err(e);
                }
            }
        }

        hooks.complete();
        Ok(delivered)
    }
}
