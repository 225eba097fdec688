#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! litequery - a callback-driven execution layer for SQLite
//!
//! litequery sits above rusqlite's statement API and takes over the
//! recurring bookkeeping of issuing SQL against a single-file database:
//! binding parameters and streaming result rows without manual resource
//! management, iterating large result sets in bounded memory, and running
//! multi-statement writes and schema migrations with all-or-nothing
//! semantics.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── connection   # QueryEngine, OpenMode, connection opening
//! ├── config       # EngineConfig pragma tuning
//! ├── executor     # QueryHooks + the prepare/bind/step/finalize loop
//! ├── paginate     # LIMIT/OFFSET page-wise enumeration
//! ├── version      # user_version schema marker access
//! ├── transaction  # TxContext, atomic operation batches
//! └── migration    # precondition/migrate/verify/rollback workflow
//! ```
//!
//! The executor is the foundation: pagination and version access are built
//! directly on it, and transactions and migrations drive it through caller
//! closures.
//!
//! Everything is synchronous and single-connection: hooks run inline on the
//! calling thread before the invoking method returns, rows arrive in the
//! order SQLite produces them, and there is no built-in cancellation.
//! Callers sharing one database file across threads must serialize access
//! themselves.
//!
//! # Quick Start
//!
//! ## Streaming a query
//!
//! ```rust,ignore
//! use litequery::{QueryEngine, QueryHooks};
//!
//! let engine = QueryEngine::new("/var/lib/app/data.db");
//! let hooks = QueryHooks::new()
//!     .bind(|stmt| stmt.raw_bind_parameter(1, 13335))
//!     .on_row(|row, idx| println!("{idx}: {:?}", row.get::<_, String>(0)))
//!     .on_complete(|| println!("done"));
//! engine.execute_read("SELECT name FROM asns WHERE asn = ?1", hooks)?;
//! ```
//!
//! ## Paging through a large result set
//!
//! ```rust,ignore
//! let conn = engine.open_read_only()?;
//! let hooks = QueryHooks::new().on_row(|row, idx| { /* idx is cumulative */ });
//! engine.enumerate_paged(
//!     &conn,
//!     "SELECT name FROM asns ORDER BY asn", // no trailing ';'
//!     "SELECT COUNT(*) FROM asns",
//!     500,
//!     hooks,
//! )?;
//! ```
//!
//! ## Atomic write batch
//!
//! ```rust,ignore
//! let committed = engine.run_write_transaction(vec![
//!     Box::new(|conn, ctx| {
//!         conn.execute("INSERT INTO asns (asn, name) VALUES (1, 'a')", []).is_ok()
//!     }),
//!     Box::new(|conn, ctx| {
//!         conn.execute("INSERT INTO asns (asn, name) VALUES (2, 'b')", []).is_ok()
//!     }),
//! ]);
//! ```
//!
//! ## Schema migration
//!
//! ```rust,ignore
//! engine.run_migration(
//!     || engine.schema_version().unwrap_or(0) < 2,
//!     || { /* apply DDL */ },
//!     || engine.schema_version().unwrap_or(0) == 2,
//!     || { /* undo */ },
//!     |outcome| println!("completed: {}", outcome.did_complete()),
//! );
//! ```

pub mod config;
pub mod connection;
pub mod executor;
pub mod migration;
pub mod paginate;
pub mod transaction;
pub mod version;

pub use config::EngineConfig;
pub use connection::{OpenMode, QueryEngine};
pub use executor::{BindHook, CompleteHook, QueryHooks, RowHook};
pub use migration::MigrationOutcome;
pub use transaction::{TxContext, TxOperation};

// The hook signatures are written against rusqlite's statement and row
// types; re-export the crate so callers don't need to pin a matching
// version themselves.
pub use rusqlite;
