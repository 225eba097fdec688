//! Migration workflow
//!
//! A four-stage workflow for schema migrations: check preconditions, run
//! the migration, verify it took effect, and roll back if it did not. The
//! stages are caller-supplied; the engine contributes the sequencing and
//! the guarantee that the completion hook fires exactly once on every path.

use tracing::debug;

use crate::connection::QueryEngine;

/// Final state of a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Preconditions held, the migration ran, and verification passed
    Completed,
    /// Preconditions did not hold; nothing was attempted
    Skipped,
    /// The migration ran but verification failed; rollback was invoked
    RolledBack,
}

impl MigrationOutcome {
    /// Whether the migration completed successfully
    ///
    /// `false` for both the skipped and the rolled-back paths.
    pub fn did_complete(self) -> bool {
        matches!(self, MigrationOutcome::Completed)
    }
}

impl QueryEngine {
    /// Run a migration through its full workflow
    ///
    /// Stages, in order:
    ///
    /// 1. `preconditions` — if it returns `false`, the workflow stops here
    ///    and none of the other stages run.
    /// 2. `migrate` — invoked unconditionally once preconditions pass; its
    ///    own outcome is not inspected.
    /// 3. `verify` — sole judge of success, invoked after `migrate`.
    /// 4. `rollback` — invoked exactly once if `verify` returned `false`.
    ///    Best-effort: it carries no success signal of its own.
    ///
    /// `on_complete` receives the outcome exactly once on every path, and
    /// the same outcome is returned to the caller.
    pub fn run_migration<P, M, V, R, C>(
        &self,
        preconditions: P,
        migrate: M,
        verify: V,
        rollback: R,
        on_complete: C,
    ) -> MigrationOutcome
    where
        P: FnOnce() -> bool,
        M: FnOnce(),
        V: FnOnce() -> bool,
        R: FnOnce(),
        C: FnOnce(MigrationOutcome),
    {
        let outcome = if !preconditions() {
            debug!("migration preconditions not met, skipping");
            MigrationOutcome::Skipped
        } else {
            debug!("migration preconditions met, migrating");
            migrate();
            if verify() {
                debug!("migration verified");
                MigrationOutcome::Completed
            } else {
                debug!("migration verification failed, rolling back");
                rollback();
                MigrationOutcome::RolledBack
            }
        };

        on_complete(outcome);
        outcome
    }
}
