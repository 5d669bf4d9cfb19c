//! Schema migrations driven by SQLite's `user_version` pragma.
//!
//! The database header's `user_version` records how many migrations have
//! been applied; the slice index of a migration is the schema version it
//! upgrades from. The runner applies everything past the recorded mark,
//! one transaction per step, bumping the version inside that same
//! transaction — a failed step leaves both the schema and the version
//! untouched.

use rusqlite::Connection;
use thiserror::Error;

/// Migration SQL in application order, embedded at compile time. New
/// migrations are appended here.
const MIGRATIONS: &[&str] = &[include_str!("migrations/000_events.sql")];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The database was written by a newer build than this one.
    #[error("database schema version {found} is newer than this build supports ({supported})")]
    VersionTooNew { found: i64, supported: i64 },

    /// Applying one migration step failed; nothing from that step was kept.
    #[error("migration to schema version {version} failed: {source}")]
    Apply {
        version: i64,
        source: rusqlite::Error,
    },

    /// Reading the schema version failed.
    #[error("failed to read schema version: {0}")]
    Version(#[from] rusqlite::Error),
}

/// Brings the schema up to date, returning how many migrations ran.
///
/// Already-applied migrations are skipped by version, so running this any
/// number of times produces the same schema.
///
/// # Errors
///
/// Returns `MigrationError` if the version cannot be read, is ahead of
/// this build, or a migration step fails.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    apply_pending(conn, MIGRATIONS)
}

fn apply_pending(conn: &Connection, migrations: &[&str]) -> Result<usize, MigrationError> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    let supported = migrations.len() as i64;
    if version > supported {
        return Err(MigrationError::VersionTooNew {
            found: version,
            supported,
        });
    }

    for (index, sql) in migrations.iter().enumerate().skip(version as usize) {
        let target = index as i64 + 1;
        apply_step(conn, sql, target)
            .map_err(|source| MigrationError::Apply { version: target, source })?;
        tracing::info!(version = target, "migrated event log schema");
    }

    Ok((supported - version) as usize)
}

fn apply_step(conn: &Connection, sql: &str, target: i64) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    // The version bump commits atomically with the step's DDL.
    tx.pragma_update(None, "user_version", target)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn version_of(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .expect("should read user_version")
    }

    #[test]
    fn fresh_database_migrates_to_current_version() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");

        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, 1);
        assert_eq!(version_of(&conn), 1);
    }

    #[test]
    fn second_run_applies_nothing() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");

        run_migrations(&conn).expect("first run should succeed");
        let applied = run_migrations(&conn).expect("second run should succeed");
        assert_eq!(applied, 0);
        assert_eq!(version_of(&conn), 1);
    }

    #[test]
    fn events_table_has_expected_columns() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        run_migrations(&conn).expect("migrations should succeed");

        let mut stmt = conn
            .prepare("SELECT name FROM pragma_table_info('events') ORDER BY cid")
            .expect("should prepare table_info query");
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("should query table_info")
            .map(|r| r.expect("should read column name"))
            .collect();

        assert_eq!(
            columns,
            vec![
                "sequence_number",
                "occurred_at",
                "event_type",
                "payload",
                "metadata"
            ]
        );
    }

    #[test]
    fn events_table_uses_autoincrement() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        run_migrations(&conn).expect("migrations should succeed");

        // AUTOINCREMENT keeps sequence numbers monotonic and never reused.
        let sql: String = conn
            .query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'events'",
                [],
                |row| row.get(0),
            )
            .expect("should read table DDL");
        assert!(
            sql.contains("AUTOINCREMENT"),
            "events table must use AUTOINCREMENT: {sql}"
        );
    }

    #[test]
    fn failed_step_leaves_schema_and_version_untouched() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        let steps = [
            "CREATE TABLE first (id INTEGER PRIMARY KEY);",
            // The second statement fails after the first has taken effect
            // inside the step's transaction.
            "CREATE TABLE second (id INTEGER PRIMARY KEY);
             INSERT INTO no_such_table VALUES (1);",
        ];

        let err = apply_pending(&conn, &steps).expect_err("broken step should fail");
        match err {
            MigrationError::Apply { version, .. } => assert_eq!(version, 2),
            other => panic!("unexpected error type: {other:?}"),
        }

        assert_eq!(version_of(&conn), 1, "only the good step may be recorded");
        let second_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'second')",
                [],
                |row| row.get(0),
            )
            .expect("should query sqlite_master");
        assert!(!second_exists, "the failed step's DDL must be rolled back");
    }

    #[test]
    fn database_from_a_newer_build_is_rejected() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.pragma_update(None, "user_version", 7)
            .expect("should set user_version");

        let err = run_migrations(&conn).expect_err("newer schema should be rejected");
        assert!(matches!(
            err,
            MigrationError::VersionTooNew {
                found: 7,
                supported: 1
            }
        ));
    }
}
