//! Database schema definitions

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::LedgerError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<(), LedgerError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new ledger schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(LedgerError::Internal(format!(
            "Ledger schema v{} is newer than supported v{}",
            current_version, SCHEMA_VERSION
        )));
    } else {
        info!("Ledger schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, LedgerError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .map_err(|e| LedgerError::storage("Failed to create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|e| LedgerError::storage("Failed to read schema_version", e))?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), LedgerError> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| LedgerError::storage("Failed to clear schema_version", e))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])
        .map_err(|e| LedgerError::storage("Failed to set schema_version", e))?;
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<(), LedgerError> {
    conn.execute_batch(PARTICIPANTS_SCHEMA)
        .map_err(|e| LedgerError::storage("Failed to create participants table", e))?;

    conn.execute_batch(SUBMISSIONS_SCHEMA)
        .map_err(|e| LedgerError::storage("Failed to create submissions table", e))?;

    conn.execute_batch(INDEXES_SCHEMA)
        .map_err(|e| LedgerError::storage("Failed to create indexes", e))?;

    Ok(())
}

const PARTICIPANTS_SCHEMA: &str = r#"
-- One row per handle. The autoincrement id doubles as creation order,
-- which is the leaderboard tiebreak.
CREATE TABLE IF NOT EXISTS participants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    handle TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    score INTEGER NOT NULL DEFAULT 0,
    last_submission_at TEXT,
    total_submissions INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

const SUBMISSIONS_SCHEMA: &str = r#"
-- Append-only. participant_handle is a logical reference; no cascade.
CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    participant_handle TEXT NOT NULL,
    content TEXT NOT NULL,
    submitted_at TEXT NOT NULL
);
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_submissions_handle ON submissions(participant_handle);
CREATE INDEX IF NOT EXISTS idx_participants_rank ON participants(score DESC, id ASC);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let version: i32 = conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_tables_exist() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        for table in ["participants", "submissions"] {
            let found: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(found, 1, "missing table {}", table);
        }
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        set_schema_version(&conn, SCHEMA_VERSION + 1).unwrap();

        let err = init_schema(&conn).unwrap_err();
        assert!(matches!(err, LedgerError::Internal(_)));
    }
}
