//! Participant rows: one aggregate per handle

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Participant row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Creation order; ties on score rank the lower id first
    pub id: i64,
    pub handle: String,
    pub display_name: String,
    pub score: u64,
    pub total_submissions: u64,
    pub last_submission_at: Option<String>,
    pub created_at: String,
}

impl Participant {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            handle: row.get("handle")?,
            display_name: row.get("display_name")?,
            score: row.get::<_, i64>("score")? as u64,
            total_submissions: row.get::<_, i64>("total_submissions")? as u64,
            last_submission_at: row.get("last_submission_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Get participant by handle
pub fn get_participant(
    conn: &Connection,
    handle: &str,
) -> Result<Option<Participant>, LedgerError> {
    conn.query_row(
        "SELECT * FROM participants WHERE handle = ?",
        params![handle],
        |row| Participant::from_row(row),
    )
    .optional()
    .map_err(|e| LedgerError::storage("Participant lookup failed", e))
}

/// Create or bump a participant in one statement.
///
/// A new handle starts at `award` points and one submission. An existing
/// handle gains `award` points and one submission. Either way the last
/// submission timestamp and display name take the supplied values.
pub fn upsert_on_submission(
    conn: &Connection,
    handle: &str,
    display_name: &str,
    award: u32,
    submitted_at: &str,
) -> Result<Participant, LedgerError> {
    conn.execute(
        r#"
        INSERT INTO participants
            (handle, display_name, score, last_submission_at, total_submissions)
        VALUES (?1, ?2, ?3, ?4, 1)
        ON CONFLICT(handle) DO UPDATE SET
            score = score + excluded.score,
            total_submissions = total_submissions + 1,
            last_submission_at = excluded.last_submission_at,
            display_name = excluded.display_name
        "#,
        params![handle, display_name, award as i64, submitted_at],
    )
    .map_err(|e| LedgerError::storage("Participant upsert failed", e))?;

    get_participant(conn, handle)?.ok_or_else(|| {
        LedgerError::Internal(format!("Participant {} not found after upsert", handle))
    })
}

/// Participants by score descending, creation order on ties.
/// `None` returns every participant.
pub fn list_ranked(conn: &Connection, limit: Option<u32>) -> Result<Vec<Participant>, LedgerError> {
    // SQLite reads a negative LIMIT as "no limit"
    let limit: i64 = limit.map(i64::from).unwrap_or(-1);

    let mut stmt = conn
        .prepare("SELECT * FROM participants ORDER BY score DESC, id ASC LIMIT ?")
        .map_err(|e| LedgerError::storage("Prepare failed", e))?;

    let rows = stmt
        .query_map(params![limit], |row| Participant::from_row(row))
        .map_err(|e| LedgerError::storage("Query failed", e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LedgerError::storage("Row parse failed", e))?;

    Ok(rows)
}
