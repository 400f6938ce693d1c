//! Submission rows: append-only record of every qualifying message

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Stored content is cut to this many characters (Unicode scalar values).
pub const MAX_CONTENT_CHARS: usize = 500;

/// Synthetic identity of a submission row
pub type SubmissionId = i64;

/// Submission row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub id: SubmissionId,
    pub participant_handle: String,
    pub content: String,
    pub submitted_at: String,
}

impl SubmissionRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            participant_handle: row.get("participant_handle")?,
            content: row.get("content")?,
            submitted_at: row.get("submitted_at")?,
        })
    }
}

/// First `MAX_CONTENT_CHARS` characters of `text`, borrowed.
pub fn truncate_content(text: &str) -> &str {
    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Append a submission. Content is truncated before storage.
pub fn append_submission(
    conn: &Connection,
    handle: &str,
    content: &str,
    submitted_at: &str,
) -> Result<SubmissionId, LedgerError> {
    conn.execute(
        "INSERT INTO submissions (participant_handle, content, submitted_at) VALUES (?, ?, ?)",
        params![handle, truncate_content(content), submitted_at],
    )
    .map_err(|e| LedgerError::storage("Submission insert failed", e))?;

    Ok(conn.last_insert_rowid())
}

/// Submissions for a handle, oldest first
pub fn list_submissions(
    conn: &Connection,
    handle: &str,
) -> Result<Vec<SubmissionRow>, LedgerError> {
    let mut stmt = conn
        .prepare("SELECT * FROM submissions WHERE participant_handle = ? ORDER BY id ASC")
        .map_err(|e| LedgerError::storage("Prepare failed", e))?;

    let rows = stmt
        .query_map(params![handle], |row| SubmissionRow::from_row(row))
        .map_err(|e| LedgerError::storage("Query failed", e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LedgerError::storage("Row parse failed", e))?;

    Ok(rows)
}

pub fn count_submissions(conn: &Connection, handle: &str) -> Result<u64, LedgerError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM submissions WHERE participant_handle = ?",
            params![handle],
            |row| row.get(0),
        )
        .map_err(|e| LedgerError::storage("Query failed", e))?;

    Ok(count as u64)
}
