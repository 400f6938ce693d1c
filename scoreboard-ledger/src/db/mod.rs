//! SQLite ledger store
//!
//! Durable home of the two ledger entities. Every other component reaches
//! them through [`LedgerDb`].
//!
//! ## Tables
//!
//! - `participants` - one aggregate row per handle (score, submission count,
//!   last submission timestamp)
//! - `submissions` - append-only record of every qualifying message
//!
//! ## Concurrency
//!
//! One writer connection behind a mutex serializes all writes. File-backed
//! databases also open a few read-only connections in WAL mode, so readers
//! see the last committed state and never wait on the writer.

pub mod participants;
pub mod schema;
pub mod submissions;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::LedgerError;

pub use participants::Participant;
pub use submissions::{SubmissionId, SubmissionRow, MAX_CONTENT_CHARS};

/// Layout of every stored timestamp. The date portion is everything before
/// the first space.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How long a statement waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// SQLite database for participants and submissions
pub struct LedgerDb {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
}

impl LedgerDb {
    /// Open or create the ledger database at `db_path` with `reader_count`
    /// read-only connections alongside the writer.
    pub fn open(db_path: &Path, reader_count: usize) -> Result<Self, LedgerError> {
        info!("Opening ledger database at {:?}", db_path);

        let writer = Connection::open(db_path)
            .map_err(|e| LedgerError::storage("Failed to open SQLite", e))?;

        writer
            .execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| LedgerError::storage("Failed to set PRAGMA", e))?;
        writer
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| LedgerError::storage("Failed to set busy timeout", e))?;

        // Schema must exist before read-only connections attach
        schema::init_schema(&writer)?;

        let mut readers = Vec::with_capacity(reader_count);
        for _ in 0..reader_count {
            let reader = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| LedgerError::storage("Failed to open reader connection", e))?;
            reader
                .busy_timeout(BUSY_TIMEOUT)
                .map_err(|e| LedgerError::storage("Failed to set busy timeout", e))?;
            readers.push(Mutex::new(reader));
        }

        debug!(reader_count, "Ledger database ready");

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
        })
    }

    /// Open an in-memory database (for testing). Reads share the writer.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        debug!("Opening in-memory ledger database");

        let conn = Connection::open_in_memory()
            .map_err(|e| LedgerError::storage("Failed to open in-memory SQLite", e))?;
        schema::init_schema(&conn)?;

        Ok(Self {
            writer: Mutex::new(conn),
            readers: Vec::new(),
            next_reader: AtomicUsize::new(0),
        })
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.writer
            .lock()
            .map_err(|e| LedgerError::Internal(format!("Lock poisoned: {}", e)))
    }

    /// Pick an idle reader, starting from a rotating offset. If every reader
    /// is busy, wait on the one at the offset.
    fn lock_reader(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        if self.readers.is_empty() {
            return self.lock_writer();
        }

        let len = self.readers.len();
        let start = self.next_reader.fetch_add(1, Ordering::Relaxed) % len;

        for offset in 0..len {
            match self.readers[(start + offset) % len].try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(e)) => {
                    return Err(LedgerError::Internal(format!("Lock poisoned: {}", e)))
                }
            }
        }

        self.readers[start]
            .lock()
            .map_err(|e| LedgerError::Internal(format!("Lock poisoned: {}", e)))
    }

    /// Run a read against the last committed state
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&Connection) -> Result<T, LedgerError>,
    {
        let conn = self.lock_reader()?;
        f(&conn)
    }

    /// Execute a write operation with exclusive access
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, LedgerError>,
    {
        let mut conn = self.lock_writer()?;
        f(&mut conn)
    }

    // =========================================================================
    // Ledger operations
    // =========================================================================

    pub fn get_participant(&self, handle: &str) -> Result<Option<Participant>, LedgerError> {
        self.with_conn(|conn| participants::get_participant(conn, handle))
    }

    /// Standalone participant upsert. The scoring path uses
    /// [`LedgerDb::record_submission`] instead, which pairs it with the
    /// submission row.
    pub fn upsert_participant_on_submission(
        &self,
        handle: &str,
        display_name: &str,
        award: u32,
        submitted_at: &DateTime<Utc>,
    ) -> Result<Participant, LedgerError> {
        validate_handle(handle)?;
        let ts = format_timestamp(submitted_at);
        self.with_conn_mut(|conn| {
            participants::upsert_on_submission(conn, handle, display_name, award, &ts)
        })
    }

    pub fn append_submission(
        &self,
        handle: &str,
        content: &str,
        submitted_at: &DateTime<Utc>,
    ) -> Result<SubmissionId, LedgerError> {
        validate_handle(handle)?;
        let ts = format_timestamp(submitted_at);
        self.with_conn_mut(|conn| submissions::append_submission(conn, handle, content, &ts))
    }

    /// Append the submission and bump the participant as one transaction.
    /// Either both rows change or neither does.
    pub fn record_submission(
        &self,
        handle: &str,
        display_name: &str,
        content: &str,
        award: u32,
        submitted_at: &DateTime<Utc>,
    ) -> Result<(SubmissionId, Participant), LedgerError> {
        validate_handle(handle)?;
        let ts = format_timestamp(submitted_at);

        self.with_conn_mut(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| LedgerError::storage("Transaction failed", e))?;

            let submission_id = submissions::append_submission(&tx, handle, content, &ts)?;
            let participant =
                participants::upsert_on_submission(&tx, handle, display_name, award, &ts)?;

            tx.commit()
                .map_err(|e| LedgerError::storage("Commit failed", e))?;

            Ok((submission_id, participant))
        })
    }

    pub fn list_ranked(&self, limit: Option<u32>) -> Result<Vec<Participant>, LedgerError> {
        self.with_conn(|conn| participants::list_ranked(conn, limit))
    }

    pub fn list_submissions(&self, handle: &str) -> Result<Vec<SubmissionRow>, LedgerError> {
        self.with_conn(|conn| submissions::list_submissions(conn, handle))
    }

    pub fn count_submissions(&self, handle: &str) -> Result<u64, LedgerError> {
        self.with_conn(|conn| submissions::count_submissions(conn, handle))
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, LedgerError> {
        self.with_conn(|conn| {
            let participant_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM participants", [], |row| row.get(0))
                .map_err(|e| LedgerError::storage("Query failed", e))?;

            let submission_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM submissions", [], |row| row.get(0))
                .map_err(|e| LedgerError::storage("Query failed", e))?;

            Ok(DbStats {
                participant_count: participant_count as u64,
                submission_count: submission_count as u64,
            })
        })
    }

    /// Compare every participant aggregate against its submission rows.
    ///
    /// Returns one entry per participant whose count disagrees with its
    /// rows or whose score is not `total_submissions * award`, plus one per
    /// handle that has submissions but no participant row.
    pub fn check_consistency(&self, award: u32) -> Result<Vec<ConsistencyIssue>, LedgerError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT p.handle, p.score, p.total_submissions,
                           (SELECT COUNT(*) FROM submissions s
                            WHERE s.participant_handle = p.handle)
                    FROM participants p
                    UNION ALL
                    SELECT s.participant_handle, NULL, NULL, COUNT(*)
                    FROM submissions s
                    WHERE NOT EXISTS (
                        SELECT 1 FROM participants p WHERE p.handle = s.participant_handle
                    )
                    GROUP BY s.participant_handle
                    "#,
                )
                .map_err(|e| LedgerError::storage("Prepare failed", e))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })
                .map_err(|e| LedgerError::storage("Query failed", e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| LedgerError::storage("Row parse failed", e))?;

            let mut issues = Vec::new();
            for (handle, score, total, rows_found) in rows {
                let rows_found = rows_found as u64;
                match (score, total) {
                    (Some(score), Some(total)) => {
                        let (score, total) = (score as u64, total as u64);
                        if total != rows_found || score != total * u64::from(award) {
                            issues.push(ConsistencyIssue {
                                handle,
                                score: Some(score),
                                total_submissions: Some(total),
                                submission_rows: rows_found,
                            });
                        }
                    }
                    _ => issues.push(ConsistencyIssue {
                        handle,
                        score: None,
                        total_submissions: None,
                        submission_rows: rows_found,
                    }),
                }
            }

            Ok(issues)
        })
    }
}

fn validate_handle(handle: &str) -> Result<(), LedgerError> {
    if handle.trim().is_empty() {
        return Err(LedgerError::InvalidInput("participant handle is empty".to_string()));
    }
    Ok(())
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub participant_count: u64,
    pub submission_count: u64,
}

/// A participant whose aggregate disagrees with the submission rows.
/// `score`/`total_submissions` are `None` for submissions with no
/// participant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyIssue {
    pub handle: String,
    pub score: Option<u64>,
    pub total_submissions: Option<u64>,
    pub submission_rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, hour, 15, 0).unwrap()
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(&at(9)), "2024-05-06 09:15:00");
    }

    #[test]
    fn test_record_submission_writes_both_rows() {
        let db = LedgerDb::open_in_memory().unwrap();

        let (id, participant) = db
            .record_submission("alice", "Alice", "#tag hello", 1, &at(9))
            .unwrap();
        assert!(id > 0);
        assert_eq!(participant.score, 1);
        assert_eq!(participant.total_submissions, 1);

        let rows = db.list_submissions("alice").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, "#tag hello");
        assert_eq!(rows[0].submitted_at, "2024-05-06 09:15:00");

        let stats = db.stats().unwrap();
        assert_eq!(stats.participant_count, 1);
        assert_eq!(stats.submission_count, 1);
    }

    #[test]
    fn test_empty_handle_rejected_without_writes() {
        let db = LedgerDb::open_in_memory().unwrap();

        let err = db.record_submission("  ", "Nobody", "#tag", 1, &at(9)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert!(db.append_submission("", "x", &at(9)).is_err());
        assert_eq!(db.stats().unwrap().submission_count, 0);
    }

    #[test]
    fn test_failed_upsert_rolls_back_submission() {
        let db = LedgerDb::open_in_memory().unwrap();

        // Break the participants table so the second statement fails
        db.with_conn_mut(|conn| {
            conn.execute_batch("DROP TABLE participants;")
                .map_err(|e| LedgerError::storage("drop", e))
        })
        .unwrap();

        let err = db.record_submission("alice", "Alice", "#tag", 1, &at(9)).unwrap_err();
        assert!(matches!(err, LedgerError::StorageUnavailable(_)));
        assert_eq!(db.count_submissions("alice").unwrap(), 0);
    }

    #[test]
    fn test_check_consistency_flags_drift() {
        let db = LedgerDb::open_in_memory().unwrap();
        db.record_submission("alice", "Alice", "#tag", 1, &at(9)).unwrap();
        db.record_submission("bob", "Bob", "#tag", 1, &at(10)).unwrap();
        assert!(db.check_consistency(1).unwrap().is_empty());

        // Orphan submission and a participant bumped without a row
        db.append_submission("carol", "#tag", &at(11)).unwrap();
        db.upsert_participant_on_submission("bob", "Bob", 1, &at(12)).unwrap();

        let mut issues = db.check_consistency(1).unwrap();
        issues.sort_by(|a, b| a.handle.cmp(&b.handle));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].handle, "bob");
        assert_eq!(issues[0].total_submissions, Some(2));
        assert_eq!(issues[0].submission_rows, 1);
        assert_eq!(issues[1].handle, "carol");
        assert_eq!(issues[1].score, None);
    }
}
