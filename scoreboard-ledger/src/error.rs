//! Error types for scoreboard-ledger

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The database could not be opened, read or written. The operation was
    /// rolled back and no partial state is visible.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub(crate) fn storage(context: &str, err: rusqlite::Error) -> Self {
        LedgerError::StorageUnavailable(format!("{}: {}", context, err))
    }
}
