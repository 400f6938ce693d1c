//! Scoreboard ledger
//!
//! Core bookkeeping for the mentoring scoreboard:
//!
//! - **Ledger store** (`db`): SQLite tables for participants and their
//!   append-only submissions, single writer and pooled readers
//! - **Scoring engine** (`scoring`): marker check, fixed award, one atomic
//!   ledger update per qualifying message
//! - **Leaderboard** (`leaderboard`): positional ranking by score with
//!   creation-order tiebreak, plus listing totals
//!
//! Transport and presentation live in `scoreboard-bot`.

pub mod db;
pub mod error;
pub mod leaderboard;
pub mod scoring;

pub use db::{ConsistencyIssue, DbStats, LedgerDb, Participant, SubmissionId, SubmissionRow};
pub use error::LedgerError;
pub use leaderboard::{Leaderboard, LeaderboardSnapshot, LeaderboardStats, ParticipantSummary};
pub use scoring::{ScoringEngine, ScoringEvent, ScoringOutcome, ScoringPolicy, SubmissionReceipt};
