//! Ranked leaderboard views over the ledger

use std::sync::Arc;

use serde::Serialize;

use crate::db::{LedgerDb, Participant};
use crate::error::LedgerError;

/// Shown where a participant has no submission date
pub const NO_DATE_LABEL: &str = "---";

/// One leaderboard line. Ranks are positional: 1-based, contiguous, and
/// tied scores still get distinct ranks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    pub rank: u32,
    pub display_name: String,
    pub handle: String,
    pub score: u64,
    pub total_submissions: u64,
    /// `YYYY-MM-DD` of the last submission
    pub last_submission_date: Option<String>,
}

impl ParticipantSummary {
    fn ranked(rank: u32, participant: Participant) -> Self {
        let last_submission_date = participant
            .last_submission_at
            .as_deref()
            .and_then(|ts| ts.split_whitespace().next())
            .map(str::to_string);

        Self {
            rank,
            display_name: participant.display_name,
            handle: participant.handle,
            score: participant.score,
            total_submissions: participant.total_submissions,
            last_submission_date,
        }
    }

    pub fn last_submission_label(&self) -> &str {
        self.last_submission_date.as_deref().unwrap_or(NO_DATE_LABEL)
    }
}

/// Totals across every participant in a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeaderboardStats {
    pub participant_count: u64,
    pub total_submissions: u64,
    pub total_score: u64,
}

/// Full listing plus totals, both from the same read
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardSnapshot {
    pub entries: Vec<ParticipantSummary>,
    pub stats: LeaderboardStats,
}

pub struct Leaderboard {
    db: Arc<LedgerDb>,
}

impl Leaderboard {
    pub fn new(db: Arc<LedgerDb>) -> Self {
        Self { db }
    }

    /// Up to `n` entries, best first
    pub fn top_n(&self, n: u32) -> Result<Vec<ParticipantSummary>, LedgerError> {
        self.list(Some(n))
    }

    /// Every participant with aggregate totals
    pub fn full(&self) -> Result<LeaderboardSnapshot, LedgerError> {
        // A single SELECT is one snapshot, so totals come from its rows
        let entries = self.list(None)?;

        let stats = entries.iter().fold(
            LeaderboardStats {
                participant_count: entries.len() as u64,
                ..Default::default()
            },
            |mut acc, entry| {
                acc.total_submissions += entry.total_submissions;
                acc.total_score += entry.score;
                acc
            },
        );

        Ok(LeaderboardSnapshot { entries, stats })
    }

    fn list(&self, limit: Option<u32>) -> Result<Vec<ParticipantSummary>, LedgerError> {
        let participants = self.db.list_ranked(limit)?;

        Ok(participants
            .into_iter()
            .zip(1u32..)
            .map(|(participant, rank)| ParticipantSummary::ranked(rank, participant))
            .collect())
    }
}
