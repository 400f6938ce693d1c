//! Scoring engine: one qualifying message becomes one ledger update

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::{format_timestamp, submissions, LedgerDb, Participant, SubmissionId};
use crate::error::LedgerError;

/// Hashtag the mentoring group uses for weekly reports
pub const DEFAULT_MARKER: &str = "#گزارش_هفتگی";

/// Points granted per qualifying message
pub const DEFAULT_AWARD: u32 = 1;

/// What qualifies a message and what it is worth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringPolicy {
    /// Case-sensitive substring that must appear somewhere in the text
    pub marker: String,
    pub award: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            award: DEFAULT_AWARD,
        }
    }
}

impl ScoringPolicy {
    pub fn qualifies(&self, text: &str) -> bool {
        text.contains(self.marker.as_str())
    }
}

/// An inbound chat message, already filtered to group chats
#[derive(Debug, Clone)]
pub struct ScoringEvent {
    pub sender_handle: String,
    pub sender_display_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of a recorded submission, enough for the reply formatter
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub submission_id: SubmissionId,
    pub participant: Participant,
    pub award: u32,
    pub recorded_at: String,
}

impl SubmissionReceipt {
    /// Date portion of the recorded timestamp
    pub fn recorded_date(&self) -> &str {
        self.recorded_at.split(' ').next().unwrap_or(&self.recorded_at)
    }
}

#[derive(Debug, Clone)]
pub enum ScoringOutcome {
    /// The text carried no marker; nothing was written
    Skipped,
    Recorded(SubmissionReceipt),
}

/// Applies a [`ScoringPolicy`] to inbound events against the ledger.
///
/// Not idempotent: the same text sent twice is two submissions.
pub struct ScoringEngine {
    db: Arc<LedgerDb>,
    policy: ScoringPolicy,
}

impl ScoringEngine {
    pub fn new(db: Arc<LedgerDb>, policy: ScoringPolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn score(&self, event: &ScoringEvent) -> Result<ScoringOutcome, LedgerError> {
        if !self.policy.qualifies(&event.text) {
            debug!(handle = %event.sender_handle, "Message has no marker, skipping");
            return Ok(ScoringOutcome::Skipped);
        }

        let content = submissions::truncate_content(&event.text);
        let (submission_id, participant) = self.db.record_submission(
            &event.sender_handle,
            &event.sender_display_name,
            content,
            self.policy.award,
            &event.timestamp,
        )?;

        info!(
            handle = %participant.handle,
            submission_id,
            score = participant.score,
            total = participant.total_submissions,
            "Submission recorded"
        );

        Ok(ScoringOutcome::Recorded(SubmissionReceipt {
            submission_id,
            participant,
            award: self.policy.award,
            recorded_at: format_timestamp(&event.timestamp),
        }))
    }
}
