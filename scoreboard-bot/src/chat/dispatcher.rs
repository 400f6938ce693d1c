//! Routes inbound chat messages to commands or the scoring engine

use std::sync::Arc;

use scoreboard_ledger::{
    Leaderboard, LedgerError, ScoringEngine, ScoringEvent, ScoringOutcome,
};
use tracing::{debug, error};

use super::commands::Command;
use super::format;
use super::{InboundMessage, OutboundReply};

pub struct Dispatcher {
    engine: Arc<ScoringEngine>,
    leaderboard: Arc<Leaderboard>,
    scoreboard_limit: u32,
    bot_username: Option<String>,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<ScoringEngine>,
        leaderboard: Arc<Leaderboard>,
        scoreboard_limit: u32,
        bot_username: Option<String>,
    ) -> Self {
        Self {
            engine,
            leaderboard,
            scoreboard_limit,
            bot_username,
        }
    }

    /// Decide the reply for one message, if any.
    ///
    /// Commands are answered in every chat and never scored. Other text is
    /// scored only in groups; unmarked text gets no reply.
    pub async fn handle(&self, message: &InboundMessage) -> Option<OutboundReply> {
        let text = match Command::parse(&message.text, self.bot_username.as_deref()) {
            Some(Command::Help) => Some(format::help_text(self.engine.policy())),
            Some(Command::Scoreboard) => Some(self.scoreboard().await),
            Some(Command::Ignored) => None,
            None if message.chat_is_group => self.score(message).await,
            None => None,
        }?;

        Some(OutboundReply {
            chat_id: message.chat_id,
            reply_to_message_id: Some(message.message_id),
            text,
        })
    }

    async fn score(&self, message: &InboundMessage) -> Option<String> {
        let engine = self.engine.clone();
        let event = ScoringEvent {
            sender_handle: message.sender_handle.clone(),
            sender_display_name: message.sender_display_name.clone(),
            text: message.text.clone(),
            timestamp: message.timestamp,
        };

        let result = tokio::task::spawn_blocking(move || engine.score(&event))
            .await
            .unwrap_or_else(|e| {
                Err(LedgerError::Internal(format!("Scoring task failed: {}", e)))
            });

        match result {
            Ok(ScoringOutcome::Recorded(receipt)) => Some(format::submission_reply(&receipt)),
            Ok(ScoringOutcome::Skipped) => {
                debug!(chat_id = message.chat_id, "No marker in group message");
                None
            }
            Err(e) => {
                error!(handle = %message.sender_handle, error = %e, "Failed to record report");
                Some(format::SUBMISSION_FAILED.to_string())
            }
        }
    }

    async fn scoreboard(&self) -> String {
        let leaderboard = self.leaderboard.clone();
        let limit = self.scoreboard_limit;

        let result = tokio::task::spawn_blocking(move || leaderboard.top_n(limit))
            .await
            .unwrap_or_else(|e| {
                Err(LedgerError::Internal(format!("Leaderboard task failed: {}", e)))
            });

        match result {
            Ok(entries) => format::scoreboard_text(&entries, self.engine.policy().award),
            Err(e) => {
                error!(error = %e, "Failed to load scoreboard");
                format::SCOREBOARD_FAILED.to_string()
            }
        }
    }
}
