//! Reply text for chat. Pure functions over ledger results.

use std::fmt::Write;

use scoreboard_ledger::{ParticipantSummary, ScoringPolicy, SubmissionReceipt};

pub const SUBMISSION_FAILED: &str = "❌ Failed to record your report. Please try again later.";
pub const SCOREBOARD_FAILED: &str = "❌ Failed to load the scoreboard.";
pub const SCOREBOARD_EMPTY: &str = "📭 No reports have been recorded yet!";

fn medal(rank: u32) -> &'static str {
    match rank {
        1 => "🥇 ",
        2 => "🥈 ",
        3 => "🥉 ",
        _ => "",
    }
}

/// Confirmation for a recorded report
pub fn submission_reply(receipt: &SubmissionReceipt) -> String {
    format!(
        "✅ Report recorded\n\
         👤 {name}\n\
         ⭐ +{award} point{plural}\n\
         📊 Total: {score} points\n\
         📅 {date}\n\
         \n\
         🏆 /scoreboard",
        name = receipt.participant.display_name,
        award = receipt.award,
        plural = if receipt.award == 1 { "" } else { "s" },
        score = receipt.participant.score,
        date = receipt.recorded_date(),
    )
}

/// Ranked listing for the `/scoreboard` command
pub fn scoreboard_text(entries: &[ParticipantSummary], award: u32) -> String {
    if entries.is_empty() {
        return SCOREBOARD_EMPTY.to_string();
    }

    let mut text = String::from("🏆 Scoreboard 🏆\n");
    let plural = if award == 1 { "" } else { "s" };
    let _ = writeln!(text, "🎯 Each report = {} point{}\n", award, plural);

    for entry in entries {
        let _ = writeln!(text, "{}{}. {}", medal(entry.rank), entry.rank, entry.display_name);
        let _ = writeln!(text, "   ⭐ {} points", entry.score);
        let _ = writeln!(text, "   📊 {} reports", entry.total_submissions);
        if let Some(date) = &entry.last_submission_date {
            let _ = writeln!(text, "   📅 {}", date);
        }
        text.push('\n');
    }

    text.trim_end().to_string()
}

/// Usage text for `/start` and `/help`
pub fn help_text(policy: &ScoringPolicy) -> String {
    format!(
        "🤖 Mentoring report bot\n\
         \n\
         📝 Every message tagged {marker} = {award} point{plural}\n\
         \n\
         📋 Commands:\n\
         /scoreboard - show the scoreboard\n\
         /help - this help\n\
         \n\
         🎯 How to use:\n\
         Post in the group:\n\
         {marker}\n\
         [your report text]",
        marker = policy.marker,
        award = policy.award,
        plural = if policy.award == 1 { "" } else { "s" },
    )
}
