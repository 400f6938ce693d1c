//! Configuration for the scoreboard bot
//!
//! CLI arguments with environment variable fallbacks using clap. A `.env`
//! file in the working directory is loaded before parsing.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use scoreboard_ledger::scoring::{DEFAULT_AWARD, DEFAULT_MARKER};
use scoreboard_ledger::ScoringPolicy;

/// Token value shipped in sample configs; never valid
pub const PLACEHOLDER_TOKEN: &str = "YOUR_BOT_TOKEN_HERE";

/// Mentoring report scoreboard: Telegram bot plus web leaderboard
#[derive(Parser, Debug, Clone)]
#[command(name = "scoreboard-bot")]
#[command(about = "Scores tagged weekly reports in a Telegram group and serves a leaderboard")]
pub struct Args {
    /// Telegram bot token from @BotFather
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: String,

    /// Address the web leaderboard listens on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "scoreboard.db")]
    pub database_path: PathBuf,

    /// Read-only connections opened next to the writer
    #[arg(long, env = "READER_CONNECTIONS", default_value = "4")]
    pub reader_connections: usize,

    /// Substring a message must contain to count as a report
    #[arg(long, env = "REPORT_MARKER", default_value = DEFAULT_MARKER)]
    pub report_marker: String,

    /// Points awarded per report
    #[arg(long, env = "POINTS_PER_REPORT", default_value_t = DEFAULT_AWARD)]
    pub points_per_report: u32,

    /// Entries shown by the /scoreboard command
    #[arg(long, env = "SCOREBOARD_LIMIT", default_value = "15")]
    pub scoreboard_limit: u32,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// Long-poll timeout for getUpdates, in seconds
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value = "30")]
    pub poll_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let token = self.token.trim();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            return Err("TOKEN must be set to the bot token issued by @BotFather".to_string());
        }

        if self.report_marker.is_empty() {
            return Err("REPORT_MARKER must not be empty".to_string());
        }

        if self.points_per_report == 0 {
            return Err("POINTS_PER_REPORT must be at least 1".to_string());
        }

        if self.scoreboard_limit == 0 {
            return Err("SCOREBOARD_LIMIT must be at least 1".to_string());
        }

        Ok(())
    }

    pub fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            marker: self.report_marker.clone(),
            award: self.points_per_report,
        }
    }
}
