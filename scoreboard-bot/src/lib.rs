//! scoreboard-bot: Telegram bot and web leaderboard for mentoring reports
//!
//! Group members post weekly reports tagged with a marker hashtag. Each
//! tagged message is recorded by `scoreboard-ledger` and earns a fixed
//! number of points. Two read surfaces expose the ranking:
//!
//! - `/scoreboard` in chat (top entries)
//! - an auto-refreshing web page served by the dashboard router

pub mod chat;
pub mod config;
pub mod dashboard;
pub mod telegram;
