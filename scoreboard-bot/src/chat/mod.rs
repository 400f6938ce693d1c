//! Chat surface: transport-neutral messages, commands and reply text
//!
//! The Telegram adapter turns updates into [`InboundMessage`]s and sends
//! whatever [`OutboundReply`] the [`Dispatcher`] produces through a
//! [`ReplySink`].

pub mod commands;
pub mod dispatcher;
pub mod format;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use commands::Command;
pub use dispatcher::Dispatcher;

/// A text message received from the chat platform
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub message_id: i64,
    /// Group or supergroup; only these are scored
    pub chat_is_group: bool,
    pub sender_handle: String,
    pub sender_display_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Text to send back, threaded under the message that triggered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub chat_id: i64,
    pub reply_to_message_id: Option<i64>,
    pub text: String,
}

/// Where replies go
#[async_trait]
pub trait ReplySink: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn send_reply(&self, reply: &OutboundReply) -> Result<(), Self::Error>;
}
