//! Telegram transport: Bot API client, wire types and the long-poll loop

pub mod client;
pub mod poller;
pub mod types;

use chrono::{DateTime, Utc};

pub use client::{TelegramClient, TelegramError};
pub use poller::Poller;

use crate::chat::InboundMessage;
use types::{Message, User};

/// Display name used when Telegram sends an empty first name
pub const UNNAMED: &str = "Unnamed";

/// Stable handle: the username, or `user<id>` for accounts without one
pub fn sender_handle(user: &User) -> String {
    match user.username.as_deref() {
        Some(username) if !username.is_empty() => username.to_string(),
        _ => format!("user{}", user.id),
    }
}

pub fn sender_display_name(user: &User) -> String {
    let mut name = if user.first_name.is_empty() {
        UNNAMED.to_string()
    } else {
        user.first_name.clone()
    };
    if let Some(last) = user.last_name.as_deref().filter(|l| !l.is_empty()) {
        name.push(' ');
        name.push_str(last);
    }
    name
}

/// Convert a Bot API message into the transport-neutral form. Messages
/// without text or without a sender are dropped.
pub fn inbound_message(message: &Message) -> Option<InboundMessage> {
    let user = message.from.as_ref()?;
    let text = message.text.as_ref()?;

    Some(InboundMessage {
        chat_id: message.chat.id,
        message_id: message.message_id,
        chat_is_group: message.chat.kind.is_group(),
        sender_handle: sender_handle(user),
        sender_display_name: sender_display_name(user),
        text: text.clone(),
        timestamp: DateTime::<Utc>::from_timestamp(message.date, 0).unwrap_or_else(Utc::now),
    })
}
