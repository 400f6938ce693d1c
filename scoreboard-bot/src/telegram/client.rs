//! Minimal Telegram Bot API client over HTTPS

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::types::{ApiResponse, GetUpdates, SendMessage, Update, User};
use crate::chat::{OutboundReply, ReplySink};

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error {code:?}: {description}")]
    Api { code: Option<i64>, description: String },

    #[error("Telegram API returned ok without a result")]
    EmptyResult,
}

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout_secs: u64) -> Result<Self, TelegramError> {
        // Leave room above the long-poll window before the request times out
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .user_agent(concat!("scoreboard-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            poll_timeout_secs,
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let response: ApiResponse<T> = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(TelegramError::Api {
                code: response.error_code,
                description: response.description.unwrap_or_default(),
            });
        }

        response.result.ok_or(TelegramError::EmptyResult)
    }

    /// Identity of the bot behind the token
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdates {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: vec!["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;
        debug!(count = updates.len(), offset, "Fetched updates");
        Ok(updates)
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<(), TelegramError> {
        let request = SendMessage {
            chat_id,
            text,
            reply_to_message_id,
            parse_mode: None,
        };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }
}

#[async_trait]
impl ReplySink for TelegramClient {
    type Error = TelegramError;

    async fn send_reply(&self, reply: &OutboundReply) -> Result<(), TelegramError> {
        self.send_message(reply.chat_id, &reply.text, reply.reply_to_message_id).await
    }
}
