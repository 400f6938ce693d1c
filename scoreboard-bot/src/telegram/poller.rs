//! Long-poll loop: fetch updates, dispatch, send replies

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::client::TelegramClient;
use super::inbound_message;
use super::types::Update;
use crate::chat::{Dispatcher, ReplySink};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

pub struct Poller<S: ReplySink> {
    client: Arc<TelegramClient>,
    sink: Arc<S>,
    dispatcher: Arc<Dispatcher>,
}

impl<S: ReplySink> Poller<S> {
    pub fn new(client: Arc<TelegramClient>, sink: Arc<S>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            client,
            sink,
            dispatcher,
        }
    }

    /// Poll until the task is dropped. Transport errors back off and retry;
    /// they never reach the ledger.
    pub async fn run(self) {
        let mut offset: i64 = 0;
        let mut backoff = INITIAL_BACKOFF;

        info!("Telegram poller started");

        loop {
            let updates = match self.client.get_updates(offset).await {
                Ok(updates) => {
                    backoff = INITIAL_BACKOFF;
                    updates
                }
                Err(e) => {
                    warn!(error = %e, retry_in_secs = backoff.as_secs(), "getUpdates failed");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.process_update(&update).await;
            }
        }
    }

    /// Dispatch one update and deliver its reply, if any
    pub async fn process_update(&self, update: &Update) {
        let Some(message) = update.message.as_ref().and_then(inbound_message) else {
            debug!(update_id = update.update_id, "Skipping update without text message");
            return;
        };

        let Some(reply) = self.dispatcher.handle(&message).await else {
            return;
        };

        if let Err(e) = self.sink.send_reply(&reply).await {
            warn!(chat_id = reply.chat_id, error = %e, "Failed to send reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::OutboundReply;
    use crate::telegram::types::{Chat, ChatKind, Message, User};
    use async_trait::async_trait;
    use scoreboard_ledger::{Leaderboard, LedgerDb, ScoringEngine, ScoringPolicy};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<OutboundReply>>,
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        type Error = std::io::Error;

        async fn send_reply(&self, reply: &OutboundReply) -> Result<(), std::io::Error> {
            self.sent.lock().unwrap().push(reply.clone());
            Ok(())
        }
    }

    fn poller() -> (Poller<RecordingSink>, Arc<RecordingSink>) {
        let db = Arc::new(LedgerDb::open_in_memory().unwrap());
        let policy = ScoringPolicy {
            marker: "#weekly".to_string(),
            award: 1,
        };
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(ScoringEngine::new(db.clone(), policy)),
            Arc::new(Leaderboard::new(db)),
            15,
            None,
        ));
        let client = Arc::new(TelegramClient::new("http://127.0.0.1:9", "test-token", 1).unwrap());
        let sink = Arc::new(RecordingSink::default());
        (Poller::new(client, sink.clone(), dispatcher), sink)
    }

    fn update(id: i64, text: Option<&str>) -> Update {
        Update {
            update_id: id,
            message: Some(Message {
                message_id: id * 10,
                date: 1_717_416_000,
                chat: Chat {
                    id: -7,
                    kind: ChatKind::Supergroup,
                },
                from: Some(User {
                    id: 1,
                    is_bot: false,
                    first_name: "Sara".to_string(),
                    last_name: None,
                    username: None,
                }),
                text: text.map(str::to_string),
            }),
        }
    }

    #[tokio::test]
    async fn test_report_update_sends_one_reply() {
        let (poller, sink) = poller();

        poller.process_update(&update(1, Some("#weekly done"))).await;
        poller.process_update(&update(2, Some("chit chat"))).await;
        poller.process_update(&update(3, None)).await;

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, -7);
        assert_eq!(sent[0].reply_to_message_id, Some(10));
        assert!(sent[0].text.contains("Sara"));
    }
}
