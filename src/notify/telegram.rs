//! Telegram Bot API transport.
//!
//! Messages go out through `sendMessage`; commands come in by long-polling
//! `getUpdates`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{CommandSource, Notifier, OperatorCommand};
use crate::core::config::TelegramSettings;
use crate::error::{PagewatchError, Result};

const API_BASE: &str = "https://api.telegram.org";

/// Seconds the server holds a `getUpdates` request open.
const LONG_POLL_TIMEOUT_SECS: u64 = 60;

/// Telegram `sendMessage` text limit (UTF-8 characters).
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

fn method_url(token: &str, method: &str) -> String {
    format!("{}/bot{}/{}", API_BASE, token, method)
}

fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Sends notifications to a single chat
pub struct TelegramNotifier {
    settings: TelegramSettings,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(settings: TelegramSettings) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { settings, client })
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": self.settings.chat_id,
            "text": truncate_message(text, TELEGRAM_MESSAGE_LIMIT),
        });

        let response = self
            .client
            .post(method_url(&self.settings.token, "sendMessage"))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(PagewatchError::telegram(format!(
            "sendMessage failed: {} - {}",
            status, body
        )))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) {
        if let Err(e) = self.send_message(text).await {
            log::warn!("Failed to deliver Telegram message: {}", e);
        }
    }
}

/// Long-polls the bot for commands sent from the configured chat
pub struct TelegramCommandSource {
    settings: TelegramSettings,
    client: Client,
    offset: i64,
}

impl TelegramCommandSource {
    pub fn new(settings: TelegramSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_TIMEOUT_SECS + 15))
            .build()?;
        Ok(Self {
            settings,
            client,
            offset: 0,
        })
    }

    /// Commands from `updates`, advancing the offset past every update seen.
    fn collect_commands(&mut self, updates: Vec<Update>) -> Vec<OperatorCommand> {
        let mut commands = Vec::new();
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(command) = message.text.as_deref().and_then(OperatorCommand::parse) else {
                continue;
            };
            if message.chat.id != self.settings.chat_id {
                log::warn!(
                    "Ignoring /{} from unexpected chat {}",
                    command,
                    message.chat.id
                );
                continue;
            }
            commands.push(command);
        }
        commands
    }
}

#[async_trait]
impl CommandSource for TelegramCommandSource {
    async fn next_commands(&mut self) -> Result<Vec<OperatorCommand>> {
        loop {
            let response: ApiResponse<Vec<Update>> = self
                .client
                .get(method_url(&self.settings.token, "getUpdates"))
                .query(&[
                    ("offset", self.offset.to_string()),
                    ("timeout", LONG_POLL_TIMEOUT_SECS.to_string()),
                ])
                .send()
                .await?
                .json()
                .await?;

            if !response.ok {
                return Err(PagewatchError::telegram(format!(
                    "getUpdates failed: {}",
                    response.description.unwrap_or_default()
                )));
            }

            let commands = self.collect_commands(response.result.unwrap_or_default());
            if !commands.is_empty() {
                return Ok(commands);
            }
        }
    }
}
