use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, warn};

use common::{AlertChannel, Error, Result};

/// Sends signal alerts to one Telegram chat or channel.
pub struct TelegramAlerter {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramAlerter {
    /// `chat` is a numeric chat id (negative for groups) or an `@channel` username.
    pub fn new(token: impl Into<String>, chat: &str) -> Result<Self> {
        Ok(Self {
            bot: Bot::new(token),
            recipient: parse_recipient(chat)?,
        })
    }
}

/// Interpret a configured chat target.
pub fn parse_recipient(chat: &str) -> Result<Recipient> {
    let chat = chat.trim();
    if let Ok(id) = chat.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if chat.starts_with('@') && chat.len() > 1 {
        return Ok(Recipient::ChannelUsername(chat.to_string()));
    }
    Err(Error::Config(format!(
        "TELEGRAM_CHAT_ID must be a numeric id or an @channel name, got '{chat}'"
    )))
}

#[async_trait]
impl AlertChannel for TelegramAlerter {
    async fn send(&self, text: &str) -> Result<()> {
        match self.bot.send_message(self.recipient.clone(), text).await {
            Ok(message) => {
                debug!(message_id = message.id.0, "Telegram alert sent");
                Ok(())
            }
            Err(e) => {
                warn!(recipient = ?self.recipient, error = %e, "Failed to send Telegram alert");
                Err(Error::Dispatch(e.to_string()))
            }
        }
    }
}
