//! Console adapter for development/testing

use std::io::Write;

use async_trait::async_trait;
use crate::domain::entities::{InboundMessage, OutboundPayload};
use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;

/// Chat id used for console input in private mode
pub const CONSOLE_PRIVATE_CHAT: &str = "console@s.whatsapp.net";
/// Chat id used for console input in group mode
pub const CONSOLE_GROUP_CHAT: &str = "console@g.us";

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    chat_id: String,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "plugbot".to_string(),
            },
            chat_id: CONSOLE_PRIVATE_CHAT.to_string(),
        }
    }

    /// Simulate a group chat instead of a direct chat
    pub fn in_group(mut self) -> Self {
        self.chat_id = CONSOLE_GROUP_CHAT.to_string();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Wrap a line typed on the console as an inbound message
    pub fn inbound(&self, line: &str) -> InboundMessage {
        InboundMessage::from_text(self.chat_id.as_str(), line).with_push_name("console")
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send(&self, _chat_id: &str, payload: OutboundPayload) -> Result<(), BotError> {
        let line = match payload {
            OutboundPayload::Text(text) => text,
            OutboundPayload::Rich(value) => value.to_string(),
        };
        writeln!(std::io::stdout().lock(), "[BOT] {}", line)
            .map_err(|e| BotError::Transport(format!("Failed to write to console: {}", e)))
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
