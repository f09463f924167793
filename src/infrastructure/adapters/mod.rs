//! Transport adapters

pub mod console;

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::OutboundPayload;
use crate::domain::traits::{Bot, Responder};

/// Reply callback that sends to one chat through a bot adapter
pub struct ChatResponder {
    bot: Arc<dyn Bot>,
    chat_id: String,
}

impl ChatResponder {
    pub fn new(bot: Arc<dyn Bot>, chat_id: impl Into<String>) -> Self {
        Self {
            bot,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Responder for ChatResponder {
    async fn send(&self, payload: OutboundPayload) -> Result<(), BotError> {
        self.bot.send(&self.chat_id, payload).await
    }
}
