use std::sync::Arc;

use crate::application::errors::BotError;
use crate::application::messaging::{CommandDispatcher, DispatchOutcome};
use crate::domain::entities::InboundMessage;
use crate::domain::traits::Bot;
use crate::infrastructure::adapters::ChatResponder;

/// Service for processing inbound transport events
#[derive(Clone)]
pub struct MessageService {
    bot: Arc<dyn Bot>,
    dispatcher: CommandDispatcher,
    ignore_own_messages: bool,
    processing_failed: String,
}

impl MessageService {
    pub fn new(bot: Arc<dyn Bot>, dispatcher: CommandDispatcher) -> Self {
        Self {
            bot,
            dispatcher,
            ignore_own_messages: true,
            processing_failed: "An error occurred while processing your request.".to_string(),
        }
    }

    pub fn with_ignore_own_messages(mut self, ignore: bool) -> Self {
        self.ignore_own_messages = ignore;
        self
    }

    pub fn with_processing_failed(mut self, text: impl Into<String>) -> Self {
        self.processing_failed = text.into();
        self
    }

    pub fn bot(&self) -> &Arc<dyn Bot> {
        &self.bot
    }

    /// Process one inbound message.
    ///
    /// Returns `None` when the event was dropped before dispatch (no text, no
    /// chat, or authored by the bot account while those are ignored).
    pub async fn process(&self, message: InboundMessage) -> Result<Option<DispatchOutcome>, BotError> {
        if self.ignore_own_messages && message.key.from_me {
            return Ok(None);
        }
        let Some(text) = message.text() else {
            return Ok(None);
        };
        let Some(chat_id) = message.chat_id() else {
            tracing::debug!("Dropping message {} without chat id", message.key.id);
            return Ok(None);
        };

        let responder = Arc::new(ChatResponder::new(Arc::clone(&self.bot), chat_id));
        match self.dispatcher.dispatch(text, &message, responder).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                tracing::error!("Error processing command: {}", e);
                self.bot.send(chat_id, self.processing_failed.as_str().into()).await?;
                Ok(None)
            }
        }
    }
}
