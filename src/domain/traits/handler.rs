use async_trait::async_trait;

use crate::application::errors::{BotError, HandlerError};
use crate::application::messaging::ExecutionContext;
use crate::domain::entities::{InboundMessage, OutboundPayload};

/// Executable behavior of a plugin unit
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, message: &InboundMessage, ctx: &ExecutionContext) -> Result<(), HandlerError>;
}

/// Outbound-send callback bound into every execution context
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, payload: OutboundPayload) -> Result<(), BotError>;
}
