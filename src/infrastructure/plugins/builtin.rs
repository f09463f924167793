//! Built-in handlers that manifest plugins can bind by name

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::application::errors::HandlerError;
use crate::application::messaging::ExecutionContext;
use crate::domain::entities::InboundMessage;
use crate::domain::traits::CommandHandler;

/// Process start, for uptime reporting
pub static STARTED: Lazy<Instant> = Lazy::new(Instant::now);

/// Named handlers a manifest's `handler` field can refer to
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with `ping` and `echo`
    pub fn builtin() -> Self {
        Self::new()
            .with("ping", PingHandler)
            .with("echo", EchoHandler)
    }

    pub fn with<H: CommandHandler + 'static>(mut self, name: impl Into<String>, handler: H) -> Self {
        self.register(name, Arc::new(handler));
        self
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Replies "Pong!" and then a short status report
pub struct PingHandler;

#[async_trait]
impl CommandHandler for PingHandler {
    async fn handle(&self, _message: &InboundMessage, ctx: &ExecutionContext) -> Result<(), HandlerError> {
        let start = Instant::now();
        ctx.reply("🏓 Pong!").await?;
        let latency = start.elapsed();

        let status = [
            "⚡ *Bot Status* ⚡".to_string(),
            format!("• Latency: {}ms", latency.as_millis()),
            format!("• Runtime: {:.2}s", STARTED.elapsed().as_secs_f64()),
            format!("• Platform: {}", std::env::consts::OS),
            format!("• Version: {}", env!("CARGO_PKG_VERSION")),
        ];
        ctx.reply(status.join("\n")).await?;
        Ok(())
    }
}

/// Replies with the command's free text
pub struct EchoHandler;

#[async_trait]
impl CommandHandler for EchoHandler {
    async fn handle(&self, _message: &InboundMessage, ctx: &ExecutionContext) -> Result<(), HandlerError> {
        if ctx.text.is_empty() {
            return Err(HandlerError::InvalidArgs(format!("usage: {}{} <text>", ctx.prefix, ctx.command)));
        }
        ctx.reply(ctx.text.as_str()).await?;
        Ok(())
    }
}
