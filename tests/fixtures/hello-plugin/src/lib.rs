//! Minimal shared-library plugin used by the loader tests

use std::sync::Arc;

use async_trait::async_trait;
use plugbot::{CommandHandler, ExecutionContext, HandlerError, InboundMessage, PluginDescriptor};

struct Hello;

#[async_trait]
impl CommandHandler for Hello {
    async fn handle(&self, _m: &InboundMessage, ctx: &ExecutionContext) -> Result<(), HandlerError> {
        ctx.reply(format!("Hello, {}!", ctx.push_name)).await?;
        Ok(())
    }
}

fn plugin() -> PluginDescriptor {
    PluginDescriptor::new(vec!["hello".into(), "hi".into()], Arc::new(Hello)).private_only()
}

plugbot::declare_plugin!(plugin);
